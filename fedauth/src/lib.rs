//! # Fedauth
//!
//! A modular federated sign-in toolkit: verify a provider-issued access
//! token, derive a stable namespaced identity, upsert the profile record,
//! and mint a signed custom token for session exchange. Enable the `full`
//! feature (or individual ones) to pull in the pieces you need.

#![warn(missing_docs)]

pub use fedauth_core::{
    ExternalProfile, FederationError, InternalIdentity, Provider, ProviderClient,
};

#[cfg(feature = "flow")]
pub use fedauth_flow::{
    FederationPipeline, FederationPipelineBuilder, ProfileSummary, SignInRequest, SignInResponse,
};

#[cfg(feature = "store")]
pub use fedauth_store::{MemoryStore, ProfileRecord, ProfileStore};

#[cfg(feature = "token")]
pub use fedauth_token::{CustomClaims, TokenIssuer};

#[cfg(feature = "kakao")]
pub use fedauth_providers_kakao::KakaoClient;

#[cfg(feature = "naver")]
pub use fedauth_providers_naver::NaverClient;
