//! # Fedauth Core
//!
//! `fedauth-core` provides the foundational traits and types for the fedauth
//! federated sign-in toolkit. It defines the canonical profile shape, the
//! provider-namespaced internal identity, the error taxonomy shared by every
//! stage of the pipeline, and the [`ProviderClient`] seam the per-provider
//! crates implement.

#![warn(missing_docs)]

use async_trait::async_trait;

/// Errors that can occur during the federation pipeline.
pub mod error;
pub use crate::error::FederationError;

/// Provider, profile and internal-identity types.
pub mod identity;
pub use crate::identity::{ExternalProfile, InternalIdentity, Provider};

/// Trait for a client of a provider's user-info endpoint.
///
/// A client issues exactly one outbound call per verification, with the
/// access token as an `Authorization: Bearer` header, and checks the
/// provider's own success condition in the payload rather than trusting the
/// HTTP status. It never touches persisted state.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The provider this client talks to.
    fn provider(&self) -> Provider;

    /// Verify a bearer access token against the provider's user-info
    /// endpoint and normalize the response.
    ///
    /// Returns [`FederationError::ProviderAuth`] when the provider rejected
    /// the token or omitted the user id, and
    /// [`FederationError::ProviderUnavailable`] when the call itself failed.
    async fn verify(&self, access_token: &str) -> Result<ExternalProfile, FederationError>;
}

#[async_trait]
impl<T: ProviderClient + ?Sized> ProviderClient for std::sync::Arc<T> {
    fn provider(&self) -> Provider {
        (**self).provider()
    }

    async fn verify(&self, access_token: &str) -> Result<ExternalProfile, FederationError> {
        (**self).verify(access_token).await
    }
}
