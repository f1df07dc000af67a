//! # Fedauth Flow
//!
//! `fedauth-flow` orchestrates the federation pipeline: verify the provider
//! access token, map the external identity to the namespaced uid, upsert the
//! profile record, and mint the custom token. Each stage's output is the
//! next stage's sole input; every failure is classified once and reported to
//! the caller.
//!
//! ## Key Components
//!
//! - **[`FederationPipeline`]**: the orchestrator, holding the registered
//!   provider clients, the profile store and the token issuer.
//! - **[`FederationPipelineBuilder`]**: a typestate builder; a pipeline
//!   cannot be constructed without a store and an issuer.
//! - **[`SignInRequest`] / [`SignInResponse`]**: the serde contract the HTTP
//!   gateway consumes. The gateway itself (routing, method checks, body
//!   reads) lives outside this crate.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;

use fedauth_core::{FederationError, InternalIdentity, Provider, ProviderClient};
use fedauth_store::ProfileStore;
use fedauth_token::TokenIssuer;
use serde::{Deserialize, Serialize};

/// The parsed request body of a federated sign-in call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// The provider-issued bearer access token.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// The successful response payload of a federated sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// The namespaced internal identity.
    pub uid: String,
    /// Canonical profile summary; absent values serialize as nulls.
    pub profile: ProfileSummary,
    /// The signed custom token to exchange for a session.
    pub custom_token: String,
}

/// The canonical profile fields echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Account email, or null.
    pub email: Option<String>,
    /// Display name, or null.
    pub display_name: Option<String>,
    /// Profile image URL, or null.
    pub avatar_url: Option<String>,
}

/// Marker for a missing component in the typestate builder.
#[derive(Clone, Default)]
pub struct Missing;

/// Marker for a configured component in the typestate builder.
#[derive(Clone)]
pub struct Configured<T>(pub T);

/// Orchestrates the federation pipeline.
pub struct FederationPipeline<S> {
    providers: HashMap<Provider, Arc<dyn ProviderClient>>,
    store: S,
    issuer: TokenIssuer,
}

impl FederationPipeline<Missing> {
    /// Create a new [`FederationPipelineBuilder`].
    pub fn builder() -> FederationPipelineBuilder<Missing, Missing> {
        FederationPipelineBuilder::default()
    }
}

impl<S: ProfileStore> FederationPipeline<S> {
    /// Run the full pipeline for one `(provider, access token)` pair.
    ///
    /// Fails closed: an empty token is rejected before any outbound call, a
    /// provider rejection leaves the store untouched, and no partial side
    /// effect is ever reported as success.
    pub async fn sign_in(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<SignInResponse, FederationError> {
        if access_token.trim().is_empty() {
            return Err(FederationError::Input("accessToken missing".to_string()));
        }

        let client = self.providers.get(&provider).ok_or_else(|| {
            FederationError::Input(format!("no client registered for provider: {provider}"))
        })?;

        let profile = client.verify(access_token).await.map_err(|err| {
            log::warn!("{provider} verification failed: {err}");
            err
        })?;

        let uid = InternalIdentity::map(profile.provider, &profile.external_id)?;

        let record = self.store.upsert(&uid, &profile).await.map_err(|err| {
            log::error!("profile upsert failed for {uid}: {err}");
            err
        })?;

        let custom_token = self.issuer.issue(&uid, provider).map_err(|err| {
            log::error!("token issuance failed for {uid}: {err}");
            err
        })?;

        log::debug!("federated sign-in complete for {uid}");
        Ok(SignInResponse {
            ok: true,
            uid: uid.to_string(),
            profile: ProfileSummary {
                email: record.email,
                display_name: record.display_name,
                avatar_url: record.avatar_url,
            },
            custom_token,
        })
    }

    /// Convenience wrapper over [`sign_in`](Self::sign_in) taking the parsed
    /// gateway request body.
    pub async fn handle(
        &self,
        provider: Provider,
        request: SignInRequest,
    ) -> Result<SignInResponse, FederationError> {
        let access_token = request.access_token.unwrap_or_default();
        self.sign_in(provider, &access_token).await
    }

    /// The profile store backing this pipeline.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// A builder for configuring and creating a [`FederationPipeline`].
pub struct FederationPipelineBuilder<S, T> {
    providers: HashMap<Provider, Arc<dyn ProviderClient>>,
    store: S,
    issuer: T,
}

impl Default for FederationPipelineBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            store: Missing,
            issuer: Missing,
        }
    }
}

impl<S, T> FederationPipelineBuilder<S, T> {
    /// Register a provider client.
    pub fn provider<P>(mut self, client: P) -> Self
    where
        P: ProviderClient + 'static,
    {
        self.providers.insert(client.provider(), Arc::new(client));
        self
    }

    /// Set the profile store.
    pub fn store<St: ProfileStore>(self, store: St) -> FederationPipelineBuilder<Configured<St>, T> {
        FederationPipelineBuilder {
            providers: self.providers,
            store: Configured(store),
            issuer: self.issuer,
        }
    }

    /// Set the token issuer.
    pub fn token_issuer(self, issuer: TokenIssuer) -> FederationPipelineBuilder<S, Configured<TokenIssuer>> {
        FederationPipelineBuilder {
            providers: self.providers,
            store: self.store,
            issuer: Configured(issuer),
        }
    }

    /// Set the signing secret for a default token issuer.
    pub fn signing_secret(self, secret: &[u8]) -> FederationPipelineBuilder<S, Configured<TokenIssuer>> {
        self.token_issuer(TokenIssuer::new(secret))
    }
}

impl<St: ProfileStore> FederationPipelineBuilder<Configured<St>, Configured<TokenIssuer>> {
    /// Build the [`FederationPipeline`].
    pub fn build(self) -> FederationPipeline<St> {
        FederationPipeline {
            providers: self.providers,
            store: self.store.0,
            issuer: self.issuer.0,
        }
    }
}
