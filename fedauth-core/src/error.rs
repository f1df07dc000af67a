use http::StatusCode;
use serde_json::{json, Value};

use crate::identity::Provider;

/// The federation error taxonomy.
///
/// Every pipeline failure is classified into exactly one of these kinds; the
/// gateway maps the classification to an HTTP status via
/// [`FederationError::status_code`] and serializes
/// [`FederationError::response_body`] as the error payload.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    /// Malformed or missing request input. Local, no side effects.
    #[error("{0}")]
    Input(String),
    /// The provider explicitly rejected the token or returned an incomplete
    /// profile. The raw upstream payload is kept for diagnostics.
    #[error("{provider} rejected the access token: {message}")]
    ProviderAuth {
        /// The provider that rejected the token.
        provider: Provider,
        /// Human-readable rejection summary.
        message: String,
        /// The raw upstream response body.
        detail: Value,
    },
    /// The provider could not be reached (network failure or timeout).
    /// Distinct from an explicit rejection; safe for the caller to retry.
    #[error("{provider} unreachable: {message}")]
    ProviderUnavailable {
        /// The provider we failed to reach.
        provider: Provider,
        /// Transport-level failure description.
        message: String,
    },
    /// The profile store failed. The caller cannot assume any mutation
    /// occurred.
    #[error("profile store error: {0}")]
    Store(String),
    /// Token signing failed. Fatal for the current request.
    #[error("token issuance error: {0}")]
    Token(String),
}

impl FederationError {
    /// Classify a transport error from the provider's user-info call.
    pub fn unavailable(provider: Provider, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        FederationError::ProviderUnavailable { provider, message }
    }

    /// The HTTP status the gateway should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FederationError::Input(_) => StatusCode::BAD_REQUEST,
            FederationError::ProviderAuth { .. } => StatusCode::UNAUTHORIZED,
            FederationError::ProviderUnavailable { .. }
            | FederationError::Store(_)
            | FederationError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON error body the gateway should serialize.
    ///
    /// Provider rejections carry the raw upstream response under `detail`;
    /// every other kind is a plain `{ "error": ... }` object.
    pub fn response_body(&self) -> Value {
        match self {
            FederationError::Input(message) => json!({ "error": message }),
            FederationError::ProviderAuth {
                message, detail, ..
            } => json!({ "error": message, "detail": detail }),
            other => json!({ "error": other.to_string() }),
        }
    }
}
