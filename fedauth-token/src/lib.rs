//! # Fedauth Token
//!
//! Mints the short-lived signed custom token a client exchanges for a full
//! session with the downstream auth system. The token asserts the internal
//! identity as subject and carries the provider as a claim; it is never
//! persisted and never reused across pipeline invocations.

#![warn(missing_docs)]

use chrono::Duration;
use fedauth_core::{FederationError, InternalIdentity, Provider};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a custom token.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomClaims {
    /// The internal identity (`"<provider>:<external_id>"`).
    pub sub: String,
    /// The provider that verified the login, for downstream consumption.
    pub provider: String,
    /// Issued-at, seconds since the epoch.
    pub iat: usize,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
    /// Optional issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Issues HS256-signed custom tokens with a fixed expiry window.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from a shared secret, with a one hour expiry.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: None,
            ttl: Duration::hours(1),
        }
    }

    /// Set the `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Override the expiry window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mint a token asserting `identity` as subject.
    pub fn issue(
        &self,
        identity: &InternalIdentity,
        provider: Provider,
    ) -> Result<String, FederationError> {
        let now = chrono::Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| FederationError::Token("token expiry overflows".to_string()))?;

        let claims = CustomClaims {
            sub: identity.to_string(),
            provider: provider.as_str().to_string(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FederationError::Token(e.to_string()))
    }

    /// Decode and validate a token minted by this issuer.
    pub fn decode(&self, token: &str) -> Result<CustomClaims, FederationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        decode::<CustomClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| FederationError::Token(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> InternalIdentity {
        InternalIdentity::map(Provider::Naver, "12345").unwrap()
    }

    #[test]
    fn token_round_trips_subject_and_provider() {
        let issuer = TokenIssuer::new(b"test-secret");
        let token = issuer.issue(&uid(), Provider::Naver).unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.sub, "naver:12345");
        assert_eq!(claims.provider, "naver");
    }

    #[test]
    fn expiry_matches_configured_window() {
        let issuer = TokenIssuer::new(b"test-secret").with_ttl(Duration::minutes(5));
        let token = issuer.issue(&uid(), Provider::Kakao).unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn issuer_claim_is_carried_and_validated() {
        let issuer = TokenIssuer::new(b"test-secret").with_issuer("fedauth");
        let token = issuer.issue(&uid(), Provider::Naver).unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("fedauth"));
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let token = TokenIssuer::new(b"test-secret")
            .issue(&uid(), Provider::Naver)
            .unwrap();

        let err = TokenIssuer::new(b"other-secret").decode(&token).unwrap_err();
        assert!(matches!(err, FederationError::Token(_)));
    }

    #[test]
    fn tampered_token_fails_validation() {
        let issuer = TokenIssuer::new(b"test-secret");
        let mut token = issuer.issue(&uid(), Provider::Naver).unwrap();
        token.push('x');
        assert!(issuer.decode(&token).is_err());
    }
}
