use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FederationError;

/// A third-party identity provider the toolkit knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Kakao Login (`kapi.kakao.com`).
    Kakao,
    /// Naver Login (`openapi.naver.com`).
    Naver,
}

impl Provider {
    /// The lowercase identifier used as the uid namespace prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Kakao => "kakao",
            Provider::Naver => "naver",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kakao" => Ok(Provider::Kakao),
            "naver" => Ok(Provider::Naver),
            other => Err(FederationError::Input(format!(
                "unknown provider: {other}"
            ))),
        }
    }
}

/// A normalized profile as returned by a provider's user-info endpoint.
///
/// Produced fresh on every verification, never cached. Canonical fields are
/// lifted out of the provider-specific payload shape; everything else the
/// provider reported lands in `extras`, with a `None` value where the
/// provider left the field out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// The provider that verified the access token.
    pub provider: Provider,
    /// The provider-assigned user id, never empty.
    pub external_id: String,
    /// Account email, if the provider disclosed one.
    pub email: Option<String>,
    /// Display name or nickname.
    pub display_name: Option<String>,
    /// Profile image URL.
    pub avatar_url: Option<String>,
    /// Provider-specific attributes (e.g. gender, age range, mobile).
    pub extras: BTreeMap<String, Option<String>>,
}

/// The stable, namespaced identity string: `"<provider>:<external_id>"`.
///
/// This is both the document key in the profile store and the subject
/// asserted by the token issuer. Prefixing with the provider keeps the
/// mapping injective even if two providers hand out the same raw id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalIdentity(String);

impl InternalIdentity {
    /// Map a provider identity to the internal identity string.
    ///
    /// Pure and deterministic. The only rejected input is an empty external
    /// id, which a well-behaved [`ProviderClient`](crate::ProviderClient)
    /// never produces.
    pub fn map(provider: Provider, external_id: &str) -> Result<Self, FederationError> {
        if external_id.is_empty() {
            return Err(FederationError::Input(
                "external id must not be empty".to_string(),
            ));
        }
        Ok(Self(format!("{}:{}", provider.as_str(), external_id)))
    }

    /// The uid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InternalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
