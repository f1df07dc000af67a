//! Kakao-style provider client for the fedauth toolkit.
//!
//! Verifies a bearer access token against Kakao's user-info endpoint
//! (`GET /v2/user/me`). Kakao signals success by the presence of a top-level
//! user `id`; the profile fields live under the optional `kakao_account`
//! sub-object and are individually optional.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use fedauth_core::{ExternalProfile, FederationError, Provider, ProviderClient};
use serde::Deserialize;
use serde_json::Value;

/// Kakao's production user-info endpoint.
pub const KAKAO_USERINFO_URL: &str = "https://kapi.kakao.com/v2/user/me";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for Kakao's user-info endpoint.
pub struct KakaoClient {
    http: reqwest::Client,
    userinfo_url: String,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KakaoUserResponse {
    id: Option<KakaoId>,
    kakao_account: Option<KakaoAccount>,
}

// Kakao documents the id as numeric but some gateways re-serialize it as a
// string; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KakaoId {
    Num(i64),
    Str(String),
}

impl KakaoId {
    fn into_string(self) -> Option<String> {
        match self {
            KakaoId::Num(n) => Some(n.to_string()),
            KakaoId::Str(s) if !s.is_empty() => Some(s),
            KakaoId::Str(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KakaoAccount {
    email: Option<String>,
    profile: Option<KakaoAccountProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KakaoAccountProfile {
    nickname: Option<String>,
    profile_image_url: Option<String>,
}

impl KakaoClient {
    /// Create a client against the production endpoint.
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            userinfo_url: KAKAO_USERINFO_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the user-info URL (tests point this at a mock server).
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    /// Override the outbound request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for KakaoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for KakaoClient {
    fn provider(&self) -> Provider {
        Provider::Kakao
    }

    async fn verify(&self, access_token: &str) -> Result<ExternalProfile, FederationError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FederationError::unavailable(Provider::Kakao, e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FederationError::unavailable(Provider::Kakao, e))?;

        let user: KakaoUserResponse =
            serde_json::from_value(body.clone()).map_err(|_| FederationError::ProviderAuth {
                provider: Provider::Kakao,
                message: "unrecognized kakao response".to_string(),
                detail: body.clone(),
            })?;

        // Success is signaled by the id, not the HTTP status.
        let external_id = match user.id.and_then(KakaoId::into_string) {
            Some(id) => id,
            None => {
                return Err(FederationError::ProviderAuth {
                    provider: Provider::Kakao,
                    message: "invalid kakao access token".to_string(),
                    detail: body,
                })
            }
        };

        let account = user.kakao_account.unwrap_or_default();
        let profile = account.profile.unwrap_or_default();

        Ok(ExternalProfile {
            provider: Provider::Kakao,
            external_id,
            email: account.email,
            display_name: profile.nickname,
            avatar_url: profile.profile_image_url,
            extras: BTreeMap::new(),
        })
    }
}
