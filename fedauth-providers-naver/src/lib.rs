//! Naver-style provider client for the fedauth toolkit.
//!
//! Verifies a bearer access token against Naver's user-info endpoint
//! (`GET /v1/nid/me`). Unlike Kakao, Naver wraps the profile in an envelope:
//! success requires `resultcode == "00"` **and** a non-empty `response.id`.
//! On failure the result code and message are surfaced for diagnostics.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use fedauth_core::{ExternalProfile, FederationError, Provider, ProviderClient};
use serde::Deserialize;
use serde_json::Value;

/// Naver's production user-info endpoint.
pub const NAVER_USERINFO_URL: &str = "https://openapi.naver.com/v1/nid/me";

/// The `resultcode` value Naver uses to signal success.
pub const NAVER_SUCCESS_CODE: &str = "00";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for Naver's user-info endpoint.
pub struct NaverClient {
    http: reqwest::Client,
    userinfo_url: String,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NaverUserResponse {
    resultcode: Option<String>,
    message: Option<String>,
    response: Option<NaverAccount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NaverAccount {
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    nickname: Option<String>,
    profile_image: Option<String>,
    gender: Option<String>,
    age: Option<String>,
    birthday: Option<String>,
    birthyear: Option<String>,
    mobile: Option<String>,
}

impl NaverClient {
    /// Create a client against the production endpoint.
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            userinfo_url: NAVER_USERINFO_URL.to_string(),
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

impl Default for NaverClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for NaverClient {
    fn provider(&self) -> Provider {
        Provider::Naver
    }

    async fn verify(&self, access_token: &str) -> Result<ExternalProfile, FederationError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FederationError::unavailable(Provider::Naver, e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FederationError::unavailable(Provider::Naver, e))?;

        let user: NaverUserResponse =
            serde_json::from_value(body.clone()).map_err(|_| FederationError::ProviderAuth {
                provider: Provider::Naver,
                message: "unrecognized naver response".to_string(),
                detail: body.clone(),
            })?;

        if user.resultcode.as_deref() != Some(NAVER_SUCCESS_CODE) {
            let message = match &user.message {
                Some(m) => format!("naver token invalid: {m}"),
                None => "naver token invalid".to_string(),
            };
            return Err(FederationError::ProviderAuth {
                provider: Provider::Naver,
                message,
                detail: body,
            });
        }

        let account = user.response.unwrap_or_default();
        let external_id = match account.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            // resultcode said success, but the envelope has no usable id;
            // still a rejection, never a server-side failure.
            _ => {
                return Err(FederationError::ProviderAuth {
                    provider: Provider::Naver,
                    message: "naver profile missing id".to_string(),
                    detail: body,
                })
            }
        };

        let mut extras = BTreeMap::new();
        extras.insert("name".to_string(), account.name.clone());
        extras.insert("gender".to_string(), account.gender);
        extras.insert("age".to_string(), account.age);
        extras.insert("birthday".to_string(), account.birthday);
        extras.insert("birthyear".to_string(), account.birthyear);
        extras.insert("mobile".to_string(), account.mobile);

        Ok(ExternalProfile {
            provider: Provider::Naver,
            external_id,
            email: account.email,
            display_name: account.nickname.or(account.name),
            avatar_url: account.profile_image,
            extras,
        })
    }
}
