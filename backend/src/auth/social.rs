//! Social login providers
//!
//! Each provider turns a client-obtained token into the provider's user
//! identity by calling its user-info endpoint. Endpoint URLs come from
//! `SocialConfig` so tests can point them at a mock server.

use crate::config::SocialConfig;
use async_trait::async_trait;
use bml_shared::models::SnsLoginType;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Identity returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialUserInfo {
    pub provider: SnsLoginType,
    pub social_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("Provider rejected the token: {0}")]
    Rejected(String),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SocialProvider: Send + Sync {
    fn login_type(&self) -> SnsLoginType;

    async fn fetch_user(&self, token: &str) -> Result<SocialUserInfo, SocialError>;
}

async fn get_json<T: for<'de> Deserialize<'de>>(
    request: reqwest::RequestBuilder,
) -> Result<T, SocialError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SocialError::Rejected(format!("HTTP {}", status)));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| SocialError::InvalidResponse(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Kakao
// ============================================================================

#[derive(Deserialize)]
struct KakaoUser {
    id: i64,
    #[serde(default)]
    kakao_account: KakaoAccount,
}

#[derive(Deserialize, Default)]
struct KakaoAccount {
    email: Option<String>,
    #[serde(default)]
    profile: KakaoProfile,
}

#[derive(Deserialize, Default)]
struct KakaoProfile {
    nickname: Option<String>,
    profile_image_url: Option<String>,
}

pub struct KakaoProvider {
    client: reqwest::Client,
    user_info_url: String,
}

#[async_trait]
impl SocialProvider for KakaoProvider {
    fn login_type(&self) -> SnsLoginType {
        SnsLoginType::Kakao
    }

    async fn fetch_user(&self, token: &str) -> Result<SocialUserInfo, SocialError> {
        let user: KakaoUser = get_json(self.client.get(&self.user_info_url).bearer_auth(token)).await?;
        Ok(SocialUserInfo {
            provider: SnsLoginType::Kakao,
            social_id: user.id.to_string(),
            email: non_empty(user.kakao_account.email),
            name: non_empty(user.kakao_account.profile.nickname),
            profile_image: non_empty(user.kakao_account.profile.profile_image_url),
        })
    }
}

// ============================================================================
// Naver
// ============================================================================

#[derive(Deserialize)]
struct NaverEnvelope {
    resultcode: String,
    #[serde(default)]
    message: String,
    response: Option<NaverUser>,
}

#[derive(Deserialize)]
struct NaverUser {
    id: String,
    email: Option<String>,
    name: Option<String>,
    profile_image: Option<String>,
}

pub struct NaverProvider {
    client: reqwest::Client,
    user_info_url: String,
}

#[async_trait]
impl SocialProvider for NaverProvider {
    fn login_type(&self) -> SnsLoginType {
        SnsLoginType::Naver
    }

    async fn fetch_user(&self, token: &str) -> Result<SocialUserInfo, SocialError> {
        let envelope: NaverEnvelope =
            get_json(self.client.get(&self.user_info_url).bearer_auth(token)).await?;
        if envelope.resultcode != "00" {
            return Err(SocialError::Rejected(format!(
                "resultcode {} {}",
                envelope.resultcode, envelope.message
            )));
        }
        let user = envelope
            .response
            .ok_or_else(|| SocialError::InvalidResponse("missing response".to_string()))?;
        Ok(SocialUserInfo {
            provider: SnsLoginType::Naver,
            social_id: user.id,
            email: non_empty(user.email),
            name: non_empty(user.name),
            profile_image: non_empty(user.profile_image),
        })
    }
}

// ============================================================================
// Google
// ============================================================================

#[derive(Deserialize)]
struct GoogleTokenInfo {
    sub: String,
    aud: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies ID tokens with the tokeninfo endpoint
pub struct GoogleProvider {
    client: reqwest::Client,
    token_info_url: String,
    client_id: Option<String>,
}

#[async_trait]
impl SocialProvider for GoogleProvider {
    fn login_type(&self) -> SnsLoginType {
        SnsLoginType::Google
    }

    async fn fetch_user(&self, token: &str) -> Result<SocialUserInfo, SocialError> {
        let info: GoogleTokenInfo = get_json(
            self.client
                .get(&self.token_info_url)
                .query(&[("id_token", token)]),
        )
        .await?;

        if let Some(expected) = &self.client_id {
            if info.aud.as_deref() != Some(expected.as_str()) {
                return Err(SocialError::Rejected("audience mismatch".to_string()));
            }
        }

        Ok(SocialUserInfo {
            provider: SnsLoginType::Google,
            social_id: info.sub,
            email: non_empty(info.email),
            name: non_empty(info.name),
            profile_image: non_empty(info.picture),
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The configured providers, cheap to clone
#[derive(Clone)]
pub struct SocialLogin {
    kakao: Arc<dyn SocialProvider>,
    naver: Arc<dyn SocialProvider>,
    google: Arc<dyn SocialProvider>,
}

impl SocialLogin {
    pub fn from_config(config: &SocialConfig) -> Result<Self, SocialError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        debug!(
            kakao = %config.kakao_user_info_url,
            naver = %config.naver_user_info_url,
            google = %config.google_token_info_url,
            "Configured social login providers"
        );

        Ok(Self {
            kakao: Arc::new(KakaoProvider {
                client: client.clone(),
                user_info_url: config.kakao_user_info_url.clone(),
            }),
            naver: Arc::new(NaverProvider {
                client: client.clone(),
                user_info_url: config.naver_user_info_url.clone(),
            }),
            google: Arc::new(GoogleProvider {
                client,
                token_info_url: config.google_token_info_url.clone(),
                client_id: config.google_client_id.clone(),
            }),
        })
    }

    /// Provider for a social login type; `None` for EMAIL
    pub fn provider(&self, login_type: SnsLoginType) -> Option<&dyn SocialProvider> {
        match login_type {
            SnsLoginType::Kakao => Some(self.kakao.as_ref()),
            SnsLoginType::Naver => Some(self.naver.as_ref()),
            SnsLoginType::Google => Some(self.google.as_ref()),
            SnsLoginType::Email => None,
        }
    }
}
