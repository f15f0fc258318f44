// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::services::token_verifier::{AuthError, TokenVerifier};
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

/// Firebase ID令牌的公钥端点
const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// 公钥缓存有效期
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
struct CachedJwks {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Firebase令牌验证器实现
///
/// 基于Google公开的securetoken公钥集验证Firebase ID令牌（RS256），
/// iss与aud固定到项目ID。公钥集按TTL缓存
pub struct FirebaseVerifierImpl {
    /// Firebase项目ID
    project_id: String,
    /// 公钥缓存
    jwks_cache: RwLock<Option<CachedJwks>>,
    /// HTTP客户端
    http: reqwest::Client,
}

impl FirebaseVerifierImpl {
    /// 创建新的Firebase令牌验证器实例
    ///
    /// # 参数
    ///
    /// * `project_id` - Firebase项目ID
    pub fn new(project_id: String) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!("Failed to configure reqwest client, using defaults: {}", err);
                reqwest::Client::new()
            }
        };

        Self {
            project_id,
            jwks_cache: RwLock::new(None),
            http,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation
    }

    async fn get_jwk(&self, kid: &str) -> Result<Option<jsonwebtoken::jwk::Jwk>, AuthError> {
        if let Some(jwk) = self.cached_jwk(kid).await {
            return Ok(Some(jwk));
        }

        self.refresh_jwks().await?;
        Ok(self.cached_jwk(kid).await)
    }

    async fn cached_jwk(&self, kid: &str) -> Option<jsonwebtoken::jwk::Jwk> {
        let cache = self.jwks_cache.read().await;
        let set = match cache.as_ref() {
            Some(cached) if cached.is_fresh(JWKS_CACHE_TTL) => Arc::clone(&cached.set),
            _ => return None,
        };
        drop(cache);

        set.keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .cloned()
    }

    async fn refresh_jwks(&self) -> Result<(), AuthError> {
        let set = self
            .http
            .get(SECURETOKEN_JWKS_URL)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        *self.jwks_cache.write().await = Some(CachedJwks {
            set: Arc::new(set),
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifierImpl {
    async fn verify(&self, token: &str) -> Result<(), AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;

        let jwk = self
            .get_jwk(&kid)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::InvalidToken)?;

        decode::<Value>(token, &decoding_key, &self.validation())
            .map(|_| ())
            .map_err(|_| AuthError::InvalidToken)
    }
}
