// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 令牌验证错误类型
#[derive(Error, Debug)]
pub enum AuthError {
    /// 令牌无效
    #[error("Invalid token")]
    InvalidToken,
    /// 验证服务不可用
    #[error("Token verification unavailable: {0}")]
    Unavailable(String),
}

/// 令牌验证接口
///
/// 对调用方凭证的不透明校验谓词
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 验证凭证令牌
    async fn verify(&self, token: &str) -> Result<(), AuthError>;
}
