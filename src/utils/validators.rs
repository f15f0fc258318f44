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

use thiserror::Error;
use url::Url;

/// 验证错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    /// URL为空
    #[error("URL is required")]
    EmptyUrl,
    /// URL格式无效
    #[error("Invalid URL format")]
    InvalidUrl,
    /// URL协议不受支持
    #[error("URL must use http or https scheme")]
    UnsupportedScheme,
}

/// 验证待分析的URL
///
/// 要求非空、可解析且协议为http或https
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(())` - URL有效
/// * `Err(ValidationError)` - URL无效
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme);
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(())
}
