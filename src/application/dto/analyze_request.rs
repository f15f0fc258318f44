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

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 分析请求数据传输对象
///
/// 封装客户端发起的URL分析请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AnalyzeRequestDto {
    /// 待分析的URL
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
    /// 调用方关联令牌
    #[serde(default)]
    pub request_uuid: String,
    /// 凭证令牌
    pub auth_token: Option<String>,
    /// 调用方分析关联ID
    #[serde(default)]
    pub analysis_id: String,
}
