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

use crate::domain::models::task::TaskStatus;
use serde::{Deserialize, Serialize};

/// Webhook请求数据传输对象
///
/// 工作器推送的终态通知
#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookRequestDto {
    /// 内部任务ID
    pub task_id: String,
    /// 上报的任务状态
    pub status: TaskStatus,
    /// 分析结果
    #[serde(default)]
    pub result: String,
}
