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

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 分析任务实体
///
/// 表示一次钓鱼短信URL分析的完整生命周期记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 调用方关联令牌
    pub request_uuid: String,
    /// 执行平台下发的句柄（如ECS任务ARN），启动成功前为空
    #[serde(default)]
    pub external_id: String,
    /// 调用方分析关联ID
    #[serde(default)]
    pub analysis_id: String,
    /// 待分析的URL
    pub url: String,
    /// 任务状态
    pub status: TaskStatus,
    /// 已重试次数
    pub retry_count: i32,
    /// 分析结果或错误描述
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 更新时间，每次变更时刷新
    pub updated_at: DateTime<FixedOffset>,
}

/// 任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// 已创建，等待启动
    #[default]
    Pending,
    /// 远程工作器执行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Running => write!(f, "RUNNING"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "RUNNING" => Ok(TaskStatus::Running),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            _ => Err(()),
        }
    }
}

impl AnalysisTask {
    /// 创建一个新的分析任务
    ///
    /// # 参数
    ///
    /// * `url` - 待分析的URL
    /// * `request_uuid` - 调用方关联令牌
    /// * `analysis_id` - 调用方分析关联ID
    ///
    /// # 返回值
    ///
    /// 返回状态为Pending的新任务实例
    pub fn new(url: String, request_uuid: String, analysis_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_uuid,
            external_id: String::new(),
            analysis_id,
            url,
            status: TaskStatus::Pending,
            retry_count: 0,
            result: String::new(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    /// 判断任务是否可以重试
    ///
    /// 失败状态且未达到最大重试次数的任务可以重试
    pub fn can_retry(&self, max_retries: i32) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < max_retries
    }

    /// 判断任务是否处于活跃状态
    ///
    /// 活跃任务是同一URL去重判定的对象：Pending、Running，
    /// 或仍可重试的Failed任务
    pub fn is_active(&self, max_retries: i32) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::Running)
            || self.can_retry(max_retries)
    }
}
