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

use crate::domain::models::task::{AnalysisTask, TaskStatus};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::domain::services::bot_executor::{BotExecutor, ExecutorError};
use crate::domain::services::token_verifier::{AuthError, TokenVerifier};
use crate::utils::validators;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 服务错误类型
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 请求参数错误
    #[error("{0}")]
    BadRequest(String),
    /// 凭证验证失败
    #[error("Authentication failed: {0}")]
    Unauthenticated(#[source] AuthError),
    /// 任务未找到
    #[error("Task not found")]
    NotFound,
    /// 存储层错误
    #[error(transparent)]
    Storage(RepositoryError),
    /// 执行器错误
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Storage(other),
        }
    }
}

/// 任务编排服务
///
/// 编排核心：负责任务创建与去重、状态更新、失败重试扫描
/// 以及运行中任务的状态轮询
pub struct TaskService<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    /// 任务仓库
    repo: Arc<R>,
    /// 远程执行器
    executor: Arc<E>,
    /// 令牌验证器
    verifier: Arc<V>,
    /// 最大重试次数
    max_retries: i32,
    /// 是否强制要求凭证令牌
    require_token: bool,
}

// 手动实现Clone：分离式启动例程需要持有服务的所有权副本，
// 而派生实现会错误地要求R/E/V本身可克隆
impl<R, E, V> Clone for TaskService<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            executor: self.executor.clone(),
            verifier: self.verifier.clone(),
            max_retries: self.max_retries,
            require_token: self.require_token,
        }
    }
}

impl<R, E, V> TaskService<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    /// 创建新的任务编排服务实例
    ///
    /// # 参数
    ///
    /// * `repo` - 任务仓库
    /// * `executor` - 远程执行器
    /// * `verifier` - 令牌验证器
    /// * `max_retries` - 最大重试次数
    /// * `require_token` - 缺失令牌时是否拒绝请求
    pub fn new(
        repo: Arc<R>,
        executor: Arc<E>,
        verifier: Arc<V>,
        max_retries: i32,
        require_token: bool,
    ) -> Self {
        Self {
            repo,
            executor,
            verifier,
            max_retries,
            require_token,
        }
    }

    /// 创建分析任务
    ///
    /// 校验URL与凭证后，对同一URL的并发请求折叠到同一个在途任务上；
    /// 新任务以Pending状态立即返回，工作器启动在后台异步完成，
    /// 其结果通过状态查询或Webhook对外可见
    ///
    /// # 参数
    ///
    /// * `url` - 待分析的URL
    /// * `request_uuid` - 调用方关联令牌
    /// * `auth_token` - 凭证令牌
    /// * `analysis_id` - 调用方分析关联ID
    ///
    /// # 返回值
    ///
    /// * `Ok(AnalysisTask)` - 已存在的活跃任务，或新建的Pending任务
    /// * `Err(ServiceError)` - 校验、鉴权或存储失败
    pub async fn create_task(
        &self,
        url: &str,
        request_uuid: &str,
        auth_token: Option<&str>,
        analysis_id: &str,
    ) -> Result<AnalysisTask, ServiceError> {
        validators::validate_url(url).map_err(|e| ServiceError::BadRequest(e.to_string()))?;

        match auth_token {
            Some(token) if !token.is_empty() => {
                if let Err(e) = self.verifier.verify(token).await {
                    warn!("Token verification failed: {}", e);
                    return Err(ServiceError::Unauthenticated(e));
                }
            }
            _ => {
                if self.require_token {
                    return Err(ServiceError::Unauthenticated(AuthError::InvalidToken));
                }
            }
        }

        // 同一URL最多存在一个活跃任务
        if let Some(existing) = self.repo.get_active_task_by_url(url).await? {
            info!(
                url = %url,
                task_id = %existing.id,
                status = %existing.status,
                "Returning existing active task for URL"
            );
            return Ok(existing);
        }

        let task = AnalysisTask::new(
            url.to_string(),
            request_uuid.to_string(),
            analysis_id.to_string(),
        );
        let task = self.repo.create(&task).await?;
        counter!("analysis_tasks_created_total").increment(1);

        self.spawn_launch(task.clone());

        Ok(task)
    }

    /// 查询任务状态
    pub async fn get_task_status(&self, id: Uuid) -> Result<AnalysisTask, ServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// 更新任务状态
    ///
    /// 覆盖状态并刷新updated_at；result为空时保留原值。
    /// 不校验状态转换的合法性，调用方（Webhook、启动失败回写）被信任
    ///
    /// # 参数
    ///
    /// * `id` - 任务ID
    /// * `status` - 新状态
    /// * `result` - 分析结果或错误描述，空串表示保留原值
    pub async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: &str,
    ) -> Result<(), ServiceError> {
        let mut task = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        task.status = status;
        if !result.is_empty() {
            task.result = result.to_string();
        }
        task.updated_at = Utc::now().into();

        self.repo.update(&task).await?;
        counter!("analysis_task_status_updates_total").increment(1);
        Ok(())
    }

    /// 重试扫描
    ///
    /// 对每个可重试的失败任务：递增retry_count、重置为Pending并持久化，
    /// 然后异步重新启动。单个任务的持久化失败只记录日志，不中断整轮扫描。
    /// 启动是即发即弃的，一轮扫描可能扇出多个并发启动
    pub async fn retry_failed_tasks(&self) -> Result<(), ServiceError> {
        let tasks = self.repo.get_failed_tasks().await?;
        if tasks.is_empty() {
            return Ok(());
        }

        info!("Retrying {} failed tasks", tasks.len());

        for mut task in tasks {
            task.retry_count += 1;
            task.status = TaskStatus::Pending;
            task.updated_at = Utc::now().into();

            if let Err(e) = self.repo.update(&task).await {
                error!(task_id = %task.id, "Failed to persist retry: {}", e);
                continue;
            }

            counter!("analysis_task_retries_total").increment(1);
            self.spawn_launch(task);
        }

        Ok(())
    }

    /// 运行状态轮询
    ///
    /// 对每个Running任务查询执行平台的真实状态，不一致时回写。
    /// external_id为空说明启动例程尚未完成，跳过；
    /// 查询失败只记录日志，留待下一轮
    pub async fn check_running_tasks(&self) -> Result<(), ServiceError> {
        let tasks = self.repo.get_running_tasks().await?;

        for mut task in tasks {
            if task.external_id.is_empty() {
                continue;
            }

            debug!(task_id = %task.id, external_id = %task.external_id, "Checking task status");

            let status = match self.executor.get_bot_status(&task.external_id).await {
                Ok(status) => status,
                Err(e) => {
                    error!(task_id = %task.id, "Failed to check status: {}", e);
                    continue;
                }
            };

            if status != task.status {
                info!(
                    task_id = %task.id,
                    old_status = %task.status,
                    new_status = %status,
                    "Updating task status"
                );
                task.status = status;
                task.updated_at = Utc::now().into();
                if let Err(e) = self.repo.update(&task).await {
                    error!(task_id = %task.id, "Failed to persist status: {}", e);
                }
            }
        }

        Ok(())
    }

    /// 分离式启动
    ///
    /// 启动例程的生命周期绑定到进程而非请求：客户端断开连接
    /// 不能中止一次已在途的工作器启动，否则任务记录会永远停在
    /// Pending而远端工作器仍在运行
    fn spawn_launch(&self, task: AnalysisTask) {
        let service = self.clone();
        tokio::spawn(async move {
            service.launch(task).await;
        });
    }

    async fn launch(&self, mut task: AnalysisTask) {
        counter!("bot_launches_total").increment(1);

        match self.executor.run_bot(&task).await {
            Ok(external_id) => {
                task.external_id = external_id;
                task.status = TaskStatus::Running;
                task.updated_at = Utc::now().into();
                if let Err(e) = self.repo.update(&task).await {
                    error!(task_id = %task.id, "Failed to record launched bot: {}", e);
                }
            }
            Err(e) => {
                counter!("bot_launch_failures_total").increment(1);
                error!(task_id = %task.id, "Failed to run bot: {}", e);
                if let Err(update_err) = self
                    .update_task_status(task.id, TaskStatus::Failed, &e.to_string())
                    .await
                {
                    error!(task_id = %task.id, "Failed to record launch failure: {}", update_err);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "task_service_test.rs"]
mod tests;
