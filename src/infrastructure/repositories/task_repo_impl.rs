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
use crate::infrastructure::database::entities::analysis_task as task_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 任务仓库实现
///
/// 基于SeaORM实现的分析任务数据访问层。
/// 重试上限在构造时注入，固化到失败任务与活跃任务两类查询中
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
    /// 最大重试次数
    max_retries: i32,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `max_retries` - 最大重试次数
    pub fn new(db: Arc<DatabaseConnection>, max_retries: i32) -> Self {
        Self { db, max_retries }
    }
}

impl From<task_entity::Model> for AnalysisTask {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            request_uuid: model.request_uuid,
            external_id: model.external_id,
            analysis_id: model.analysis_id,
            url: model.url,
            status: model.status.parse().unwrap_or_default(),
            retry_count: model.retry_count,
            result: model.result,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&AnalysisTask> for task_entity::ActiveModel {
    fn from(task: &AnalysisTask) -> Self {
        Self {
            id: Set(task.id),
            request_uuid: Set(task.request_uuid.clone()),
            external_id: Set(task.external_id.clone()),
            analysis_id: Set(task.analysis_id.clone()),
            url: Set(task.url.clone()),
            status: Set(task.status.to_string()),
            retry_count: Set(task.retry_count),
            result: Set(task.result.clone()),
            created_at: Set(task.created_at),
            updated_at: Set(task.updated_at),
        }
    }
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn create(&self, task: &AnalysisTask) -> Result<AnalysisTask, RepositoryError> {
        let model: task_entity::ActiveModel = task.into();

        model.insert(self.db.as_ref()).await?;
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisTask>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(&self, task: &AnalysisTask) -> Result<AnalysisTask, RepositoryError> {
        let model: task_entity::ActiveModel = task.into();

        let updated_model = model.update(self.db.as_ref()).await?;
        Ok(updated_model.into())
    }

    async fn get_pending_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Pending.to_string()))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_running_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_failed_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Failed.to_string()))
            .filter(task_entity::Column::RetryCount.lt(self.max_retries))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_active_task_by_url(
        &self,
        url: &str,
    ) -> Result<Option<AnalysisTask>, RepositoryError> {
        // 活跃谓词：Pending、Running，或retry_count未达上限的Failed
        let model = task_entity::Entity::find()
            .filter(task_entity::Column::Url.eq(url))
            .filter(
                Condition::any()
                    .add(
                        task_entity::Column::Status.is_in([
                            TaskStatus::Pending.to_string(),
                            TaskStatus::Running.to_string(),
                        ]),
                    )
                    .add(
                        Condition::all()
                            .add(task_entity::Column::Status.eq(TaskStatus::Failed.to_string()))
                            .add(task_entity::Column::RetryCount.lt(self.max_retries)),
                    ),
            )
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}
