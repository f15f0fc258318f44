// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::AnalysisTask;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 任务仓库特质
///
/// 定义分析任务数据访问接口
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, task: &AnalysisTask) -> Result<AnalysisTask, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisTask>, RepositoryError>;
    /// 全量更新任务记录，以ID为键；created_at保持不变
    async fn update(&self, task: &AnalysisTask) -> Result<AnalysisTask, RepositoryError>;
    /// 获取所有Pending状态的任务
    async fn get_pending_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError>;
    /// 获取所有Running状态的任务
    async fn get_running_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError>;
    /// 获取可重试的失败任务（retry_count未达上限）
    async fn get_failed_tasks(&self) -> Result<Vec<AnalysisTask>, RepositoryError>;
    /// 根据URL查找活跃任务，不存在时返回None
    async fn get_active_task_by_url(
        &self,
        url: &str,
    ) -> Result<Option<AnalysisTask>, RepositoryError>;
}
