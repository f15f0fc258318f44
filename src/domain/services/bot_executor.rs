// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{AnalysisTask, TaskStatus};
use async_trait::async_trait;
use thiserror::Error;

/// 执行器错误类型
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// 执行平台错误
    #[error("Executor platform error: {0}")]
    Platform(String),
    /// 远程任务未找到
    #[error("External task not found")]
    NotFound,
}

/// 远程执行器接口
///
/// 负责在容器编排平台上启动分析工作器并查询其运行状态
#[async_trait]
pub trait BotExecutor: Send + Sync {
    /// 启动一个分析工作器
    ///
    /// 调用在平台受理后即返回，工作器此时已被调度但尚未结束
    ///
    /// # 参数
    ///
    /// * `task` - 携带URL与关联令牌的分析任务
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 平台下发的外部句柄（如任务ARN）
    /// * `Err(ExecutorError)` - 启动失败
    async fn run_bot(&self, task: &AnalysisTask) -> Result<String, ExecutorError>;

    /// 查询工作器运行状态
    ///
    /// 将平台的容器生命周期映射为内部任务状态
    async fn get_bot_status(&self, external_id: &str) -> Result<TaskStatus, ExecutorError>;
}
