// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::bot_executor::BotExecutor;
use crate::domain::services::task_service::TaskService;
use crate::domain::services::token_verifier::TokenVerifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// 失败任务重试工作器
///
/// 定期扫描可重试的失败任务并重新启动
pub struct RetryWorker<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    service: Arc<TaskService<R, E, V>>,
    interval: Duration,
}

impl<R, E, V> RetryWorker<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(service: Arc<TaskService<R, E, V>>) -> Self {
        Self {
            service,
            interval: Duration::from_secs(60),
        }
    }

    /// 运行工作器
    ///
    /// 同一工作器的两次扫描不会重叠；收到关闭信号后
    /// 在途的扫描跑完当前迭代，不再开始新的迭代
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Retry worker started");

        let mut ticker = tokio::time::interval(self.interval);
        // 首个tick立即完成，跳过以保持固定周期
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.service.retry_failed_tasks().await {
                        error!("Failed to retry tasks: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("Retry worker stopping");
                    break;
                }
            }
        }
    }
}
