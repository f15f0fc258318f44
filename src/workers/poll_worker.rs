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

/// 运行状态轮询工作器
///
/// 定期向执行平台查询Running任务的真实状态并回写；
/// 在没有Webhook的情况下，这是RUNNING到终态转换的权威路径
pub struct PollWorker<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    service: Arc<TaskService<R, E, V>>,
    interval: Duration,
}

impl<R, E, V> PollWorker<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(service: Arc<TaskService<R, E, V>>) -> Self {
        Self {
            service,
            interval: Duration::from_secs(30),
        }
    }

    /// 运行工作器
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Poll worker started");

        let mut ticker = tokio::time::interval(self.interval);
        // 首个tick立即完成，跳过以保持固定周期
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.service.check_running_tasks().await {
                        error!("Failed to check running tasks: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("Poll worker stopping");
                    break;
                }
            }
        }
    }
}
