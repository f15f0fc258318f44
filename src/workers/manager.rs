// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::bot_executor::BotExecutor;
use crate::domain::services::task_service::TaskService;
use crate::domain::services::token_verifier::TokenVerifier;
use crate::workers::poll_worker::PollWorker;
use crate::workers::retry_worker::RetryWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 排空等待上限，超时后强制中止
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// 工作管理器
///
/// 启动重试与轮询两个周期性工作器，并在关闭时统一排空。
/// 分离式启动例程不归管理器管辖，关闭时也不会被中止
pub struct WorkerManager<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    service: Arc<TaskService<R, E, V>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl<R, E, V> WorkerManager<R, E, V>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(service: Arc<TaskService<R, E, V>>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            service,
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// 启动工作器
    ///
    /// 两个工作器各自独立循环，彼此之间以及与请求处理器并发执行
    pub fn start(&mut self) {
        let retry_worker = RetryWorker::new(self.service.clone());
        let retry_shutdown = self.shutdown_tx.subscribe();
        self.handles.push(tokio::spawn(async move {
            retry_worker.run(retry_shutdown).await;
        }));

        let poll_worker = PollWorker::new(self.service.clone());
        let poll_shutdown = self.shutdown_tx.subscribe();
        self.handles.push(tokio::spawn(async move {
            poll_worker.run(poll_shutdown).await;
        }));
    }

    /// 关闭工作器
    ///
    /// 发出关闭信号后等待在途迭代完成，超出排空上限则强制中止
    pub async fn shutdown(&mut self) {
        info!("Shutting down workers...");
        let _ = self.shutdown_tx.send(true);

        for mut handle in self.handles.drain(..) {
            if tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                error!("Worker did not stop within drain timeout, aborting");
                handle.abort();
            }
        }

        info!("Workers shut down successfully");
    }
}
