// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use smishrs::config::settings::Settings;
use smishrs::domain::services::task_service::TaskService;
use smishrs::infrastructure::database::connection;
use smishrs::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use smishrs::infrastructure::services::ecs_executor_impl::EcsExecutorImpl;
use smishrs::infrastructure::services::firebase_verifier_impl::FirebaseVerifierImpl;
use smishrs::presentation::routes;
use smishrs::utils::telemetry;
use smishrs::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载应用程序配置
    let settings = Settings::new()?;

    // 2. 初始化日志和遥测系统
    telemetry::init_telemetry(&settings.logger);
    info!("Starting smishrs...");

    // 初始化 Prometheus 指标收集
    smishrs::infrastructure::metrics::init_metrics();

    let settings = Arc::new(settings);

    // 3. 建立数据库连接
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // 运行数据库迁移
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. 加载AWS配置并创建ECS客户端
    let mut aws_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(settings.aws.region.clone()));
    if let Some(profile) = &settings.aws.profile {
        aws_loader = aws_loader.profile_name(profile);
    }
    let aws_cfg = aws_loader.load().await;
    let ecs_client = aws_sdk_ecs::Client::new(&aws_cfg);
    info!("AWS configuration loaded");

    // 5. 初始化核心组件
    let task_repo = Arc::new(TaskRepositoryImpl::new(
        db.clone(),
        settings.task.max_retries,
    ));
    let executor = Arc::new(EcsExecutorImpl::new(ecs_client, &settings.ecs));
    let verifier = Arc::new(FirebaseVerifierImpl::new(
        settings.firebase.project_id.clone(),
    ));
    let service = Arc::new(TaskService::new(
        task_repo,
        executor,
        verifier,
        settings.task.max_retries,
        settings.firebase.require_token,
    ));

    // 6. 启动后台工作器：失败重试扫描与运行状态轮询
    let mut worker_manager = WorkerManager::new(service.clone());
    worker_manager.start();

    // 7. 配置HTTP路由
    let app = routes::routes::<TaskRepositoryImpl, EcsExecutorImpl, FirebaseVerifierImpl>()
        .layer(Extension(service));

    // 8. 启动HTTP服务器
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 9. 优雅关闭：在途的扫描跑完当前迭代，分离式启动例程不受影响
    worker_manager.shutdown().await;

    Ok(())
}

/// 等待进程关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Unable to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
