// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::bot_executor::BotExecutor;
use crate::domain::services::token_verifier::TokenVerifier;
use crate::presentation::handlers::{task_handler, webhook_handler};
use axum::{
    routing::{get, post},
    Router,
};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes<R, E, V>() -> Router
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/analyze", post(task_handler::analyze::<R, E, V>))
        .route("/status/{id}", get(task_handler::get_status::<R, E, V>))
        .route("/webhook", post(webhook_handler::handle_webhook::<R, E, V>));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
