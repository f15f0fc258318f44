// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::webhook_request::WebhookRequestDto;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::bot_executor::BotExecutor;
use crate::domain::services::task_service::{ServiceError, TaskService};
use crate::domain::services::token_verifier::TokenVerifier;
use crate::presentation::errors::AppError;
use axum::{extract::Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Webhook处理器
///
/// 受理工作器推送的状态通知。该端点按部署约定被信任，
/// 上报Failed不触发立即重试，由下一轮重试扫描统一处理
pub async fn handle_webhook<R, E, V>(
    Extension(service): Extension<Arc<TaskService<R, E, V>>>,
    Json(request): Json<WebhookRequestDto>,
) -> Result<Json<Value>, AppError>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    let id = Uuid::parse_str(&request.task_id)
        .map_err(|_| ServiceError::BadRequest("Invalid task ID".to_string()))?;

    service
        .update_task_status(id, request.status, &request.result)
        .await?;

    Ok(Json(json!({ "message": "Status updated" })))
}
