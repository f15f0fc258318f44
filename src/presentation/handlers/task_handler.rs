// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::analyze_request::AnalyzeRequestDto;
use crate::domain::models::task::AnalysisTask;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::bot_executor::BotExecutor;
use crate::domain::services::task_service::{ServiceError, TaskService};
use crate::domain::services::token_verifier::TokenVerifier;
use crate::presentation::errors::AppError;
use axum::extract::Path;
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 分析请求处理器
///
/// 受理URL分析请求并返回任务记录；任务启动在后台完成，
/// 调用方拿到的要么是同一URL已在途的任务，要么是新建的Pending任务
pub async fn analyze<R, E, V>(
    Extension(service): Extension<Arc<TaskService<R, E, V>>>,
    Json(request): Json<AnalyzeRequestDto>,
) -> Result<(StatusCode, Json<AnalysisTask>), AppError>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    // 验证请求参数
    if let Err(errors) = request.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "Validation error: {:?}",
            errors
        )));
    }

    let task = service
        .create_task(
            &request.url,
            &request.request_uuid,
            request.auth_token.as_deref(),
            &request.analysis_id,
        )
        .await?;

    Ok((StatusCode::ACCEPTED, Json(task)))
}

/// 任务状态查询处理器
pub async fn get_status<R, E, V>(
    Extension(service): Extension<Arc<TaskService<R, E, V>>>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisTask>, AppError>
where
    R: TaskRepository + 'static,
    E: BotExecutor + 'static,
    V: TokenVerifier + 'static,
{
    let id = Uuid::parse_str(&id)
        .map_err(|_| ServiceError::BadRequest("Invalid task ID".to_string()))?;

    let task = service.get_task_status(id).await?;
    Ok(Json(task))
}
