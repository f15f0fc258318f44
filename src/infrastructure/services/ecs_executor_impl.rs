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

use crate::config::settings::EcsSettings;
use crate::domain::models::task::{AnalysisTask, TaskStatus};
use crate::domain::services::bot_executor::{BotExecutor, ExecutorError};
use async_trait::async_trait;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{
    AssignPublicIp, AwsVpcConfiguration, ContainerOverride, KeyValuePair, LaunchType,
    NetworkConfiguration, TaskOverride,
};
use aws_sdk_ecs::Client;

/// ECS执行器实现
///
/// 在Fargate上以一次性任务的形式启动分析工作器，
/// 并将ECS的容器生命周期映射为内部任务状态
pub struct EcsExecutorImpl {
    /// ECS客户端
    client: Client,
    /// 集群名称
    cluster: String,
    /// 任务定义
    task_def: String,
    /// 容器名称
    container_name: String,
    /// 子网列表
    subnets: Vec<String>,
    /// 安全组ID
    sec_group: String,
    /// STOPPED且无退出码时是否视为完成
    stopped_no_exit_completed: bool,
}

impl EcsExecutorImpl {
    /// 创建新的ECS执行器实例
    ///
    /// # 参数
    ///
    /// * `client` - ECS客户端
    /// * `settings` - ECS配置
    pub fn new(client: Client, settings: &EcsSettings) -> Self {
        Self {
            client,
            cluster: settings.cluster.clone(),
            task_def: settings.task_def.clone(),
            container_name: settings.container_name.clone(),
            subnets: settings.subnets.clone(),
            sec_group: settings.sec_group.clone(),
            stopped_no_exit_completed: settings.stopped_no_exit_completed,
        }
    }
}

/// 将ECS生命周期阶段映射为内部任务状态
///
/// 供给/启动中的阶段映射为Running：轮询循环只扫描Running任务，
/// 已启动但仍在供给中的任务不能掉出对账集合。
/// STOPPED时检查容器退出码；无退出码的情况由配置开关决定
///
/// # 参数
///
/// * `last_status` - ECS上报的生命周期阶段
/// * `exit_codes` - 各容器的退出码
/// * `stopped_no_exit_completed` - 无退出码的STOPPED是否视为完成
pub fn map_platform_status(
    last_status: &str,
    exit_codes: &[Option<i32>],
    stopped_no_exit_completed: bool,
) -> TaskStatus {
    match last_status {
        "PROVISIONING" | "PENDING" | "ACTIVATING" => TaskStatus::Running,
        "RUNNING" => TaskStatus::Running,
        "DEACTIVATING" | "STOPPING" | "DEPROVISIONING" => TaskStatus::Running,
        "STOPPED" => {
            if exit_codes
                .iter()
                .any(|code| matches!(code, Some(c) if *c != 0))
            {
                return TaskStatus::Failed;
            }

            let exit_code_missing =
                exit_codes.is_empty() || exit_codes.iter().any(|code| code.is_none());
            if exit_code_missing && !stopped_no_exit_completed {
                TaskStatus::Failed
            } else {
                TaskStatus::Completed
            }
        }
        _ => TaskStatus::Pending,
    }
}

#[async_trait]
impl BotExecutor for EcsExecutorImpl {
    async fn run_bot(&self, task: &AnalysisTask) -> Result<String, ExecutorError> {
        // URL与关联令牌以环境变量的形式传给工作器容器
        let overrides = TaskOverride::builder()
            .container_overrides(
                ContainerOverride::builder()
                    .name(&self.container_name)
                    .environment(
                        KeyValuePair::builder()
                            .name("TARGET_URL")
                            .value(&task.url)
                            .build(),
                    )
                    .environment(
                        KeyValuePair::builder()
                            .name("REQUEST_UUID")
                            .value(&task.request_uuid)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let vpc_config = AwsVpcConfiguration::builder()
            .set_subnets(Some(self.subnets.clone()))
            .security_groups(&self.sec_group)
            .assign_public_ip(AssignPublicIp::Enabled)
            .build()
            .map_err(|e| ExecutorError::Platform(e.to_string()))?;

        let out = self
            .client
            .run_task()
            .cluster(&self.cluster)
            .task_definition(&self.task_def)
            .launch_type(LaunchType::Fargate)
            .network_configuration(
                NetworkConfiguration::builder()
                    .awsvpc_configuration(vpc_config)
                    .build(),
            )
            .overrides(overrides)
            .send()
            .await
            .map_err(|e| ExecutorError::Platform(DisplayErrorContext(&e).to_string()))?;

        let arn = out
            .tasks()
            .first()
            .and_then(|t| t.task_arn())
            .ok_or_else(|| ExecutorError::Platform("no tasks started".to_string()))?;

        Ok(arn.to_string())
    }

    async fn get_bot_status(&self, external_id: &str) -> Result<TaskStatus, ExecutorError> {
        let out = self
            .client
            .describe_tasks()
            .cluster(&self.cluster)
            .tasks(external_id)
            .send()
            .await
            .map_err(|e| ExecutorError::Platform(DisplayErrorContext(&e).to_string()))?;

        let task = out.tasks().first().ok_or(ExecutorError::NotFound)?;

        let last_status = task.last_status().unwrap_or_default();
        let exit_codes: Vec<Option<i32>> =
            task.containers().iter().map(|c| c.exit_code()).collect();

        Ok(map_platform_status(
            last_status,
            &exit_codes,
            self.stopped_no_exit_completed,
        ))
    }
}
