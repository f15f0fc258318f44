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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、数据库、AWS/ECS、任务编排与日志等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// AWS配置
    pub aws: AwsSettings,
    /// ECS配置
    pub ecs: EcsSettings,
    /// 任务编排配置
    pub task: TaskSettings,
    /// Firebase配置
    pub firebase: FirebaseSettings,
    /// 日志配置
    pub logger: LoggerSettings,
    /// 应用配置
    pub app: AppSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库驱动 (postgres, mysql)
    pub driver: String,
    /// 数据库主机
    pub host: String,
    /// 数据库端口
    pub port: u16,
    /// 数据库用户
    pub user: String,
    /// 数据库密码
    pub password: String,
    /// 数据库名称
    pub name: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// AWS配置设置
#[derive(Debug, Deserialize)]
pub struct AwsSettings {
    /// AWS区域
    pub region: String,
    /// 共享配置Profile（可选）
    pub profile: Option<String>,
}

/// ECS配置设置
#[derive(Debug, Deserialize)]
pub struct EcsSettings {
    /// 集群名称
    pub cluster: String,
    /// 任务定义
    pub task_def: String,
    /// 容器名称
    pub container_name: String,
    /// 子网列表
    pub subnets: Vec<String>,
    /// 安全组ID
    pub sec_group: String,
    /// STOPPED且无退出码时是否视为完成
    pub stopped_no_exit_completed: bool,
}

/// 任务编排配置设置
#[derive(Debug, Deserialize)]
pub struct TaskSettings {
    /// 最大重试次数
    pub max_retries: i32,
}

/// Firebase配置设置
#[derive(Debug, Deserialize)]
pub struct FirebaseSettings {
    /// Firebase项目ID
    pub project_id: String,
    /// 缺失令牌时是否拒绝请求
    pub require_token: bool,
}

/// 日志配置设置
#[derive(Debug, Deserialize)]
pub struct LoggerSettings {
    /// 日志级别
    pub level: String,
    /// 日志格式 (json, pretty)
    pub format: String,
}

/// 应用配置设置
#[derive(Debug, Deserialize)]
pub struct AppSettings {
    /// 运行环境
    pub env: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Default DB settings
            .set_default("database.driver", "postgres")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "")?
            .set_default("database.name", "smishrs")?
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default AWS settings
            .set_default("aws.region", "ap-northeast-2")?
            // Default ECS settings
            .set_default("ecs.cluster", "")?
            .set_default("ecs.task_def", "")?
            .set_default("ecs.container_name", "")?
            .set_default("ecs.subnets", Vec::<String>::new())?
            .set_default("ecs.sec_group", "")?
            .set_default("ecs.stopped_no_exit_completed", true)?
            // Default task orchestration settings
            .set_default("task.max_retries", 3)?
            // Default Firebase settings
            .set_default("firebase.project_id", "")?
            .set_default("firebase.require_token", true)?
            // Default logger settings
            .set_default("logger.level", "info")?
            .set_default("logger.format", "json")?
            .set_default("app.env", "dev")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SMISHRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
