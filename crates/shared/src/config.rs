//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use std::fmt;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::observability::ObservabilityConfig;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 远程分类服务（Azure OpenAI chat completions）配置
///
/// 凭据只能通过配置源注入（配置文件或 `HSA_CLASSIFIER__API_KEY` 环境变量），
/// 代码中不存在任何默认密钥。
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 资源端点，如 `https://my-resource.openai.azure.com/`
    pub endpoint: String,
    /// 部署名称
    pub deployment: String,
    pub api_version: String,
    pub api_key: Option<String>,
    /// 单次远程调用的超时上限，必须大于 0
    pub timeout_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8090".to_string(),
            deployment: "o4-mini".to_string(),
            api_version: "2024-12-01-preview".to_string(),
            api_key: None,
            timeout_seconds: 30,
        }
    }
}

impl ClassifierConfig {
    /// 是否已配置凭据
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// 密钥不能出现在日志里
impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub classifier: ClassifierConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（HSA_ 前缀，双下划线分隔层级，如 HSA_CLASSIFIER__API_KEY -> classifier.api_key）
    /// 5. 服务特定端口环境变量（如 ELIGIBILITY_SERVICE_PORT）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("HSA_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            // 单下划线会与 api_key 之类的字段名冲突，层级分隔使用双下划线
            .add_source(
                Environment::with_prefix("HSA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if let Some(port) = Self::get_service_port_from_env(service_name) {
            config.server.port = port;
        }

        config.validate()?;

        Ok(config)
    }

    /// 校验加载后的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "classifier.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 从环境变量获取服务特定端口
    ///
    /// 将 "eligibility-service" 转换为 "ELIGIBILITY_SERVICE_PORT"
    fn get_service_port_from_env(service_name: &str) -> Option<u16> {
        let env_var_name = Self::service_port_env_var(service_name);
        std::env::var(&env_var_name)
            .ok()
            .and_then(|v| v.parse().ok())
    }

    fn service_port_env_var(service_name: &str) -> String {
        format!("{}_PORT", service_name.to_uppercase().replace('-', "_"))
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
