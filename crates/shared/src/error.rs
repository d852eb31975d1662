//! 统一错误处理模块
//!
//! 定义服务间共享的基础设施错误，业务错误由各服务自行定义。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum HsaError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("配置加载失败: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

impl HsaError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ConfigLoad(_) => "CONFIG_LOAD_ERROR",
        }
    }
}
