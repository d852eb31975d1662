//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use crate::resolver::EligibilityResolver;

/// Axum 应用共享状态
///
/// 判定器本身无可变状态，通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<EligibilityResolver>,
    /// 远程分类服务凭据是否已配置，用于就绪探针
    pub classifier_configured: bool,
}

impl AppState {
    pub fn new(resolver: Arc<EligibilityResolver>, classifier_configured: bool) -> Self {
        Self {
            resolver,
            classifier_configured,
        }
    }
}
