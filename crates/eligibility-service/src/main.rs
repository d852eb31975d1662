//! HSA/FSA 交易资格判定服务
//!
//! 提供交易分类 REST API。

use std::sync::Arc;

use eligibility_service::{
    AppState, AzureOpenAiEstimator, EligibilityResolver, ReferenceCatalog, routes,
};
use hsa_shared::{config::AppConfig, error::HsaError, observability};
use tokio::net::TcpListener;
use tracing::{info, warn};

const SERVICE_NAME: &str = "eligibility-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本地开发可通过 .env 注入凭据，文件不存在时忽略
    dotenvy::dotenv().ok();

    let config = AppConfig::load(SERVICE_NAME).map_err(HsaError::from)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    let classifier_configured = config.classifier.has_credentials();
    if !classifier_configured {
        if config.is_production() {
            return Err(HsaError::Configuration(
                "classifier.api_key must be set in production (HSA_CLASSIFIER__API_KEY)".into(),
            )
            .into());
        }
        warn!("未配置远程分类凭据，目录未命中的交易将返回估算失败");
    }

    let estimator = Arc::new(AzureOpenAiEstimator::new(&config.classifier)?);
    let catalog = Arc::new(ReferenceCatalog::builtin());
    info!(
        merchant_categories = catalog.merchant_categories().len(),
        products = catalog.products().len(),
        "参考目录已加载"
    );

    let resolver = Arc::new(EligibilityResolver::new(catalog, estimator));
    let app = routes::build_router(AppState::new(resolver, classifier_configured));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
