//! 路由配置

use axum::{
    Router, middleware,
    routing::{get, post},
};
use hsa_shared::observability::middleware as obs_middleware;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handlers;
use crate::state::AppState;

/// 业务与探针路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/txn-hsa-fsa-classification",
            post(handlers::classify_transaction),
        )
        .route("/classify", post(handlers::classify_transaction))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
}

/// 组装完整应用：panic 兜底、请求追踪与请求 ID
pub fn build_router(state: AppState) -> Router {
    api_routes()
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
