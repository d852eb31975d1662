//! HTTP 处理器
//!
//! 请求体按原始字节读取，不要求 Content-Type，缺失或非法 JSON 统一返回 400。

use std::any::Any;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::error::{EligibilityError, MISSING_BODY_MESSAGE};
use crate::models::{EligibilityVerdict, TransactionRequest};
use crate::state::AppState;

const SERVICE_NAME: &str = "eligibility-service";

/// 交易资格分类
///
/// POST /api/txn-hsa-fsa-classification
/// POST /classify
#[instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn classify_transaction(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EligibilityVerdict>, EligibilityError> {
    let request = parse_request(&body)?;
    let verdict = state.resolver.resolve(&request).await?;
    Ok(Json(verdict))
}

/// 解析请求体：空白正文视为缺失
pub fn parse_request(body: &[u8]) -> Result<TransactionRequest, EligibilityError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(EligibilityError::MalformedRequest(
            MISSING_BODY_MESSAGE.to_string(),
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| EligibilityError::MalformedRequest(format!("Invalid request body: {e}")))
}

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针
///
/// 未配置远程分类凭据时目录命中仍可用，但兜底估算必然失败，报告 degraded。
pub async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.resolver.catalog();

    Json(serde_json::json!({
        "status": if state.classifier_configured { "ok" } else { "degraded" },
        "service": SERVICE_NAME,
        "checks": {
            "classifier": if state.classifier_configured { "ok" } else { "unconfigured" },
            "merchantCategories": catalog.merchant_categories().len(),
            "products": catalog.products().len()
        }
    }))
}

/// 处理器 panic 时返回通用 500，panic 细节只进日志
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    EligibilityError::Unexpected(detail).into_response()
}
