//! 资格判定服务错误类型
//!
//! 分两层：
//! - `ClassifierError`: 远程分类服务调用失败（不可用、超时、响应无法解析）
//! - `EligibilityError`: 面向 HTTP 调用方的判定失败，负责映射状态码与响应体
//!
//! 错误的 Display 文本会出现在 API 响应中，因此使用英文。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// 商户类别校验失败时返回给调用方的固定文案
pub const MERCHANT_INELIGIBLE_MESSAGE: &str = "Merchant not eligible for HSA/FSA transactions";
/// 请求体缺失时的固定文案
pub const MISSING_BODY_MESSAGE: &str = "Request body is required";
const ESTIMATION_FAILED_MESSAGE: &str = "Eligibility estimation failed";
const UNEXPECTED_FAULT_MESSAGE: &str = "Failed to determine product eligibility";

/// 远程分类服务错误
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// 网络、鉴权失败或服务端返回非 2xx
    #[error("Classifier service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Classifier call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// 响应正文不是合法 JSON，携带原始内容便于排查
    #[error("Failed to parse classifier response: {content}")]
    MalformedResponse { content: String },
}

impl ClassifierError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable(_) => "REMOTE_UNAVAILABLE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
    }

    /// 指标标签
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable(_) => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::MalformedResponse { .. } => "malformed",
        }
    }
}

/// 资格判定错误
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    /// 请求体缺失或无法解析
    #[error("{0}")]
    MalformedRequest(String),

    /// MCC 不在商户类别目录中（或目录标记为不合格）。
    /// 商户在入驻时已经过审核，这里失败说明数据或入驻流程存在不一致。
    #[error("Merchant not eligible for HSA/FSA transactions (mcc={mcc})")]
    MerchantIneligible { mcc: String },

    /// 兜底估算失败，绝不替换为默认判定结果
    #[error("Eligibility estimation failed: {0}")]
    EstimationFailure(#[from] ClassifierError),

    /// 未预期的故障，细节只记日志不返回给调用方
    #[error("Unexpected fault: {0}")]
    Unexpected(String),
}

impl EligibilityError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::MerchantIneligible { .. } => StatusCode::BAD_REQUEST,
            Self::EstimationFailure(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于日志与指标）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::MerchantIneligible { .. } => "MERCHANT_INELIGIBLE",
            Self::EstimationFailure(_) => "ESTIMATION_FAILURE",
            Self::Unexpected(_) => "UNEXPECTED_FAULT",
        }
    }
}

impl IntoResponse for EligibilityError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::MalformedRequest(message) => json!({ "error": message }),
            Self::MerchantIneligible { mcc } => {
                tracing::warn!(mcc = %mcc, "商户类别未通过 HSA/FSA 校验");
                json!({ "error": MERCHANT_INELIGIBLE_MESSAGE })
            }
            Self::EstimationFailure(cause) => {
                json!({ "error": ESTIMATION_FAILED_MESSAGE, "details": cause.to_string() })
            }
            Self::Unexpected(detail) => {
                tracing::error!(error = %detail, "判定过程出现未预期故障");
                json!({ "error": UNEXPECTED_FAULT_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}
