//! 远程分类服务适配器
//!
//! 目录未命中时，调用 Azure OpenAI 部署的推理模型估算交易资格。
//! 远程输出被视为不可信输入：
//! - 正文不是 JSON 对象时整体失败（`MalformedResponse`），不返回默认判定
//! - 是对象但字段缺失或类型错误时，逐字段回退到安全默认值
//!
//! 通过 `EligibilityEstimator` trait 抽象远程调用，便于测试时注入 mock 实现。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hsa_shared::config::ClassifierConfig;
use hsa_shared::observability::metrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ClassifierError;
use crate::models::{EligibilityVerdict, EstimationInput};

/// 错误信息中保留的远程响应正文长度上限
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// 系统指令：领域角色与置信度评分标准
pub const SYSTEM_PROMPT: &str = "You are an expert in HSA/FSA product eligibility that analyzes medical and wellness transactions by reviewing mcc code, upc code, sku numbers, and transaction descriptions to determine step by step if the transaction is eligible for HSA/FSA reimbursement.
When providing a confidenceScore, use the following guidelines:
- 0.9 to 1.0: The product is clearly eligible or ineligible based on well-known HSA/FSA rules or is a common medical/healthcare item.
- 0.7 to 0.89: The product is likely eligible/ineligible, but there is some ambiguity or it is less common.
- 0.4 to 0.69: The product is uncommon or there is significant ambiguity, but some evidence exists for eligibility/ineligibility.
- 0.0 to 0.39: There is little to no evidence for eligibility/ineligibility, or the product is unrelated to HSA/FSA categories.
Always provide a rationale for your decision and confidence score.";

/// 兜底资格估算接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilityEstimator: Send + Sync {
    /// 单次估算，不重试
    async fn estimate(&self, input: &EstimationInput)
    -> Result<EligibilityVerdict, ClassifierError>;
}

/// 用户指令：嵌入交易字段，缺失字段渲染为空字符串
pub fn build_user_prompt(input: &EstimationInput) -> String {
    let field = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();

    format!(
        "A customer is attempting to purchase a product with the following details:\n\
         SKU: {}\n\
         UPC: {}\n\
         Merchant Category Code (MCC): {}\n\
         Transaction Description: {}.\n\
         Is this product likely to be eligible for HSA/FSA reimbursement?\n\
         Respond with a JSON object with keys: eligible (boolean), needsLmn (boolean), \
         confidenceScore (0-1 float), and rationale (string).",
        field(&input.sku),
        field(&input.upc),
        field(&input.mcc),
        field(&input.description),
    )
}

/// 将远程服务返回的正文规范化为判定结果
///
/// 不是 JSON 对象 -> `MalformedResponse`；对象内字段只做类型校验与默认值回退：
/// - `eligible` / `needsLmn`: 仅接受 JSON 布尔值，否则为 false
/// - `confidenceScore`: 仅接受数字并截断到 [0, 1]，否则为 0
/// - `rationale`: 仅接受字符串，否则为空
pub fn normalize_verdict(content: &str) -> Result<EligibilityVerdict, ClassifierError> {
    let malformed = || ClassifierError::MalformedResponse {
        content: content.to_string(),
    };

    let value: Value = serde_json::from_str(content).map_err(|_| malformed())?;
    let Some(fields) = value.as_object() else {
        return Err(malformed());
    };

    let flag = |key: &str| fields.get(key).and_then(Value::as_bool).unwrap_or(false);

    Ok(EligibilityVerdict {
        eligible: flag("eligible"),
        needs_lmn: flag("needsLmn"),
        confidence_score: fields
            .get("confidenceScore")
            .and_then(Value::as_f64)
            .map(|score| score.clamp(0.0, 1.0))
            .unwrap_or(0.0),
        rationale: fields
            .get("rationale")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

// ---------------------------------------------------------------------------
// chat completions 协议
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Azure OpenAI 实现
// ---------------------------------------------------------------------------

/// 基于 Azure OpenAI chat completions 的估算器
///
/// reqwest::Client 内部带连接池，clone 是廉价操作。
pub struct AzureOpenAiEstimator {
    client: reqwest::Client,
    completions_url: String,
    deployment: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl AzureOpenAiEstimator {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            ClassifierError::RemoteUnavailable(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self::with_client(config, client))
    }

    /// 使用外部构造的 HTTP 客户端（代理、TLS 等由调用方决定）
    pub fn with_client(config: &ClassifierConfig, client: reqwest::Client) -> Self {
        let completions_url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version
        );

        info!(
            completions_url = %completions_url,
            timeout_seconds = config.timeout_seconds,
            credentials = config.has_credentials(),
            "远程分类客户端已初始化"
        );

        Self {
            client,
            completions_url,
            deployment: config.deployment.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ClassifierError {
        if err.is_timeout() {
            ClassifierError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            ClassifierError::RemoteUnavailable(err.to_string())
        }
    }

    async fn request_completion(
        &self,
        input: &EstimationInput,
    ) -> Result<EligibilityVerdict, ClassifierError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ClassifierError::RemoteUnavailable(
                "classifier api key is not configured".to_string(),
            ));
        };

        let user_prompt = build_user_prompt(input);
        let body = ChatCompletionRequest {
            model: &self.deployment,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.completions_url)
            .header("api-key", api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            return Err(ClassifierError::RemoteUnavailable(format!(
                "HTTP {status}: {preview}"
            )));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|_| ClassifierError::MalformedResponse {
                content: text.clone(),
            })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        debug!(content = %content, "远程分类服务原始输出");

        normalize_verdict(&content)
    }
}

#[async_trait]
impl EligibilityEstimator for AzureOpenAiEstimator {
    async fn estimate(
        &self,
        input: &EstimationInput,
    ) -> Result<EligibilityVerdict, ClassifierError> {
        let start = Instant::now();
        let result = self.request_completion(input).await;
        let elapsed = start.elapsed().as_secs_f64();

        // 失败由判定器统一记录日志，这里只记指标
        match &result {
            Ok(verdict) => {
                metrics::record_classifier_call("ok", elapsed);
                debug!(rationale = %verdict.rationale, elapsed_secs = elapsed, "远程分类估算完成");
            }
            Err(e) => metrics::record_classifier_call(e.outcome(), elapsed),
        }

        result
    }
}
