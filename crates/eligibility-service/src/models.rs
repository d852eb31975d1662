//! 请求与判定结果模型
//!
//! 字段命名与对外 JSON 契约保持一致（camelCase）。

use serde::{Deserialize, Serialize};

use crate::catalog::ProductRecord;

/// 目录精确匹配时的固定说明
pub const CATALOG_MATCH_RATIONALE: &str = "Matched in mock inventory list.";

/// 交易分类请求
///
/// 传输层所有字段均可缺省；缺少 sku/upc 时只能走兜底估算。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub txn_amount: Option<f64>,
    #[serde(default)]
    pub txn_description: Option<String>,
    #[serde(default)]
    pub mcc: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
}

impl TransactionRequest {
    /// 需要校验的 MCC；空字符串视为未提供
    pub fn assessable_mcc(&self) -> Option<&str> {
        self.mcc.as_deref().filter(|mcc| !mcc.is_empty())
    }
}

/// 资格判定结果，无论由哪一层给出形状都相同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityVerdict {
    pub eligible: bool,
    pub needs_lmn: bool,
    /// 取值 [0, 1]；目录命中恒为 1.0，兜底估算时为远程服务自评
    pub confidence_score: f64,
    pub rationale: String,
}

impl EligibilityVerdict {
    /// 目录命中：原样复制商品记录的资格标记，置信度为 1.0
    pub fn from_catalog(product: &ProductRecord) -> Self {
        Self {
            eligible: product.eligible,
            needs_lmn: product.needs_lmn,
            confidence_score: 1.0,
            rationale: CATALOG_MATCH_RATIONALE.to_string(),
        }
    }
}

/// 兜底估算的输入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstimationInput {
    pub sku: Option<String>,
    pub upc: Option<String>,
    pub mcc: Option<String>,
    pub description: Option<String>,
}

impl From<&TransactionRequest> for EstimationInput {
    fn from(request: &TransactionRequest) -> Self {
        Self {
            sku: request.sku.clone(),
            upc: request.upc.clone(),
            mcc: request.mcc.clone(),
            description: request.txn_description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: TransactionRequest = serde_json::from_str(
            r#"{"merchantName":"Wellness Pharmacy","txnAmount":49.99,
                "txnDescription":"Blood Pressure Monitor","mcc":"5912",
                "sku":"1001","upc":"10011001"}"#,
        )
        .unwrap();

        assert_eq!(request.merchant_name.as_deref(), Some("Wellness Pharmacy"));
        assert_eq!(request.txn_amount, Some(49.99));
        assert_eq!(request.mcc.as_deref(), Some("5912"));
        assert_eq!(request.upc.as_deref(), Some("10011001"));
    }

    #[test]
    fn test_request_all_fields_optional() {
        let request: TransactionRequest = serde_json::from_str(r#"{"sku":null}"#).unwrap();
        assert_eq!(request, TransactionRequest::default());
    }

    #[test]
    fn test_empty_mcc_is_not_assessable() {
        let mut request = TransactionRequest {
            mcc: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(request.assessable_mcc(), None);

        request.mcc = Some("8011".into());
        assert_eq!(request.assessable_mcc(), Some("8011"));
    }

    #[test]
    fn test_verdict_serializes_contract_fields() {
        let verdict = EligibilityVerdict {
            eligible: true,
            needs_lmn: false,
            confidence_score: 0.85,
            rationale: "Common first aid item".into(),
        };

        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "eligible": true,
                "needsLmn": false,
                "confidenceScore": 0.85,
                "rationale": "Common first aid item"
            })
        );
    }
}
