//! 交易资格判定器
//!
//! 按固定顺序逐层判定，任一层给出结论即短路返回：
//! 1. **商户校验**: 请求带 MCC 时必须命中合格的商户类别，否则直接拒绝
//! 2. **目录匹配**: 按目录顺序取第一条 SKU 或 UPC 相等的商品，置信度 1.0
//! 3. **兜底估算**: 目录未命中时调用远程分类服务，结果原样透传
//!
//! 兜底估算失败时不重试、不替换默认判定：结果最终决定真实的资金交易，
//! 显式失败比静默猜测更安全。

use std::sync::Arc;
use std::time::Instant;

use hsa_shared::observability::metrics;
use tracing::{debug, error, info};

use crate::catalog::ReferenceCatalog;
use crate::classifier::EligibilityEstimator;
use crate::error::EligibilityError;
use crate::models::{EligibilityVerdict, EstimationInput, TransactionRequest};

/// 做出最终结论的判定层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    MerchantGate,
    Catalog,
    Estimator,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MerchantGate => "merchant_gate",
            Self::Catalog => "catalog",
            Self::Estimator => "estimator",
        }
    }
}

/// 交易资格判定器
///
/// 目录与估算器均通过构造函数注入，请求之间不共享可变状态，
/// 可以直接放入 `Arc` 供并发请求复用。
pub struct EligibilityResolver {
    catalog: Arc<ReferenceCatalog>,
    estimator: Arc<dyn EligibilityEstimator>,
}

impl EligibilityResolver {
    pub fn new(catalog: Arc<ReferenceCatalog>, estimator: Arc<dyn EligibilityEstimator>) -> Self {
        Self { catalog, estimator }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// 判定单笔交易
    pub async fn resolve(
        &self,
        request: &TransactionRequest,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        let start = Instant::now();

        info!(
            merchant_name = ?request.merchant_name,
            txn_amount = ?request.txn_amount,
            txn_description = ?request.txn_description,
            mcc = ?request.mcc,
            sku = ?request.sku,
            upc = ?request.upc,
            "收到交易分类请求"
        );

        if let Err(e) = self.check_merchant(request) {
            metrics::record_resolution(
                ResolutionTier::MerchantGate.as_str(),
                "rejected",
                start.elapsed().as_secs_f64(),
            );
            return Err(e);
        }

        if let Some(verdict) = self.match_catalog(request) {
            metrics::record_resolution(
                ResolutionTier::Catalog.as_str(),
                "resolved",
                start.elapsed().as_secs_f64(),
            );
            return Ok(verdict);
        }

        let result = self.estimate(request).await;
        let outcome = if result.is_ok() { "resolved" } else { "failed" };
        metrics::record_resolution(
            ResolutionTier::Estimator.as_str(),
            outcome,
            start.elapsed().as_secs_f64(),
        );

        result
    }

    /// 商户校验；未携带 MCC 视为无法评估，直接放行
    fn check_merchant(&self, request: &TransactionRequest) -> Result<(), EligibilityError> {
        let Some(mcc) = request.assessable_mcc() else {
            debug!("请求未携带 MCC，跳过商户校验");
            return Ok(());
        };

        match self.catalog.find_merchant_category(mcc) {
            Some(record) if record.eligible => {
                debug!(mcc, description = %record.description, "商户类别校验通过");
                Ok(())
            }
            _ => Err(EligibilityError::MerchantIneligible {
                mcc: mcc.to_string(),
            }),
        }
    }

    fn match_catalog(&self, request: &TransactionRequest) -> Option<EligibilityVerdict> {
        let product = self
            .catalog
            .find_product(request.sku.as_deref(), request.upc.as_deref())?;

        info!(
            product_id = %product.id,
            product_name = %product.name,
            category = %product.category,
            eligible = product.eligible,
            needs_lmn = product.needs_lmn,
            "目录命中商品"
        );

        Some(EligibilityVerdict::from_catalog(product))
    }

    async fn estimate(
        &self,
        request: &TransactionRequest,
    ) -> Result<EligibilityVerdict, EligibilityError> {
        let input = EstimationInput::from(request);

        debug!(sku = ?input.sku, upc = ?input.upc, "目录未命中，调用兜底估算");

        match self.estimator.estimate(&input).await {
            Ok(verdict) => {
                info!(
                    eligible = verdict.eligible,
                    needs_lmn = verdict.needs_lmn,
                    confidence_score = verdict.confidence_score,
                    "兜底估算完成"
                );
                Ok(verdict)
            }
            Err(e) => {
                error!(error = %e, code = e.code(), "兜底估算失败");
                Err(EligibilityError::EstimationFailure(e))
            }
        }
    }
}
