//! HSA/FSA 交易资格判定服务
//!
//! 接收单笔零售交易（MCC、SKU/UPC、描述、金额），判定是否可用 HSA/FSA 报销，
//! 以及是否需要医疗必要性证明（LMN）。
//! 判定按 商户校验 -> 目录精确匹配 -> 远程模型兜底估算 三层依次进行。

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod state;

pub use catalog::{MerchantCategoryRecord, ProductRecord, ReferenceCatalog};
pub use classifier::{AzureOpenAiEstimator, EligibilityEstimator};
pub use error::{ClassifierError, EligibilityError};
pub use models::{EligibilityVerdict, EstimationInput, TransactionRequest};
pub use resolver::EligibilityResolver;
pub use state::AppState;
