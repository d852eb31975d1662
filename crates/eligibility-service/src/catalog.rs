//! 参考目录
//!
//! 商户类别目录与商品目录均为进程启动时构造一次、只读共享的静态数据，
//! 以 `Arc<ReferenceCatalog>` 注入判定器，测试时可替换为自定义数据。

use serde::{Deserialize, Serialize};

/// 商户类别记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantCategoryRecord {
    pub code: String,
    pub description: String,
    pub eligible: bool,
}

/// 商品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub sku: String,
    pub upc: String,
    pub name: String,
    pub category: String,
    pub eligible: bool,
    pub needs_lmn: bool,
    pub description: String,
}

/// 只读参考目录，记录顺序即匹配优先级
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    merchant_categories: Vec<MerchantCategoryRecord>,
    products: Vec<ProductRecord>,
}

impl ReferenceCatalog {
    pub fn new(
        merchant_categories: Vec<MerchantCategoryRecord>,
        products: Vec<ProductRecord>,
    ) -> Self {
        Self {
            merchant_categories,
            products,
        }
    }

    /// 内置目录数据
    pub fn builtin() -> Self {
        Self::new(builtin_merchant_categories(), builtin_products())
    }

    pub fn merchant_categories(&self) -> &[MerchantCategoryRecord] {
        &self.merchant_categories
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    /// 按 MCC 查找，重复代码时取第一条
    pub fn find_merchant_category(&self, mcc: &str) -> Option<&MerchantCategoryRecord> {
        self.merchant_categories.iter().find(|r| r.code == mcc)
    }

    /// 按目录顺序返回第一条 SKU 或 UPC 相等的商品
    ///
    /// 请求未携带的标识不参与比较。
    pub fn find_product(&self, sku: Option<&str>, upc: Option<&str>) -> Option<&ProductRecord> {
        self.products.iter().find(|p| {
            sku.is_some_and(|sku| p.sku == sku) || upc.is_some_and(|upc| p.upc == upc)
        })
    }
}

fn merchant_category(code: &str, description: &str) -> MerchantCategoryRecord {
    MerchantCategoryRecord {
        code: code.to_string(),
        description: description.to_string(),
        eligible: true,
    }
}

fn builtin_merchant_categories() -> Vec<MerchantCategoryRecord> {
    vec![
        merchant_category("5912", "Drug Stores and Pharmacies"),
        merchant_category("8011", "Doctors and Physicians"),
        merchant_category("8021", "Dentists and Orthodontists"),
        merchant_category("8062", "Hospitals"),
    ]
}

fn builtin_products() -> Vec<ProductRecord> {
    vec![
        ProductRecord {
            id: "product-001".to_string(),
            sku: "1001".to_string(),
            upc: "10011001".to_string(),
            name: "Blood Pressure Monitor".to_string(),
            category: "Medical Devices".to_string(),
            eligible: true,
            needs_lmn: true,
            description: "Mat designed for acupressure therapy to relieve stress and pain."
                .to_string(),
        },
        ProductRecord {
            id: "product-002".to_string(),
            sku: "1002".to_string(),
            upc: "10021002".to_string(),
            name: "First Aid Kit".to_string(),
            category: "Medical Supplies".to_string(),
            eligible: true,
            needs_lmn: false,
            description: "Comprehensive kit for minor injuries and emergencies.".to_string(),
        },
        ProductRecord {
            id: "product-003".to_string(),
            sku: "1003".to_string(),
            upc: "10031003".to_string(),
            name: "Therapeutic Massager".to_string(),
            category: "Wellness".to_string(),
            eligible: true,
            needs_lmn: false,
            description: "Handheld device for muscle relaxation and pain relief.".to_string(),
        },
    ]
}
