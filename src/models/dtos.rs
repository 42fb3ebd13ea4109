// ============================================================================
// 数据传输对象（DTO）定义
// 请求体、查询参数、下拉选项、分页结果
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::domain::{DictItem, DictType, ProductStatus};

/// 下拉选项（value 为编码或 ID 字符串，label 为展示文本）
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// 分页结果
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// 当前页的数据切片
    pub items: Vec<T>,
    /// 过滤后的总条数
    pub total: usize,
    /// 总页数，最小为 1
    pub total_pages: usize,
    /// 钳制到 [1, total_pages] 后的页码
    pub page: usize,
}

/// 列表查询参数（`?productId=&moduleId=`）
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
}

impl ListQuery {
    /// 转为查询参数键值对，未设置的字段不出现
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(product_id) = self.product_id {
            pairs.push(("productId", product_id.to_string()));
        }
        if let Some(module_id) = self.module_id {
            pairs.push(("moduleId", module_id.to_string()));
        }
        pairs
    }
}

/// 产品创建/更新请求体；更新时不携带 code
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub owner: String,
    pub status: ProductStatus,
    pub description: String,
}

/// 模块创建/更新请求体
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModulePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    pub description: String,
}

/// 版本创建/更新请求体；创建时不携带 status（后端默认 PLANNED），更新时不携带 versionCode
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionPayload {
    pub product_id: i64,
    pub module_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_code: Option<String>,
    pub name: String,
    pub owner: String,
    pub plan_release_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub description: String,
}

/// 需求创建/更新请求体
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementPayload {
    pub product_id: i64,
    pub module_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub version_id: i64,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// 任务创建/更新请求体
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub product_id: i64,
    pub module_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub assignee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// 字典项创建/更新请求体
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DictPayload {
    pub dict_type: DictType,
    pub dict_code: String,
    pub dict_label: String,
    pub sort_order: i32,
    pub is_active: i32,
    pub remark: String,
}

impl From<&DictItem> for DictPayload {
    fn from(item: &DictItem) -> Self {
        Self {
            dict_type: item.dict_type,
            dict_code: item.dict_code.clone(),
            dict_label: item.dict_label.clone(),
            sort_order: item.sort_order,
            is_active: item.is_active,
            remark: item.remark.clone().unwrap_or_default(),
        }
    }
}
