// ============================================================================
// 领域实体定义
// 与后端 REST 接口的 JSON 结构一一对应（camelCase）
// ⛔ 禁止：包含过滤、分页等派生逻辑
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 可通过 REST 列表/增删改接口访问的资源
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 资源集合路径，如 `/api/products`
    const PATH: &'static str;
    /// 中文资源名，用于错误提示
    const NAME: &'static str;

    fn id(&self) -> Option<i64>;
}

/// 产品与模块共用的启停状态
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 2] = [ProductStatus::Active, ProductStatus::Inactive];

    pub fn code(self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductStatus::Active => "启用",
            ProductStatus::Inactive => "停用",
        }
    }
}

/// 产品
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    /// 创建后不可修改
    pub code: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// 功能模块，按产品组成最多三层的森林
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductModule {
    #[serde(default)]
    pub id: Option<i64>,
    pub product_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub level: u8,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// 版本
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub module_id: Option<i64>,
    /// 创建后不可修改
    pub version_code: String,
    pub name: String,
    pub owner: String,
    /// ISO 8601 日期（YYYY-MM-DD），可能为空
    #[serde(default)]
    pub plan_release_date: Option<String>,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub actual_release_date: Option<String>,
}

/// 需求
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub module_id: Option<i64>,
    /// 创建后不可修改
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub version_id: Option<i64>,
    pub owner: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub estimate_story_points: Option<f64>,
}

/// 研发任务
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub module_id: Option<i64>,
    #[serde(default)]
    pub requirement_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub assignee: String,
    pub status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub estimate_hours: Option<f64>,
}

/// 字典类型（固定枚举）
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DictType {
    RequirementStatus,
    Priority,
    TaskStatus,
    VersionStatus,
}

impl DictType {
    pub const ALL: [DictType; 4] = [
        DictType::RequirementStatus,
        DictType::Priority,
        DictType::TaskStatus,
        DictType::VersionStatus,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DictType::RequirementStatus => "REQUIREMENT_STATUS",
            DictType::Priority => "PRIORITY",
            DictType::TaskStatus => "TASK_STATUS",
            DictType::VersionStatus => "VERSION_STATUS",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DictType::RequirementStatus => "需求状态",
            DictType::Priority => "需求优先级",
            DictType::TaskStatus => "任务状态",
            DictType::VersionStatus => "版本状态",
        }
    }
}

/// 字典项
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DictItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub dict_type: DictType,
    /// 同一类型内唯一
    pub dict_code: String,
    pub dict_label: String,
    /// 同一类型内从 1 开始连续
    #[serde(default)]
    pub sort_order: i32,
    /// 1 = 启用，0 = 停用
    #[serde(default = "default_active")]
    pub is_active: i32,
    #[serde(default)]
    pub remark: Option<String>,
}

fn default_active() -> i32 {
    1
}

impl DictItem {
    pub fn active(&self) -> bool {
        self.is_active == 1
    }
}

/// 导航菜单节点
///
/// 两个固定分组节点（`productGroup`、`system`）持有有序的叶子列表，
/// 其余节点为顶层叶子。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuItem>>,
}

impl MenuItem {
    /// 是否为带子节点的分组
    pub fn is_group(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// 可删除的实体种类
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Product,
    Module,
    Version,
    Requirement,
    Task,
    Dict,
}

impl Resource for Product {
    const PATH: &'static str = "/api/products";
    const NAME: &'static str = "产品";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Resource for ProductModule {
    const PATH: &'static str = "/api/modules";
    const NAME: &'static str = "功能模块";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Resource for Version {
    const PATH: &'static str = "/api/versions";
    const NAME: &'static str = "版本";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Resource for Requirement {
    const PATH: &'static str = "/api/requirements";
    const NAME: &'static str = "需求";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Resource for TaskItem {
    const PATH: &'static str = "/api/tasks";
    const NAME: &'static str = "任务";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Resource for DictItem {
    const PATH: &'static str = "/api/dicts";
    const NAME: &'static str = "字典";

    fn id(&self) -> Option<i64> {
        self.id
    }
}
