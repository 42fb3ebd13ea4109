// ============================================================================
// 新建/编辑表单草稿
// 校验在任何网络请求之前同步执行，遇到第一个错误即返回
// ✅ 只能做：表单字段、校验、构造请求体
// ⛔ 禁止：发起网络请求、修改实体集合
// ============================================================================

use serde::{Deserialize, Serialize};
use time::macros::format_description;

use crate::models::domain::{
    DictItem, DictType, Product, ProductModule, ProductStatus, Requirement, TaskItem, Version,
};
use crate::models::dtos::{
    DictPayload, ModulePayload, ProductPayload, RequirementPayload, SelectOption, TaskPayload,
    VersionPayload,
};
use crate::services::dict_resolver::DictResolver;
use crate::services::filter::{Filter, RequirementCriteria, TaskCriteria, VersionCriteria};
use crate::services::stats::version_label;
use crate::utils::error::{AppError, AppResult};

/// 表单模式：新建，或编辑某条记录
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// 已打开的弹窗：表单模式与当前草稿
#[derive(Clone, Debug, PartialEq)]
pub struct OpenForm<F> {
    pub mode: FormMode,
    pub form: F,
}

fn require_text(value: &str, message: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

fn require_id(value: Option<i64>, message: &str) -> AppResult<i64> {
    match value {
        Some(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation(message)),
    }
}

/// 日期字段非空时必须是 YYYY-MM-DD
pub fn validate_date(value: &str) -> AppResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let format = format_description!("[year]-[month]-[day]");
    time::Date::parse(value, &format)
        .map(|_| ())
        .map_err(|_| AppError::validation("日期格式应为 YYYY-MM-DD"))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// 用启用编码校正字段，返回是否有改动
fn sync_code(dicts: &DictResolver, dict_type: DictType, field: &mut String) -> bool {
    let next = dicts.ensure_active_value(dict_type, field);
    if &next == field {
        return false;
    }
    *field = next;
    true
}

// ============================================================================
// 产品
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub code: String,
    pub name: String,
    pub owner: String,
    pub status: ProductStatus,
    pub description: String,
}

impl ProductForm {
    pub fn from_entity(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            owner: product.owner.clone(),
            status: product.status,
            description: product.description.clone().unwrap_or_default(),
        }
    }

    pub fn create_payload(&self) -> AppResult<ProductPayload> {
        require_text(&self.code, "请输入产品编码")?;
        require_text(&self.name, "请输入产品名称")?;
        require_text(&self.owner, "请输入负责人")?;
        Ok(ProductPayload {
            code: Some(self.code.clone()),
            ..self.update_payload()
        })
    }

    /// 编码创建后不可修改，更新时不携带
    pub fn update_payload(&self) -> ProductPayload {
        ProductPayload {
            code: None,
            name: self.name.clone(),
            owner: self.owner.clone(),
            status: self.status,
            description: self.description.clone(),
        }
    }
}

// ============================================================================
// 功能模块
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleForm {
    pub product_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub level: u8,
    pub code: String,
    pub name: String,
    pub owner: String,
    pub status: ProductStatus,
    pub description: String,
}

impl Default for ModuleForm {
    fn default() -> Self {
        Self {
            product_id: None,
            parent_id: None,
            level: 1,
            code: String::new(),
            name: String::new(),
            owner: String::new(),
            status: ProductStatus::Active,
            description: String::new(),
        }
    }
}

impl ModuleForm {
    /// 新建时带入模块页当前选中的产品
    pub fn prefill(product_id: Option<i64>) -> Self {
        Self {
            product_id,
            ..Self::default()
        }
    }

    pub fn from_entity(module: &ProductModule) -> Self {
        Self {
            product_id: Some(module.product_id),
            parent_id: module.parent_id,
            level: module.level,
            code: module.code.clone(),
            name: module.name.clone(),
            owner: module.owner.clone().unwrap_or_default(),
            status: module.status,
            description: module.description.clone().unwrap_or_default(),
        }
    }

    /// 切换层级后上级模块需重新选择
    pub fn set_level(&mut self, level: u8) {
        if self.level != level {
            self.level = level;
            self.parent_id = None;
        }
    }

    /// 层级规则（父级存在、同产品、低一级）由调用方结合模块树校验
    pub fn create_payload(&self) -> AppResult<ModulePayload> {
        let product_id = require_id(self.product_id, "请选择所属产品")?;
        if self.level > 1 && self.parent_id.is_none() {
            return Err(AppError::validation("请选择上级模块"));
        }
        require_text(&self.code, "请输入模块编码")?;
        require_text(&self.name, "请输入模块名称")?;
        Ok(ModulePayload {
            product_id: Some(product_id),
            parent_id: self.parent_id,
            level: Some(self.level),
            code: self.code.clone(),
            name: self.name.clone(),
            owner: non_empty(&self.owner),
            status: Some(self.status),
            description: self.description.clone(),
        })
    }

    pub fn update_payload(&self) -> ModulePayload {
        ModulePayload {
            product_id: self.product_id,
            parent_id: self.parent_id,
            level: Some(self.level),
            code: self.code.clone(),
            name: self.name.clone(),
            owner: non_empty(&self.owner),
            status: Some(self.status),
            description: self.description.clone(),
        }
    }
}

// ============================================================================
// 版本
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionForm {
    pub product_id: Option<i64>,
    pub module_id: Option<i64>,
    pub version_code: String,
    pub name: String,
    pub owner: String,
    pub plan_release_date: String,
    pub status: String,
    pub description: String,
}

impl Default for VersionForm {
    fn default() -> Self {
        Self {
            product_id: None,
            module_id: None,
            version_code: String::new(),
            name: String::new(),
            owner: String::new(),
            plan_release_date: String::new(),
            status: "PLANNED".to_string(),
            description: String::new(),
        }
    }
}

impl VersionForm {
    /// 新建时带入版本页草稿筛选中的产品与模块
    pub fn prefill(draft: &VersionCriteria) -> Self {
        Self {
            product_id: draft.product.specific().copied(),
            module_id: draft.module.specific().copied(),
            ..Self::default()
        }
    }

    pub fn from_entity(version: &Version) -> Self {
        Self {
            product_id: version.product_id,
            module_id: version.module_id,
            version_code: version.version_code.clone(),
            name: version.name.clone(),
            owner: version.owner.clone(),
            plan_release_date: version.plan_release_date.clone().unwrap_or_default(),
            status: version.status.clone(),
            description: version.description.clone().unwrap_or_default(),
        }
    }

    fn base_payload(&self) -> AppResult<VersionPayload> {
        let product_id = require_id(self.product_id, "请选择所属产品")?;
        let module_id = require_id(self.module_id, "请选择功能模块")?;
        validate_date(&self.plan_release_date)?;
        Ok(VersionPayload {
            product_id,
            module_id,
            version_code: None,
            name: self.name.clone(),
            owner: self.owner.clone(),
            plan_release_date: self.plan_release_date.clone(),
            status: None,
            description: self.description.clone(),
        })
    }

    /// 新建不携带状态，由后端默认为 PLANNED
    pub fn create_payload(&self) -> AppResult<VersionPayload> {
        Ok(VersionPayload {
            version_code: Some(self.version_code.clone()),
            ..self.base_payload()?
        })
    }

    pub fn update_payload(&self) -> AppResult<VersionPayload> {
        Ok(VersionPayload {
            status: Some(self.status.clone()),
            ..self.base_payload()?
        })
    }

    pub fn sync_dicts(&mut self, dicts: &DictResolver) -> bool {
        sync_code(dicts, DictType::VersionStatus, &mut self.status)
    }
}

// ============================================================================
// 需求
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementForm {
    pub product_id: Option<i64>,
    pub module_id: Option<i64>,
    pub code: String,
    pub name: String,
    pub priority: String,
    pub version_id: Option<i64>,
    pub owner: String,
    pub status: String,
    pub due_date: String,
    pub description: String,
}

impl Default for RequirementForm {
    fn default() -> Self {
        Self {
            product_id: None,
            module_id: None,
            code: String::new(),
            name: String::new(),
            priority: "HIGH".to_string(),
            version_id: None,
            owner: String::new(),
            status: "DRAFT".to_string(),
            due_date: String::new(),
            description: String::new(),
        }
    }
}

impl RequirementForm {
    pub fn prefill(draft: &RequirementCriteria) -> Self {
        Self {
            product_id: draft.product.specific().copied(),
            module_id: draft.module.specific().copied(),
            ..Self::default()
        }
    }

    pub fn from_entity(requirement: &Requirement) -> Self {
        Self {
            product_id: requirement.product_id,
            module_id: requirement.module_id,
            code: requirement.code.clone(),
            name: requirement.name.clone(),
            priority: requirement.priority.clone(),
            version_id: requirement.version_id,
            owner: requirement.owner.clone(),
            status: requirement.status.clone(),
            due_date: requirement.due_date.clone().unwrap_or_default(),
            description: requirement.description.clone().unwrap_or_default(),
        }
    }

    pub fn create_payload(&self) -> AppResult<RequirementPayload> {
        require_text(&self.code, "请输入需求编号")?;
        require_text(&self.name, "请输入需求名称")?;
        require_text(&self.owner, "请输入负责人")?;
        let product_id = require_id(self.product_id, "请选择所属产品")?;
        let module_id = require_id(self.module_id, "请选择功能模块")?;
        let version_id = require_id(self.version_id, "请选择关联版本")?;
        validate_date(&self.due_date)?;
        Ok(RequirementPayload {
            product_id,
            module_id,
            code: Some(self.code.clone()),
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority.clone(),
            status: None,
            version_id,
            owner: self.owner.clone(),
            due_date: non_empty(&self.due_date),
        })
    }

    pub fn update_payload(&self) -> AppResult<RequirementPayload> {
        let product_id = require_id(self.product_id, "请选择所属产品")?;
        let module_id = require_id(self.module_id, "请选择功能模块")?;
        let version_id = require_id(self.version_id, "请选择关联版本")?;
        validate_date(&self.due_date)?;
        Ok(RequirementPayload {
            product_id,
            module_id,
            code: None,
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority.clone(),
            status: Some(self.status.clone()),
            version_id,
            owner: self.owner.clone(),
            due_date: non_empty(&self.due_date),
        })
    }

    /// 切换产品后模块与版本需重新选择
    pub fn set_product(&mut self, product_id: Option<i64>) {
        if self.product_id != product_id {
            self.product_id = product_id;
            self.module_id = None;
            self.version_id = None;
        }
    }

    pub fn set_module(&mut self, module_id: Option<i64>) {
        if self.module_id != module_id {
            self.module_id = module_id;
            self.version_id = None;
        }
    }

    /// 关联版本候选：限定为表单所选产品与模块下的版本
    pub fn version_options(&self, versions: &[Version]) -> Vec<SelectOption> {
        let product = Filter::from(self.product_id);
        let module = Filter::from(self.module_id);
        versions
            .iter()
            .filter(|v| product.admits_opt(v.product_id.as_ref()))
            .filter(|v| module.admits_opt(v.module_id.as_ref()))
            .filter_map(|v| v.id.map(|id| SelectOption::new(id.to_string(), version_label(v))))
            .collect()
    }

    pub fn sync_dicts(&mut self, dicts: &DictResolver) -> bool {
        let priority = sync_code(dicts, DictType::Priority, &mut self.priority);
        let status = sync_code(dicts, DictType::RequirementStatus, &mut self.status);
        priority || status
    }
}

// ============================================================================
// 任务
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    pub product_id: Option<i64>,
    pub module_id: Option<i64>,
    pub title: String,
    pub requirement_id: Option<i64>,
    pub assignee: String,
    pub status: String,
    pub due_date: String,
    pub description: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            product_id: None,
            module_id: None,
            title: String::new(),
            requirement_id: None,
            assignee: String::new(),
            status: "TODO".to_string(),
            due_date: String::new(),
            description: String::new(),
        }
    }
}

impl TaskForm {
    pub fn prefill(draft: &TaskCriteria) -> Self {
        Self {
            product_id: draft.product.specific().copied(),
            module_id: draft.module.specific().copied(),
            ..Self::default()
        }
    }

    pub fn from_entity(task: &TaskItem) -> Self {
        Self {
            product_id: task.product_id,
            module_id: task.module_id,
            title: task.title.clone(),
            requirement_id: task.requirement_id,
            assignee: task.assignee.clone(),
            status: task.status.clone(),
            due_date: task.due_date.clone().unwrap_or_default(),
            description: task.description.clone().unwrap_or_default(),
        }
    }

    fn base_payload(&self) -> AppResult<TaskPayload> {
        let product_id = require_id(self.product_id, "请选择所属产品")?;
        let module_id = require_id(self.module_id, "请选择功能模块")?;
        validate_date(&self.due_date)?;
        Ok(TaskPayload {
            product_id,
            module_id,
            requirement_id: self.requirement_id,
            title: self.title.clone(),
            description: self.description.clone(),
            assignee: self.assignee.clone(),
            status: None,
            due_date: non_empty(&self.due_date),
        })
    }

    /// 新建不携带状态，由后端默认为 TODO
    pub fn create_payload(&self) -> AppResult<TaskPayload> {
        self.base_payload()
    }

    pub fn update_payload(&self) -> AppResult<TaskPayload> {
        Ok(TaskPayload {
            status: Some(self.status.clone()),
            ..self.base_payload()?
        })
    }

    pub fn sync_dicts(&mut self, dicts: &DictResolver) -> bool {
        sync_code(dicts, DictType::TaskStatus, &mut self.status)
    }
}

// ============================================================================
// 字典项
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DictForm {
    pub dict_type: DictType,
    pub dict_code: String,
    pub dict_label: String,
    pub sort_order: i32,
    pub is_active: i32,
    pub remark: String,
}

impl DictForm {
    /// 新建字典项：排序号默认排在该类型末尾
    pub fn prefill(dict_type: DictType, dicts: &DictResolver) -> Self {
        Self {
            dict_type,
            dict_code: String::new(),
            dict_label: String::new(),
            sort_order: dicts.next_sort_order(dict_type),
            is_active: 1,
            remark: String::new(),
        }
    }

    pub fn from_entity(item: &DictItem) -> Self {
        Self {
            dict_type: item.dict_type,
            dict_code: item.dict_code.clone(),
            dict_label: item.dict_label.clone(),
            sort_order: item.sort_order,
            is_active: item.is_active,
            remark: item.remark.clone().unwrap_or_default(),
        }
    }

    pub fn payload(&self) -> AppResult<DictPayload> {
        require_text(&self.dict_code, "请输入字典编码")?;
        require_text(&self.dict_label, "请输入字典名称")?;
        Ok(DictPayload {
            dict_type: self.dict_type,
            dict_code: self.dict_code.clone(),
            dict_label: self.dict_label.clone(),
            sort_order: self.sort_order,
            is_active: if self.is_active == 1 { 1 } else { 0 },
            remark: self.remark.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        err.to_string()
    }

    #[test]
    fn test_product_validation_order() {
        let mut form = ProductForm::default();
        assert_eq!(message(form.create_payload().unwrap_err()), "请输入产品编码");
        form.code = "P1".to_string();
        assert_eq!(message(form.create_payload().unwrap_err()), "请输入产品名称");
        form.name = "Demo".to_string();
        assert_eq!(message(form.create_payload().unwrap_err()), "请输入负责人");
        form.owner = "Alice".to_string();
        let payload = form.create_payload().unwrap();
        assert_eq!(payload.code.as_deref(), Some("P1"));
        assert_eq!(form.update_payload().code, None);
    }

    #[test]
    fn test_module_requires_parent_above_level_one() {
        let mut form = ModuleForm::prefill(Some(1));
        form.set_level(2);
        assert_eq!(message(form.create_payload().unwrap_err()), "请选择上级模块");
        form.parent_id = Some(5);
        assert_eq!(message(form.create_payload().unwrap_err()), "请输入模块编码");

        form.set_level(3);
        assert_eq!(form.parent_id, None);
    }

    #[test]
    fn test_version_prefill_and_create_omits_status() {
        let draft = VersionCriteria {
            product: Filter::Specific(1),
            module: Filter::Specific(2),
            ..Default::default()
        };
        let mut form = VersionForm::prefill(&draft);
        assert_eq!((form.product_id, form.module_id), (Some(1), Some(2)));
        form.version_code = "V1.0".to_string();
        let payload = form.create_payload().unwrap();
        assert_eq!(payload.status, None);
        assert_eq!(payload.version_code.as_deref(), Some("V1.0"));

        let update = form.update_payload().unwrap();
        assert_eq!(update.status.as_deref(), Some("PLANNED"));
        assert_eq!(update.version_code, None);
    }

    #[test]
    fn test_version_requires_module() {
        let form = VersionForm {
            product_id: Some(1),
            ..Default::default()
        };
        assert_eq!(message(form.create_payload().unwrap_err()), "请选择功能模块");
    }

    #[test]
    fn test_requirement_create_validation() {
        let mut form = RequirementForm {
            code: "R-1".to_string(),
            name: "登录".to_string(),
            owner: "Bob".to_string(),
            product_id: Some(1),
            module_id: Some(2),
            ..Default::default()
        };
        assert_eq!(message(form.create_payload().unwrap_err()), "请选择关联版本");
        form.version_id = Some(3);
        form.due_date = "2026/01/01".to_string();
        assert_eq!(
            message(form.create_payload().unwrap_err()),
            "日期格式应为 YYYY-MM-DD"
        );
        form.due_date = "2026-01-31".to_string();
        assert!(form.create_payload().is_ok());
    }

    #[test]
    fn test_requirement_update_requires_version() {
        let mut form = RequirementForm {
            name: "登录".to_string(),
            owner: "Bob".to_string(),
            product_id: Some(1),
            module_id: Some(2),
            ..Default::default()
        };
        assert_eq!(message(form.update_payload().unwrap_err()), "请选择关联版本");
        form.version_id = Some(0);
        assert!(form.update_payload().is_err());

        form.version_id = Some(3);
        let payload = form.update_payload().unwrap();
        assert_eq!(payload.version_id, 3);
        assert_eq!(payload.code, None);
        assert_eq!(payload.status.as_deref(), Some("DRAFT"));
    }

    fn version(id: i64, product_id: i64, module_id: i64, code: &str) -> Version {
        Version {
            id: Some(id),
            product_id: Some(product_id),
            module_id: Some(module_id),
            version_code: code.to_string(),
            name: "迭代".to_string(),
            owner: "Alice".to_string(),
            plan_release_date: None,
            status: "PLANNED".to_string(),
            description: None,
            actual_release_date: None,
        }
    }

    #[test]
    fn test_requirement_version_options_follow_form_selection() {
        let versions = vec![
            version(1, 1, 10, "V1"),
            version(2, 1, 11, "V2"),
            version(3, 2, 20, "V3"),
        ];
        let mut form = RequirementForm::default();
        assert_eq!(form.version_options(&versions).len(), 3);

        form.set_product(Some(1));
        form.set_module(Some(11));
        let options = form.version_options(&versions);
        assert_eq!(options, vec![SelectOption::new("2", "V2 · 迭代")]);

        form.version_id = Some(2);
        form.set_product(Some(2));
        assert_eq!((form.module_id, form.version_id), (None, None));
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("").is_ok());
        assert!(validate_date("2026-02-28").is_ok());
        assert!(validate_date("2026-02-30").is_err());
        assert!(validate_date("20260101").is_err());
    }

    #[test]
    fn test_sync_dicts_resets_inactive_code() {
        let dicts = DictResolver::new(&[DictItem {
            id: Some(1),
            dict_type: DictType::TaskStatus,
            dict_code: "DOING".to_string(),
            dict_label: "处理中".to_string(),
            sort_order: 1,
            is_active: 1,
            remark: None,
        }]);
        let mut form = TaskForm::default();
        assert!(form.sync_dicts(&dicts));
        assert_eq!(form.status, "DOING");
        assert!(!form.sync_dicts(&dicts));
    }

    #[test]
    fn test_dict_form_defaults_and_validation() {
        let dicts = DictResolver::default();
        let mut form = DictForm::prefill(DictType::Priority, &dicts);
        assert_eq!(form.sort_order, 1);
        assert_eq!(message(form.payload().unwrap_err()), "请输入字典编码");
        form.dict_code = "P0".to_string();
        assert_eq!(message(form.payload().unwrap_err()), "请输入字典名称");
        form.dict_label = "最高".to_string();
        assert_eq!(form.payload().unwrap().is_active, 1);
    }
}
