// ============================================================================
// 过滤引擎：Filter<T> 取值、各列表的筛选条件、草稿/生效两阶段状态
// ✅ 只能做：纯内存谓词与状态变换
// ⛔ 禁止：发起网络请求、持有实体集合
// ============================================================================

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::models::domain::{
    DictType, Product, ProductModule, ProductStatus, Requirement, TaskItem, Version,
};
use crate::models::dtos::SelectOption;
use crate::services::dict_resolver::DictResolver;

/// "全部" 的展示文案
pub const ALL_LABEL: &str = "全部";

/// 筛选取值：不限，或限定为某个具体值
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Filter<T> {
    All,
    Specific(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T> From<Option<T>> for Filter<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Filter::Specific(v),
            None => Filter::All,
        }
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Specific(expected) => expected == value,
        }
    }

    /// 实体字段可能为空：限定了具体值时，空字段不匹配
    pub fn admits_opt(&self, value: Option<&T>) -> bool {
        match self {
            Filter::All => true,
            Filter::Specific(expected) => value == Some(expected),
        }
    }
}

impl<T> Filter<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    pub fn specific(&self) -> Option<&T> {
        match self {
            Filter::All => None,
            Filter::Specific(v) => Some(v),
        }
    }
}

impl<T: Display> Filter<T> {
    pub fn label(&self) -> String {
        match self {
            Filter::All => ALL_LABEL.to_string(),
            Filter::Specific(v) => v.to_string(),
        }
    }
}

/// 文本包含匹配，空关键字不过滤
fn contains_text(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.contains(needle)
}

/// 文本条件是否生效（去除首尾空白后非空）
fn text_active(value: &str) -> bool {
    !value.trim().is_empty()
}

/// 闭区间日期过滤，ISO 日期字符串按字典序比较
fn within_date_range(value: Option<&str>, start: &str, end: &str) -> bool {
    let start = start.trim();
    let end = end.trim();
    if start.is_empty() && end.is_empty() {
        return true;
    }
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return false,
    };
    if !start.is_empty() && value < start {
        return false;
    }
    if !end.is_empty() && value > end {
        return false;
    }
    true
}

/// 文案筛选项失效（不在该字典类型的筛选选项中）时回到 All
pub fn sync_label_filter(filter: &mut Filter<String>, options: &[SelectOption]) -> bool {
    let stale = match filter {
        Filter::All => false,
        Filter::Specific(label) => !options.iter().any(|o| o.label == *label),
    };
    if stale {
        log::debug!("筛选文案已失效，重置为{}：{}", ALL_LABEL, filter.label());
        *filter = Filter::All;
    }
    stale
}

/// 某个列表的筛选条件
pub trait Criteria: Clone + Default + PartialEq {
    type Item;

    fn matches(&self, item: &Self::Item, dicts: &DictResolver) -> bool;

    /// 是否有任一字段偏离 All/空
    fn is_active(&self) -> bool;

    /// 字典变化后校正文案类筛选项，返回是否有改动
    fn sync_labels(&mut self, _dicts: &DictResolver) -> bool {
        false
    }
}

/// 按条件过滤，保持原有顺序
pub fn apply_filters<'a, C: Criteria>(
    items: &'a [C::Item],
    criteria: &C,
    dicts: &DictResolver,
) -> Vec<&'a C::Item> {
    items
        .iter()
        .filter(|item| criteria.matches(item, dicts))
        .collect()
}

// ============================================================================
// 各列表的筛选条件
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductCriteria {
    pub status: Filter<ProductStatus>,
    pub owner: String,
    /// 匹配名称或编码
    pub keyword: String,
}

impl Criteria for ProductCriteria {
    type Item = Product;

    fn matches(&self, item: &Product, _dicts: &DictResolver) -> bool {
        self.status.admits(&item.status)
            && contains_text(&item.owner, &self.owner)
            && (self.keyword.is_empty()
                || item.name.contains(&self.keyword)
                || item.code.contains(&self.keyword))
    }

    fn is_active(&self) -> bool {
        !self.status.is_all() || text_active(&self.owner) || text_active(&self.keyword)
    }
}

/// 模块列表筛选，选择即生效
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCriteria {
    pub product: Filter<i64>,
    pub level: Filter<u8>,
    pub status: Filter<ProductStatus>,
}

impl Criteria for ModuleCriteria {
    type Item = ProductModule;

    fn matches(&self, item: &ProductModule, _dicts: &DictResolver) -> bool {
        self.product.admits(&item.product_id)
            && self.level.admits(&item.level)
            && self.status.admits(&item.status)
    }

    fn is_active(&self) -> bool {
        !self.product.is_all() || !self.level.is_all() || !self.status.is_all()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionCriteria {
    pub product: Filter<i64>,
    pub module: Filter<i64>,
    /// 状态文案（非编码）
    pub status: Filter<String>,
    pub owner: String,
    pub date_start: String,
    pub date_end: String,
}

impl VersionCriteria {
    /// 切换产品时模块一并回到 All
    pub fn select_product(&mut self, product: Filter<i64>) {
        self.product = product;
        self.module = Filter::All;
    }
}

impl Criteria for VersionCriteria {
    type Item = Version;

    fn matches(&self, item: &Version, dicts: &DictResolver) -> bool {
        if !self.product.admits_opt(item.product_id.as_ref())
            || !self.module.admits_opt(item.module_id.as_ref())
        {
            return false;
        }
        if let Filter::Specific(label) = &self.status {
            if &dicts.label_of(DictType::VersionStatus, &item.status) != label {
                return false;
            }
        }
        contains_text(&item.owner, &self.owner)
            && within_date_range(
                item.plan_release_date.as_deref(),
                &self.date_start,
                &self.date_end,
            )
    }

    fn is_active(&self) -> bool {
        !self.product.is_all()
            || !self.module.is_all()
            || !self.status.is_all()
            || text_active(&self.owner)
            || text_active(&self.date_start)
            || text_active(&self.date_end)
    }

    fn sync_labels(&mut self, dicts: &DictResolver) -> bool {
        sync_label_filter(
            &mut self.status,
            &dicts.filter_options(DictType::VersionStatus),
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCriteria {
    pub product: Filter<i64>,
    pub module: Filter<i64>,
    /// 优先级文案（非编码）
    pub priority: Filter<String>,
    pub version: Filter<i64>,
    pub owner: String,
}

impl RequirementCriteria {
    pub fn select_product(&mut self, product: Filter<i64>) {
        self.product = product;
        self.module = Filter::All;
        self.version = Filter::All;
    }

    pub fn select_module(&mut self, module: Filter<i64>) {
        self.module = module;
        self.version = Filter::All;
    }
}

impl Criteria for RequirementCriteria {
    type Item = Requirement;

    fn matches(&self, item: &Requirement, dicts: &DictResolver) -> bool {
        if !self.product.admits_opt(item.product_id.as_ref())
            || !self.module.admits_opt(item.module_id.as_ref())
            || !self.version.admits_opt(item.version_id.as_ref())
        {
            return false;
        }
        if let Filter::Specific(label) = &self.priority {
            if &dicts.label_of(DictType::Priority, &item.priority) != label {
                return false;
            }
        }
        contains_text(&item.owner, &self.owner)
    }

    fn is_active(&self) -> bool {
        !self.product.is_all()
            || !self.module.is_all()
            || !self.priority.is_all()
            || !self.version.is_all()
            || text_active(&self.owner)
    }

    fn sync_labels(&mut self, dicts: &DictResolver) -> bool {
        sync_label_filter(&mut self.priority, &dicts.filter_options(DictType::Priority))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCriteria {
    pub product: Filter<i64>,
    pub module: Filter<i64>,
    /// 状态文案（非编码）
    pub status: Filter<String>,
    pub assignee: String,
    /// 截止日期子串
    pub due: String,
}

impl TaskCriteria {
    pub fn select_product(&mut self, product: Filter<i64>) {
        self.product = product;
        self.module = Filter::All;
    }
}

impl Criteria for TaskCriteria {
    type Item = TaskItem;

    fn matches(&self, item: &TaskItem, dicts: &DictResolver) -> bool {
        if !self.product.admits_opt(item.product_id.as_ref())
            || !self.module.admits_opt(item.module_id.as_ref())
        {
            return false;
        }
        if let Filter::Specific(label) = &self.status {
            if &dicts.label_of(DictType::TaskStatus, &item.status) != label {
                return false;
            }
        }
        contains_text(&item.assignee, &self.assignee)
            && contains_text(item.due_date.as_deref().unwrap_or_default(), &self.due)
    }

    fn is_active(&self) -> bool {
        !self.product.is_all()
            || !self.module.is_all()
            || !self.status.is_all()
            || text_active(&self.assignee)
            || text_active(&self.due)
    }

    fn sync_labels(&mut self, dicts: &DictResolver) -> bool {
        sync_label_filter(&mut self.status, &dicts.filter_options(DictType::TaskStatus))
    }
}

// ============================================================================
// 两阶段状态
// ============================================================================

/// 草稿条件随输入变化，生效条件只在提交时更新
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState<C> {
    pub draft: C,
    pub applied: C,
}

impl<C: Clone + Default> FilterState<C> {
    /// 只改草稿（文本输入过程中）
    pub fn edit(&mut self, f: impl FnOnce(&mut C)) {
        f(&mut self.draft);
    }

    /// 草稿和生效条件同时修改（下拉选择、文本失焦）
    pub fn commit(&mut self, f: impl Fn(&mut C)) {
        f(&mut self.draft);
        f(&mut self.applied);
    }

    /// 提交：生效条件 := 草稿
    pub fn submit(&mut self) {
        self.applied = self.draft.clone();
    }

    pub fn reset(&mut self) {
        self.draft = C::default();
        self.applied = C::default();
    }

    /// 字典变化后两阶段一起校正
    pub fn sync_labels(&mut self, dicts: &DictResolver) -> bool
    where
        C: Criteria,
    {
        let draft_changed = self.draft.sync_labels(dicts);
        let applied_changed = self.applied.sync_labels(dicts);
        draft_changed || applied_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::DictItem;
    use proptest::prelude::*;

    fn product(id: i64, code: &str, name: &str, owner: &str, status: ProductStatus) -> Product {
        Product {
            id: Some(id),
            code: code.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            status,
            description: None,
        }
    }

    fn version(id: i64, product_id: i64, module_id: i64, status: &str, date: Option<&str>) -> Version {
        Version {
            id: Some(id),
            product_id: Some(product_id),
            module_id: Some(module_id),
            version_code: format!("V{id}"),
            name: format!("版本{id}"),
            owner: "Alice".to_string(),
            plan_release_date: date.map(str::to_string),
            status: status.to_string(),
            description: None,
            actual_release_date: None,
        }
    }

    #[test]
    fn test_filter_option_semantics() {
        let all: Filter<i64> = Filter::All;
        assert!(all.admits(&3));
        assert!(all.admits_opt(None));
        let one = Filter::Specific(1);
        assert!(one.admits(&1));
        assert!(!one.admits_opt(None));
        assert_eq!(all.label(), "全部");
        assert_eq!(Filter::from(Some(5)).specific(), Some(&5));
    }

    #[test]
    fn test_product_owner_substring() {
        let dicts = DictResolver::default();
        let items = vec![product(1, "P1", "Demo", "Alice", ProductStatus::Active)];
        let mut criteria = ProductCriteria {
            owner: "Ali".to_string(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&items, &criteria, &dicts).len(), 1);
        criteria.owner = "Bob".to_string();
        assert!(apply_filters(&items, &criteria, &dicts).is_empty());
    }

    #[test]
    fn test_product_keyword_matches_code_or_name() {
        let dicts = DictResolver::default();
        let items = vec![
            product(1, "CRM", "客户管理", "A", ProductStatus::Active),
            product(2, "ERP", "资源计划", "B", ProductStatus::Inactive),
        ];
        let criteria = ProductCriteria {
            keyword: "客户".to_string(),
            ..Default::default()
        };
        let result = apply_filters(&items, &criteria, &dicts);
        assert_eq!(result[0].code, "CRM");

        let criteria = ProductCriteria {
            status: Filter::Specific(ProductStatus::Inactive),
            ..Default::default()
        };
        assert_eq!(apply_filters(&items, &criteria, &dicts)[0].code, "ERP");
    }

    #[test]
    fn test_version_status_compared_by_label() {
        let dicts = DictResolver::new(&[DictItem {
            id: Some(1),
            dict_type: DictType::VersionStatus,
            dict_code: "PLANNED".to_string(),
            dict_label: "计划中".to_string(),
            sort_order: 1,
            is_active: 1,
            remark: None,
        }]);
        let items = vec![version(1, 1, 1, "PLANNED", None)];
        let criteria = VersionCriteria {
            status: Filter::Specific("计划中".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&items, &criteria, &dicts).len(), 1);
        let criteria = VersionCriteria {
            status: Filter::Specific("规划中".to_string()),
            ..Default::default()
        };
        assert!(apply_filters(&items, &criteria, &dicts).is_empty());
    }

    #[test]
    fn test_version_date_range() {
        let dicts = DictResolver::default();
        let items = vec![
            version(1, 1, 1, "PLANNED", Some("2026-01-10")),
            version(2, 1, 1, "PLANNED", Some("2026-03-01")),
            version(3, 1, 1, "PLANNED", None),
        ];
        let criteria = VersionCriteria {
            date_start: "2026-01-01".to_string(),
            date_end: "2026-01-31".to_string(),
            ..Default::default()
        };
        let ids: Vec<_> = apply_filters(&items, &criteria, &dicts)
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![Some(1)]);

        let open_end = VersionCriteria {
            date_start: "2026-02-01".to_string(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&items, &open_end, &dicts).len(), 1);

        // 未设置区间时空日期不被排除
        assert_eq!(apply_filters(&items, &VersionCriteria::default(), &dicts).len(), 3);
    }

    fn module(id: i64, product_id: i64, level: u8, status: ProductStatus) -> ProductModule {
        ProductModule {
            id: Some(id),
            product_id,
            parent_id: None,
            level,
            code: format!("M{id}"),
            name: format!("模块{id}"),
            owner: None,
            status,
            description: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_module_criteria_conjunction() {
        let dicts = DictResolver::default();
        let items = vec![
            module(1, 1, 1, ProductStatus::Active),
            module(2, 1, 2, ProductStatus::Active),
            module(3, 1, 2, ProductStatus::Inactive),
            module(4, 2, 2, ProductStatus::Active),
        ];
        let ids = |criteria: &ModuleCriteria| -> Vec<i64> {
            apply_filters(&items, criteria, &dicts)
                .iter()
                .filter_map(|m| m.id)
                .collect()
        };

        let mut criteria = ModuleCriteria::default();
        assert!(!criteria.is_active());
        assert_eq!(ids(&criteria), vec![1, 2, 3, 4]);

        criteria.product = Filter::Specific(1);
        assert_eq!(ids(&criteria), vec![1, 2, 3]);
        criteria.level = Filter::Specific(2);
        assert_eq!(ids(&criteria), vec![2, 3]);
        criteria.status = Filter::Specific(ProductStatus::Inactive);
        assert_eq!(ids(&criteria), vec![3]);
        assert!(criteria.is_active());

        // 任一条件不满足即排除
        criteria.product = Filter::Specific(2);
        assert!(ids(&criteria).is_empty());
    }

    #[test]
    fn test_product_change_resets_children() {
        let mut state: FilterState<RequirementCriteria> = FilterState::default();
        state.commit(|c| c.select_product(Filter::Specific(1)));
        state.commit(|c| c.select_module(Filter::Specific(10)));
        state.commit(|c| c.version = Filter::Specific(100));

        state.commit(|c| c.select_product(Filter::Specific(2)));
        assert_eq!(state.applied.module, Filter::All);
        assert_eq!(state.applied.version, Filter::All);
        assert_eq!(state.draft.module, Filter::All);
    }

    #[test]
    fn test_edit_then_submit() {
        let mut state: FilterState<TaskCriteria> = FilterState::default();
        state.edit(|c| c.assignee = "Bo".to_string());
        assert!(!state.applied.is_active());
        state.submit();
        assert!(state.applied.is_active());
        state.reset();
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn test_sync_labels_resets_stale_label() {
        let dicts = DictResolver::default();
        let mut state: FilterState<TaskCriteria> = FilterState::default();
        state.commit(|c| c.status = Filter::Specific("已挂起".to_string()));
        assert!(state.sync_labels(&dicts));
        assert!(state.applied.status.is_all());

        state.commit(|c| c.status = Filter::Specific("阻塞".to_string()));
        assert!(!state.sync_labels(&dicts));
    }

    fn task_strategy() -> impl Strategy<Value = TaskItem> {
        (
            1i64..50,
            prop::option::of(1i64..4),
            prop::option::of(1i64..4),
            prop_oneof![Just("TODO"), Just("DONE"), Just("BLOCKED"), Just("X")],
            "[a-c]{0,4}",
            prop::option::of("2026-0[1-3]-1[0-9]"),
        )
            .prop_map(|(id, product_id, module_id, status, assignee, due)| TaskItem {
                id: Some(id),
                product_id,
                module_id,
                requirement_id: None,
                title: format!("T{id}"),
                description: None,
                assignee,
                status: status.to_string(),
                due_date: due,
                estimate_hours: None,
            })
    }

    fn criteria_strategy() -> impl Strategy<Value = TaskCriteria> {
        (
            prop::option::of(1i64..4),
            prop::option::of(1i64..4),
            prop::option::of(prop_oneof![Just("待开始".to_string()), Just("X".to_string())]),
            "[a-c]{0,2}",
            "(2026-0[1-3])?",
        )
            .prop_map(|(product, module, status, assignee, due)| TaskCriteria {
                product: product.into(),
                module: module.into(),
                status: status.into(),
                assignee,
                due,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 同一条件过滤两次结果不变
        #[test]
        fn prop_apply_filters_idempotent(
            items in prop::collection::vec(task_strategy(), 0..30),
            criteria in criteria_strategy(),
        ) {
            let dicts = DictResolver::default();
            let once: Vec<TaskItem> = apply_filters(&items, &criteria, &dicts)
                .into_iter()
                .cloned()
                .collect();
            let twice: Vec<TaskItem> = apply_filters(&once, &criteria, &dicts)
                .into_iter()
                .cloned()
                .collect();
            prop_assert_eq!(once, twice);
        }

        /// 全部字段复位后得到原列表，顺序不变
        #[test]
        fn prop_reset_yields_original(
            items in prop::collection::vec(task_strategy(), 0..30),
            criteria in criteria_strategy(),
        ) {
            let dicts = DictResolver::default();
            let mut state = FilterState { draft: criteria.clone(), applied: criteria };
            state.reset();
            let result: Vec<TaskItem> = apply_filters(&items, &state.applied, &dicts)
                .into_iter()
                .cloned()
                .collect();
            prop_assert_eq!(result, items);
        }
    }
}
