// ============================================================================
// 字典解析：编码 → 文案映射、表单/筛选选项、停用值回退
// 后端无启用项时回退到内置默认值
// ============================================================================

use std::collections::HashMap;

use crate::models::domain::{DictItem, DictType};
use crate::models::dtos::SelectOption;

/// 内置默认选项（编码, 文案），顺序即展示顺序
pub fn fallback_entries(dict_type: DictType) -> &'static [(&'static str, &'static str)] {
    match dict_type {
        DictType::VersionStatus => &[
            ("PLANNED", "规划中"),
            ("REVIEW", "评审中"),
            ("RELEASED", "已发布"),
            ("DEPRECATED", "已废弃"),
        ],
        DictType::RequirementStatus => &[
            ("DRAFT", "草稿"),
            ("REVIEW", "评审中"),
            ("APPROVED", "已确认"),
            ("IN_PROGRESS", "进行中"),
            ("DONE", "已完成"),
            ("ARCHIVED", "已归档"),
        ],
        DictType::TaskStatus => &[
            ("TODO", "待开始"),
            ("IN_PROGRESS", "进行中"),
            ("BLOCKED", "阻塞"),
            ("DONE", "已完成"),
        ],
        DictType::Priority => &[
            ("HIGH", "高"),
            ("MEDIUM", "中"),
            ("LOW", "低"),
            ("URGENT", "紧急"),
        ],
    }
}

pub fn fallback_options(dict_type: DictType) -> Vec<SelectOption> {
    fallback_entries(dict_type)
        .iter()
        .map(|(code, label)| SelectOption::new(*code, *label))
        .collect()
}

/// 模块层级选项
pub fn module_level_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("1", "一级模块"),
        SelectOption::new("2", "二级模块"),
        SelectOption::new("3", "三级模块"),
    ]
}

/// 字典类型选项
pub fn dict_type_options() -> Vec<SelectOption> {
    DictType::ALL
        .iter()
        .map(|t| SelectOption::new(t.code(), t.display_name()))
        .collect()
}

/// 基于一次字典快照的解析器
#[derive(Debug, Clone, Default)]
pub struct DictResolver {
    items: Vec<DictItem>,
}

impl DictResolver {
    pub fn new(items: &[DictItem]) -> Self {
        Self {
            items: items.to_vec(),
        }
    }

    /// 某类型的全部字典项（含停用），按 sortOrder 升序
    pub fn items_of_type(&self, dict_type: DictType) -> Vec<&DictItem> {
        let mut items: Vec<&DictItem> = self
            .items
            .iter()
            .filter(|item| item.dict_type == dict_type)
            .collect();
        items.sort_by_key(|item| item.sort_order);
        items
    }

    fn active_items(&self, dict_type: DictType) -> Vec<&DictItem> {
        self.items_of_type(dict_type)
            .into_iter()
            .filter(|item| item.active())
            .collect()
    }

    /// 编码 → 文案：默认值打底，后端同类型条目覆盖
    pub fn label_map(&self, dict_type: DictType) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = fallback_entries(dict_type)
            .iter()
            .map(|(code, label)| (code.to_string(), label.to_string()))
            .collect();
        for item in self.items.iter().filter(|item| item.dict_type == dict_type) {
            map.insert(item.dict_code.clone(), item.dict_label.clone());
        }
        map
    }

    /// 单个编码的文案，未知编码原样返回
    pub fn label_of(&self, dict_type: DictType, code: &str) -> String {
        let overridden = self
            .items
            .iter()
            .rev()
            .find(|item| item.dict_type == dict_type && item.dict_code == code);
        if let Some(item) = overridden {
            return item.dict_label.clone();
        }
        fallback_entries(dict_type)
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| code.to_string())
    }

    /// 表单选项：有启用项则用启用项，否则原样返回默认值
    pub fn form_options(&self, dict_type: DictType) -> Vec<SelectOption> {
        let active: Vec<SelectOption> = self
            .active_items(dict_type)
            .into_iter()
            .map(|item| SelectOption::new(item.dict_code.clone(), item.dict_label.clone()))
            .collect();
        if active.is_empty() {
            fallback_options(dict_type)
        } else {
            active
        }
    }

    /// 筛选选项，规则与表单相同
    pub fn filter_options(&self, dict_type: DictType) -> Vec<SelectOption> {
        self.form_options(dict_type)
    }

    pub fn active_codes(&self, dict_type: DictType) -> Vec<String> {
        self.active_items(dict_type)
            .into_iter()
            .map(|item| item.dict_code.clone())
            .collect()
    }

    /// 表单值校正：当前值不再是启用编码时回退到第一个启用编码
    ///
    /// 无启用项时保留当前值，当前值为空则取默认值的第一项。
    pub fn ensure_active_value(&self, dict_type: DictType, current: &str) -> String {
        let active = self.active_codes(dict_type);
        if active.is_empty() {
            if !current.is_empty() {
                return current.to_string();
            }
            return fallback_entries(dict_type)
                .first()
                .map(|(code, _)| code.to_string())
                .unwrap_or_default();
        }
        if !current.is_empty() && active.iter().any(|code| code == current) {
            return current.to_string();
        }
        active[0].clone()
    }

    /// 新建字典项的默认排序号
    pub fn next_sort_order(&self, dict_type: DictType) -> i32 {
        let count = self
            .items
            .iter()
            .filter(|item| item.dict_type == dict_type)
            .count();
        count as i32 + 1
    }
}
