// ============================================================================
// 导航菜单配置：默认菜单树、键冲突规范化、与服务端配置合并
// ✅ 只能做：菜单树的纯变换
// ⛔ 禁止：直接保存（由 commands::menus 负责防抖保存）
// ============================================================================

use std::collections::HashSet;

use serde::Serialize;

use crate::models::domain::MenuItem;

pub const PRODUCT_GROUP_KEY: &str = "productGroup";
pub const SYSTEM_GROUP_KEY: &str = "system";

/// 找不到当前菜单时的标题
pub const FALLBACK_TITLE: &str = "概览";

fn leaf(key: &str, label: &str) -> MenuItem {
    MenuItem {
        key: key.to_string(),
        label: label.to_string(),
        title: label.to_string(),
        icon_key: Some(key.to_string()),
        icon_data_url: None,
        children: None,
    }
}

fn group(key: &str, label: &str, icon_key: &str, children: Vec<MenuItem>) -> MenuItem {
    MenuItem {
        icon_key: Some(icon_key.to_string()),
        children: Some(children),
        ..leaf(key, label)
    }
}

/// 内置默认菜单树
pub fn default_menus() -> Vec<MenuItem> {
    vec![
        leaf("overview", "概览"),
        group(
            PRODUCT_GROUP_KEY,
            "产品管理",
            "products",
            vec![
                leaf("products", "产品管理"),
                leaf("modules", "功能模块"),
                leaf("versions", "版本管理"),
            ],
        ),
        leaf("requirements", "需求管理"),
        leaf("tasks", "任务管理"),
        leaf("reports", "数据报表"),
        group(
            SYSTEM_GROUP_KEY,
            "系统管理",
            "system",
            vec![
                leaf("dicts", "字典管理"),
                leaf("settings", "应用设置"),
                leaf("menus", "菜单管理"),
            ],
        ),
    ]
}

/// 修复历史数据中父节点 key 与子节点 key 相同的问题
///
/// `products` 改名为 `productGroup`，其余 key 追加 `Group` 后缀直到不再冲突。
pub fn normalize_menus(items: Vec<MenuItem>) -> Vec<MenuItem> {
    items
        .into_iter()
        .map(|mut item| {
            let child_keys: HashSet<String> = match &item.children {
                Some(children) if !children.is_empty() => {
                    children.iter().map(|c| c.key.clone()).collect()
                }
                _ => return item,
            };
            if !child_keys.contains(&item.key) {
                return item;
            }
            let mut renamed = if item.key == "products" {
                PRODUCT_GROUP_KEY.to_string()
            } else {
                format!("{}Group", item.key)
            };
            while child_keys.contains(&renamed) {
                renamed.push_str("Group");
            }
            log::warn!("菜单分组 key 与子节点冲突，{} 更名为 {}", item.key, renamed);
            item.key = renamed;
            item
        })
        .collect()
}

/// 服务端字段优先，缺省的可选字段取默认值
fn overlay(default: &MenuItem, server: &MenuItem) -> MenuItem {
    MenuItem {
        key: server.key.clone(),
        label: server.label.clone(),
        title: server.title.clone(),
        icon_key: server.icon_key.clone().or_else(|| default.icon_key.clone()),
        icon_data_url: server
            .icon_data_url
            .clone()
            .or_else(|| default.icon_data_url.clone()),
        children: server.children.clone().or_else(|| default.children.clone()),
    }
}

/// 合并默认菜单与服务端菜单
///
/// 服务端顺序与自定义（名称、图标）保留；默认分组中服务端缺少的子项追加在末尾，
/// 服务端缺少的默认顶层节点追加在最后；服务端独有的节点原样保留。
pub fn merge_menus(defaults: &[MenuItem], server: &[MenuItem]) -> Vec<MenuItem> {
    let mut merged: Vec<MenuItem> = server
        .iter()
        .map(|item| {
            let Some(default) = defaults.iter().find(|d| d.key == item.key) else {
                return item.clone();
            };
            let mut node = overlay(default, item);
            if default.is_group() {
                let mut children = item.children.clone().unwrap_or_default();
                let present: HashSet<String> = children.iter().map(|c| c.key.clone()).collect();
                let missing = default
                    .children
                    .iter()
                    .flatten()
                    .filter(|c| !present.contains(&c.key))
                    .cloned();
                children.extend(missing);
                node.children = Some(children);
            }
            node
        })
        .collect();

    let merged_keys: HashSet<String> = merged.iter().map(|m| m.key.clone()).collect();
    merged.extend(
        defaults
            .iter()
            .filter(|d| !merged_keys.contains(&d.key))
            .cloned(),
    );
    merged
}

/// 按展示顺序排列的叶子菜单（分组展开为子项，系统分组本身不作为叶子）
pub fn flat_menus(menus: &[MenuItem]) -> Vec<&MenuItem> {
    let mut items = Vec::new();
    for menu in menus {
        match &menu.children {
            Some(children) if !children.is_empty() => items.extend(children.iter()),
            _ if menu.key != SYSTEM_GROUP_KEY => items.push(menu),
            _ => {}
        }
    }
    items
}

/// 当前菜单的窗口标题
pub fn menu_title(menus: &[MenuItem], key: &str) -> String {
    flat_menus(menus)
        .into_iter()
        .find(|m| m.key == key)
        .map(|m| m.title.clone())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

pub fn find_group<'a>(menus: &'a [MenuItem], key: &str) -> Option<&'a MenuItem> {
    menus.iter().find(|m| m.key == key)
}

/// 定位节点：有 parent_key 时在该分组的子项中查找
fn locate<'a>(
    menus: &'a mut [MenuItem],
    key: &str,
    parent_key: Option<&str>,
) -> Option<&'a mut MenuItem> {
    match parent_key {
        Some(parent_key) => menus
            .iter_mut()
            .find(|m| m.key == parent_key)?
            .children
            .as_mut()?
            .iter_mut()
            .find(|c| c.key == key),
        None => menus.iter_mut().find(|m| m.key == key),
    }
}

/// 修改名称（标题同步修改），返回是否找到节点
pub fn update_label(
    menus: &mut [MenuItem],
    key: &str,
    parent_key: Option<&str>,
    label: &str,
) -> bool {
    match locate(menus, key, parent_key) {
        Some(node) => {
            node.label = label.to_string();
            node.title = label.to_string();
            true
        }
        None => false,
    }
}

/// 设置或清除自定义图标
pub fn update_icon(
    menus: &mut [MenuItem],
    key: &str,
    parent_key: Option<&str>,
    icon_data_url: Option<String>,
) -> bool {
    match locate(menus, key, parent_key) {
        Some(node) => {
            node.icon_data_url = icon_data_url;
            true
        }
        None => false,
    }
}

/// 页面头部标题与副标题
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageMeta {
    pub title: &'static str,
    pub subtitle: &'static str,
}

pub fn page_meta(key: &str) -> Option<PageMeta> {
    let (title, subtitle) = match key {
        "overview" => ("产品交付总览", "版本节奏与研发资源概览"),
        "products" => ("产品管理", "多产品研发矩阵与负责人维护"),
        "modules" => ("功能模块", "模块层级与职责边界管理"),
        "versions" => ("版本管理", "版本生命周期与里程碑"),
        "requirements" => ("需求管理", "需求拆解与评审协作"),
        "tasks" => ("任务管理", "研发任务跟踪与交付进度"),
        "reports" => ("数据报表", "交付指标与风险洞察"),
        "dicts" => ("字典管理", "字典配置与系统规则维护"),
        "settings" => ("应用设置", "应用名称与图标配置"),
        "menus" => ("菜单管理", "菜单层级、名称与图标维护"),
        _ => return None,
    };
    Some(PageMeta { title, subtitle })
}
