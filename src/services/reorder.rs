// ============================================================================
// 拖拽排序：按 key 把源元素移动到目标位置（splice 语义，非交换）
// ============================================================================

use crate::models::domain::{DictItem, MenuItem};

/// 移除源元素并插入到目标元素原来的下标处
///
/// 源与目标相同、或任一 key 不存在时返回 None（无变化）。
pub fn reorder_by_key<T, K, F>(items: &[T], source: &K, target: &K, key_fn: F) -> Option<Vec<T>>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    if source == target {
        return None;
    }
    let from = items.iter().position(|item| &key_fn(item) == source)?;
    let to = items.iter().position(|item| &key_fn(item) == target)?;
    let mut next = items.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

/// 同类型字典项重排，并把 sortOrder 重写为 1..N
///
/// `items` 为某一字典类型按 sortOrder 排好的全部条目。
pub fn reorder_dict_items(items: &[DictItem], source_id: i64, target_id: i64) -> Option<Vec<DictItem>> {
    let mut next = reorder_by_key(items, &Some(source_id), &Some(target_id), |item| item.id)?;
    renumber(&mut next);
    Some(next)
}

/// sortOrder 按当前顺序稠密编号
pub fn renumber(items: &mut [DictItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.sort_order = index as i32 + 1;
    }
}

/// 按 id 把重排后的条目写回完整集合
pub fn apply_dict_order(all: &mut [DictItem], updated: &[DictItem]) {
    for item in all.iter_mut() {
        if let Some(next) = updated.iter().find(|u| u.id.is_some() && u.id == item.id) {
            *item = next.clone();
        }
    }
}

/// 正在拖动的菜单节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDrag {
    pub key: String,
    /// 顶层节点为 None
    pub parent_key: Option<String>,
}

/// 菜单拖放：只在同一父级下重排，跨父级的放置忽略
pub fn reorder_menus(
    menus: &[MenuItem],
    drag: &MenuDrag,
    target_key: &str,
    target_parent: Option<&str>,
) -> Option<Vec<MenuItem>> {
    if drag.parent_key.as_deref() != target_parent {
        log::debug!("跨分组拖放被忽略：{} -> {}", drag.key, target_key);
        return None;
    }
    let source = drag.key.clone();
    let target = target_key.to_string();
    match target_parent {
        None => reorder_by_key(menus, &source, &target, |m| m.key.clone()),
        Some(parent_key) => {
            let index = menus.iter().position(|m| m.key == parent_key)?;
            let children = menus[index].children.as_deref()?;
            let reordered = reorder_by_key(children, &source, &target, |m| m.key.clone())?;
            let mut next = menus.to_vec();
            next[index].children = Some(reordered);
            Some(next)
        }
    }
}
