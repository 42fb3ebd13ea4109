// ============================================================================
// 实体列表存储
// 每个列表独立维护 loading / error，一个列表失败不影响其他列表
// 请求代次单调递增，只接受最新一次请求的结果
// ============================================================================

use crate::models::domain::{DictItem, Product, ProductModule, Requirement, Resource, TaskItem, Version};
use crate::utils::error::AppResult;

/// 一次列表请求的凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// 单个实体列表
#[derive(Debug, Clone)]
pub struct EntityList<T> {
    items: Vec<T>,
    loading: bool,
    /// 行内提示，如 "产品接口不可用 (HTTP 500)"
    error: Option<String>,
    /// 已发出的最新请求代次
    generation: u64,
    /// 数据每变化一次加一，派生状态据此判断是否重建
    revision: u64,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
            revision: 0,
        }
    }
}

impl<T: Resource> EntityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == Some(id))
    }

    /// 发起请求：代次加一并进入加载状态
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket(self.generation)
    }

    /// 请求完成；只有最新代次的结果会被应用，返回是否应用
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: AppResult<Vec<T>>) -> bool {
        if ticket.0 != self.generation {
            log::warn!(
                "丢弃过期的{}列表响应（代次 {}，最新 {}）",
                T::NAME,
                ticket.0,
                self.generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                log::info!("{}列表已加载：{} 条", T::NAME, items.len());
                self.items = items;
                self.error = None;
                self.revision += 1;
            }
            Err(err) => {
                log::warn!("{}列表加载失败：{}", T::NAME, err);
                self.error = Some(format!("{}接口不可用 ({})", T::NAME, err));
            }
        }
        true
    }

    /// 追加服务端确认创建的实体
    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.revision += 1;
    }

    /// 按 id 替换服务端确认更新的实体；本地不存在时追加
    pub fn replace(&mut self, item: T) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.id().is_some() && existing.id() == item.id())
        {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        self.revision += 1;
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == Some(id))?;
        self.revision += 1;
        Some(self.items.remove(index))
    }

    /// 整体替换（排序回滚时使用）
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.revision += 1;
    }

    pub fn update_items(&mut self, f: impl FnOnce(&mut Vec<T>)) {
        f(&mut self.items);
        self.revision += 1;
    }
}

/// 六个实体列表
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub products: EntityList<Product>,
    pub modules: EntityList<ProductModule>,
    pub versions: EntityList<Version>,
    pub requirements: EntityList<Requirement>,
    pub tasks: EntityList<TaskItem>,
    pub dicts: EntityList<DictItem>,
}
