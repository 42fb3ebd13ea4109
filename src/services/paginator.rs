// ============================================================================
// 分页器：把过滤后的列表切成一页
// 纯函数，越界页码一律钳制，不返回错误
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::dtos::Page;

/// 每页条数可选项
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 20, 50];

/// 页码条最多展示的页码数
const PAGE_WINDOW: usize = 5;

/// 总页数，空列表也至少 1 页
pub fn total_pages(total: usize, size: usize) -> usize {
    let size = size.max(1);
    total.div_ceil(size).max(1)
}

/// 按页码和每页条数切片
///
/// `page` 可以是任意整数（包括 0 和负数），结果页码钳制在 `[1, total_pages]`。
pub fn paginate<T: Clone>(items: &[T], page: i64, size: usize) -> Page<T> {
    let size = size.max(1);
    let total = items.len();
    let total_pages = total_pages(total, size);
    let page = page.clamp(1, total_pages as i64) as usize;
    let start = (page - 1) * size;
    let end = (start + size).min(total);
    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        total,
        total_pages,
        page,
    }
}

/// 页码条：从 `max(1, page - 2)` 开始，最多 5 个页码
pub fn page_window(page: usize, total_pages: usize) -> Vec<usize> {
    let start = page.saturating_sub(2).max(1);
    let end = total_pages.min(start + PAGE_WINDOW - 1);
    (start..=end).collect()
}

/// 单个列表的分页状态
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageState {
    pub page: usize,
    pub size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            size: PAGE_SIZE_OPTIONS[0],
        }
    }
}

impl PageState {
    pub fn with_size(size: usize) -> Self {
        Self {
            page: 1,
            size: size.max(1),
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// 修改每页条数后回到第一页
    pub fn set_size(&mut self, size: usize) {
        self.size = size.max(1);
        self.page = 1;
    }

    /// 切片并把存储的页码同步为钳制后的页码
    pub fn slice<T: Clone>(&mut self, items: &[T]) -> Page<T> {
        let page = paginate(items, self.page as i64, self.size);
        self.resync(&page);
        page
    }

    /// 过滤结果缩短后，存储页码可能超出总页数，需要回写
    pub fn resync<T>(&mut self, page: &Page<T>) -> bool {
        if self.page == page.page {
            return false;
        }
        log::debug!("分页页码回写：{} -> {}", self.page, page.page);
        self.page = page.page;
        true
    }
}
