// ============================================================================
// 列表页视图模型：筛选条件 + 分页状态
// ✅ 只能做：根据注入的实体切片计算当前页
// ⛔ 禁止：持有实体集合、发起网络请求
// ============================================================================

use crate::models::domain::{Requirement, Version};
use crate::models::dtos::{Page, SelectOption};
use crate::services::dict_resolver::DictResolver;
use crate::services::filter::{apply_filters, Criteria, Filter, FilterState, RequirementCriteria};
use crate::services::paginator::PageState;
use crate::services::stats::version_label;

/// 通用列表页
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView<C> {
    pub filters: FilterState<C>,
    pub paging: PageState,
}

impl<C> ListView<C>
where
    C: Criteria,
    C::Item: Clone,
{
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: FilterState::default(),
            paging: PageState::with_size(page_size),
        }
    }

    /// 按生效条件过滤后切出当前页，并回写钳制后的页码
    pub fn page(&mut self, items: &[C::Item], dicts: &DictResolver) -> Page<C::Item> {
        let filtered: Vec<C::Item> = apply_filters(items, &self.filters.applied, dicts)
            .into_iter()
            .cloned()
            .collect();
        self.paging.slice(&filtered)
    }

    /// 查询按钮：草稿生效并回到第一页
    pub fn submit(&mut self) {
        self.filters.submit();
        self.paging.set_page(1);
    }

    pub fn reset(&mut self) {
        self.filters.reset();
        self.paging.set_page(1);
    }

    pub fn filter_active(&self) -> bool {
        self.filters.applied.is_active()
    }
}

// ============================================================================
// 需求页：额外固定一个版本筛选
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementView {
    pub list: ListView<RequirementCriteria>,
    /// 页面顶部的版本选择
    pub selected_version: Filter<i64>,
}

impl RequirementView {
    pub fn new(page_size: usize) -> Self {
        Self {
            list: ListView::new(page_size),
            selected_version: Filter::All,
        }
    }

    /// 草稿产品/模块条件下可选的版本
    pub fn version_options(&self, versions: &[Version]) -> Vec<SelectOption> {
        self.admitted_versions(versions)
            .filter_map(|v| v.id.map(|id| SelectOption::new(id.to_string(), version_label(v))))
            .collect()
    }

    fn admitted_versions<'a>(&'a self, versions: &'a [Version]) -> impl Iterator<Item = &'a Version> {
        let draft = &self.list.filters.draft;
        versions.iter().filter(move |v| {
            draft.product.admits_opt(v.product_id.as_ref())
                && draft.module.admits_opt(v.module_id.as_ref())
        })
    }

    /// 选中的版本不再可选时回到 All
    pub fn sync_selected_version(&mut self, versions: &[Version]) -> bool {
        let Filter::Specific(id) = self.selected_version else {
            return false;
        };
        if self.admitted_versions(versions).any(|v| v.id == Some(id)) {
            return false;
        }
        log::debug!("已选版本 {} 不在当前筛选范围内，重置", id);
        self.selected_version = Filter::All;
        true
    }

    pub fn select_version(&mut self, version: Filter<i64>) {
        self.selected_version = version;
        self.list.paging.set_page(1);
    }

    pub fn page(&mut self, items: &[Requirement], dicts: &DictResolver) -> Page<Requirement> {
        let filtered: Vec<Requirement> = apply_filters(items, &self.list.filters.applied, dicts)
            .into_iter()
            .filter(|r| self.selected_version.admits_opt(r.version_id.as_ref()))
            .cloned()
            .collect();
        self.list.paging.slice(&filtered)
    }

    pub fn filter_active(&self) -> bool {
        self.list.filter_active() || !self.selected_version.is_all()
    }
}
