// ============================================================================
// 控制台视图模型
// 持有实体列表、派生状态（模块树、字典解析）和各页面状态
// ✅ 只能做：编排 API 调用与本地状态更新
// ⛔ 禁止：直接拼接 HTTP 请求、实现过滤/分页算法
// ============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::commands::delete_confirm::{DeleteConfirm, PendingDelete};
use crate::commands::dicts::DictPage;
use crate::commands::list_view::{ListView, RequirementView};
use crate::commands::menus::MenuPage;
use crate::commands::settings::SettingsPage;
use crate::commands::store::{EntityList, Stores};
use crate::config::ConsoleConfig;
use crate::database::Database;
use crate::models::domain::{
    DictItem, DictType, EntityKind, Product, ProductModule, Requirement, Resource, TaskItem,
    Version,
};
use crate::models::dtos::{ListQuery, Page, SelectOption};
use crate::models::forms::{
    DictForm, FormMode, ModuleForm, OpenForm, ProductForm, RequirementForm, TaskForm,
    VersionForm,
};
use crate::services::api_client::ConsoleApi;
use crate::services::dict_resolver::DictResolver;
use crate::services::filter::{
    Filter, ModuleCriteria, ProductCriteria, TaskCriteria, VersionCriteria,
};
use crate::services::module_tree::ModuleTree;
use crate::services::stats::{overview_stats, product_label, OverviewStats};
use crate::utils::error::{AppError, AppResult};
use crate::utils::latch::SubmitLatch;

pub struct Console<A: ConsoleApi> {
    api: Arc<A>,
    config: ConsoleConfig,
    pub stores: Stores,

    // 派生状态，按列表 revision 懒重建
    tree: ModuleTree,
    tree_revision: Option<u64>,
    dicts: DictResolver,
    dict_revision: Option<u64>,

    pub product_view: ListView<ProductCriteria>,
    pub module_view: ListView<ModuleCriteria>,
    pub version_view: ListView<VersionCriteria>,
    pub requirement_view: RequirementView,
    pub task_view: ListView<TaskCriteria>,
    pub dict_page: DictPage,
    pub menu_page: MenuPage<A>,
    pub delete_confirm: DeleteConfirm,
    pub settings: SettingsPage,

    // 已打开的弹窗，字典启用项变化时随之校正
    pub version_form: Option<OpenForm<VersionForm>>,
    pub requirement_form: Option<OpenForm<RequirementForm>>,
    pub task_form: Option<OpenForm<TaskForm>>,

    /// 新建/编辑弹窗的提交闩锁
    form_latch: SubmitLatch,
}

impl<A: ConsoleApi> Console<A> {
    pub fn new(api: Arc<A>, config: ConsoleConfig, db: Database) -> AppResult<Self> {
        let size = config.default_page_size;
        let mut console = Self {
            menu_page: MenuPage::new(Arc::clone(&api), config.menu_save_debounce()),
            dict_page: DictPage::new(config.reorder.clone()),
            settings: SettingsPage::open(db)?,
            api,
            stores: Stores::default(),
            tree: ModuleTree::default(),
            tree_revision: None,
            dicts: DictResolver::default(),
            dict_revision: None,
            product_view: ListView::new(size),
            module_view: ListView::new(size),
            version_view: ListView::new(size),
            requirement_view: RequirementView::new(size),
            task_view: ListView::new(size),
            delete_confirm: DeleteConfirm::new(),
            version_form: None,
            requirement_form: None,
            task_form: None,
            form_latch: SubmitLatch::new(),
            config,
        };
        console.sync_derived();
        Ok(console)
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn dicts(&self) -> &DictResolver {
        &self.dicts
    }

    pub fn module_tree(&self) -> &ModuleTree {
        &self.tree
    }

    pub fn is_submitting(&self) -> bool {
        self.form_latch.is_held()
    }

    // ========================================================================
    // 加载
    // ========================================================================

    async fn fetch<R: Resource>(api: &A, store: &mut EntityList<R>, query: &ListQuery) -> bool {
        let ticket = store.begin_fetch();
        let result = api.list::<R>(query).await;
        store.finish_fetch(ticket, result)
    }

    /// 六个列表并发加载，各自记录成功或失败
    pub async fn refresh_all(&mut self) {
        let api = Arc::clone(&self.api);
        let query = ListQuery::default();
        let stores = &mut self.stores;
        futures::join!(
            Self::fetch(&*api, &mut stores.products, &query),
            Self::fetch(&*api, &mut stores.modules, &query),
            Self::fetch(&*api, &mut stores.versions, &query),
            Self::fetch(&*api, &mut stores.requirements, &query),
            Self::fetch(&*api, &mut stores.tasks, &query),
            Self::fetch(&*api, &mut stores.dicts, &query),
        );
        self.sync_derived();
    }

    pub async fn refresh_versions(&mut self, query: &ListQuery) {
        Self::fetch(&*self.api, &mut self.stores.versions, query).await;
        self.sync_derived();
    }

    pub async fn refresh_requirements(&mut self, query: &ListQuery) {
        Self::fetch(&*self.api, &mut self.stores.requirements, query).await;
        self.sync_derived();
    }

    pub async fn refresh_tasks(&mut self, query: &ListQuery) {
        Self::fetch(&*self.api, &mut self.stores.tasks, query).await;
        self.sync_derived();
    }

    pub async fn refresh_dicts(&mut self) {
        Self::fetch(&*self.api, &mut self.stores.dicts, &ListQuery::default()).await;
        self.sync_derived();
    }

    pub async fn load_menus(&mut self) {
        self.menu_page.load(&*self.api).await;
    }

    /// 列表变化后重建模块树、字典解析，并校正失效的筛选项
    fn sync_derived(&mut self) {
        let module_revision = self.stores.modules.revision();
        if self.tree_revision != Some(module_revision) {
            self.tree = ModuleTree::build(self.stores.modules.items());
            self.tree_revision = Some(module_revision);
        }

        let dict_revision = self.stores.dicts.revision();
        if self.dict_revision != Some(dict_revision) {
            self.dicts = DictResolver::new(self.stores.dicts.items());
            self.dict_revision = Some(dict_revision);
            self.version_view.filters.sync_labels(&self.dicts);
            self.requirement_view.list.filters.sync_labels(&self.dicts);
            self.task_view.filters.sync_labels(&self.dicts);
            if let Some(open) = self.version_form.as_mut() {
                open.form.sync_dicts(&self.dicts);
            }
            if let Some(open) = self.requirement_form.as_mut() {
                open.form.sync_dicts(&self.dicts);
            }
            if let Some(open) = self.task_form.as_mut() {
                open.form.sync_dicts(&self.dicts);
            }
        }

        self.requirement_view
            .sync_selected_version(self.stores.versions.items());
    }

    // ========================================================================
    // 列表页
    // ========================================================================

    pub fn product_page(&mut self) -> Page<Product> {
        self.product_view.page(self.stores.products.items(), &self.dicts)
    }

    pub fn module_page(&mut self) -> Page<ProductModule> {
        self.module_view.page(self.stores.modules.items(), &self.dicts)
    }

    pub fn version_page(&mut self) -> Page<Version> {
        self.version_view.page(self.stores.versions.items(), &self.dicts)
    }

    pub fn requirement_page(&mut self) -> Page<Requirement> {
        self.requirement_view
            .page(self.stores.requirements.items(), &self.dicts)
    }

    pub fn task_page(&mut self) -> Page<TaskItem> {
        self.task_view.page(self.stores.tasks.items(), &self.dicts)
    }

    pub fn dict_items(&self) -> Vec<DictItem> {
        self.dict_page.items(&self.dicts)
    }

    pub fn overview(&self) -> OverviewStats {
        overview_stats(
            self.stores.versions.items(),
            self.stores.requirements.items(),
            self.stores.tasks.items(),
        )
    }

    /// 下拉选择立即生效；切换产品时清空下级筛选
    pub fn select_version_product(&mut self, product: Filter<i64>) {
        self.version_view
            .filters
            .commit(|c| c.select_product(product.clone()));
        self.version_view.paging.set_page(1);
    }

    pub fn select_requirement_product(&mut self, product: Filter<i64>) {
        self.requirement_view
            .list
            .filters
            .commit(|c| c.select_product(product.clone()));
        self.requirement_view.list.paging.set_page(1);
        self.requirement_view
            .sync_selected_version(self.stores.versions.items());
    }

    pub fn select_requirement_module(&mut self, module: Filter<i64>) {
        self.requirement_view
            .list
            .filters
            .commit(|c| c.select_module(module.clone()));
        self.requirement_view.list.paging.set_page(1);
        self.requirement_view
            .sync_selected_version(self.stores.versions.items());
    }

    pub fn select_task_product(&mut self, product: Filter<i64>) {
        self.task_view
            .filters
            .commit(|c| c.select_product(product.clone()));
        self.task_view.paging.set_page(1);
    }

    // ========================================================================
    // 下拉选项与展示文案
    // ========================================================================

    pub fn product_options(&self) -> Vec<SelectOption> {
        self.stores
            .products
            .items()
            .iter()
            .filter_map(|p| p.id.map(|id| SelectOption::new(id.to_string(), product_label(p))))
            .collect()
    }

    pub fn product_label(&self, id: Option<i64>) -> String {
        id.and_then(|id| self.stores.products.find(id))
            .map(product_label)
            .unwrap_or_default()
    }

    pub fn module_options(&self, product: &Filter<i64>) -> Vec<SelectOption> {
        self.tree.module_options(product)
    }

    pub fn module_label(&self, id: Option<i64>) -> String {
        id.map(|id| self.tree.label(id)).unwrap_or_default()
    }

    pub fn parent_options(&self, product_id: Option<i64>, level: u8) -> Vec<SelectOption> {
        self.tree.parent_options(product_id, level)
    }

    pub fn requirement_version_options(&self, form: &RequirementForm) -> Vec<SelectOption> {
        form.version_options(self.stores.versions.items())
    }

    pub fn dict_label(&self, dict_type: DictType, code: &str) -> String {
        self.dicts.label_of(dict_type, code)
    }

    // ========================================================================
    // 表单
    // ========================================================================

    pub fn new_module_form(&self) -> ModuleForm {
        let draft = &self.module_view.filters.draft;
        ModuleForm::prefill(draft.product.specific().copied())
    }

    pub fn new_version_form(&self) -> VersionForm {
        let mut form = VersionForm::prefill(&self.version_view.filters.draft);
        form.sync_dicts(&self.dicts);
        form
    }

    pub fn new_requirement_form(&self) -> RequirementForm {
        let mut form = RequirementForm::prefill(&self.requirement_view.list.filters.draft);
        form.sync_dicts(&self.dicts);
        form
    }

    pub fn new_task_form(&self) -> TaskForm {
        let mut form = TaskForm::prefill(&self.task_view.filters.draft);
        form.sync_dicts(&self.dicts);
        form
    }

    pub fn new_dict_form(&self) -> DictForm {
        DictForm::prefill(self.dict_page.dict_type, &self.dicts)
    }

    fn find<R: Resource>(store: &EntityList<R>, id: i64) -> AppResult<&R> {
        store
            .find(id)
            .ok_or_else(|| AppError::NotFound(R::NAME.to_string()))
    }

    pub fn edit_product_form(&self, id: i64) -> AppResult<ProductForm> {
        Self::find(&self.stores.products, id).map(ProductForm::from_entity)
    }

    pub fn edit_module_form(&self, id: i64) -> AppResult<ModuleForm> {
        Self::find(&self.stores.modules, id).map(ModuleForm::from_entity)
    }

    pub fn edit_version_form(&self, id: i64) -> AppResult<VersionForm> {
        let mut form = VersionForm::from_entity(Self::find(&self.stores.versions, id)?);
        form.sync_dicts(&self.dicts);
        Ok(form)
    }

    pub fn edit_requirement_form(&self, id: i64) -> AppResult<RequirementForm> {
        let mut form = RequirementForm::from_entity(Self::find(&self.stores.requirements, id)?);
        form.sync_dicts(&self.dicts);
        Ok(form)
    }

    pub fn edit_task_form(&self, id: i64) -> AppResult<TaskForm> {
        let mut form = TaskForm::from_entity(Self::find(&self.stores.tasks, id)?);
        form.sync_dicts(&self.dicts);
        Ok(form)
    }

    pub fn edit_dict_form(&self, id: i64) -> AppResult<DictForm> {
        Self::find(&self.stores.dicts, id).map(DictForm::from_entity)
    }

    // ========================================================================
    // 弹窗：打开后由控制台持有草稿，提交成功才关闭
    // ========================================================================

    pub fn open_version_form(&mut self, mode: FormMode) -> AppResult<&mut VersionForm> {
        let form = match mode {
            FormMode::Create => self.new_version_form(),
            FormMode::Edit(id) => self.edit_version_form(id)?,
        };
        Ok(&mut self.version_form.insert(OpenForm { mode, form }).form)
    }

    pub fn open_requirement_form(&mut self, mode: FormMode) -> AppResult<&mut RequirementForm> {
        let form = match mode {
            FormMode::Create => self.new_requirement_form(),
            FormMode::Edit(id) => self.edit_requirement_form(id)?,
        };
        Ok(&mut self.requirement_form.insert(OpenForm { mode, form }).form)
    }

    pub fn open_task_form(&mut self, mode: FormMode) -> AppResult<&mut TaskForm> {
        let form = match mode {
            FormMode::Create => self.new_task_form(),
            FormMode::Edit(id) => self.edit_task_form(id)?,
        };
        Ok(&mut self.task_form.insert(OpenForm { mode, form }).form)
    }

    /// 关闭所有弹窗；提交中不可关闭
    pub fn close_forms(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.version_form = None;
        self.requirement_form = None;
        self.task_form = None;
        true
    }

    pub async fn submit_version_form(&mut self) -> AppResult<Version> {
        let open = self
            .version_form
            .clone()
            .ok_or_else(|| AppError::NotFound("版本表单".to_string()))?;
        let saved = self.save_version(open.mode, &open.form).await?;
        self.version_form = None;
        Ok(saved)
    }

    pub async fn submit_requirement_form(&mut self) -> AppResult<Requirement> {
        let open = self
            .requirement_form
            .clone()
            .ok_or_else(|| AppError::NotFound("需求表单".to_string()))?;
        let saved = self.save_requirement(open.mode, &open.form).await?;
        self.requirement_form = None;
        Ok(saved)
    }

    pub async fn submit_task_form(&mut self) -> AppResult<TaskItem> {
        let open = self
            .task_form
            .clone()
            .ok_or_else(|| AppError::NotFound("任务表单".to_string()))?;
        let saved = self.save_task(open.mode, &open.form).await?;
        self.task_form = None;
        Ok(saved)
    }

    // ========================================================================
    // 保存：校验通过后请求后端，成功后写回列表
    // ========================================================================

    async fn persist<R, P>(
        api: &A,
        store: &mut EntityList<R>,
        mode: FormMode,
        payload: &P,
    ) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync,
    {
        let result = match mode {
            FormMode::Create => api.create::<R, P>(payload).await,
            FormMode::Edit(id) => api.update::<R, P>(id, payload).await,
        };
        let saved = result.map_err(|err| {
            log::warn!("{}保存失败：{}", R::NAME, err);
            err
        })?;
        match mode {
            FormMode::Create => {
                log::info!("{}已创建（ID: {:?}）", R::NAME, saved.id());
                store.insert(saved.clone());
            }
            FormMode::Edit(id) => {
                log::info!("{}已更新（ID: {}）", R::NAME, id);
                store.replace(saved.clone());
            }
        }
        Ok(saved)
    }

    pub async fn save_product(&mut self, mode: FormMode, form: &ProductForm) -> AppResult<Product> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = match mode {
            FormMode::Create => form.create_payload()?,
            FormMode::Edit(_) => form.update_payload(),
        };
        Self::persist(&*self.api, &mut self.stores.products, mode, &payload).await
    }

    pub async fn save_module(&mut self, mode: FormMode, form: &ModuleForm) -> AppResult<ProductModule> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = match mode {
            FormMode::Create => form.create_payload()?,
            FormMode::Edit(_) => form.update_payload(),
        };
        if let Some(product_id) = payload.product_id {
            self.tree
                .validate_hierarchy(product_id, payload.parent_id, form.level)?;
        }
        let saved = Self::persist(&*self.api, &mut self.stores.modules, mode, &payload).await?;
        self.sync_derived();
        Ok(saved)
    }

    pub async fn save_version(&mut self, mode: FormMode, form: &VersionForm) -> AppResult<Version> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = match mode {
            FormMode::Create => form.create_payload()?,
            FormMode::Edit(_) => form.update_payload()?,
        };
        let saved = Self::persist(&*self.api, &mut self.stores.versions, mode, &payload).await?;
        self.sync_derived();
        Ok(saved)
    }

    pub async fn save_requirement(
        &mut self,
        mode: FormMode,
        form: &RequirementForm,
    ) -> AppResult<Requirement> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = match mode {
            FormMode::Create => form.create_payload()?,
            FormMode::Edit(_) => form.update_payload()?,
        };
        Self::persist(&*self.api, &mut self.stores.requirements, mode, &payload).await
    }

    pub async fn save_task(&mut self, mode: FormMode, form: &TaskForm) -> AppResult<TaskItem> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = match mode {
            FormMode::Create => form.create_payload()?,
            FormMode::Edit(_) => form.update_payload()?,
        };
        Self::persist(&*self.api, &mut self.stores.tasks, mode, &payload).await
    }

    pub async fn save_dict(&mut self, mode: FormMode, form: &DictForm) -> AppResult<DictItem> {
        let _guard = self.form_latch.try_acquire().ok_or(AppError::Busy)?;
        let payload = form.payload()?;
        let saved = Self::persist(&*self.api, &mut self.stores.dicts, mode, &payload).await?;
        self.sync_derived();
        Ok(saved)
    }

    // ========================================================================
    // 删除与排序
    // ========================================================================

    pub fn request_delete(&mut self, kind: EntityKind, id: i64) -> AppResult<PendingDelete> {
        self.delete_confirm.open(&self.stores, kind, id).cloned()
    }

    pub fn cancel_delete(&mut self) -> bool {
        self.delete_confirm.close()
    }

    async fn remove_remote<R: Resource>(api: &A, store: &mut EntityList<R>, id: i64) -> AppResult<()> {
        api.delete::<R>(id).await?;
        store.remove(id);
        log::info!("{}已删除（ID: {}）", R::NAME, id);
        Ok(())
    }

    /// 确认删除；失败时确认框保持打开，可重试
    pub async fn confirm_delete(&mut self) -> AppResult<()> {
        let (pending, guard) = self.delete_confirm.begin()?;
        let api = &*self.api;
        let stores = &mut self.stores;
        let id = pending.id;
        let result = match pending.kind {
            EntityKind::Product => Self::remove_remote(api, &mut stores.products, id).await,
            EntityKind::Module => Self::remove_remote(api, &mut stores.modules, id).await,
            EntityKind::Version => Self::remove_remote(api, &mut stores.versions, id).await,
            EntityKind::Requirement => {
                Self::remove_remote(api, &mut stores.requirements, id).await
            }
            EntityKind::Task => Self::remove_remote(api, &mut stores.tasks, id).await,
            EntityKind::Dict => Self::remove_remote(api, &mut stores.dicts, id).await,
        };
        match result {
            Ok(()) => {
                self.delete_confirm.finish(guard);
                self.sync_derived();
                Ok(())
            }
            Err(err) => {
                log::warn!("删除{}失败：{}", pending.label, err);
                Err(err)
            }
        }
    }

    /// 字典拖拽排序
    pub async fn reorder_dicts(&mut self, source_id: i64, target_id: i64) -> AppResult<bool> {
        let result = self
            .dict_page
            .reorder(&*self.api, &mut self.stores.dicts, source_id, target_id)
            .await;
        self.sync_derived();
        result
    }
}
