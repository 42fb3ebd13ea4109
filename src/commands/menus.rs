// ============================================================================
// 菜单管理页
// 加载：服务端配置规范化后与默认菜单合并
// 编辑：改名、改图标、同级拖拽，每次编辑触发防抖保存
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::domain::MenuItem;
use crate::services::api_client::ConsoleApi;
use crate::services::icon::svg_to_data_url;
use crate::services::menu_config::{
    default_menus, flat_menus, menu_title, merge_menus, normalize_menus, update_icon, update_label,
};
use crate::services::reorder::{reorder_menus, MenuDrag};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 防抖保存
// ============================================================================

/// 窗口内只发送最后一次编辑；保存失败只记日志
pub struct MenuSaver<A: ConsoleApi> {
    api: Arc<A>,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<A: ConsoleApi> MenuSaver<A> {
    pub fn new(api: Arc<A>, debounce: Duration) -> Self {
        Self {
            api,
            debounce,
            pending: None,
        }
    }

    /// 需在 tokio 运行时内调用
    pub fn schedule(&mut self, menus: Vec<MenuItem>) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let api = Arc::clone(&self.api);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            match api.save_menu_config(&menus).await {
                Ok(()) => log::info!("菜单配置已保存：{} 个顶层节点", menus.len()),
                Err(err) => log::warn!("菜单配置保存失败：{}", err),
            }
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 等待最后一次保存结束
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    log::warn!("菜单保存任务异常退出：{}", err);
                }
            }
        }
    }
}

// ============================================================================
// 页面状态
// ============================================================================

pub struct MenuPage<A: ConsoleApi> {
    menus: Vec<MenuItem>,
    drag: Option<MenuDrag>,
    saver: MenuSaver<A>,
}

impl<A: ConsoleApi> MenuPage<A> {
    pub fn new(api: Arc<A>, debounce: Duration) -> Self {
        Self {
            menus: default_menus(),
            drag: None,
            saver: MenuSaver::new(api, debounce),
        }
    }

    pub fn menus(&self) -> &[MenuItem] {
        &self.menus
    }

    /// 按展示顺序排列的叶子菜单
    pub fn flat(&self) -> Vec<&MenuItem> {
        flat_menus(&self.menus)
    }

    pub fn title(&self, key: &str) -> String {
        menu_title(&self.menus, key)
    }

    pub fn saver_mut(&mut self) -> &mut MenuSaver<A> {
        &mut self.saver
    }

    /// 拉取服务端配置；失败或为空时沿用默认菜单
    pub async fn load(&mut self, api: &A) {
        match api.load_menu_config().await {
            Ok(server) if !server.is_empty() => {
                let normalized = normalize_menus(server);
                self.menus = merge_menus(&default_menus(), &normalized);
                log::info!("菜单配置已加载：{} 个顶层节点", self.menus.len());
            }
            Ok(_) => {
                self.menus = default_menus();
            }
            Err(err) => {
                log::warn!("菜单配置加载失败，使用默认菜单：{}", err);
                self.menus = default_menus();
            }
        }
    }

    fn changed(&mut self) {
        self.saver.schedule(self.menus.clone());
    }

    pub fn rename(&mut self, key: &str, parent_key: Option<&str>, label: &str) -> AppResult<()> {
        if label.trim().is_empty() {
            return Err(AppError::validation("请输入菜单名称"));
        }
        if !update_label(&mut self.menus, key, parent_key, label) {
            return Err(AppError::NotFound(format!("菜单 {}", key)));
        }
        self.changed();
        Ok(())
    }

    /// 用 SVG 文本设置自定义图标
    pub fn set_icon_svg(&mut self, key: &str, parent_key: Option<&str>, svg: &str) -> AppResult<()> {
        let data_url = svg_to_data_url(svg)?;
        if !update_icon(&mut self.menus, key, parent_key, Some(data_url)) {
            return Err(AppError::NotFound(format!("菜单 {}", key)));
        }
        self.changed();
        Ok(())
    }

    /// 恢复默认图标
    pub fn clear_icon(&mut self, key: &str, parent_key: Option<&str>) -> AppResult<()> {
        if !update_icon(&mut self.menus, key, parent_key, None) {
            return Err(AppError::NotFound(format!("菜单 {}", key)));
        }
        self.changed();
        Ok(())
    }

    pub fn start_drag(&mut self, key: &str, parent_key: Option<&str>) {
        self.drag = Some(MenuDrag {
            key: key.to_string(),
            parent_key: parent_key.map(str::to_string),
        });
    }

    /// 放下拖拽节点，返回顺序是否变化
    pub fn drop_on(&mut self, target_key: &str, target_parent: Option<&str>) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        match reorder_menus(&self.menus, &drag, target_key, target_parent) {
            Some(next) => {
                self.menus = next;
                self.changed();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake_api::FakeApi;
    use crate::services::menu_config::{PRODUCT_GROUP_KEY, SYSTEM_GROUP_KEY};

    fn page(api: &Arc<FakeApi>) -> MenuPage<FakeApi> {
        MenuPage::new(Arc::clone(api), Duration::from_millis(20))
    }

    fn keys(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|m| m.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_normalizes_and_merges() {
        let api = Arc::new(FakeApi::new());
        // 旧数据：分组 key 与子节点 "products" 冲突，且缺少 system 分组
        let mut legacy: Vec<MenuItem> = default_menus()
            .into_iter()
            .filter(|m| m.key != SYSTEM_GROUP_KEY)
            .collect();
        if let Some(group) = legacy.iter_mut().find(|m| m.key == PRODUCT_GROUP_KEY) {
            group.key = "products".to_string();
            group.label = "产品线".to_string();
        }
        api.seed_menus(legacy);

        let mut page = page(&api);
        page.load(&*api).await;
        let menus = page.menus();
        let group = menus.iter().find(|m| m.key == PRODUCT_GROUP_KEY).unwrap();
        assert_eq!(group.label, "产品线");
        assert_eq!(menus.last().map(|m| m.key.as_str()), Some(SYSTEM_GROUP_KEY));
    }

    #[tokio::test]
    async fn test_load_failure_uses_defaults() {
        let api = Arc::new(FakeApi::new());
        api.fail("/api/menu-config", 500);
        let mut page = page(&api);
        page.load(&*api).await;
        assert_eq!(page.menus(), default_menus().as_slice());
    }

    #[tokio::test]
    async fn test_rapid_edits_are_debounced() {
        let api = Arc::new(FakeApi::new());
        let mut page = page(&api);
        page.rename("overview", None, "总览").unwrap();
        page.rename("overview", None, "首页").unwrap();
        page.rename("tasks", None, "任务中心").unwrap();
        assert!(page.saver_mut().is_pending());
        page.saver_mut().flush().await;

        assert_eq!(api.count_calls("PUT /api/menu-config"), 1);
        let stored = api.stored_menus();
        assert_eq!(stored[0].label, "首页");
        assert_eq!(stored[0].title, "首页");
        assert_eq!(page.title("tasks"), "任务中心");
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let api = Arc::new(FakeApi::new());
        api.fail("/api/menu-config", 503);
        let mut page = page(&api);
        page.rename("reports", None, "报表").unwrap();
        page.saver_mut().flush().await;
        assert_eq!(api.count_calls("PUT /api/menu-config"), 1);
        assert_eq!(page.title("reports"), "报表");
    }

    #[tokio::test]
    async fn test_drag_within_group_only() {
        let api = Arc::new(FakeApi::new());
        let mut page = page(&api);

        page.start_drag("versions", Some(PRODUCT_GROUP_KEY));
        assert!(page.drop_on("products", Some(PRODUCT_GROUP_KEY)));
        let group = page
            .menus()
            .iter()
            .find(|m| m.key == PRODUCT_GROUP_KEY)
            .and_then(|m| m.children.as_deref())
            .unwrap();
        assert_eq!(keys(group), vec!["versions", "products", "modules"]);

        page.start_drag("dicts", Some(SYSTEM_GROUP_KEY));
        assert!(!page.drop_on("overview", None));
        // 没有进行中的拖拽
        assert!(!page.drop_on("overview", None));
        page.saver_mut().flush().await;
    }

    #[tokio::test]
    async fn test_icon_from_svg() {
        let api = Arc::new(FakeApi::new());
        let mut page = page(&api);
        assert!(page.set_icon_svg("overview", None, "not svg").is_err());
        page.set_icon_svg("overview", None, "<svg><path d='M0 0'/></svg>")
            .unwrap();
        let icon = page.menus()[0].icon_data_url.clone().unwrap();
        assert!(icon.starts_with("data:image/svg+xml;base64,"));

        page.clear_icon("overview", None).unwrap();
        assert!(page.menus()[0].icon_data_url.is_none());
        assert!(matches!(
            page.clear_icon("missing", None),
            Err(AppError::NotFound(_))
        ));
        page.saver_mut().flush().await;
    }
}
