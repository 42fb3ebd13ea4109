// ============================================================================
// 删除确认
// 同一时刻最多一个待确认的删除；提交期间不可关闭、不可重复提交
// ============================================================================

use serde::Serialize;

use crate::commands::store::Stores;
use crate::models::domain::EntityKind;
use crate::services::stats::{product_label, version_label};
use crate::utils::error::{AppError, AppResult};
use crate::utils::latch::{SubmitGuard, SubmitLatch};

/// 待确认的删除目标
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingDelete {
    pub kind: EntityKind,
    pub id: i64,
    pub label: String,
}

/// 确认框中展示的目标名称；本地找不到时显示 "ID: {id}"
pub fn delete_label(stores: &Stores, kind: EntityKind, id: i64) -> String {
    let label = match kind {
        EntityKind::Product => stores.products.find(id).map(product_label),
        EntityKind::Module => stores
            .modules
            .find(id)
            .map(|m| format!("{} · {}", m.code, m.name)),
        EntityKind::Version => stores.versions.find(id).map(version_label),
        EntityKind::Requirement => stores
            .requirements
            .find(id)
            .map(|r| format!("{} · {}", r.code, r.name)),
        EntityKind::Task => stores.tasks.find(id).map(|t| t.title.clone()),
        EntityKind::Dict => stores
            .dicts
            .find(id)
            .map(|d| format!("{} · {}", d.dict_code, d.dict_label)),
    };
    label.unwrap_or_else(|| format!("ID: {}", id))
}

#[derive(Debug, Default)]
pub struct DeleteConfirm {
    pending: Option<PendingDelete>,
    latch: SubmitLatch,
}

impl DeleteConfirm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingDelete> {
        self.pending.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.latch.is_held()
    }

    /// 打开确认框；提交进行中时不替换当前目标
    pub fn open(&mut self, stores: &Stores, kind: EntityKind, id: i64) -> AppResult<&PendingDelete> {
        if self.is_submitting() {
            return Err(AppError::Busy);
        }
        let label = delete_label(stores, kind, id);
        Ok(self.pending.insert(PendingDelete { kind, id, label }))
    }

    /// 关闭确认框，提交进行中时拒绝
    pub fn close(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.pending = None;
        true
    }

    /// 占用提交闩锁并取出目标；确认框保持打开直到删除成功
    pub fn begin(&self) -> AppResult<(PendingDelete, SubmitGuard)> {
        let pending = self
            .pending
            .clone()
            .ok_or_else(|| AppError::NotFound("待删除记录".to_string()))?;
        let guard = self.latch.try_acquire().ok_or(AppError::Busy)?;
        Ok((pending, guard))
    }

    /// 删除成功后关闭
    pub fn finish(&mut self, guard: SubmitGuard) {
        drop(guard);
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{Product, ProductStatus, TaskItem};

    fn stores() -> Stores {
        let mut stores = Stores::default();
        stores.products.insert(Product {
            id: Some(1),
            code: "P1".to_string(),
            name: "Demo".to_string(),
            owner: "Alice".to_string(),
            status: ProductStatus::Active,
            description: None,
        });
        stores.tasks.insert(TaskItem {
            id: Some(9),
            product_id: Some(1),
            module_id: None,
            requirement_id: None,
            title: "联调接口".to_string(),
            description: None,
            assignee: "Bob".to_string(),
            status: "TODO".to_string(),
            due_date: None,
            estimate_hours: None,
        });
        stores
    }

    #[test]
    fn test_labels() {
        let stores = stores();
        assert_eq!(delete_label(&stores, EntityKind::Product, 1), "P1 · Demo");
        assert_eq!(delete_label(&stores, EntityKind::Task, 9), "联调接口");
        assert_eq!(delete_label(&stores, EntityKind::Version, 3), "ID: 3");
    }

    #[test]
    fn test_close_refused_while_submitting() {
        let stores = stores();
        let mut confirm = DeleteConfirm::new();
        confirm.open(&stores, EntityKind::Product, 1).unwrap();

        let (pending, guard) = confirm.begin().unwrap();
        assert_eq!(pending.id, 1);
        assert!(confirm.is_submitting());
        assert!(matches!(confirm.begin(), Err(AppError::Busy)));
        assert!(!confirm.close());
        assert!(matches!(
            confirm.open(&stores, EntityKind::Task, 9),
            Err(AppError::Busy)
        ));

        // 失败路径：守卫释放后确认框仍然打开
        drop(guard);
        assert!(!confirm.is_submitting());
        assert_eq!(confirm.pending().map(|p| p.id), Some(1));

        let (_, guard) = confirm.begin().unwrap();
        confirm.finish(guard);
        assert!(confirm.pending().is_none());
    }

    #[test]
    fn test_begin_without_target() {
        let confirm = DeleteConfirm::new();
        assert!(matches!(confirm.begin(), Err(AppError::NotFound(_))));
    }
}
