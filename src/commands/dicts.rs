// ============================================================================
// 字典管理页
// 拖拽排序两阶段提交：先改本地顺序，再并发持久化；
// 重试耗尽后回滚本地顺序，补发原顺序，并返回 ReorderReverted
// ============================================================================

use futures::future::{join_all, try_join_all};

use crate::commands::store::EntityList;
use crate::config::ReorderConfig;
use crate::models::domain::{DictItem, DictType};
use crate::models::dtos::DictPayload;
use crate::services::api_client::ConsoleApi;
use crate::services::dict_resolver::DictResolver;
use crate::services::reorder::{apply_dict_order, reorder_dict_items};
use crate::utils::error::{AppError, AppResult};
use crate::utils::latch::SubmitLatch;

#[derive(Debug)]
pub struct DictPage {
    /// 当前查看的字典类型
    pub dict_type: DictType,
    reorder: ReorderConfig,
    latch: SubmitLatch,
}

impl DictPage {
    pub fn new(reorder: ReorderConfig) -> Self {
        Self {
            dict_type: DictType::RequirementStatus,
            reorder,
            latch: SubmitLatch::new(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.latch.is_held()
    }

    /// 当前类型的条目，按 sortOrder 排序
    pub fn items(&self, dicts: &DictResolver) -> Vec<DictItem> {
        dicts
            .items_of_type(self.dict_type)
            .into_iter()
            .cloned()
            .collect()
    }

    /// 把 source 拖到 target 的位置并持久化
    ///
    /// 无变化时返回 `Ok(false)`；持久化成功返回 `Ok(true)`。
    pub async fn reorder<A: ConsoleApi>(
        &self,
        api: &A,
        store: &mut EntityList<DictItem>,
        source_id: i64,
        target_id: i64,
    ) -> AppResult<bool> {
        let _guard = self.latch.try_acquire().ok_or(AppError::Busy)?;

        let mut current: Vec<DictItem> = store
            .items()
            .iter()
            .filter(|item| item.dict_type == self.dict_type)
            .cloned()
            .collect();
        current.sort_by_key(|item| item.sort_order);
        let Some(next) = reorder_dict_items(&current, source_id, target_id) else {
            return Ok(false);
        };

        // 第一阶段：本地生效
        let snapshot = store.items().to_vec();
        store.update_items(|all| apply_dict_order(all, &next));

        // 第二阶段：持久化，失败按退避重试
        let payloads: Vec<(i64, DictPayload)> = next
            .iter()
            .filter_map(|item| item.id.map(|id| (id, DictPayload::from(item))))
            .collect();
        let max_attempts = self.reorder.max_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=max_attempts {
            let result = try_join_all(
                payloads
                    .iter()
                    .map(|(id, payload)| api.update::<DictItem, DictPayload>(*id, payload)),
            )
            .await;
            match result {
                Ok(saved) => {
                    store.update_items(|all| apply_dict_order(all, &saved));
                    log::info!(
                        "{}排序已保存：{} 项（第 {} 次尝试）",
                        self.dict_type.display_name(),
                        saved.len(),
                        attempt
                    );
                    return Ok(true);
                }
                Err(err) => {
                    log::warn!(
                        "{}排序保存失败（第 {}/{} 次）：{}",
                        self.dict_type.display_name(),
                        attempt,
                        max_attempts,
                        err
                    );
                    last_error = Some(err);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.reorder.backoff(attempt)).await;
                    }
                }
            }
        }

        store.set_items(snapshot);
        let mut reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        let unrestored = self.restore_remote(api, &current, &next).await;
        if unrestored > 0 {
            reason = format!("{}；{} 项服务端顺序可能与本地不一致", reason, unrestored);
        }
        log::warn!("{}排序已回滚：{}", self.dict_type.display_name(), reason);
        Err(AppError::ReorderReverted(reason))
    }

    /// 部分请求可能已落库：把顺序有变化的条目按原 sortOrder 补发一次
    ///
    /// 尽力而为，返回补发失败的条目数。
    async fn restore_remote<A: ConsoleApi>(
        &self,
        api: &A,
        original: &[DictItem],
        attempted: &[DictItem],
    ) -> usize {
        let payloads: Vec<(i64, DictPayload)> = original
            .iter()
            .filter(|item| {
                attempted
                    .iter()
                    .any(|next| next.id == item.id && next.sort_order != item.sort_order)
            })
            .filter_map(|item| item.id.map(|id| (id, DictPayload::from(item))))
            .collect();
        let results = join_all(
            payloads
                .iter()
                .map(|(id, payload)| api.update::<DictItem, DictPayload>(*id, payload)),
        )
        .await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!(
                "{}原顺序补发失败：{}/{} 项",
                self.dict_type.display_name(),
                failed,
                payloads.len()
            );
        }
        failed
    }
}
