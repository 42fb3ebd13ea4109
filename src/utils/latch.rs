// ============================================================================
// 提交闩锁：同一时刻最多一个提交在进行
// 使用 scopeguard 保证任何退出路径（成功、失败、提前返回）都会释放
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 闩锁守卫，离开作用域时自动释放
pub type SubmitGuard = scopeguard::ScopeGuard<Arc<AtomicBool>, fn(Arc<AtomicBool>)>;

fn release(flag: Arc<AtomicBool>) {
    flag.store(false, Ordering::Release);
}

/// 对应界面上的 "submitting" 标记
#[derive(Debug, Clone, Default)]
pub struct SubmitLatch {
    flag: Arc<AtomicBool>,
}

impl SubmitLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试占用闩锁；已被占用时返回 None
    pub fn try_acquire(&self) -> Option<SubmitGuard> {
        if self
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(scopeguard::guard(
            Arc::clone(&self.flag),
            release as fn(Arc<AtomicBool>),
        ))
    }

    pub fn is_held(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
