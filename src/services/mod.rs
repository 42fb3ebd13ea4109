// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：除 api_client 外不做 I/O，方便写 #[test]
// ⛔ 禁止：持有页面状态
// ============================================================================

pub mod api_client;
pub mod dict_resolver;
#[cfg(test)]
pub mod fake_api;
pub mod filter;
pub mod icon;
pub mod menu_config;
pub mod module_tree;
pub mod paginator;
pub mod reorder;
pub mod stats;
