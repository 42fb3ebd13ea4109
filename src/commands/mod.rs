// ============================================================================
// 视图模型层：页面状态与增删改流程
// ✅ 只能做：组合 services 的纯函数、调用 ConsoleApi、维护本地列表
// ⛔ 禁止：实现过滤、分页、排序等算法（放在 services）
// ============================================================================

pub mod console;
pub mod delete_confirm;
pub mod dicts;
pub mod list_view;
pub mod menus;
pub mod settings;
pub mod store;

pub use console::Console;
