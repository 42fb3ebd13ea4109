// 测试用内存后端：按资源路径保存 JSON 记录，可注入失败

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::domain::{MenuItem, Resource};
use crate::models::dtos::ListQuery;
use crate::services::api_client::{ConsoleApi, MENU_CONFIG_PATH};
use crate::utils::error::{AppError, AppResult};

#[derive(Default)]
struct FakeState {
    tables: HashMap<&'static str, Vec<Value>>,
    next_id: i64,
    menus: Vec<MenuItem>,
    /// 路径 → 所有请求返回的状态码
    failing: HashMap<&'static str, u16>,
    /// 路径 → 接下来若干次 PUT 失败
    failing_updates: HashMap<&'static str, usize>,
    /// 路径 → PUT 总是失败的记录 ID
    failing_rows: HashMap<&'static str, Vec<i64>>,
    /// 每次请求记录 "METHOD PATH"
    calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

/// 创建时后端补齐的默认状态
fn default_status(path: &str) -> Option<&'static str> {
    match path {
        "/api/versions" => Some("PLANNED"),
        "/api/requirements" => Some("DRAFT"),
        "/api/tasks" => Some("TODO"),
        _ => None,
    }
}

fn to_object<P: Serialize>(payload: &P) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::HttpStatus { status: 400 }),
    }
}

fn decode<R: Resource>(value: Value) -> AppResult<R> {
    serde_json::from_value(value).map_err(|e| AppError::NetworkError(e.to_string()))
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 直接写入一条记录（不计入调用日志）
    pub fn seed<R: Resource>(&self, item: &R) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        let id = item.id().unwrap_or(state.next_id);
        state.next_id = state.next_id.max(id);
        let mut value = serde_json::to_value(item).unwrap_or(Value::Null);
        value["id"] = json!(id);
        state.tables.entry(R::PATH).or_default().push(value);
        id
    }

    pub fn seed_menus(&self, menus: Vec<MenuItem>) {
        self.lock().menus = menus;
    }

    pub fn stored_menus(&self) -> Vec<MenuItem> {
        self.lock().menus.clone()
    }

    pub fn fail(&self, path: &'static str, status: u16) {
        self.lock().failing.insert(path, status);
    }

    pub fn recover(&self, path: &'static str) {
        self.lock().failing.remove(path);
    }

    pub fn fail_next_updates(&self, path: &'static str, count: usize) {
        self.lock().failing_updates.insert(path, count);
    }

    pub fn fail_updates_of(&self, path: &'static str, id: i64) {
        self.lock().failing_rows.entry(path).or_default().push(id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn records<R: Resource>(&self) -> Vec<R> {
        self.lock()
            .tables
            .get(R::PATH)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    fn check(state: &mut FakeState, method: &str, path: &'static str) -> AppResult<()> {
        state.calls.push(format!("{} {}", method, path));
        match state.failing.get(path) {
            Some(status) => Err(AppError::HttpStatus { status: *status }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConsoleApi for FakeApi {
    async fn list<R: Resource>(&self, query: &ListQuery) -> AppResult<Vec<R>> {
        let mut state = self.lock();
        Self::check(&mut state, "GET", R::PATH)?;
        let rows = state.tables.get(R::PATH).cloned().unwrap_or_default();
        rows.into_iter()
            .filter(|row| {
                query
                    .product_id
                    .map_or(true, |id| row.get("productId") == Some(&json!(id)))
                    && query
                        .module_id
                        .map_or(true, |id| row.get("moduleId") == Some(&json!(id)))
            })
            .map(decode)
            .collect()
    }

    async fn create<R, P>(&self, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync,
    {
        let mut state = self.lock();
        Self::check(&mut state, "POST", R::PATH)?;
        let mut row = to_object(payload)?;
        state.next_id += 1;
        row.insert("id".to_string(), json!(state.next_id));
        if let Some(status) = default_status(R::PATH) {
            row.entry("status").or_insert_with(|| json!(status));
        }
        let value = Value::Object(row);
        let created = decode::<R>(value.clone())?;
        state.tables.entry(R::PATH).or_default().push(value);
        Ok(created)
    }

    async fn update<R, P>(&self, id: i64, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync,
    {
        let mut state = self.lock();
        Self::check(&mut state, "PUT", R::PATH)?;
        if let Some(remaining) = state.failing_updates.get_mut(R::PATH) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::HttpStatus { status: 503 });
            }
        }
        if state
            .failing_rows
            .get(R::PATH)
            .is_some_and(|ids| ids.contains(&id))
        {
            return Err(AppError::HttpStatus { status: 503 });
        }
        let patch = to_object(payload)?;
        let rows = state.tables.entry(R::PATH).or_default();
        let row = rows
            .iter_mut()
            .find(|row| row.get("id") == Some(&json!(id)))
            .ok_or(AppError::HttpStatus { status: 404 })?;
        if let Value::Object(existing) = &mut *row {
            existing.extend(patch);
        }
        decode(row.clone())
    }

    async fn delete<R: Resource>(&self, id: i64) -> AppResult<()> {
        let mut state = self.lock();
        Self::check(&mut state, "DELETE", R::PATH)?;
        let rows = state.tables.entry(R::PATH).or_default();
        let before = rows.len();
        rows.retain(|row| row.get("id") != Some(&json!(id)));
        if rows.len() == before {
            return Err(AppError::HttpStatus { status: 404 });
        }
        Ok(())
    }

    async fn load_menu_config(&self) -> AppResult<Vec<MenuItem>> {
        let mut state = self.lock();
        Self::check(&mut state, "GET", MENU_CONFIG_PATH)?;
        Ok(state.menus.clone())
    }

    async fn save_menu_config(&self, menus: &[MenuItem]) -> AppResult<()> {
        let mut state = self.lock();
        Self::check(&mut state, "PUT", MENU_CONFIG_PATH)?;
        state.menus = menus.to_vec();
        Ok(())
    }
}
