// ============================================================================
// 后端 REST 客户端
// ✅ 只能做：HTTP 请求、JSON 编解码、状态码检查
// ⛔ 禁止：持有列表状态、做筛选分页
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::domain::{MenuItem, Resource};
use crate::models::dtos::ListQuery;
use crate::utils::error::{AppError, AppResult};

/// 菜单配置端点
pub const MENU_CONFIG_PATH: &str = "/api/menu-config";

/// 控制台依赖的后端接口
///
/// 所有非 2xx 响应统一视为失败，只保留状态码，不解析错误体。
#[async_trait]
pub trait ConsoleApi: Send + Sync + 'static {
    /// `GET {PATH}[?productId=&moduleId=]`
    async fn list<R: Resource>(&self, query: &ListQuery) -> AppResult<Vec<R>>;

    /// `POST {PATH}`，返回创建后的实体
    async fn create<R, P>(&self, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync;

    /// `PUT {PATH}/{id}`，返回更新后的实体
    async fn update<R, P>(&self, id: i64, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync;

    /// `DELETE {PATH}/{id}`，无响应体
    async fn delete<R: Resource>(&self, id: i64) -> AppResult<()>;

    /// `GET /api/menu-config`
    async fn load_menu_config(&self) -> AppResult<Vec<MenuItem>>;

    /// `PUT /api/menu-config`
    async fn save_menu_config(&self, menus: &[MenuItem]) -> AppResult<()>;
}

/// 基于 reqwest 的实现
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            // 兼容末尾有无斜杠
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn item_url(&self, path: &str, id: i64) -> String {
        format!("{}{}/{}", self.base_url, path, id)
    }

    /// 发送请求并检查状态码
    async fn send(&self, req: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let resp = req
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AppError::HttpStatus {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
        resp.json::<T>()
            .await
            .map_err(|e| AppError::NetworkError(format!("解析响应失败：{}", e)))
    }
}

#[async_trait]
impl ConsoleApi for ApiClient {
    async fn list<R: Resource>(&self, query: &ListQuery) -> AppResult<Vec<R>> {
        let req = self.client.get(self.url(R::PATH)).query(&query.to_pairs());
        let resp = self.send(req).await?;
        let items: Vec<R> = Self::read_json(resp).await?;
        log::debug!("加载{}列表：{} 条", R::NAME, items.len());
        Ok(items)
    }

    async fn create<R, P>(&self, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync,
    {
        let req = self.client.post(self.url(R::PATH)).json(payload);
        let resp = self.send(req).await?;
        Self::read_json(resp).await
    }

    async fn update<R, P>(&self, id: i64, payload: &P) -> AppResult<R>
    where
        R: Resource,
        P: Serialize + Send + Sync,
    {
        let req = self.client.put(self.item_url(R::PATH, id)).json(payload);
        let resp = self.send(req).await?;
        Self::read_json(resp).await
    }

    async fn delete<R: Resource>(&self, id: i64) -> AppResult<()> {
        let req = self.client.delete(self.item_url(R::PATH, id));
        self.send(req).await?;
        Ok(())
    }

    async fn load_menu_config(&self) -> AppResult<Vec<MenuItem>> {
        let resp = self.send(self.client.get(self.url(MENU_CONFIG_PATH))).await?;
        // 尚未保存过时后端可能返回空体
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::NetworkError(format!("读取响应失败：{}", e)))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::NetworkError(format!("解析菜单配置失败：{}", e)))
    }

    async fn save_menu_config(&self, menus: &[MenuItem]) -> AppResult<()> {
        let req = self.client.put(self.url(MENU_CONFIG_PATH)).json(menus);
        self.send(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_trailing_slash_handling() {
        // 验证 URL 拼接逻辑（不发起实际请求）
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(1));
        assert_eq!(client.url("/api/products"), "http://localhost:8080/api/products");
        assert_eq!(client.item_url("/api/dicts", 7), "http://localhost:8080/api/dicts/7");

        let client = ApiClient::new("http://localhost:8080", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // 端口 9 (discard) 通常无监听，连接被拒绝
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500));
        let err = client
            .list::<crate::models::domain::Product>(&ListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NetworkError(_)));
    }
}
