//! Adapter for the generic HTTP API backend.
//!
//! Route layout follows the backend service: `/fetch-all-items`,
//! `/add-item`, `/update-item/{id}`, `/delete-item/{id}`, `/insert-order`,
//! `/order-count`, `/fetch-orders`, and the `/fetch-stores` family for
//! outlets. Responses are validated here, at the adapter boundary; the
//! engine only ever sees typed records.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiClient;
use crate::catalog::CatalogItem;
use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::orders::{Order, OrderPage};
use crate::outlets::Outlet;

use super::{CatalogStore, OrderStore, OutletStore};

/// Client for the generic HTTP API backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, StoreError> {
        Ok(Self {
            api: ApiClient::new(config)?,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

fn encode_path_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn id_from_response(resp: &Value, keys: &[&str]) -> Result<String, StoreError> {
    for key in keys {
        if let Some(id) = resp
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            return Ok(id.to_string());
        }
    }
    Err(StoreError::InvalidResponse(format!(
        "response is missing an id field ({})",
        keys.join("/")
    )))
}

fn parse_item_list(value: Value) -> Result<Vec<CatalogItem>, StoreError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
        .map_err(|e| StoreError::InvalidResponse(format!("malformed item list: {e}")))
}

fn parse_outlet_list(value: Value) -> Result<Vec<Outlet>, StoreError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
        .map_err(|e| StoreError::InvalidResponse(format!("malformed outlet list: {e}")))
}

/// Parse a `/fetch-orders` response: an array of order records, each with
/// the backend-injected `id`. The continuation cursor is the last id in the
/// page; the caller detects the end via a short page.
fn parse_order_page(value: Value) -> Result<OrderPage, StoreError> {
    if value.is_null() {
        return Ok(OrderPage::default());
    }
    let rows = value
        .as_array()
        .cloned()
        .ok_or_else(|| StoreError::InvalidResponse("order page is not an array".to_string()))?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let id = id_from_response(&row, &["id"])?;
        let order: Order = serde_json::from_value(row)
            .map_err(|e| StoreError::InvalidResponse(format!("malformed order {id}: {e}")))?;
        orders.push((id, order));
    }

    let next_cursor = orders.last().map(|(id, _)| id.clone());
    Ok(OrderPage {
        orders,
        next_cursor,
    })
}

#[async_trait]
impl CatalogStore for HttpBackend {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        parse_item_list(self.api.get("/fetch-all-items").await?)
    }

    async fn create_item(&self, item: &CatalogItem) -> Result<String, StoreError> {
        let body = serde_json::to_value(item)
            .map_err(|e| StoreError::Config(format!("serialize item: {e}")))?;
        let resp = self.api.post("/add-item", &body).await?;
        id_from_response(&resp, &["item_id", "id"])
    }

    async fn update_item(&self, id: &str, item: &CatalogItem) -> Result<(), StoreError> {
        let body = serde_json::to_value(item)
            .map_err(|e| StoreError::Config(format!("serialize item: {e}")))?;
        let path = format!("/update-item/{}", encode_path_segment(id));
        self.api.put(&path, &body).await?;
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let path = format!("/delete-item/{}", encode_path_segment(id));
        self.api.delete(&path).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for HttpBackend {
    async fn count_orders(&self) -> Result<u64, StoreError> {
        let resp = self.api.get("/order-count").await?;
        resp.get("total_orders")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                StoreError::InvalidResponse("order count response missing total_orders".to_string())
            })
    }

    async fn insert_order(&self, order: &Order, request_id: &str) -> Result<String, StoreError> {
        let mut body = serde_json::to_value(order)
            .map_err(|e| StoreError::Config(format!("serialize order: {e}")))?;
        if let Value::Object(map) = &mut body {
            map.insert(
                "clientRequestId".to_string(),
                Value::String(request_id.to_string()),
            );
        }
        let resp = self.api.post("/insert-order", &body).await?;
        id_from_response(&resp, &["order_id", "id"])
    }

    async fn list_orders(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<OrderPage, StoreError> {
        let mut path = format!("/fetch-orders?page_size={page_size}");
        if let Some(cursor) = cursor {
            path.push_str("&last_key=");
            path.push_str(&encode_path_segment(cursor));
        }
        parse_order_page(self.api.get(&path).await?)
    }
}

#[async_trait]
impl OutletStore for HttpBackend {
    async fn list_outlets(&self) -> Result<Vec<Outlet>, StoreError> {
        parse_outlet_list(self.api.get("/fetch-stores").await?)
    }

    async fn create_outlet(&self, outlet: &Outlet) -> Result<String, StoreError> {
        let body = serde_json::to_value(outlet)
            .map_err(|e| StoreError::Config(format!("serialize outlet: {e}")))?;
        let resp = self.api.post("/add-store", &body).await?;
        id_from_response(&resp, &["store_id", "id"])
    }

    async fn update_outlet(&self, id: &str, outlet: &Outlet) -> Result<(), StoreError> {
        let body = serde_json::to_value(outlet)
            .map_err(|e| StoreError::Config(format!("serialize outlet: {e}")))?;
        let path = format!("/update-store/{}", encode_path_segment(id));
        self.api.put(&path, &body).await?;
        Ok(())
    }

    async fn delete_outlet(&self, id: &str) -> Result<(), StoreError> {
        let path = format!("/delete-store/{}", encode_path_segment(id));
        self.api.delete(&path).await?;
        Ok(())
    }
}
