//! Adapter for the keyed realtime store backend.
//!
//! The store exposes a JSON REST surface: every node is addressable as
//! `{base}/{path}.json`, a push-style POST returns the generated child key
//! as `{"name": key}`, and key-ordered pagination uses `orderBy="$key"`
//! with `startAfter` and `limitToFirst`. Child keys sort chronologically,
//! so key order is insertion order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::api::{friendly_error, rejection};
use crate::catalog::CatalogItem;
use crate::error::StoreError;
use crate::orders::{Order, OrderPage};
use crate::outlets::Outlet;

use super::{CatalogStore, OrderStore, OutletStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ITEMS_PATH: &str = "items";
const ORDERS_PATH: &str = "orders";
const OUTLETS_PATH: &str = "stores";

/// Client for the keyed realtime store's REST surface.
#[derive(Debug, Clone)]
pub struct KeyedBackend {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl KeyedBackend {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            auth_token: None,
            client,
        })
    }

    /// Attach a database auth token, passed as the `auth` query parameter.
    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.trim().to_string());
        self
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{path}.json", self.base_url)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, StoreError> {
        let url = self.node_url(path);
        let mut req = self.client.request(method, &url);
        if let Some(token) = &self.auth_token {
            req = req.query(&[("auth", token.as_str())]);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(rejection(status, &body_text));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let body_text = resp.text().await.unwrap_or_default();
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| StoreError::InvalidResponse(format!("store sent invalid JSON: {e}")))
    }

    /// Push a child under `path`, returning the store-generated key.
    async fn push(&self, path: &str, body: &Value) -> Result<String, StoreError> {
        let resp = self.request(Method::POST, path, &[], Some(body)).await?;
        resp.get("name")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                StoreError::InvalidResponse("push response is missing the child key".to_string())
            })
    }
}

/// Flatten a keyed node into `(key, value)` entries in key order.
fn sorted_entries(value: Value) -> Result<Vec<(String, Value)>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(entries)
        }
        _ => Err(StoreError::InvalidResponse(
            "keyed node is not an object".to_string(),
        )),
    }
}

/// Child count of a node fetched with `shallow=true` (values are `true`).
fn shallow_count(value: &Value) -> u64 {
    value.as_object().map(|map| map.len() as u64).unwrap_or(0)
}

fn strip_id(value: &mut Value) {
    if let Value::Object(map) = value {
        map.remove("id");
    }
}

#[async_trait]
impl CatalogStore for KeyedBackend {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let node = self.request(Method::GET, ITEMS_PATH, &[], None).await?;
        let mut items = Vec::new();
        for (key, value) in sorted_entries(node)? {
            let mut item: CatalogItem = serde_json::from_value(value)
                .map_err(|e| StoreError::InvalidResponse(format!("malformed item {key}: {e}")))?;
            // The child key is the identity; stored records do not embed it.
            item.id = key;
            items.push(item);
        }
        Ok(items)
    }

    async fn create_item(&self, item: &CatalogItem) -> Result<String, StoreError> {
        let mut body = serde_json::to_value(item)
            .map_err(|e| StoreError::Config(format!("serialize item: {e}")))?;
        strip_id(&mut body);
        self.push(ITEMS_PATH, &body).await
    }

    async fn update_item(&self, id: &str, item: &CatalogItem) -> Result<(), StoreError> {
        let mut body = serde_json::to_value(item)
            .map_err(|e| StoreError::Config(format!("serialize item: {e}")))?;
        strip_id(&mut body);
        let path = format!("{ITEMS_PATH}/{id}");
        self.request(Method::PATCH, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let path = format!("{ITEMS_PATH}/{id}");
        self.request(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for KeyedBackend {
    async fn count_orders(&self) -> Result<u64, StoreError> {
        let node = self
            .request(
                Method::GET,
                ORDERS_PATH,
                &[("shallow", "true".to_string())],
                None,
            )
            .await?;
        Ok(shallow_count(&node))
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
        self.push(ORDERS_PATH, &body).await
    }

    async fn list_orders(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<OrderPage, StoreError> {
        // String parameters must be quoted for the store's query grammar.
        let mut query = vec![
            ("orderBy", "\"$key\"".to_string()),
            ("limitToFirst", page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("startAfter", format!("\"{cursor}\"")));
        }

        let node = self.request(Method::GET, ORDERS_PATH, &query, None).await?;
        let mut orders = Vec::new();
        for (key, value) in sorted_entries(node)? {
            let order: Order = serde_json::from_value(value)
                .map_err(|e| StoreError::InvalidResponse(format!("malformed order {key}: {e}")))?;
            orders.push((key, order));
        }
        let next_cursor = orders.last().map(|(key, _)| key.clone());
        Ok(OrderPage {
            orders,
            next_cursor,
        })
    }
}

#[async_trait]
impl OutletStore for KeyedBackend {
    async fn list_outlets(&self) -> Result<Vec<Outlet>, StoreError> {
        let node = self.request(Method::GET, OUTLETS_PATH, &[], None).await?;
        let mut outlets = Vec::new();
        for (key, value) in sorted_entries(node)? {
            let mut outlet: Outlet = serde_json::from_value(value)
                .map_err(|e| StoreError::InvalidResponse(format!("malformed outlet {key}: {e}")))?;
            outlet.id = key;
            outlets.push(outlet);
        }
        Ok(outlets)
    }

    async fn create_outlet(&self, outlet: &Outlet) -> Result<String, StoreError> {
        let mut body = serde_json::to_value(outlet)
            .map_err(|e| StoreError::Config(format!("serialize outlet: {e}")))?;
        if let Value::Object(map) = &mut body {
            map.remove("store_id");
        }
        self.push(OUTLETS_PATH, &body).await
    }

    async fn update_outlet(&self, id: &str, outlet: &Outlet) -> Result<(), StoreError> {
        let mut body = serde_json::to_value(outlet)
            .map_err(|e| StoreError::Config(format!("serialize outlet: {e}")))?;
        if let Value::Object(map) = &mut body {
            map.remove("store_id");
        }
        let path = format!("{OUTLETS_PATH}/{id}");
        self.request(Method::PATCH, &path, &[], Some(&body)).await?;
        Ok(())
    }

    async fn delete_outlet(&self, id: &str) -> Result<(), StoreError> {
        let path = format!("{OUTLETS_PATH}/{id}");
        self.request(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_entries_orders_by_child_key() {
        let entries = sorted_entries(serde_json::json!({
            "-Nb": { "name": "second" },
            "-Na": { "name": "first" },
            "-Nc": { "name": "third" }
        }))
        .expect("object node");
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["-Na", "-Nb", "-Nc"]);
    }

    #[test]
    fn sorted_entries_tolerates_null_and_rejects_arrays() {
        assert!(sorted_entries(Value::Null)
            .expect("null node is empty")
            .is_empty());
        assert!(sorted_entries(serde_json::json!([1, 2, 3])).is_err());
    }

    #[test]
    fn shallow_count_counts_child_keys() {
        let node = serde_json::json!({ "-Na": true, "-Nb": true });
        assert_eq!(shallow_count(&node), 2);
        assert_eq!(shallow_count(&Value::Null), 0);
    }

    #[test]
    fn node_url_appends_json_suffix() {
        let backend = KeyedBackend::new("https://pos-demo.example-rtdb.com/").expect("client");
        assert_eq!(
            backend.node_url("orders"),
            "https://pos-demo.example-rtdb.com/orders.json"
        );
    }

    #[test]
    fn strip_id_removes_only_the_id_field() {
        let mut body = serde_json::json!({ "id": "x", "name": "Egg Tray", "price": 210.0 });
        strip_id(&mut body);
        assert!(body.get("id").is_none());
        assert_eq!(body["name"], "Egg Tray");
    }
}
