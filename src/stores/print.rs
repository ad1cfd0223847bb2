//! HTTP client for the external print bridge.
//!
//! The bridge owns the physical printer; this adapter only POSTs the
//! derived receipt to `{base}/print`. Failures are best-effort noise: the
//! checkout coordinator logs and moves on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::api::{friendly_error, rejection};
use crate::config::normalize_base_url;
use crate::error::StoreError;
use crate::receipt::Receipt;

use super::PrintService;

/// Receipts are small; a stalled bridge should not hold up the terminal.
const PRINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the receipt print bridge.
#[derive(Debug, Clone)]
pub struct HttpPrinter {
    base_url: String,
    client: Client,
}

impl HttpPrinter {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(PRINT_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    fn print_url(&self) -> String {
        format!("{}/print", self.base_url)
    }
}

#[async_trait]
impl PrintService for HttpPrinter {
    async fn submit_receipt(&self, receipt: &Receipt) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.print_url())
            .json(receipt)
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(rejection(status, &body_text));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_url_targets_the_bridge_endpoint() {
        let printer = HttpPrinter::new("localhost:8000").expect("client");
        assert_eq!(printer.print_url(), "http://localhost:8000/print");
    }
}
