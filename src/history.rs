//! Paged browsing over persisted orders.
//!
//! Pages accumulate into a display set keyed by order id; `load_more`
//! merges, never replaces. Cursor staleness is tolerated: if the backend's
//! ordering shifted underneath us a page may skip or repeat records, and
//! the merge absorbs the repeats.

use chrono::NaiveDate;
use tracing::info;

use crate::error::EngineError;
use crate::orders::{parse_display_date, Order};
use crate::stores::OrderStore;

/// Page size the order history screen has always used.
pub const DEFAULT_PAGE_SIZE: usize = 40;

/// Accumulating, paged view over the order history.
#[derive(Debug)]
pub struct HistoryBrowser {
    page_size: usize,
    orders: Vec<(String, Order)>,
    cursor: Option<String>,
    has_more: bool,
    loaded_once: bool,
}

impl Default for HistoryBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl HistoryBrowser {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            orders: Vec::new(),
            cursor: None,
            has_more: true,
            loaded_once: false,
        }
    }

    /// Fetch the next page and merge it into the display set. Returns the
    /// number of records the page carried; 0 once pagination is exhausted.
    pub async fn load_more(&mut self, store: &dyn OrderStore) -> Result<usize, EngineError> {
        if self.loaded_once && !self.has_more {
            return Ok(0);
        }

        let page = store
            .list_orders(self.page_size, self.cursor.as_deref())
            .await?;
        let fetched = page.orders.len();

        for (id, order) in page.orders {
            if let Some(existing) = self.orders.iter_mut().find(|(key, _)| *key == id) {
                existing.1 = order;
            } else {
                self.orders.push((id, order));
            }
        }

        // A short page, or a page without a cursor, ends pagination.
        self.has_more = fetched == self.page_size && page.next_cursor.is_some();
        if let Some(next) = page.next_cursor {
            self.cursor = Some(next);
        }
        self.loaded_once = true;

        info!(
            fetched,
            accumulated = self.orders.len(),
            has_more = self.has_more,
            "order history page loaded"
        );
        Ok(fetched)
    }

    /// Drop everything and start paging from the top again.
    pub fn reset(&mut self) {
        self.orders.clear();
        self.cursor = None;
        self.has_more = true;
        self.loaded_once = false;
    }

    /// Accumulated orders with their store-assigned ids, first-seen order.
    pub fn orders(&self) -> &[(String, Order)] {
        &self.orders
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Orders whose display date falls on exactly the given day.
    pub fn orders_on(&self, date: NaiveDate) -> Vec<&(String, Order)> {
        self.orders
            .iter()
            .filter(|(_, order)| parse_display_date(&order.date) == Some(date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MemoryBackend, OrderStore as _};

    fn order(number: u64, date: &str) -> Order {
        Order {
            date: date.to_string(),
            order_number: number,
            items: vec![],
            total_amount: format!("{number}.00"),
        }
    }

    async fn seeded_backend(count: u64) -> MemoryBackend {
        let backend = MemoryBackend::new();
        for n in 1..=count {
            backend
                .insert_order(&order(n, "7/3/2024"), &format!("req-{n}"))
                .await
                .expect("seed order");
        }
        backend
    }

    #[tokio::test]
    async fn full_page_then_short_page_ends_pagination() {
        let backend = seeded_backend(3).await;
        let mut browser = HistoryBrowser::new(2);

        assert_eq!(browser.load_more(&backend).await.expect("page 1"), 2);
        assert!(browser.has_more());
        assert_eq!(browser.orders().len(), 2);

        assert_eq!(browser.load_more(&backend).await.expect("page 2"), 1);
        assert!(!browser.has_more());
        assert_eq!(browser.orders().len(), 3);

        // Exhausted: no further store calls are made.
        let calls_before = backend.calls().list_orders;
        assert_eq!(browser.load_more(&backend).await.expect("no-op"), 0);
        assert_eq!(backend.calls().list_orders, calls_before);
    }

    #[tokio::test]
    async fn exact_page_boundary_ends_on_the_following_empty_page() {
        let backend = seeded_backend(4).await;
        let mut browser = HistoryBrowser::new(2);

        browser.load_more(&backend).await.expect("page 1");
        browser.load_more(&backend).await.expect("page 2");
        assert_eq!(browser.orders().len(), 4);
        assert!(browser.has_more());

        assert_eq!(browser.load_more(&backend).await.expect("page 3"), 0);
        assert!(!browser.has_more());
    }

    #[tokio::test]
    async fn merge_is_keyed_by_order_id() {
        let backend = seeded_backend(2).await;
        let mut browser = HistoryBrowser::new(2);

        browser.load_more(&backend).await.expect("page 1");
        // Stale cursor scenario: re-read the same page by resetting the
        // cursor; records must merge, not duplicate.
        browser.cursor = None;
        browser.has_more = true;
        browser.load_more(&backend).await.expect("repeat page");

        assert_eq!(browser.orders().len(), 2);
    }

    #[tokio::test]
    async fn reset_starts_from_the_top() {
        let backend = seeded_backend(3).await;
        let mut browser = HistoryBrowser::new(2);
        browser.load_more(&backend).await.expect("page 1");
        browser.reset();
        assert!(browser.orders().is_empty());
        assert_eq!(browser.load_more(&backend).await.expect("page 1 again"), 2);
    }

    #[tokio::test]
    async fn date_filter_matches_exact_day() {
        let backend = MemoryBackend::new();
        backend
            .insert_order(&order(1, "7/3/2024"), "req-1")
            .await
            .expect("seed");
        backend
            .insert_order(&order(2, "07/03/2024"), "req-2")
            .await
            .expect("seed");
        backend
            .insert_order(&order(3, "8/3/2024"), "req-3")
            .await
            .expect("seed");

        let mut browser = HistoryBrowser::new(10);
        browser.load_more(&backend).await.expect("load");

        let day = NaiveDate::from_ymd_opt(2024, 3, 7).expect("valid date");
        let hits = browser.orders_on(day);
        assert_eq!(hits.len(), 2);

        let other = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        assert!(browser.orders_on(other).is_empty());
    }

    #[test]
    fn page_size_is_clamped_to_at_least_one() {
        assert_eq!(HistoryBrowser::new(0).page_size(), 1);
    }
}
