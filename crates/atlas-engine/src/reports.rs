//! # Sales Reports
//!
//! Day-bucketed rollups over persisted receipts. Read-only: reports never
//! touch stock or receipts, and re-sort by the receipts' own timestamp
//! fields rather than trusting store scan order.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use atlas_core::Transaction;
use atlas_store::keys::TRANSACTION_PREFIX;
use atlas_store::{scan_typed, DocumentStore};

use crate::error::EngineResult;

/// Aggregated sales figures for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub transaction_count: u64,
    pub units_sold: i64,
    pub revenue_cents: i64,
    pub cogs_cents: i64,
    pub profit_cents: i64,
}

/// Read-only reporting over committed receipts.
#[derive(Clone)]
pub struct SalesReports {
    store: Arc<dyn DocumentStore>,
}

impl SalesReports {
    /// Creates reports over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SalesReports { store }
    }

    /// Rollup for a single day.
    pub async fn daily_summary(&self, date: NaiveDate) -> EngineResult<SalesSummary> {
        self.summary_between(date, date).await
    }

    /// Rollup for an inclusive date range.
    pub async fn summary_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<SalesSummary> {
        let transactions: Vec<Transaction> =
            scan_typed(self.store.as_ref(), TRANSACTION_PREFIX).await?;

        // Receipt dates are ISO "YYYY-MM-DD", so string comparison against
        // formatted bounds is a correct range filter
        let from_str = from.to_string();
        let to_str = to.to_string();

        let mut summary = SalesSummary {
            from,
            to,
            transaction_count: 0,
            units_sold: 0,
            revenue_cents: 0,
            cogs_cents: 0,
            profit_cents: 0,
        };

        for transaction in transactions
            .iter()
            .filter(|t| t.date >= from_str && t.date <= to_str)
        {
            summary.transaction_count += 1;
            summary.units_sold += transaction.units_sold();
            summary.revenue_cents += transaction.total_cents;
            summary.cogs_cents += transaction.cogs_cents;
            summary.profit_cents += transaction.profit_cents;
        }

        debug!(
            from = %from,
            to = %to,
            transactions = summary.transaction_count,
            revenue = summary.revenue_cents,
            "Sales summary computed"
        );

        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::KeyLocks;
    use crate::testutil::{seed_product_priced, staff};
    use crate::transaction::{SaleLine, TransactionEngine};
    use atlas_store::MemoryStore;

    async fn committed_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let engine = TransactionEngine::new(
            store.clone() as Arc<dyn DocumentStore>,
            Arc::new(KeyLocks::new()),
        );
        let actor = staff();
        seed_product_priced(store.as_ref(), "p1", "Tea", 100, 1000, 400).await;

        // Two receipts today: totals 2000 and 1000, cogs 800 and 400
        for quantity in [2, 1] {
            engine
                .commit(
                    vec![SaleLine {
                        product_id: "p1".to_string(),
                        quantity,
                    }],
                    0,
                    None,
                    &actor,
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_daily_summary_aggregates_todays_receipts() {
        let store = committed_store().await;
        let reports = SalesReports::new(store as Arc<dyn DocumentStore>);

        let today = chrono::Utc::now().date_naive();
        let summary = reports.daily_summary(today).await.unwrap();

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.revenue_cents, 3000);
        assert_eq!(summary.cogs_cents, 1200);
        assert_eq!(summary.profit_cents, 1800);
    }

    #[tokio::test]
    async fn test_range_outside_activity_is_empty() {
        let store = committed_store().await;
        let reports = SalesReports::new(store as Arc<dyn DocumentStore>);

        let past = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let summary = reports
            .summary_between(past, past + chrono::Duration::days(30))
            .await
            .unwrap();

        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.revenue_cents, 0);
    }

    #[tokio::test]
    async fn test_empty_store_summarizes_to_zero() {
        let store = Arc::new(MemoryStore::new());
        let reports = SalesReports::new(store as Arc<dyn DocumentStore>);

        let today = chrono::Utc::now().date_naive();
        let summary = reports.daily_summary(today).await.unwrap();

        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.units_sold, 0);
        assert_eq!(summary.profit_cents, 0);
    }
}
