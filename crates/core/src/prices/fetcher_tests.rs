//! Tests for the fetch-and-store contract.
//!
//! 1. Idempotence: a second run over the same range inserts nothing
//! 2. A duplicate row never aborts the rest of the batch
//! 3. Empty series are a zero-row success
//! 4. Provider failures and timeouts propagate to the caller

#[cfg(test)]
mod tests {
    use crate::errors::{Error, Result, ValidationError};
    use crate::prices::{
        fetcher::{resolve_window, PriceFetcher, PriceFetcherTrait},
        model::{InsertOutcome, NewPriceBar, PriceBar},
        store::PriceStore,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
    use quoteflow_market_data::{MarketDataError, MarketDataProvider, RawBar};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // =========================================================================
    // Mock PriceStore
    // =========================================================================

    #[derive(Clone, Default)]
    struct MockPriceStore {
        bars: Arc<Mutex<Vec<PriceBar>>>,
        fail_on_insert: Arc<Mutex<bool>>,
    }

    impl MockPriceStore {
        fn new() -> Self {
            Self::default()
        }

        fn set_fail_on_insert(&self, fail: bool) {
            *self.fail_on_insert.lock().unwrap() = fail;
        }

        fn seed(&self, bar: &NewPriceBar) {
            let mut bars = self.bars.lock().unwrap();
            let id = bars.len() as i64 + 1;
            bars.push(stored(id, bar));
        }

        fn get_all(&self) -> Vec<PriceBar> {
            self.bars.lock().unwrap().clone()
        }
    }

    fn stored(id: i64, bar: &NewPriceBar) -> PriceBar {
        PriceBar {
            id,
            symbol: bar.symbol.clone(),
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            source: bar.source.clone(),
            created_at: Utc::now(),
        }
    }

    #[async_trait]
    impl PriceStore for MockPriceStore {
        async fn insert_bar(&self, bar: &NewPriceBar) -> Result<InsertOutcome> {
            if *self.fail_on_insert.lock().unwrap() {
                return Err(Error::Unexpected("Intentional insert failure".into()));
            }
            // Yield so concurrent fetchers interleave
            tokio::task::yield_now().await;
            let mut bars = self.bars.lock().unwrap();
            if bars
                .iter()
                .any(|b| b.symbol == bar.symbol && b.timestamp == bar.timestamp)
            {
                return Ok(InsertOutcome::Duplicate);
            }
            let id = bars.len() as i64 + 1;
            bars.push(stored(id, bar));
            Ok(InsertOutcome::Inserted)
        }

        fn range(
            &self,
            symbol: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PriceBar>> {
            let mut out: Vec<PriceBar> = self
                .bars
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.symbol == symbol && b.timestamp >= start && b.timestamp <= end)
                .cloned()
                .collect();
            out.sort_by_key(|b| b.timestamp);
            Ok(out)
        }

        fn count(&self, symbol: &str) -> Result<usize> {
            Ok(self
                .bars
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.symbol == symbol)
                .count())
        }
    }

    // =========================================================================
    // Mock provider
    // =========================================================================

    enum Reply {
        Bars(Vec<RawBar>),
        NoData,
        NotFound,
        Hang,
    }

    struct MockProvider {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn fetch_series(
            &self,
            symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> std::result::Result<Vec<RawBar>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Bars(bars) => Ok(bars.clone()),
                Reply::NoData => Err(MarketDataError::NoDataForRange),
                Reply::NotFound => Err(MarketDataError::SymbolNotFound(symbol.to_string())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::days(n)
    }

    fn daily_bars(count: i64) -> Vec<RawBar> {
        (0..count)
            .map(|i| RawBar {
                timestamp: day(i),
                open: Some(dec!(100) + Decimal::from(i)),
                high: Some(dec!(101) + Decimal::from(i)),
                low: Some(dec!(99) + Decimal::from(i)),
                close: Some(dec!(100.5) + Decimal::from(i)),
                volume: Some(1_000 + i),
            })
            .collect()
    }

    fn fetcher(provider: Arc<MockProvider>, store: MockPriceStore) -> PriceFetcher {
        PriceFetcher::new(provider, Arc::new(store))
    }

    // =========================================================================
    // Idempotence
    // =========================================================================

    #[tokio::test]
    async fn test_second_run_inserts_nothing() {
        let store = MockPriceStore::new();
        let provider = Arc::new(MockProvider::new(Reply::Bars(daily_bars(180))));
        let fetcher = fetcher(provider, store.clone());

        let first = fetcher.fetch_and_store("ABC", None, None).await.unwrap();
        assert_eq!(first.fetched, 180);
        assert_eq!(first.inserted, 180);
        let after_first = store.get_all();

        let second = fetcher.fetch_and_store("ABC", None, None).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 180);
        assert_eq!(store.get_all(), after_first);
    }

    #[tokio::test]
    async fn test_fetch_now_returns_inserted_count() {
        let store = MockPriceStore::new();
        let provider = Arc::new(MockProvider::new(Reply::Bars(daily_bars(3))));
        let fetcher = fetcher(provider, store);

        assert_eq!(fetcher.fetch_now("ABC").await.unwrap(), 3);
        assert_eq!(fetcher.fetch_now("ABC").await.unwrap(), 0);
    }

    // =========================================================================
    // Partial failure isolation
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_row_does_not_abort_batch() {
        let store = MockPriceStore::new();
        let bars = daily_bars(30);
        store.seed(&NewPriceBar::from_raw("ABC", "MOCK", bars[4].clone()));

        let provider = Arc::new(MockProvider::new(Reply::Bars(bars)));
        let fetcher = fetcher(provider, store.clone());

        let outcome = fetcher.fetch_and_store("ABC", None, None).await.unwrap();
        assert_eq!(outcome.inserted, 29);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(store.count("ABC").unwrap(), 30);
    }

    #[tokio::test]
    async fn test_bars_without_close_are_skipped() {
        let store = MockPriceStore::new();
        let mut bars = daily_bars(3);
        bars[1].close = None;
        let provider = Arc::new(MockProvider::new(Reply::Bars(bars)));
        let fetcher = fetcher(provider, store.clone());

        let outcome = fetcher.fetch_and_store("ABC", None, None).await.unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.skipped, 1);
    }

    // =========================================================================
    // Empty series
    // =========================================================================

    #[tokio::test]
    async fn test_empty_series_is_zero() {
        let store = MockPriceStore::new();
        let provider = Arc::new(MockProvider::new(Reply::Bars(vec![])));
        let fetcher = fetcher(provider, store.clone());

        let outcome = fetcher.fetch_and_store("NEW", None, None).await.unwrap();
        assert_eq!(outcome.inserted, 0);
        assert!(store.get_all().is_empty());
    }

    #[tokio::test]
    async fn test_no_data_for_range_is_zero() {
        let provider = Arc::new(MockProvider::new(Reply::NoData));
        let fetcher = fetcher(provider, MockPriceStore::new());

        assert_eq!(fetcher.fetch_now("NEW").await.unwrap(), 0);
    }

    // =========================================================================
    // Failure propagation
    // =========================================================================

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockProvider::new(Reply::NotFound));
        let fetcher = fetcher(provider, MockPriceStore::new());

        let err = fetcher.fetch_now("ZZZZ").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::SymbolNotFound(ref s)) if s == "ZZZZ"
        ));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store = MockPriceStore::new();
        store.set_fail_on_insert(true);
        let provider = Arc::new(MockProvider::new(Reply::Bars(daily_bars(2))));
        let fetcher = fetcher(provider, store);

        assert!(matches!(
            fetcher.fetch_now("ABC").await,
            Err(Error::Unexpected(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out() {
        let provider = Arc::new(MockProvider::new(Reply::Hang));
        let fetcher = fetcher(provider, MockPriceStore::new())
            .with_provider_timeout(Duration::from_secs(5));

        let err = fetcher.fetch_now("ABC").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::Timeout { ref provider }) if provider == "MOCK"
        ));
    }

    #[tokio::test]
    async fn test_blank_symbol_is_rejected_before_provider_call() {
        let provider = Arc::new(MockProvider::new(Reply::Bars(daily_bars(1))));
        let fetcher = fetcher(provider.clone(), MockPriceStore::new());

        let err = fetcher.fetch_now("   ").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(_))
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_symbol_is_trimmed() {
        let store = MockPriceStore::new();
        let provider = Arc::new(MockProvider::new(Reply::Bars(daily_bars(1))));
        let fetcher = fetcher(provider, store.clone());

        fetcher.fetch_now("  ABC ").await.unwrap();
        assert_eq!(store.get_all()[0].symbol, "ABC");
        assert_eq!(store.get_all()[0].source, "MOCK");
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_overlapping_fetches_leave_no_duplicates() {
        let store = MockPriceStore::new();
        let a = fetcher(
            Arc::new(MockProvider::new(Reply::Bars(daily_bars(40)))),
            store.clone(),
        );
        let b = fetcher(
            Arc::new(MockProvider::new(Reply::Bars(daily_bars(60)[20..].to_vec()))),
            store.clone(),
        );

        let (ra, rb) = tokio::join!(
            a.fetch_and_store("ABC", None, None),
            b.fetch_and_store("ABC", None, None)
        );
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        assert_eq!(ra.inserted + rb.inserted, 60);
        let all = store.get_all();
        assert_eq!(all.len(), 60);
        let mut stamps: Vec<_> = all.iter().map(|b| b.timestamp).collect();
        stamps.sort();
        stamps.dedup();
        assert_eq!(stamps.len(), 60);
    }

    // =========================================================================
    // Window resolution
    // =========================================================================

    #[test]
    fn test_default_window_starts_at_history_start() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let (from, to) = resolve_window(None, None, now).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, now);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 31);
        let (from, to) = resolve_window(start, end, now).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(matches!(
            resolve_window(start, end, Utc::now()),
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));
    }
}
