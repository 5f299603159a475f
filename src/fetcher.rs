use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::{PageQuery, PageSource};
use crate::config::{Mode, RunConfig, TimeWindow};
use crate::error::FetchError;
use crate::models::NormalizedRecord;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub mode: Mode,
    pub window: TimeWindow,
    pub page_size: u32,
    pub page_delay: Duration,
}

impl From<&RunConfig> for FetchOptions {
    fn from(c: &RunConfig) -> Self {
        Self {
            mode: c.mode,
            window: c.window,
            page_size: c.page_size,
            page_delay: c.page_delay,
        }
    }
}

/// Everything gathered for one address, in API order.
#[derive(Debug, Default)]
pub struct AddressHistory {
    pub records: Vec<NormalizedRecord>,
    /// Page requests that returned a body.
    pub pages: usize,
    /// Raw records dropped because they could not be parsed.
    pub skipped: usize,
    /// Set when pagination stopped on a failed request.
    pub error: Option<FetchError>,
}

/// Follows the fingerprint cursor for `address` until the API runs dry.
///
/// A failed request ends pagination for this address only; records from
/// earlier pages are kept. Unparseable records are skipped.
pub async fn fetch_address<S>(source: &S, address: &str, opts: &FetchOptions) -> AddressHistory
where
    S: PageSource + ?Sized,
{
    let mut history = AddressHistory::default();
    let mut cursor: Option<String> = None;

    loop {
        let query = PageQuery {
            mode: opts.mode,
            address,
            limit: opts.page_size,
            window: opts.window,
            fingerprint: cursor.as_deref(),
        };

        let page = match source.fetch_page(&query).await {
            Ok(page) => page,
            Err(e) => {
                error!(address, page = history.pages + 1, error = %e, "Fetch failed");
                history.error = Some(e);
                break;
            }
        };
        history.pages += 1;

        if page.data.is_empty() {
            break;
        }

        let before = history.records.len();
        for raw in &page.data {
            match opts.mode.parse_record(raw) {
                Ok(record) => history.records.push(record),
                Err(e) => {
                    warn!(
                        mode = opts.mode.label(),
                        txid = opts.mode.record_id(raw),
                        error = %e,
                        "Skipping unparseable record"
                    );
                    history.skipped += 1;
                }
            }
        }
        info!(
            address,
            page = history.pages,
            parsed = history.records.len() - before,
            raw = page.data.len(),
            "Page fetched"
        );

        match page.cursor() {
            Some(fp) => {
                cursor = Some(fp);
                if !opts.page_delay.is_zero() {
                    tokio::time::sleep(opts.page_delay).await;
                }
            }
            None => break,
        }
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawPage;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records each request's cursor.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<RawPage, FetchError>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<RawPage, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RawPage, FetchError> {
            self.cursors
                .lock()
                .unwrap()
                .push(query.fingerprint.map(str::to_string));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("more requests than scripted pages")
        }
    }

    fn transfer(id: &str, value: &str) -> Value {
        json!({
            "transaction_id": id,
            "block_timestamp": 1691568000000u64,
            "from": "TFrom",
            "to": "TTo",
            "value": value,
            "token_info": { "symbol": "USDT", "decimals": 6 }
        })
    }

    fn page(data: Vec<Value>, fingerprint: Option<&str>) -> Result<RawPage, FetchError> {
        Ok(serde_json::from_value(json!({
            "data": data,
            "meta": { "fingerprint": fingerprint }
        }))
        .unwrap())
    }

    fn opts() -> FetchOptions {
        FetchOptions {
            mode: Mode::Trc20,
            window: TimeWindow {
                min_timestamp: 0,
                max_timestamp: i64::MAX,
            },
            page_size: 2,
            page_delay: Duration::ZERO,
        }
    }

    fn ids(history: &AddressHistory) -> Vec<&str> {
        history.records.iter().map(|r| r.tx_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_follows_cursor_to_last_page() {
        let source = ScriptedSource::new(vec![
            page(vec![transfer("a", "1"), transfer("b", "2")], Some("fp1")),
            page(vec![transfer("c", "3"), transfer("d", "4")], Some("fp2")),
            page(vec![transfer("e", "5")], None),
        ]);

        let history = fetch_address(&source, "TAddr", &opts()).await;

        assert_eq!(ids(&history), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(history.pages, 3);
        assert!(history.error.is_none());
        assert_eq!(
            source.cursors(),
            vec![None, Some("fp1".to_string()), Some("fp2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_cursor_ends_pagination() {
        let source = ScriptedSource::new(vec![page(vec![transfer("a", "1")], Some(""))]);
        let history = fetch_address(&source, "TAddr", &opts()).await;
        assert_eq!(ids(&history), vec!["a"]);
        assert_eq!(source.cursors().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_even_with_cursor() {
        let source = ScriptedSource::new(vec![
            page(vec![transfer("a", "1")], Some("fp1")),
            page(vec![], Some("fp2")),
        ]);
        let history = fetch_address(&source, "TAddr", &opts()).await;
        assert_eq!(ids(&history), vec!["a"]);
        assert_eq!(source.cursors().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_records_do_not_stop_pagination() {
        let source = ScriptedSource::new(vec![
            page(vec![json!({ "transaction_id": "bad" })], Some("fp1")),
            page(vec![transfer("b", "oops"), transfer("c", "3")], None),
        ]);
        let history = fetch_address(&source, "TAddr", &opts()).await;
        assert_eq!(ids(&history), vec!["c"]);
        assert_eq!(history.skipped, 2);
        assert_eq!(history.pages, 2);
    }

    #[tokio::test]
    async fn test_numeric_cursor_and_null_data() {
        let source = ScriptedSource::new(vec![
            Ok(serde_json::from_value(json!({
                "data": [transfer("a", "1")],
                "meta": { "fingerprint": 42 }
            }))
            .unwrap()),
            Ok(serde_json::from_value(json!({ "data": null, "meta": {} })).unwrap()),
        ]);
        let history = fetch_address(&source, "TAddr", &opts()).await;
        assert_eq!(ids(&history), vec!["a"]);
        assert!(history.error.is_none());
        assert_eq!(source.cursors(), vec![None, Some("42".to_string())]);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_earlier_pages() {
        let source = ScriptedSource::new(vec![
            page(vec![transfer("a", "1"), transfer("b", "2")], Some("fp1")),
            Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
            page(vec![transfer("c", "3")], None),
        ]);
        let history = fetch_address(&source, "TAddr", &opts()).await;
        assert_eq!(ids(&history), vec!["a", "b"]);
        assert_eq!(history.pages, 1);
        assert!(matches!(
            history.error,
            Some(FetchError::Status { status: 503, .. })
        ));
        assert_eq!(source.cursors().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_pages() {
        let source = ScriptedSource::new(vec![
            page(vec![transfer("a", "1")], Some("fp1")),
            page(vec![transfer("b", "2")], None),
        ]);
        let opts = FetchOptions {
            page_delay: Duration::from_millis(200),
            ..opts()
        };
        let started = tokio::time::Instant::now();
        let history = fetch_address(&source, "TAddr", &opts).await;
        assert_eq!(history.records.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
