use crate::error::{ScatterError, ScatterResult};
use crate::merge::ResultWindow;
use crate::query::{Filter, Order};
use crate::Record;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::debug;

// One partition of the store: an append-only local record log plus the local
// half of the query executor. Health is an administrative flag; an offline
// shard answers queries with an empty cursor and is never retried.
pub struct Shard {
    name: String,
    online: AtomicBool,
    records: RwLock<Vec<Record>>,
}

impl Shard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            online: AtomicBool::new(true),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_online(&self) -> bool {
        self.online.load(AtomicOrdering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, AtomicOrdering::SeqCst);
    }

    pub async fn save(&self, record: Record) {
        self.records.write().await.push(record);
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    // Local half of phase 1: filter the full local store, sort by `order`,
    // cut to `limit`, and hand the rows back as a cursor for this round.
    // Projections are applied by the coordinator once the page is assembled,
    // so the cursor carries unprojected rows the comparator can still see.
    pub async fn query(&self, filter: &Filter, order: &Order, limit: usize) -> ShardCursor {
        if !self.is_online() {
            debug!("shard {} offline, returning empty cursor", self.name);
            return ShardCursor::empty(&self.name);
        }

        let records = self.records.read().await;
        let mut rows: Vec<Record> = records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        rows.sort_by(|a, b| order.compare(a, b));
        rows.truncate(limit);

        ShardCursor {
            shard: self.name.clone(),
            rows,
        }
    }
}

// Snapshot of one shard's phase-1 output for a single query round. Phase 2
// reads the page slice back out of the cursor, so interleaved rounds on the
// same shard can never see each other's state.
#[derive(Debug, Clone)]
pub struct ShardCursor {
    shard: String,
    rows: Vec<Record>,
}

impl ShardCursor {
    fn empty(shard: &str) -> Self {
        Self {
            shard: shard.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // The phase-2 slice [skip, skip+keep). A window reaching past the cursor
    // means the caller paired it with the wrong round; that is a contract
    // violation and must not be clamped.
    pub fn window(&self, window: &ResultWindow) -> ScatterResult<&[Record]> {
        let end = window.span();
        if end > self.rows.len() {
            return Err(ScatterError::WindowOutOfRange {
                skip: window.skip(),
                keep: window.keep(),
                len: self.rows.len(),
            });
        }
        Ok(&self.rows[window.skip()..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: i32) -> Record {
        Record::new().with("id", id).with("age", age)
    }

    async fn seeded_shard() -> Shard {
        let shard = Shard::new("shard-0");
        for (id, age) in [(3, 20), (1, 45), (2, 31), (4, 50)] {
            shard.save(person(id, age)).await;
        }
        shard
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_limits() {
        let shard = seeded_shard().await;

        let cursor = shard
            .query(&Filter::int_gt("age", 25), &Order::by_field("id"), 2)
            .await;

        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.rows()[0].int64("id").unwrap(), 1);
        assert_eq!(cursor.rows()[1].int64("id").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_offline_shard_yields_empty_cursor() {
        let shard = seeded_shard().await;
        shard.set_online(false);

        let cursor = shard
            .query(&Filter::accept_all(), &Order::by_field("id"), 10)
            .await;

        assert!(cursor.is_empty());
        assert_eq!(cursor.shard(), "shard-0");
    }

    #[tokio::test]
    async fn test_zero_limit_yields_empty_cursor() {
        let shard = seeded_shard().await;

        let cursor = shard
            .query(&Filter::accept_all(), &Order::by_field("id"), 0)
            .await;

        assert!(cursor.is_empty());
    }

    #[tokio::test]
    async fn test_window_slices_cursor() {
        let shard = seeded_shard().await;
        let cursor = shard
            .query(&Filter::accept_all(), &Order::by_field("id"), 4)
            .await;

        let mut window = ResultWindow::new();
        window.bump_skip();
        window.bump_keep();
        window.bump_keep();

        let rows = cursor.window(&window).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].int64("id").unwrap(), 2);
        assert_eq!(rows[1].int64("id").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_window_past_cursor_fails_loudly() {
        let shard = seeded_shard().await;
        let cursor = shard
            .query(&Filter::accept_all(), &Order::by_field("id"), 2)
            .await;

        let mut window = ResultWindow::new();
        for _ in 0..3 {
            window.bump_keep();
        }

        match cursor.window(&window) {
            Err(ScatterError::WindowOutOfRange { skip, keep, len }) => {
                assert_eq!(skip, 0);
                assert_eq!(keep, 3);
                assert_eq!(len, 2);
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }
}
