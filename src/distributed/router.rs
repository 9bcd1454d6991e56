use crate::cluster::{Shard, ShardCursor};
use crate::error::{ScatterError, ScatterResult};
use crate::merge::{k_way_merge, PageAssembly, ResultWindow, WindowDiscovery};
use crate::query::{Filter, Order, Projection};
use crate::Record;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

// Runs one paginated query round as a two-phase distributed merge.
//
// Phase 1 asks every shard for its best (page+1)*page_size candidates and
// merges the resulting streams just far enough to learn, per shard, which
// contiguous slice of its candidates belongs to the requested page. Phase 2
// fetches exactly those slices and merges them into the final page. Each
// shard therefore only ever ships a bounded, locally sorted slice, yet the
// page matches what a single centralized store would return.
pub struct PageRouter;

impl PageRouter {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        shards: &[Arc<Shard>],
        page: usize,
        page_size: usize,
        filter: &Filter,
        order: &Order,
        projection: &Projection,
    ) -> ScatterResult<Vec<Record>> {
        let round_id = uuid::Uuid::new_v4();
        let from = page
            .checked_mul(page_size)
            .ok_or_else(|| ScatterError::Query {
                message: format!("page {page} out of range for page_size {page_size}"),
            })?;
        let limit = from.checked_add(page_size).ok_or_else(|| ScatterError::Query {
            message: format!("page {page} out of range for page_size {page_size}"),
        })?;

        info!(
            "query round {}: page {} (rows {}..{}) across {} shards",
            round_id,
            page,
            from,
            limit,
            shards.len()
        );

        let cursors = self.discover(shards, filter, order, limit).await?;

        let mut queues: Vec<VecDeque<Record>> = cursors
            .iter()
            .map(|cursor| cursor.rows().iter().cloned().collect())
            .collect();
        let mut discovery = WindowDiscovery::new(queues.len(), from, limit);
        k_way_merge(&mut queues, |a, b| order.compare(a, b), &mut discovery);
        let windows = discovery.into_windows();

        for (cursor, window) in cursors.iter().zip(&windows) {
            debug!(
                "round {}: shard {} window skip={} keep={}",
                round_id,
                cursor.shard(),
                window.skip(),
                window.keep()
            );
        }

        let rows = self.assemble(&cursors, &windows, order, page_size)?;

        debug!("round {}: assembled {} rows", round_id, rows.len());
        Ok(rows.iter().map(|row| projection.apply(row)).collect())
    }

    // Phase 1: broadcast the bounded local query to every shard in parallel.
    // Offline shards contribute an empty cursor; their data is simply absent
    // for this round. Cursors come back in shard order.
    async fn discover(
        &self,
        shards: &[Arc<Shard>],
        filter: &Filter,
        order: &Order,
        limit: usize,
    ) -> ScatterResult<Vec<ShardCursor>> {
        let mut tasks = Vec::with_capacity(shards.len());
        for shard in shards {
            let shard = Arc::clone(shard);
            let filter = filter.clone();
            let order = order.clone();
            tasks.push(tokio::spawn(async move {
                shard.query(&filter, &order, limit).await
            }));
        }

        let mut cursors = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(cursor) => cursors.push(cursor),
                Err(e) => {
                    return Err(ScatterError::Query {
                        message: format!("shard query task failed: {e}"),
                    })
                }
            }
        }
        Ok(cursors)
    }

    // Phase 2: slice each cursor down to its window and merge the slices.
    // A window that does not fit its cursor is a phase-ordering violation and
    // surfaces as an error rather than a truncated page.
    fn assemble(
        &self,
        cursors: &[ShardCursor],
        windows: &[ResultWindow],
        order: &Order,
        page_size: usize,
    ) -> ScatterResult<Vec<Record>> {
        let mut queues: Vec<VecDeque<Record>> = Vec::with_capacity(cursors.len());
        for (cursor, window) in cursors.iter().zip(windows) {
            let rows = cursor.window(window)?;
            queues.push(rows.iter().cloned().collect());
        }

        let mut assembly = PageAssembly::new(page_size);
        k_way_merge(&mut queues, |a, b| order.compare(a, b), &mut assembly);
        Ok(assembly.into_page())
    }
}

impl Default for PageRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: i32) -> Record {
        Record::new().with("id", id).with("age", age)
    }

    async fn shard_with(name: &str, ids: &[(i64, i32)]) -> Arc<Shard> {
        let shard = Shard::new(name);
        for &(id, age) in ids {
            shard.save(person(id, age)).await;
        }
        Arc::new(shard)
    }

    #[tokio::test]
    async fn test_two_phase_page_matches_centralized_order() {
        let shards = vec![
            shard_with("shard-0", &[(1, 10), (6, 60)]).await,
            shard_with("shard-1", &[(3, 30), (4, 40)]).await,
            shard_with("shard-2", &[(2, 20), (5, 50)]).await,
        ];

        let router = PageRouter::new();
        let order = Order::by_field("id");

        let page = router
            .execute(
                &shards,
                1,
                2,
                &Filter::accept_all(),
                &order,
                &Projection::identity(),
            )
            .await
            .unwrap();

        let ids: Vec<i64> = page.iter().map(|r| r.int64("id").unwrap()).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_replica_rows_collapse_in_page() {
        // Record 2 lives on two shards; the page must carry it once.
        let shards = vec![
            shard_with("shard-0", &[(1, 10), (2, 20)]).await,
            shard_with("shard-1", &[(2, 20), (3, 30)]).await,
        ];

        let router = PageRouter::new();
        let page = router
            .execute(
                &shards,
                0,
                10,
                &Filter::accept_all(),
                &Order::by_field("id"),
                &Projection::identity(),
            )
            .await
            .unwrap();

        let ids: Vec<i64> = page.iter().map(|r| r.int64("id").unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_projection_applied_after_assembly() {
        let shards = vec![shard_with("shard-0", &[(1, 10), (2, 20)]).await];

        let router = PageRouter::new();
        let page = router
            .execute(
                &shards,
                0,
                2,
                &Filter::accept_all(),
                &Order::by_field("age").then(Order::by_field("id")),
                &Projection::keep(&["id"]),
            )
            .await
            .unwrap();

        // The order field is projected away, yet ordering still held because
        // the merge ran over unprojected rows.
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].int64("id").unwrap(), 1);
        assert!(page[0].get("age").is_absent());
    }

    #[tokio::test]
    async fn test_page_overflow_is_a_query_error() {
        let shards = vec![shard_with("shard-0", &[(1, 10)]).await];
        let router = PageRouter::new();

        let result = router
            .execute(
                &shards,
                usize::MAX,
                2,
                &Filter::accept_all(),
                &Order::by_field("id"),
                &Projection::identity(),
            )
            .await;

        assert!(matches!(result, Err(ScatterError::Query { .. })));
    }
}
