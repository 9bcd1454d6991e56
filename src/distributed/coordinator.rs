use crate::cluster::{RandomSelector, Shard, ShardSelector};
use crate::distributed::PageRouter;
use crate::error::{ScatterError, ScatterResult};
use crate::query::{Filter, Order, Projection};
use crate::{Record, StoreConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

// Owns the fixed shard set, fans writes out to R replicas, and drives the
// two-phase query protocol through the router. Shard count and replication
// factor are fixed for the life of the coordinator.
pub struct Coordinator {
    shards: Vec<Arc<Shard>>,
    replication_factor: usize,
    selector: Arc<dyn ShardSelector>,
    router: PageRouter,
}

impl Coordinator {
    pub fn new(shard_count: usize, replication_factor: usize) -> ScatterResult<Self> {
        Self::with_selector(shard_count, replication_factor, Arc::new(RandomSelector))
    }

    pub fn with_selector(
        shard_count: usize,
        replication_factor: usize,
        selector: Arc<dyn ShardSelector>,
    ) -> ScatterResult<Self> {
        if replication_factor < 1 {
            return Err(ScatterError::Config {
                message: "replication factor must be at least 1".to_string(),
            });
        }
        if shard_count < replication_factor {
            return Err(ScatterError::Config {
                message: format!(
                    "shard count {shard_count} is below replication factor {replication_factor}"
                ),
            });
        }

        let shards = (0..shard_count)
            .map(|index| Arc::new(Shard::new(format!("shard-{index}"))))
            .collect();

        info!(
            "coordinator ready: {} shards, replication factor {}",
            shard_count, replication_factor
        );

        Ok(Self {
            shards,
            replication_factor,
            selector,
            router: PageRouter::new(),
        })
    }

    pub fn from_config(config: &StoreConfig) -> ScatterResult<Self> {
        Self::new(config.shard_count, config.replication_factor)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub fn shard(&self, index: usize) -> Option<&Arc<Shard>> {
        self.shards.get(index)
    }

    // Replicated append: R distinct shards picked uniformly per save, online
    // or not, with the appends fanned out in parallel.
    pub async fn save(&self, record: Record) -> ScatterResult<()> {
        let targets = self
            .selector
            .pick_distinct(self.shards.len(), self.replication_factor);
        debug!("replicating record to shards {:?}", targets);

        let mut tasks = Vec::with_capacity(targets.len());
        for index in targets {
            let shard = Arc::clone(&self.shards[index]);
            let record = record.clone();
            tasks.push(tokio::spawn(async move {
                shard.save(record).await;
            }));
        }

        for task in tasks {
            task.await
                .map_err(|e| ScatterError::Replication(format!("replica write failed: {e}")))?;
        }

        Ok(())
    }

    pub async fn save_all(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> ScatterResult<usize> {
        let mut saved = 0;
        for record in records {
            self.save(record).await?;
            saved += 1;
        }
        Ok(saved)
    }

    // Paginated, filtered, sorted read across all shards. Returns the exact
    // page a centralized store would return over the union of online
    // replicas, at most `page_size` rows.
    pub async fn query(
        &self,
        page: usize,
        page_size: usize,
        filter: &Filter,
        order: &Order,
        projection: &Projection,
    ) -> ScatterResult<Vec<Record>> {
        if page_size == 0 {
            return Err(ScatterError::Query {
                message: "page_size must be positive".to_string(),
            });
        }

        self.router
            .execute(&self.shards, page, page_size, filter, order, projection)
            .await
    }

    pub fn set_online(&self, index: usize, online: bool) -> ScatterResult<()> {
        match self.shards.get(index) {
            Some(shard) => {
                shard.set_online(online);
                Ok(())
            }
            None => Err(ScatterError::Config {
                message: format!("no shard at index {index}"),
            }),
        }
    }

    // Fault injection: take `count` selector-chosen shards offline and bring
    // every other shard back up. Returns the indices taken down.
    pub fn degrade_random(&self, count: usize) -> ScatterResult<Vec<usize>> {
        if count > self.shards.len() {
            return Err(ScatterError::Config {
                message: format!(
                    "cannot degrade {count} of {} shards",
                    self.shards.len()
                ),
            });
        }

        for shard in &self.shards {
            shard.set_online(true);
        }
        let downed = self.selector.pick_distinct(self.shards.len(), count);
        for &index in &downed {
            self.shards[index].set_online(false);
        }

        warn!("degraded shards {:?}", downed);
        Ok(downed)
    }

    pub async fn status(&self) -> Vec<ShardStatus> {
        let mut statuses = Vec::with_capacity(self.shards.len());
        for shard in &self.shards {
            statuses.push(ShardStatus {
                name: shard.name().to_string(),
                online: shard.is_online(),
                records: shard.record_count().await,
            });
        }
        statuses
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ShardStatus {
    pub name: String,
    pub online: bool,
    pub records: usize,
}
