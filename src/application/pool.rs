use super::completion::{BatchOutcome, Completion, ItemReport};
use super::message::{Inbox, Message, TransactionJob};
use super::status_worker::StatusWorker;
use super::transaction_worker::TransactionWorker;
use super::worker::{Worker, run_slot};
use crate::domain::ports::TransactionStoreRef;
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::warn;

/// Mixes a slot index into a base seed so every slot draws an independent stream.
pub(crate) fn mix_seed(seed: u64, index: u64) -> u64 {
    seed ^ (index + 1).wrapping_mul(0x9e3779b97f4a7c15)
}

/// Pool slots an item is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub transaction_slot: usize,
    pub status_slot: usize,
}

/// Round-robin routing: item `index` goes to slot `index mod size` in each pool.
pub fn route(index: usize, pool_size: usize, status_pool_size: usize) -> Route {
    Route {
        transaction_slot: index % pool_size,
        status_slot: index % status_pool_size,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub pool_size: usize,
    pub status_pool_size: usize,
    pub failure_rate: f64,
    /// Base seed for the transaction workers' outcome draws.
    pub seed: u64,
}

/// Sending half of a slot plus the task running its worker.
struct Slot {
    inbox: Inbox,
    task: JoinHandle<()>,
}

impl Slot {
    fn spawn<W: Worker>(worker: W) -> Self {
        let (inbox, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_slot(worker, rx));
        Self { inbox, task }
    }

    async fn close(self) {
        drop(self.inbox);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Worker task ended abnormally");
        }
    }
}

/// Fixed-size pools of transaction and status workers.
///
/// Every slot owns its own worker state; the only thing shared between slots is
/// the transaction store. A pool lives for one cycle.
pub struct DispatchPool {
    transaction_slots: Vec<Slot>,
    status_slots: Vec<Slot>,
}

impl DispatchPool {
    /// Spawns one task per slot. Must be called inside a tokio runtime.
    pub fn spawn(settings: PoolSettings, store: TransactionStoreRef) -> Result<Self> {
        if settings.pool_size == 0 || settings.status_pool_size == 0 {
            return Err(PipelineError::ConfigError(
                "pool sizes must be > 0".to_string(),
            ));
        }

        let transaction_slots = (0..settings.pool_size)
            .map(|slot| {
                let rng = StdRng::seed_from_u64(mix_seed(settings.seed, slot as u64));
                Slot::spawn(TransactionWorker::new(
                    slot,
                    store.clone(),
                    settings.failure_rate,
                    rng,
                ))
            })
            .collect();
        let status_slots = (0..settings.status_pool_size)
            .map(|slot| Slot::spawn(StatusWorker::new(slot, store.clone())))
            .collect();

        Ok(Self {
            transaction_slots,
            status_slots,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.transaction_slots.len()
    }

    pub fn status_pool_size(&self) -> usize {
        self.status_slots.len()
    }

    pub fn route(&self, index: usize) -> Route {
        route(index, self.pool_size(), self.status_pool_size())
    }

    /// Dispatches every transaction and waits until each one has either been
    /// verified or stopped at a failure.
    ///
    /// One task is spawned per item; it enqueues the job on the routed transaction
    /// worker, naming the routed status worker as verifier, and awaits the item's
    /// completion.
    pub async fn submit_batch(&self, transactions: Vec<Transaction>) -> BatchOutcome {
        let submitted = transactions.len();
        let mut tasks = JoinSet::new();

        for (index, transaction) in transactions.into_iter().enumerate() {
            let route = self.route(index);
            let inbox = self.transaction_slots[route.transaction_slot].inbox.clone();
            let verifier = self.status_slots[route.status_slot].inbox.clone();

            tasks.spawn(async move {
                let id = transaction.id.clone();
                let (completion, reply) = Completion::new(index, id.clone());
                let job = TransactionJob {
                    transaction,
                    verifier: Some(verifier),
                    completion,
                };
                // A closed inbox drops the job, which resolves `reply` as lost.
                let _ = inbox.send(Message::Transaction(job));
                reply.await.unwrap_or_else(|_| ItemReport::lost(index, id))
            });
        }

        let mut items = Vec::with_capacity(submitted);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => items.push(report),
                Err(e) => warn!(error = %e, "Dispatch task failed"),
            }
        }
        items.sort_by_key(|report| report.index);

        BatchOutcome { submitted, items }
    }

    /// Closes every inbox and waits for the workers to drain and stop.
    pub async fn shutdown(self) {
        for slot in self.transaction_slots {
            slot.close().await;
        }
        for slot in self.status_slots {
            slot.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::completion::ItemOutcome;
    use crate::config::CounterMode;
    use crate::infrastructure::cache_store::CacheStore;
    use crate::infrastructure::in_memory::InMemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    fn settings(pool_size: usize, status_pool_size: usize) -> PoolSettings {
        PoolSettings {
            pool_size,
            status_pool_size,
            failure_rate: 0.05,
            seed: 11,
        }
    }

    fn store() -> TransactionStoreRef {
        Arc::new(CacheStore::new(
            Arc::new(InMemoryStorage::new()),
            Duration::from_secs(120),
            CounterMode::External,
        ))
    }

    fn batch(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| Transaction {
                id: format!("T{i:05}"),
                amount: i as f64,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_route_is_modular() {
        assert_eq!(
            route(7, 3, 2),
            Route {
                transaction_slot: 1,
                status_slot: 1
            }
        );
        for index in 0..100 {
            let r = route(index, 4, 3);
            assert_eq!(r.transaction_slot, index % 4);
            assert_eq!(r.status_slot, index % 3);
            assert_eq!(r, route(index, 4, 3));
        }
    }

    #[test]
    fn test_mix_seed_separates_slots() {
        assert_ne!(mix_seed(1, 0), mix_seed(1, 1));
        assert_eq!(mix_seed(9, 4), mix_seed(9, 4));
    }

    #[tokio::test]
    async fn test_rejects_empty_pool() {
        assert!(matches!(
            DispatchPool::spawn(settings(0, 2), store()),
            Err(PipelineError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_items_reach_their_routed_slots() {
        let pool = DispatchPool::spawn(settings(3, 2), store()).unwrap();

        let outcome = pool.submit_batch(batch(20)).await;
        pool.shutdown().await;

        assert_eq!(outcome.submitted, 20);
        assert_eq!(outcome.items.len(), 20);
        for report in &outcome.items {
            assert_eq!(report.transaction_slot, Some(report.index % 3));
            assert_eq!(report.status_slot, Some(report.index % 2));
            assert_eq!(report.outcome, ItemOutcome::Verified);
        }
        assert_eq!(outcome.verified(), 20);
        assert_eq!(outcome.lost(), 0);
    }

    #[tokio::test]
    async fn test_routing_is_repeatable() {
        let mut runs = Vec::new();
        for _ in 0..2 {
            let pool = DispatchPool::spawn(settings(4, 3), store()).unwrap();
            let outcome = pool.submit_batch(batch(12)).await;
            pool.shutdown().await;
            let slots: Vec<_> = outcome
                .items
                .iter()
                .map(|r| (r.transaction_slot, r.status_slot))
                .collect();
            runs.push(slots);
        }
        assert_eq!(runs[0], runs[1]);
    }

    #[tokio::test]
    async fn test_empty_batch_releases_immediately() {
        let pool = DispatchPool::spawn(settings(2, 2), store()).unwrap();
        let outcome = pool.submit_batch(Vec::new()).await;
        pool.shutdown().await;

        assert_eq!(outcome.submitted, 0);
        assert!(outcome.items.is_empty());
    }
}
