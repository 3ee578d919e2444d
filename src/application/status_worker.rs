use super::completion::ItemOutcome;
use super::message::{Message, VerifyJob};
use super::worker::{Worker, log_lifecycle};
use crate::domain::ports::TransactionStoreRef;
use crate::domain::transaction::{Transaction, TransactionStatus};
use async_trait::async_trait;
use tracing::{info, warn};

/// Re-reads a persisted transaction by id, marks it verified and persists it again.
pub struct StatusWorker {
    slot: usize,
    store: TransactionStoreRef,
}

impl StatusWorker {
    pub fn new(slot: usize, store: TransactionStoreRef) -> Self {
        Self { slot, store }
    }

    async fn verify(&mut self, job: VerifyJob) {
        let VerifyJob { id, mut completion } = job;
        completion.set_status_slot(self.slot);

        let stored = match self.store.get(&id).await {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => {
                info!(id = %id, "Status for transaction is unknown");
                completion.finish(ItemOutcome::StatusUnknown);
                return;
            }
        };

        let (mut transaction, repaired) = match Transaction::parse(&stored) {
            Ok(transaction) => (transaction, false),
            Err(e) => {
                warn!(id = %id, error = %e, "Stored transaction is malformed, marking it failed");
                let transaction = Transaction {
                    id: id.clone(),
                    status: TransactionStatus::Failed,
                    ..Default::default()
                };
                (transaction, true)
            }
        };
        transaction.mark_read();
        completion.set_status(transaction.status);

        let saved = match transaction.stringify() {
            Ok(value) => self.store.save(&id, &value).await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            warn!(id = %id, error = %e, "Failed to update transaction status in storage");
            completion.finish(ItemOutcome::VerifySaveFailed);
            return;
        }

        if !repaired {
            completion.finish(ItemOutcome::Verified);
            return;
        }

        // The record's earlier outcome is unreadable, so only the repair is counted.
        if let Err(e) = self.store.record_outcome(TransactionStatus::Failed).await {
            warn!(id = %id, error = %e, "Failed to count repaired transaction");
        }
        completion.finish(ItemOutcome::Repaired);
    }
}

#[async_trait]
impl Worker for StatusWorker {
    fn role(&self) -> &'static str {
        "status_worker"
    }

    fn slot(&self) -> usize {
        self.slot
    }

    async fn receive(&mut self, message: Message) {
        match message {
            Message::Verify(job) => self.verify(job).await,
            Message::Start | Message::Stop | Message::Restart => {
                log_lifecycle(self.role(), self.slot, &message)
            }
            // ignore all other inputs
            Message::Transaction(_) | Message::Unknown => {}
        }
    }
}
