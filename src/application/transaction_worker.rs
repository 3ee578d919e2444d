use super::completion::ItemOutcome;
use super::message::{Message, TransactionJob, VerifyJob};
use super::worker::{Worker, log_lifecycle};
use crate::domain::ports::TransactionStoreRef;
use crate::domain::transaction::TransactionStatus;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

/// Draws the terminal status of a transaction.
pub fn decide_status<R: Rng + ?Sized>(rng: &mut R, failure_rate: f64) -> TransactionStatus {
    if rng.r#gen::<f64>() < failure_rate {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Processed
    }
}

/// Moves a pending transaction to a terminal status, persists it and hands its id
/// to the verifier carried by the job.
pub struct TransactionWorker {
    slot: usize,
    store: TransactionStoreRef,
    failure_rate: f64,
    rng: StdRng,
}

impl TransactionWorker {
    pub fn new(slot: usize, store: TransactionStoreRef, failure_rate: f64, rng: StdRng) -> Self {
        Self {
            slot,
            store,
            failure_rate,
            rng,
        }
    }

    async fn process(&mut self, job: TransactionJob) {
        let TransactionJob {
            mut transaction,
            verifier,
            mut completion,
        } = job;
        completion.set_transaction_slot(self.slot);

        let started = Utc::now();
        transaction.created_at = Some(started);
        let status = decide_status(&mut self.rng, self.failure_rate);
        transaction.update_status(status);
        completion.set_status(status);

        let saved = match transaction.stringify() {
            Ok(value) => self.store.save(&transaction.id, &value).await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            warn!(id = %transaction.id, error = %e, "Transaction dropped");
            completion.finish(ItemOutcome::SaveFailed);
            return;
        }

        // Counter failures are already logged by the store and do not affect the item.
        let _ = self.store.record_outcome(status).await;

        let latency = Utc::now() - started;
        debug!(
            id = %transaction.id,
            ?status,
            latency_us = latency.num_microseconds(),
            "Transaction processed"
        );

        match verifier {
            Some(verifier) => {
                let job = VerifyJob {
                    id: transaction.id,
                    completion,
                };
                if verifier.send(Message::Verify(job)).is_err() {
                    warn!(slot = self.slot, "Status worker is gone, verification skipped");
                }
            }
            None => completion.finish(ItemOutcome::Processed),
        }
    }
}

#[async_trait]
impl Worker for TransactionWorker {
    fn role(&self) -> &'static str {
        "transaction_worker"
    }

    fn slot(&self) -> usize {
        self.slot
    }

    async fn receive(&mut self, message: Message) {
        match message {
            Message::Transaction(job) => self.process(job).await,
            Message::Start | Message::Stop | Message::Restart => {
                log_lifecycle(self.role(), self.slot, &message)
            }
            // ignore all other inputs
            Message::Verify(_) | Message::Unknown => {}
        }
    }
}
