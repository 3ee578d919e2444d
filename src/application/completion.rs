use crate::domain::transaction::TransactionStatus;
use tokio::sync::oneshot;

/// Where an item's unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Saved by a transaction worker that had no verifier to hand off to.
    Processed,
    /// Saved, verified and re-saved.
    Verified,
    /// The stored value could not be parsed and was re-saved as a failed record.
    Repaired,
    /// The transaction worker could not persist the record.
    SaveFailed,
    /// The status worker could not read the record back.
    StatusUnknown,
    /// The status worker could not persist the verified record.
    VerifySaveFailed,
    /// The work was dropped before anyone reported on it.
    Lost,
}

/// Per-item result collected by the batch barrier.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub index: usize,
    pub id: String,
    pub transaction_slot: Option<usize>,
    pub status_slot: Option<usize>,
    /// Last status a worker wrote for this item.
    pub status: Option<TransactionStatus>,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    fn new(index: usize, id: String) -> Self {
        Self {
            index,
            id,
            transaction_slot: None,
            status_slot: None,
            status: None,
            outcome: ItemOutcome::Lost,
        }
    }

    pub fn lost(index: usize, id: String) -> Self {
        Self::new(index, id)
    }
}

/// Completion token that travels with an item through both worker stages.
///
/// Exactly one stage finishes it. Dropping it unfinished makes the waiting side
/// observe [`ItemOutcome::Lost`].
#[derive(Debug)]
pub struct Completion {
    report: ItemReport,
    reply: oneshot::Sender<ItemReport>,
}

impl Completion {
    pub fn new(index: usize, id: String) -> (Self, oneshot::Receiver<ItemReport>) {
        let (reply, rx) = oneshot::channel();
        let completion = Self {
            report: ItemReport::new(index, id),
            reply,
        };
        (completion, rx)
    }

    pub fn set_transaction_slot(&mut self, slot: usize) {
        self.report.transaction_slot = Some(slot);
    }

    pub fn set_status_slot(&mut self, slot: usize) {
        self.report.status_slot = Some(slot);
    }

    pub fn set_status(&mut self, status: TransactionStatus) {
        self.report.status = Some(status);
    }

    pub fn finish(mut self, outcome: ItemOutcome) {
        self.report.outcome = outcome;
        // The waiter may already be gone when a cycle is abandoned.
        let _ = self.reply.send(self.report);
    }
}

/// Everything the barrier collected for one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub submitted: usize,
    /// Item reports ordered by batch index.
    pub items: Vec<ItemReport>,
}

impl BatchOutcome {
    pub fn count(&self, outcome: ItemOutcome) -> usize {
        self.items.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Items that finished both stages, repaired ones included.
    pub fn verified(&self) -> usize {
        self.count(ItemOutcome::Verified) + self.count(ItemOutcome::Repaired)
    }

    /// Items that stopped at a storage failure.
    pub fn failed(&self) -> usize {
        self.count(ItemOutcome::SaveFailed)
            + self.count(ItemOutcome::StatusUnknown)
            + self.count(ItemOutcome::VerifySaveFailed)
    }

    pub fn lost(&self) -> usize {
        self.count(ItemOutcome::Lost) + self.submitted.saturating_sub(self.items.len())
    }
}
