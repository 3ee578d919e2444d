use super::completion::Completion;
use crate::domain::transaction::Transaction;
use tokio::sync::mpsc;

/// Inbox of a worker slot.
pub type Inbox = mpsc::UnboundedSender<Message>;

/// A transaction to process, with the status worker that should verify it.
#[derive(Debug)]
pub struct TransactionJob {
    pub transaction: Transaction,
    pub verifier: Option<Inbox>,
    pub completion: Completion,
}

/// A transaction id to re-read and mark as verified.
#[derive(Debug)]
pub struct VerifyJob {
    pub id: String,
    pub completion: Completion,
}

/// Everything a worker slot can receive.
#[derive(Debug)]
pub enum Message {
    Start,
    Stop,
    Restart,
    Transaction(TransactionJob),
    Verify(VerifyJob),
    Unknown,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Start => "start",
            Message::Stop => "stop",
            Message::Restart => "restart",
            Message::Transaction(_) => "transaction",
            Message::Verify(_) => "verify",
            Message::Unknown => "unknown",
        }
    }
}
