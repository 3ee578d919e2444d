use super::message::Message;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span};

/// Behaviour behind one pool slot.
#[async_trait]
pub trait Worker: Send + 'static {
    /// Name used in log spans.
    fn role(&self) -> &'static str;
    fn slot(&self) -> usize;
    async fn receive(&mut self, message: Message);
}

/// Logs a lifecycle notification. Lifecycle messages carry no work.
pub(crate) fn log_lifecycle(role: &str, slot: usize, message: &Message) {
    match message {
        Message::Start => debug!(role, slot, "Worker started"),
        Message::Stop => debug!(role, slot, "Worker stopping"),
        Message::Restart => debug!(role, slot, "Worker restarting"),
        _ => {}
    }
}

/// Drives a worker over its inbox until every sender is gone.
///
/// Messages are handled one at a time, in the order they were enqueued.
pub async fn run_slot<W: Worker>(mut worker: W, mut inbox: mpsc::UnboundedReceiver<Message>) {
    worker.receive(Message::Start).await;
    while let Some(message) = inbox.recv().await {
        let span = info_span!(
            "receive",
            role = worker.role(),
            slot = worker.slot(),
            kind = message.kind()
        );
        worker.receive(message).instrument(span).await;
    }
    worker.receive(Message::Stop).await;
}
