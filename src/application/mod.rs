//! Application layer: the worker pools and the cycle that drives them.
//!
//! Each pool slot is a tokio task that owns its worker state and drains an
//! unbounded inbox in order. Work items carry a completion token through the
//! transaction and status stages so the batch barrier knows when an item is done.

pub mod completion;
pub mod message;
pub mod orchestrator;
pub mod pool;
pub mod scheduler;
pub mod status_worker;
pub mod transaction_worker;
pub mod worker;
