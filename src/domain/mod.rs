//! Domain types and the storage ports the pipeline is written against.

pub mod ports;
pub mod stats;
pub mod transaction;
