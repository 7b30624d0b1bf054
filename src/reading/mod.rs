//! Parsers for the remote feeds. Each turns one source format into typed
//! values and a history row.

pub mod climate;
pub mod hdd;
pub mod storage;
