//! WaniKani integration: typed API client, cache reconciliation, and sync
//! orchestration.

pub mod api_types;
pub mod client;
pub mod service;
pub mod sync;
pub mod types;
