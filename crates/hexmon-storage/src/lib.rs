//! SQLite persistence: the append-only sample history plus the settings
//! table that keeps thresholds and alert state across restarts.

pub mod error;
pub mod store;


pub use error::{Result, StoreError};
pub use store::HistoryStore;
