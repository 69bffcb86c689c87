//! Monitoring daemon: a serialized sampling loop feeding the alert pipeline,
//! with a small read-mostly HTTP API on the side.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod monitor;
pub mod state;
