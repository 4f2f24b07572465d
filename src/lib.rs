//! Token analytics client: polls the backend token API into a single store,
//! filters and scores tokens locally, and serves the results over a local
//! JSON API consumed by the terminal dashboard.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod format;
pub mod history;
pub mod poller;
pub mod scorer;
pub mod state;
pub mod types;
