// Public API for the host shell and integration tests

pub mod catalog;
pub mod config;
pub mod events;
pub mod state;
pub mod stats;
pub mod types;
