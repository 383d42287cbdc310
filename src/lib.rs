//! FinOps Advisor Library
//!
//! Query cost analytics over a pay-per-scan warehouse or a provisioned
//! relational database: cost resources, optimization findings and savings
//! recommendations behind one dispatcher.

use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;
pub mod verify;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use services::{CostBackend, Dispatcher, DispatcherState, create_backend};

/// Application shared state
///
/// The dispatcher is built once at startup and never replaced; it owns the
/// active backend.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}
