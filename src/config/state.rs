// Application state module
// Shared handle passed to every connection: configuration plus the record store

use std::sync::atomic::AtomicUsize;
use tokio::sync::Notify;

use super::types::Config;
use crate::store::StudentStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: StudentStore,

    /// Connections currently being served
    pub active_connections: AtomicUsize,

    /// Fired once when the process should stop accepting connections
    pub shutdown_signal: Notify,
}

impl AppState {
    /// Create state with an empty store
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: StudentStore::new(),
            active_connections: AtomicUsize::new(0),
            shutdown_signal: Notify::new(),
        }
    }
}
