//! Reader/writer gate over the entity graph
//!
//! Ingestion holds the write side for a whole run so that queries never
//! observe a half-rebuilt graph.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared graph gate, cloned into the orchestrator and the query service
#[derive(Debug, Clone, Default)]
pub struct GraphGate {
    lock: Arc<RwLock<()>>,
}

impl GraphGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared access for a query
    pub async fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// Acquire exclusive access for an ingestion run
    pub async fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}
