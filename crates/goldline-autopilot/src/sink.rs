//! # Order Persistence
//!
//! Every committed order is handed to an [`OrderSink`]. The order book never
//! waits on a database; the sink decides what "saved" means.
//!
//! [`JsonFileSink`] writes one pretty-printed JSON file per order:
//!
//! ```text
//! orders/
//! ├── ORD-1.json
//! ├── ORD-2.json
//! └── ...
//! ```
//!
//! Writes go to `<id>.json.tmp` first and are renamed into place, so a crash
//! mid-write leaves the previous version intact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use goldline_core::Order;

use crate::error::AutopilotResult;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write order {order_id}: {reason}")]
    Io { order_id: String, reason: String },

    #[error("Failed to serialize order {order_id}: {reason}")]
    Serialize { order_id: String, reason: String },
}

#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn persist(&self, order: &Order) -> Result<(), SinkError>;
}

/// Sink that discards everything. Used for dry runs and tests.
pub struct NullSink;

#[async_trait]
impl OrderSink for NullSink {
    async fn persist(&self, order: &Order) -> Result<(), SinkError> {
        debug!(order_id = %order.id, "Discarding order write");
        Ok(())
    }
}

/// One JSON file per order under a directory.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, order_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", order_id))
    }
}

#[async_trait]
impl OrderSink for JsonFileSink {
    async fn persist(&self, order: &Order) -> Result<(), SinkError> {
        let io_err = |e: std::io::Error| SinkError::Io {
            order_id: order.id.clone(),
            reason: e.to_string(),
        };

        let json = serde_json::to_string_pretty(order).map_err(|e| SinkError::Serialize {
            order_id: order.id.clone(),
            reason: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let path = self.path_for(&order.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;

        debug!(order_id = %order.id, ?path, "Order persisted");
        Ok(())
    }
}

/// Loads every `*.json` order in `dir`, sorted by creation time.
///
/// A missing directory is an empty book. Files that fail to parse are
/// skipped with a warning so one bad file cannot stop the autopilot.
pub async fn load_orders(dir: &Path) -> AutopilotResult<Vec<Order>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?dir, "Orders directory not found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut orders = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        match serde_json::from_str::<Order>(&contents) {
            Ok(order) => orders.push(order),
            Err(e) => warn!(?path, error = %e, "Skipping unreadable order file"),
        }
    }

    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
}
