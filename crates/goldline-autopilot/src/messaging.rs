//! # Messaging Seams
//!
//! The autopilot only needs to know whether a message went out and when the
//! last one did. Both questions are answered through traits so the real
//! WhatsApp/SMS gateway can live outside this workspace.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Autopilot ──send(OutboundMessage)──► MessageTransport                  │
//! │      │                                    │                             │
//! │      │              Ok(SendReceipt) ◄─────┘                             │
//! │      ▼                                                                  │
//! │  MessageHistory::record(entry)      (only confirmed sends)              │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  next cycle: last_outbound(order_id) ──► spacing check                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! History is keyed by order ID. Matching on phone-number suffixes would
//! merge customers who share a number and split one customer who changed
//! theirs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use goldline_core::{MessageKind, OutboundMessage};

use crate::error::AutopilotResult;

// =============================================================================
// Transport
// =============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::SendFailed(_) | TransportError::RateLimited(_)
        )
    }
}

/// Acknowledgement from a transport that a message was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub provider_id: Option<String>,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, TransportError>;
}

/// Transport that logs instead of sending. Used by the CLI.
#[derive(Default)]
pub struct DryRunTransport {
    send_count: AtomicU64,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageTransport for DryRunTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, TransportError> {
        if message.to.trim().is_empty() {
            return Err(TransportError::InvalidRecipient(format!(
                "order {} has no contact number",
                message.order_id
            )));
        }

        let n = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            to = %message.to,
            order_id = %message.order_id,
            kind = %message.kind,
            body_length = message.text.len(),
            "[DRY RUN] Message would be sent"
        );

        Ok(SendReceipt {
            provider_id: Some(format!("dry-run-{}", n)),
        })
    }
}

/// Transport that keeps every message it is handed. Can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails.
    pub fn failing() -> Self {
        RecordingTransport {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, TransportError> {
        if self.failing {
            return Err(TransportError::SendFailed("gateway unavailable".into()));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| TransportError::SendFailed("recorder poisoned".into()))?;
        sent.push(message.clone());

        Ok(SendReceipt {
            provider_id: Some(format!("rec-{}", sent.len())),
        })
    }
}

// =============================================================================
// History
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// One line of the message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageLogEntry {
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
    pub customer_id: String,
    pub phone_number: String,
    pub direction: Direction,
    #[serde(default)]
    pub kind: Option<MessageKind>,
    pub message: String,
}

impl MessageLogEntry {
    /// Log entry for a message that was just sent.
    pub fn outbound(message: &OutboundMessage, timestamp: DateTime<Utc>) -> Self {
        MessageLogEntry {
            timestamp,
            order_id: message.order_id.clone(),
            customer_id: message.customer_id.clone(),
            phone_number: message.to.clone(),
            direction: Direction::Outbound,
            kind: Some(message.kind),
            message: message.text.clone(),
        }
    }
}

#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// Outbound messages about `order_id`, newest first.
    async fn outbound_for(&self, order_id: &str) -> Vec<MessageLogEntry>;

    /// Appends an entry.
    async fn record(&self, entry: MessageLogEntry) -> AutopilotResult<()>;

    /// When the most recent outbound message about `order_id` went out.
    async fn last_outbound(&self, order_id: &str) -> Option<DateTime<Utc>> {
        self.outbound_for(order_id)
            .await
            .first()
            .map(|entry| entry.timestamp)
    }
}

/// Message log kept in memory, optionally mirrored to a JSON file.
pub struct MessageLog {
    entries: RwLock<Vec<MessageLogEntry>>,
    path: Option<PathBuf>,
}

impl MessageLog {
    /// A log that is never written to disk.
    pub fn in_memory() -> Self {
        MessageLog {
            entries: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Opens (or starts) a log backed by `path`.
    pub async fn open(path: PathBuf) -> AutopilotResult<Self> {
        let entries = read_entries(&path).await?;
        Ok(MessageLog {
            entries: RwLock::new(entries),
            path: Some(path),
        })
    }

    /// Loads the log at `path` but never writes it back.
    ///
    /// Spacing still sees the real history; new entries live in memory only.
    pub async fn open_read_only(path: PathBuf) -> AutopilotResult<Self> {
        let entries = read_entries(&path).await?;
        Ok(MessageLog {
            entries: RwLock::new(entries),
            path: None,
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn entries(&self) -> Vec<MessageLogEntry> {
        self.entries.read().await.clone()
    }
}

async fn read_entries(path: &Path) -> AutopilotResult<Vec<MessageLogEntry>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "Message log not found, starting empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl MessageHistory for MessageLog {
    async fn outbound_for(&self, order_id: &str) -> Vec<MessageLogEntry> {
        let mut matching: Vec<MessageLogEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.direction == Direction::Outbound && e.order_id == order_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }

    async fn record(&self, entry: MessageLogEntry) -> AutopilotResult<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let json = serde_json::to_string_pretty(&*entries)?;
            tokio::fs::write(path, json).await?;
        }

        Ok(())
    }
}
