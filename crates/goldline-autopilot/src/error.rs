//! # Autopilot Error Types
//!
//! Error types for the order book, the desk and the autopilot job.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Autopilot Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Collaborators │  │     Orders              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  Core (from core crate) │ │
//! │  │  ConfigLoad     │  │  Sink           │  │  OrderNotFound          │ │
//! │  │  ConfigSave     │  │  Io / Json      │  │  DuplicateOrder         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Scheduling: CycleInProgress, ChannelError                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use goldline_core::CoreError;

use crate::messaging::TransportError;
use crate::sink::SinkError;

/// Result type alias for autopilot operations.
pub type AutopilotResult<T> = Result<T, AutopilotError>;

/// Error type covering everything outside the pure core.
#[derive(Debug, Error)]
pub enum AutopilotError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid autopilot configuration.
    #[error("Invalid autopilot configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Reading or writing a data file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Order or message data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(String),

    /// The persistence sink rejected an order.
    #[error("Persistence failed: {0}")]
    Sink(#[from] SinkError),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// A pricing, schedule or state-transition rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No order with this ID is in the order book.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// An order with this ID already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(String),

    // =========================================================================
    // Messaging Errors
    // =========================================================================
    /// The message transport failed.
    #[error("Message transport failed: {0}")]
    Transport(#[from] TransportError),

    // =========================================================================
    // Scheduling Errors
    // =========================================================================
    /// Another autopilot cycle is still running.
    #[error("An autopilot cycle is already running")]
    CycleInProgress,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<goldline_core::ValidationError> for AutopilotError {
    fn from(err: goldline_core::ValidationError) -> Self {
        AutopilotError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for AutopilotError {
    fn from(err: std::io::Error) -> Self {
        AutopilotError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AutopilotError {
    fn from(err: serde_json::Error) -> Self {
        AutopilotError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for AutopilotError {
    fn from(err: toml::de::Error) -> Self {
        AutopilotError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for AutopilotError {
    fn from(err: toml::ser::Error) -> Self {
        AutopilotError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl AutopilotError {
    /// Returns true if the operation may succeed when tried again later.
    ///
    /// Messaging failures surface to staff as a retryable notice.
    pub fn is_retryable(&self) -> bool {
        match self {
            AutopilotError::Transport(err) => err.is_retryable(),
            AutopilotError::CycleInProgress | AutopilotError::Io(_) | AutopilotError::Sink(_) => {
                true
            }
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AutopilotError::InvalidConfig(_)
                | AutopilotError::ConfigLoadFailed(_)
                | AutopilotError::ConfigSaveFailed(_)
        )
    }
}
