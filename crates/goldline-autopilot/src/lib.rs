//! # goldline-autopilot: Order Book and Collections Autopilot
//!
//! Everything around [`goldline_core`] that touches the outside world: the
//! clock, the shared order list, persistence and customer messages.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      goldline-autopilot (THIS CRATE)                    │
//! │                                                                         │
//! │   Staff (back office)                 Timer (tokio interval)            │
//! │          │                                    │                         │
//! │          ▼                                    ▼                         │
//! │   ┌─────────────┐                      ┌─────────────┐                  │
//! │   │    Desk     │                      │  Autopilot  │──► Transport     │
//! │   └──────┬──────┘                      └──────┬──────┘──► History       │
//! │          │        ┌──────────────────┐        │                         │
//! │          └───────►│    OrderBook     │◄───────┘                         │
//! │                   │ (single writer)  │──► OrderSink (JSON files)        │
//! │                   └────────┬─────────┘──► OrderEvent broadcast          │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                   goldline-core (pure)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - TOML configuration with env overrides
//! - [`store`] - The shared order book
//! - [`desk`] - Staff operations
//! - [`agent`] - The periodic autopilot job
//! - [`messaging`] - Transport and message-history seams
//! - [`sink`] - Order persistence
//! - [`emitter`] - Activity and error feed
//! - [`error`] - Error types

pub mod agent;
pub mod config;
pub mod desk;
pub mod emitter;
pub mod error;
pub mod messaging;
pub mod sink;
pub mod store;

pub use agent::{Autopilot, AutopilotBuilder, AutopilotHandle, CycleReport};
pub use config::AutopilotConfig;
pub use desk::Desk;
pub use emitter::{ActivityEmitter, ActivityKind, NoOpEmitter, Severity, TracingEmitter};
pub use error::{AutopilotError, AutopilotResult};
pub use messaging::{
    Direction, DryRunTransport, MessageHistory, MessageLog, MessageLogEntry, MessageTransport,
    RecordingTransport, SendReceipt, TransportError,
};
pub use sink::{load_orders, JsonFileSink, NullSink, OrderSink, SinkError};
pub use store::{OrderBook, OrderEvent};
