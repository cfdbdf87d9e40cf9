//! # Activity Emitter
//!
//! Staff see a running activity feed and an error feed in the back office.
//! Both the desk and the autopilot report through [`ActivityEmitter`]; the
//! UI integration implements it, tests and the CLI use the ones here.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// What happened to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    OrderCreated,
    PaymentRecorded,
    ProtectionLapsed,
    ProtectionRevoked,
    OrderRepriced,
    WarningSent,
    QuoteSent,
    OrderDelivered,
    OrderCancelled,
    OverdueChanged,
    GoldRateChanged,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityKind::OrderCreated => "order_created",
            ActivityKind::PaymentRecorded => "payment_recorded",
            ActivityKind::ProtectionLapsed => "protection_lapsed",
            ActivityKind::ProtectionRevoked => "protection_revoked",
            ActivityKind::OrderRepriced => "order_repriced",
            ActivityKind::WarningSent => "warning_sent",
            ActivityKind::QuoteSent => "quote_sent",
            ActivityKind::OrderDelivered => "order_delivered",
            ActivityKind::OrderCancelled => "order_cancelled",
            ActivityKind::OverdueChanged => "overdue_changed",
            ActivityKind::GoldRateChanged => "gold_rate_changed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Trait for reporting activity and errors to staff.
pub trait ActivityEmitter: Send + Sync {
    /// Something happened to an order.
    fn activity(&self, kind: ActivityKind, details: &str);

    /// Something went wrong. `source` names the component.
    fn error(&self, source: &str, message: &str, severity: Severity);
}

/// No-op emitter for testing.
pub struct NoOpEmitter;

impl ActivityEmitter for NoOpEmitter {
    fn activity(&self, _kind: ActivityKind, _details: &str) {}
    fn error(&self, _source: &str, _message: &str, _severity: Severity) {}
}

/// Emitter that writes to the tracing subscriber.
pub struct TracingEmitter;

impl ActivityEmitter for TracingEmitter {
    fn activity(&self, kind: ActivityKind, details: &str) {
        info!(activity = %kind, "{}", details);
    }

    fn error(&self, source: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(source, "{}", message),
            Severity::Warning => warn!(source, "{}", message),
            Severity::Critical => error!(source, "{}", message),
        }
    }
}
