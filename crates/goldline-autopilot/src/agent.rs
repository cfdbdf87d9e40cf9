//! # Collections Autopilot
//!
//! Periodic job that walks every open order and carries out what
//! [`goldline_core::decide`] asks for.
//!
//! ## Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Autopilot::run_cycle(now)                        │
//! │                                                                         │
//! │  try_lock(cycle) ──busy──► Err(CycleInProgress)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  settings + snapshot of OrderBook                                       │
//! │       │                                                                 │
//! │       ▼  for each open order                                            │
//! │  history.last_outbound(order_id) ──► decide(order, now, last, settings) │
//! │       │                                                                 │
//! │       ├── Lapse ─────────► re-check current order, lapse ──► notice     │
//! │       ├── GraceWarning ──► send ──ok──► record history                  │
//! │       │                              └──► warning_count += 1            │
//! │       └── DynamicQuote ──► send ──ok──► record history                  │
//! │                                                                         │
//! │  Send failures are logged and counted. Nothing is rolled back.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling
//! - [`Autopilot::spawn`] ticks on a `tokio::time::interval`; missed ticks are
//!   delayed, never bunched
//! - Only one cycle runs at a time; an overlapping call is refused rather than
//!   queued

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use goldline_core::messages;
use goldline_core::protection::lapse_protection;
use goldline_core::{
    decide, evaluate_protection, record_warning_sent, AutopilotDecision, Order, OutboundMessage,
    ProtectionCheck, SnapshotReason, StoreSettings,
};

use crate::emitter::{ActivityEmitter, ActivityKind, NoOpEmitter, Severity};
use crate::error::{AutopilotError, AutopilotResult};
use crate::messaging::{MessageHistory, MessageLog, MessageLogEntry, MessageTransport};
use crate::sink::{NullSink, OrderSink};
use crate::store::OrderBook;

/// Component name used in error reports.
const SOURCE: &str = "autopilot";

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Open orders examined.
    pub scanned: usize,
    pub warnings_sent: usize,
    pub lapsed: usize,
    pub quotes_sent: usize,
    /// Every message that went out, lapse notices included.
    pub messages_sent: usize,
    pub send_failures: usize,
    /// Decisions that could not be made or committed.
    pub errors: usize,
}

impl CycleReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        CycleReport {
            started_at,
            scanned: 0,
            warnings_sent: 0,
            lapsed: 0,
            quotes_sent: 0,
            messages_sent: 0,
            send_failures: 0,
            errors: 0,
        }
    }
}

// =============================================================================
// Autopilot
// =============================================================================

/// The collections autopilot. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Autopilot {
    book: OrderBook,
    transport: Arc<dyn MessageTransport>,
    history: Arc<dyn MessageHistory>,
    sink: Arc<dyn OrderSink>,
    emitter: Arc<dyn ActivityEmitter>,
    cycle_lock: Arc<Mutex<()>>,
}

impl Autopilot {
    pub fn new(
        book: OrderBook,
        transport: Arc<dyn MessageTransport>,
        history: Arc<dyn MessageHistory>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        Self::with_emitter(book, transport, history, sink, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(
        book: OrderBook,
        transport: Arc<dyn MessageTransport>,
        history: Arc<dyn MessageHistory>,
        sink: Arc<dyn OrderSink>,
        emitter: Arc<dyn ActivityEmitter>,
    ) -> Self {
        Autopilot {
            book,
            transport,
            history,
            sink,
            emitter,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Runs one scan of the order book as of `now`.
    ///
    /// ## Errors
    /// `CycleInProgress` if another cycle holds the lock. Per-order failures
    /// do not fail the cycle; they are counted in the report.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> AutopilotResult<CycleReport> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| AutopilotError::CycleInProgress)?;

        let settings = self.book.settings().await;
        let orders = self.book.snapshot().await;
        let mut report = CycleReport::new(now);

        debug!(orders = orders.len(), %now, "Autopilot cycle starting");

        for order in orders.iter().filter(|o| o.is_open()) {
            report.scanned += 1;

            let last_outbound = self.history.last_outbound(&order.id).await;
            match decide(order, now, last_outbound, &settings) {
                Ok(Some(decision)) => self.execute(decision, now, &settings, &mut report).await,
                Ok(None) => {}
                Err(e) => {
                    report.errors += 1;
                    warn!(order_id = %order.id, error = %e, "Autopilot could not decide");
                    self.emitter.error(
                        SOURCE,
                        &format!("Order {}: {}", order.id, e),
                        Severity::Warning,
                    );
                }
            }
        }

        info!(
            scanned = report.scanned,
            warnings = report.warnings_sent,
            lapsed = report.lapsed,
            quotes = report.quotes_sent,
            failures = report.send_failures,
            errors = report.errors,
            "Autopilot cycle finished"
        );

        Ok(report)
    }

    async fn execute(
        &self,
        decision: AutopilotDecision,
        now: DateTime<Utc>,
        settings: &StoreSettings,
        report: &mut CycleReport,
    ) {
        match decision {
            AutopilotDecision::Lapse { order, .. } => {
                let Some(lapsed) = self.lapse(&order.id, now, settings, report).await else {
                    return;
                };
                report.lapsed += 1;
                self.emitter.activity(
                    ActivityKind::ProtectionLapsed,
                    &format!("Order {} lost its booked rate", lapsed.id),
                );

                let message = messages::protection_lapsed(&lapsed);
                self.deliver(&message, now, report).await;
            }

            AutopilotDecision::GraceWarning {
                order_id,
                milestone_id,
                level,
                message,
            } => {
                if !self.deliver(&message, now, report).await {
                    return;
                }
                report.warnings_sent += 1;
                self.emitter.activity(
                    ActivityKind::WarningSent,
                    &format!("{} warning for order {} ({})", level, order_id, milestone_id),
                );

                let counted = self
                    .book
                    .update(&order_id, self.sink.as_ref(), |current| {
                        record_warning_sent(current, &milestone_id).map(Some)
                    })
                    .await;
                if let Err(e) = counted {
                    report.errors += 1;
                    warn!(order_id = %order_id, error = %e, "Failed to record warning count");
                }
            }

            AutopilotDecision::DynamicQuote {
                order_id,
                quote,
                message,
            } => {
                if !self.deliver(&message, now, report).await {
                    return;
                }
                report.quotes_sent += 1;
                self.emitter.activity(
                    ActivityKind::QuoteSent,
                    &format!(
                        "Quoted order {} at {} ({} over the original)",
                        order_id,
                        quote.quoted_total,
                        quote.difference()
                    ),
                );
            }
        }
    }

    /// Lapses the current copy of the order if its grace period has still
    /// expired. The decision was made on a snapshot; a payment recorded at
    /// the desk since then must not be overwritten.
    ///
    /// Returns the lapsed order, or `None` if nothing was lapsed.
    async fn lapse(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
        settings: &StoreSettings,
        report: &mut CycleReport,
    ) -> Option<Order> {
        let outcome = self
            .book
            .update(order_id, self.sink.as_ref(), |current| {
                Ok(match evaluate_protection(current, now, settings.grace_period_hours) {
                    ProtectionCheck::GraceExpired { .. } => Some(lapse_protection(
                        current,
                        SnapshotReason::GracePeriodExpired,
                        now,
                    )),
                    _ => None,
                })
            })
            .await;

        match outcome {
            Ok(Some(lapsed)) => Some(lapsed),
            Ok(None) => {
                debug!(order_id, "Order caught up before lapse, leaving it");
                None
            }
            Err(e) => {
                report.errors += 1;
                error!(order_id, error = %e, "Failed to commit lapse");
                self.emitter
                    .error(SOURCE, &format!("Order {}: {}", order_id, e), Severity::Critical);

                // The lapse stands in memory even when persisting it failed.
                match e {
                    AutopilotError::Sink(_) => self.book.get(order_id).await,
                    _ => None,
                }
            }
        }
    }

    /// Sends one message and records it. Returns true if it went out.
    async fn deliver(
        &self,
        message: &OutboundMessage,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> bool {
        match self.transport.send(message).await {
            Ok(receipt) => {
                report.messages_sent += 1;
                debug!(
                    order_id = %message.order_id,
                    kind = %message.kind,
                    provider_id = ?receipt.provider_id,
                    "Message sent"
                );
                if let Err(e) = self.history.record(MessageLogEntry::outbound(message, now)).await {
                    report.errors += 1;
                    error!(order_id = %message.order_id, error = %e, "Failed to record message");
                }
                true
            }
            Err(e) => {
                report.send_failures += 1;
                let retryable = e.is_retryable();
                warn!(
                    order_id = %message.order_id,
                    kind = %message.kind,
                    error = %e,
                    retryable,
                    "Message send failed"
                );
                let severity = if retryable {
                    Severity::Warning
                } else {
                    Severity::Critical
                };
                self.emitter.error(
                    SOURCE,
                    &format!(
                        "Could not message {} about order {}: {}",
                        message.customer_name, message.order_id, e
                    ),
                    severity,
                );
                false
            }
        }
    }

    /// Starts running cycles every `period` until the handle is shut down.
    ///
    /// The first cycle runs immediately.
    pub fn spawn(&self, period: Duration) -> AutopilotHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let last_report = Arc::new(RwLock::new(None));

        let autopilot = self.clone();
        let report_slot = last_report.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            info!(period_secs = period.as_secs(), "Autopilot started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match autopilot.run_cycle(Utc::now()).await {
                            Ok(report) => {
                                *report_slot.write().await = Some(report);
                            }
                            Err(AutopilotError::CycleInProgress) => {
                                debug!("Previous cycle still running, skipping tick");
                            }
                            Err(e) => {
                                error!(error = %e, "Autopilot cycle failed");
                                autopilot.emitter.error(SOURCE, &e.to_string(), Severity::Critical);
                            }
                        }
                    }

                    _ = shutdown_rx.recv() => {
                        info!("Autopilot received shutdown");
                        break;
                    }
                }
            }
        });

        AutopilotHandle {
            shutdown_tx,
            last_report,
            task,
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for a running autopilot.
pub struct AutopilotHandle {
    shutdown_tx: mpsc::Sender<()>,
    last_report: Arc<RwLock<Option<CycleReport>>>,
    task: JoinHandle<()>,
}

impl AutopilotHandle {
    /// Report of the most recently finished cycle.
    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    /// Stops the job and waits for the current cycle to finish.
    pub async fn shutdown(self) -> AutopilotResult<()> {
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| AutopilotError::ChannelError(e.to_string()))
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for an [`Autopilot`] with optional collaborators.
pub struct AutopilotBuilder {
    book: OrderBook,
    transport: Option<Arc<dyn MessageTransport>>,
    history: Option<Arc<dyn MessageHistory>>,
    sink: Option<Arc<dyn OrderSink>>,
    emitter: Option<Arc<dyn ActivityEmitter>>,
}

impl AutopilotBuilder {
    pub fn new(book: OrderBook) -> Self {
        AutopilotBuilder {
            book,
            transport: None,
            history: None,
            sink: None,
            emitter: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn MessageTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn MessageHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn OrderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ActivityEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Builds the autopilot. A transport is required; history defaults to
    /// an in-memory log and persistence to [`NullSink`].
    pub fn build(self) -> AutopilotResult<Autopilot> {
        let transport = self
            .transport
            .ok_or_else(|| AutopilotError::InvalidConfig("Message transport required".into()))?;
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MessageLog::in_memory()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NullSink));
        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));

        Ok(Autopilot::with_emitter(self.book, transport, history, sink, emitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::DryRunTransport;
    use goldline_core::StoreSettings;

    #[test]
    fn test_builder_requires_transport() {
        let book = OrderBook::new(Vec::new(), StoreSettings::default());
        let err = AutopilotBuilder::new(book.clone()).build().err().unwrap();
        assert!(err.is_config_error());

        assert!(AutopilotBuilder::new(book)
            .with_transport(Arc::new(DryRunTransport::new()))
            .build()
            .is_ok());
    }

    #[tokio::test]
    async fn test_empty_book_cycle() {
        let autopilot = AutopilotBuilder::new(OrderBook::new(Vec::new(), StoreSettings::default()))
            .with_transport(Arc::new(DryRunTransport::new()))
            .build()
            .unwrap();

        let report = autopilot.run_cycle(Utc::now()).await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.messages_sent, 0);
    }

    #[tokio::test]
    async fn test_spawned_job_shuts_down() {
        let autopilot = AutopilotBuilder::new(OrderBook::new(Vec::new(), StoreSettings::default()))
            .with_transport(Arc::new(DryRunTransport::new()))
            .build()
            .unwrap();

        let handle = autopilot.spawn(Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.last_report().await.is_some());
        handle.shutdown().await.unwrap();
    }
}
