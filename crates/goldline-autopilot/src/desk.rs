//! # Staff Desk
//!
//! The operations staff trigger from the back office. Each one runs the
//! matching core transition through the order book, which commits the result,
//! and reports it on the activity feed.
//!
//! ```text
//! Desk::record_payment("ORD-1", payment)
//!     │
//!     ├── book.update("ORD-1", ..) ──── missing ──► Err(OrderNotFound)
//!     │     └── projection::record_payment ── Err ──► Err(Core(..)), book untouched
//!     │         (runs on the current order under the write lock)
//!     └── emitter.activity(PaymentRecorded)
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use goldline_core::order::{cancel_order, mark_delivered, set_overdue};
use goldline_core::projection::record_payment;
use goldline_core::protection::{accept_new_rate, revoke_protection};
use goldline_core::{
    build_order, quote_at_rate, CoreResult, Order, OrderDraft, Payment, RepriceQuote,
};

use crate::emitter::{ActivityEmitter, ActivityKind, NoOpEmitter};
use crate::error::{AutopilotError, AutopilotResult};
use crate::sink::OrderSink;
use crate::store::OrderBook;

#[derive(Clone)]
pub struct Desk {
    book: OrderBook,
    sink: Arc<dyn OrderSink>,
    emitter: Arc<dyn ActivityEmitter>,
}

impl Desk {
    pub fn new(book: OrderBook, sink: Arc<dyn OrderSink>) -> Self {
        Self::with_emitter(book, sink, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(
        book: OrderBook,
        sink: Arc<dyn OrderSink>,
        emitter: Arc<dyn ActivityEmitter>,
    ) -> Self {
        Desk {
            book,
            sink,
            emitter,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Prices a draft at today's rate and books it.
    pub async fn create_order(
        &self,
        draft: OrderDraft,
        now: DateTime<Utc>,
    ) -> AutopilotResult<Order> {
        let settings = self.book.settings().await;
        let order = build_order(draft, &settings, now)?;

        self.book.insert(order.clone(), self.sink.as_ref()).await?;
        self.emitter.activity(
            ActivityKind::OrderCreated,
            &format!(
                "Order {} for {} booked at {}/g, {} over {} months",
                order.id,
                order.customer.name,
                order.gold_rate_at_booking,
                order.net_payable,
                order.plan.months
            ),
        );
        Ok(order)
    }

    pub async fn record_payment(&self, order_id: &str, payment: Payment) -> AutopilotResult<Order> {
        let amount = payment.amount;
        let updated = self.apply(order_id, |order| record_payment(order, payment)).await?;
        self.emitter.activity(
            ActivityKind::PaymentRecorded,
            &format!("{} received on order {}", amount, order_id),
        );
        Ok(updated)
    }

    /// Staff withdraws the booked rate by hand.
    pub async fn revoke_protection(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> AutopilotResult<Order> {
        let updated = self
            .apply(order_id, |order| revoke_protection(order, now))
            .await?;
        self.emitter.activity(
            ActivityKind::ProtectionRevoked,
            &format!("Protection revoked on order {}", order_id),
        );
        Ok(updated)
    }

    /// Customer agrees to continue at today's rate.
    pub async fn accept_new_rate(&self, order_id: &str) -> AutopilotResult<Order> {
        let settings = self.book.settings().await;
        let rate = settings.current_gold_rate_24k;
        let updated = self
            .apply(order_id, |order| accept_new_rate(order, rate, &settings))
            .await?;

        info!(order_id, rate, total = %updated.total_amount, "Order repriced");
        self.emitter.activity(
            ActivityKind::OrderRepriced,
            &format!(
                "Order {} repriced at {}/g, new total {}",
                order_id, rate, updated.total_amount
            ),
        );
        Ok(updated)
    }

    /// What the order would cost at today's rate. Nothing is committed.
    pub async fn quote(&self, order_id: &str) -> AutopilotResult<RepriceQuote> {
        let order = self.find(order_id).await?;
        let settings = self.book.settings().await;
        Ok(quote_at_rate(&order, settings.current_gold_rate_24k, &settings)?)
    }

    pub async fn mark_delivered(&self, order_id: &str) -> AutopilotResult<Order> {
        let updated = self.apply(order_id, mark_delivered).await?;
        self.emitter
            .activity(ActivityKind::OrderDelivered, &format!("Order {} handed over", order_id));
        Ok(updated)
    }

    pub async fn cancel_order(&self, order_id: &str) -> AutopilotResult<Order> {
        let updated = self.apply(order_id, cancel_order).await?;
        self.emitter
            .activity(ActivityKind::OrderCancelled, &format!("Order {} cancelled", order_id));
        Ok(updated)
    }

    pub async fn set_overdue(&self, order_id: &str, overdue: bool) -> AutopilotResult<Order> {
        let updated = self
            .apply(order_id, |order| set_overdue(order, overdue))
            .await?;
        self.emitter.activity(
            ActivityKind::OverdueChanged,
            &format!("Order {} is now {}", order_id, updated.status),
        );
        Ok(updated)
    }

    /// Sets today's 24K rate for pricing, quotes and repricing.
    pub async fn set_gold_rate(&self, rate_24k: f64) -> AutopilotResult<()> {
        self.book.set_gold_rate(rate_24k).await?;
        self.emitter.activity(
            ActivityKind::GoldRateChanged,
            &format!("24K rate set to {}/g", rate_24k),
        );
        Ok(())
    }

    async fn find(&self, order_id: &str) -> AutopilotResult<Order> {
        self.book
            .get(order_id)
            .await
            .ok_or_else(|| AutopilotError::OrderNotFound(order_id.to_string()))
    }

    async fn apply<F>(&self, order_id: &str, transition: F) -> AutopilotResult<Order>
    where
        F: FnOnce(&Order) -> CoreResult<Order>,
    {
        self.book
            .update(order_id, self.sink.as_ref(), |order| transition(order).map(Some))
            .await?
            .ok_or_else(|| AutopilotError::OrderNotFound(order_id.to_string()))
    }
}
