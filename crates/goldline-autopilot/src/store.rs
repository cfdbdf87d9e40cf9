//! # Order Book
//!
//! The single in-process owner of the order list and store settings.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         OrderBook (Clone)                               │
//! │                                                                         │
//! │  orders:   Arc<RwLock<Vec<Order>>>       many readers, one writer       │
//! │  settings: Arc<RwLock<StoreSettings>>    gold rate changes live         │
//! │  events:   broadcast::Sender<OrderEvent> UI subscribes for refresh      │
//! │                                                                         │
//! │  Desk ──┐                                                              │
//! │         ├──► insert / update ──► replace in list ──► OrderSink          │
//! │  Autopilot                                  └──────► broadcast event    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Core operations are copy-on-write. Writers pass the transition to
//! [`OrderBook::update`], which runs it against the current order under the
//! write lock, so a payment recorded by staff while the autopilot is busy
//! sending cannot be overwritten by a stale copy.

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use goldline_core::{CoreError, CoreResult, Order, StoreSettings};

use crate::error::{AutopilotError, AutopilotResult};
use crate::sink::OrderSink;

/// Capacity of the order event channel.
const EVENT_CAPACITY: usize = 64;

/// Change notifications for subscribers.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(Order),
    Updated(Order),
    SettingsChanged(StoreSettings),
}

#[derive(Clone)]
pub struct OrderBook {
    orders: Arc<RwLock<Vec<Order>>>,
    settings: Arc<RwLock<StoreSettings>>,
    events: broadcast::Sender<OrderEvent>,
}

impl OrderBook {
    pub fn new(orders: Vec<Order>, settings: StoreSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        OrderBook {
            orders: Arc::new(RwLock::new(orders)),
            settings: Arc::new(RwLock::new(settings)),
            events,
        }
    }

    /// Copy of every order, in insertion order.
    pub async fn snapshot(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn get(&self, order_id: &str) -> Option<Order> {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    /// Adds a new order and persists it.
    pub async fn insert(&self, order: Order, sink: &dyn OrderSink) -> AutopilotResult<()> {
        {
            let mut orders = self.orders.write().await;
            if orders.iter().any(|o| o.id == order.id) {
                return Err(AutopilotError::DuplicateOrder(order.id));
            }
            orders.push(order.clone());
        }

        sink.persist(&order).await?;
        debug!(order_id = %order.id, "Order inserted");
        self.publish(OrderEvent::Created(order));
        Ok(())
    }

    /// Replaces an existing order and persists it.
    ///
    /// The in-memory book is updated even if the sink fails; the sink error
    /// is still returned so the caller can report it.
    pub async fn commit(&self, order: Order, sink: &dyn OrderSink) -> AutopilotResult<()> {
        let order_id = order.id.clone();
        self.update(&order_id, sink, |_| Ok(Some(order))).await?;
        Ok(())
    }

    /// Runs `transition` on the current copy of an order while holding the
    /// write lock, then stores and persists what it returns.
    ///
    /// `Ok(None)` from the transition leaves the order untouched and nothing
    /// is persisted or published. A transition error also leaves the book
    /// untouched. As with [`OrderBook::commit`], a sink failure is returned
    /// after the in-memory order has already been replaced.
    pub async fn update<F>(
        &self,
        order_id: &str,
        sink: &dyn OrderSink,
        transition: F,
    ) -> AutopilotResult<Option<Order>>
    where
        F: FnOnce(&Order) -> CoreResult<Option<Order>>,
    {
        let mut orders = self.orders.write().await;
        let slot = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| AutopilotError::OrderNotFound(order_id.to_string()))?;

        let Some(updated) = transition(&*slot)? else {
            return Ok(None);
        };
        *slot = updated.clone();

        // Persist before releasing the lock so files land in commit order.
        let persisted = sink.persist(&updated).await;
        drop(orders);

        debug!(order_id = %updated.id, "Order committed");
        self.publish(OrderEvent::Updated(updated.clone()));
        persisted?;
        Ok(Some(updated))
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub async fn settings(&self) -> StoreSettings {
        self.settings.read().await.clone()
    }

    /// Sets today's 24K rate.
    pub async fn set_gold_rate(&self, rate_24k: f64) -> AutopilotResult<()> {
        if !rate_24k.is_finite() || rate_24k <= 0.0 {
            return Err(CoreError::InvalidRate {
                field: "gold rate (24K)".into(),
                value: rate_24k,
            }
            .into());
        }

        let updated = {
            let mut settings = self.settings.write().await;
            settings.current_gold_rate_24k = rate_24k;
            settings.clone()
        };
        self.publish(OrderEvent::SettingsChanged(updated));
        Ok(())
    }

    pub async fn update_settings(&self, settings: StoreSettings) {
        *self.settings.write().await = settings.clone();
        self.publish(OrderEvent::SettingsChanged(settings));
    }

    fn publish(&self, event: OrderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use chrono::{TimeZone, Utc};
    use goldline_core::order::{mark_delivered, set_overdue};
    use goldline_core::projection::record_payment;
    use goldline_core::*;

    fn settings() -> StoreSettings {
        StoreSettings {
            current_gold_rate_24k: 7500.0,
            ..StoreSettings::default()
        }
    }

    fn order(id: &str) -> Order {
        let draft = OrderDraft {
            customer: Customer {
                id: "C-1".to_string(),
                name: "Meera".to_string(),
                contact: "+919800000001".to_string(),
            },
            items: vec![JewelryItem::new(
                "Ring",
                Purity::K22,
                5.0,
                8.0,
                400.0,
                Money::zero(),
            )],
            exchange_credit: Money::zero(),
            advance_pct: 20.0,
            months: 2,
            protection_enabled: true,
            protection_limit: 0.0,
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut order = build_order(draft, &settings(), now).unwrap();
        order.id = id.to_string();
        order
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let book = OrderBook::new(Vec::new(), StoreSettings::default());
        book.insert(order("ORD-1"), &NullSink).await.unwrap();

        let err = book.insert(order("ORD-1"), &NullSink).await.unwrap_err();
        assert!(matches!(err, AutopilotError::DuplicateOrder(id) if id == "ORD-1"));
        assert_eq!(book.len().await, 1);
    }

    #[tokio::test]
    async fn test_commit_replaces_and_notifies() {
        let book = OrderBook::new(vec![order("ORD-1")], StoreSettings::default());
        let mut events = book.subscribe();

        let mut changed = order("ORD-1");
        changed.status = OrderStatus::Overdue;
        book.commit(changed, &NullSink).await.unwrap();

        assert_eq!(book.get("ORD-1").await.unwrap().status, OrderStatus::Overdue);
        assert!(matches!(events.recv().await.unwrap(), OrderEvent::Updated(o) if o.id == "ORD-1"));
    }

    #[tokio::test]
    async fn test_commit_unknown_order() {
        let book = OrderBook::new(Vec::new(), StoreSettings::default());
        let err = book.commit(order("ORD-404"), &NullSink).await.unwrap_err();
        assert!(matches!(err, AutopilotError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_sees_latest_order() {
        let book = OrderBook::new(vec![order("ORD-1")], settings());
        let paid_at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        // A stale copy taken before the payment.
        let stale = book.get("ORD-1").await.unwrap();
        book.update("ORD-1", &NullSink, |current| {
            let payment = Payment::new(paid_at, Money::from_rupees(1000), PaymentMethod::Cash);
            record_payment(current, payment).map(Some)
        })
        .await
        .unwrap();

        let updated = book
            .update("ORD-1", &NullSink, |current| set_overdue(current, true).map(Some))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.payments.len(), 1);
        assert_eq!(updated.status, OrderStatus::Overdue);
        assert!(stale.payments.is_empty());
    }

    #[tokio::test]
    async fn test_update_none_and_errors_leave_book_alone() {
        let book = OrderBook::new(vec![order("ORD-1")], settings());
        let before = book.get("ORD-1").await.unwrap();
        let mut events = book.subscribe();

        let unchanged = book.update("ORD-1", &NullSink, |_| Ok(None)).await.unwrap();
        assert!(unchanged.is_none());

        let err = book
            .update("ORD-1", &NullSink, |current| mark_delivered(current).map(Some))
            .await
            .unwrap_err();
        assert!(matches!(err, AutopilotError::Core(_)));

        let err = book
            .update("ORD-404", &NullSink, |current| Ok(Some(current.clone())))
            .await
            .unwrap_err();
        assert!(matches!(err, AutopilotError::OrderNotFound(id) if id == "ORD-404"));

        assert_eq!(book.get("ORD-1").await.unwrap(), before);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_gold_rate_must_be_positive() {
        let book = OrderBook::new(Vec::new(), StoreSettings::default());
        assert!(book.set_gold_rate(0.0).await.is_err());
        assert!(book.set_gold_rate(f64::NAN).await.is_err());

        book.set_gold_rate(7800.0).await.unwrap();
        assert_eq!(book.settings().await.current_gold_rate_24k, 7800.0);
    }
}
