//! # Customer Messages
//!
//! Renders the texts the autopilot sends. Transport is somebody else's
//! problem; this module only decides the words and the recipient.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::autopilot::WarningLevel;
use crate::money::Money;
use crate::repricing::RepriceQuote;
use crate::types::{Milestone, Order};

/// Which autopilot branch produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    GraceWarning,
    ProtectionLapsed,
    DynamicQuote,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::GraceWarning => write!(f, "grace_warning"),
            MessageKind::ProtectionLapsed => write!(f, "protection_lapsed"),
            MessageKind::DynamicQuote => write!(f, "dynamic_quote"),
        }
    }
}

/// A message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    /// Phone number of the customer.
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

impl OutboundMessage {
    fn for_order(order: &Order, kind: MessageKind, text: String) -> Self {
        OutboundMessage {
            order_id: order.id.clone(),
            customer_id: order.customer.id.clone(),
            customer_name: order.customer.name.clone(),
            to: order.customer.contact.clone(),
            text,
            kind,
        }
    }
}

/// Grace-period reminder for `milestone`, worded for `level`.
pub fn grace_warning(
    order: &Order,
    milestone: &Milestone,
    level: WarningLevel,
    hours_left: i64,
) -> OutboundMessage {
    let name = &order.customer.name;
    let due = (milestone.cumulative_target - order.total_paid())
        .floor_zero()
        .min(milestone.target_amount);
    let date = milestone.due_date.format("%d %b %Y");
    let rate = order.plan.protection_rate_booked;
    let hours_left = hours_left.max(0);

    let text = match level {
        WarningLevel::Gentle => format!(
            "Hello {name}, a friendly reminder that your installment of {due} \
             was due on {date}. Paying soon keeps your gold rate of ₹{rate:.0}/g locked."
        ),
        WarningLevel::Firm => format!(
            "Dear {name}, your installment of {due} (due {date}) is still pending. \
             Please pay within {hours_left} hours to keep your protected rate of ₹{rate:.0}/g."
        ),
        WarningLevel::Urgent => format!(
            "Urgent: {name}, {due} is overdue on your order. Your gold rate \
             protection ends in {hours_left} hours, after which the order is \
             repriced at the market rate."
        ),
        WarningLevel::Final => format!(
            "Final notice for {name}: pay {due} within {hours_left} hours or \
             your booked rate of ₹{rate:.0}/g will be released."
        ),
    };

    OutboundMessage::for_order(order, MessageKind::GraceWarning, text)
}

/// One-time notice sent when protection lapses.
pub fn protection_lapsed(order: &Order) -> OutboundMessage {
    let text = format!(
        "Dear {}, the grace period on your order has ended and the gold rate \
         protection at ₹{:.0}/g has lapsed. The balance of {} will now follow \
         the market rate. Visit us or reply to lock in today's rate.",
        order.customer.name,
        order.plan.protection_rate_booked,
        order.balance_due().floor_zero(),
    );
    OutboundMessage::for_order(order, MessageKind::ProtectionLapsed, text)
}

/// Recurring nudge contrasting the original total with today's price.
pub fn dynamic_quote(order: &Order, quote: &RepriceQuote) -> OutboundMessage {
    let difference = quote.difference();
    let movement = if difference.is_positive() {
        format!("{} more", difference)
    } else if difference.is_negative() {
        format!("{} less", Money::zero() - difference)
    } else {
        "the same".to_string()
    };

    let text = format!(
        "Hello {}, your order was booked at {} (₹{:.0}/g). At today's rate of \
         ₹{:.0}/g it comes to {}, {} than before. Your remaining balance would \
         be {}. Reply to confirm the new rate and restart your plan.",
        order.customer.name,
        quote.original_total,
        quote.original_rate,
        quote.quoted_rate,
        quote.quoted_total,
        movement,
        quote.quoted_balance,
    );
    OutboundMessage::for_order(order, MessageKind::DynamicQuote, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_order;

    #[test]
    fn test_warning_tones_differ() {
        let order = sample_order();
        let milestone = &order.plan.milestones[0];

        let texts: Vec<String> = [
            WarningLevel::Gentle,
            WarningLevel::Firm,
            WarningLevel::Urgent,
            WarningLevel::Final,
        ]
        .into_iter()
        .map(|level| grace_warning(&order, milestone, level, 18).text)
        .collect();

        for (i, a) in texts.iter().enumerate() {
            for b in &texts[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(texts[0].contains("₹10,000"));
        assert!(texts[3].starts_with("Final notice"));
    }

    #[test]
    fn test_message_addressing() {
        let order = sample_order();
        let message = protection_lapsed(&order);
        assert_eq!(message.order_id, order.id);
        assert_eq!(message.customer_id, "C-1");
        assert_eq!(message.to, order.customer.contact);
        assert_eq!(message.kind, MessageKind::ProtectionLapsed);
        assert!(message.text.contains("₹1,00,000"));
    }

    #[test]
    fn test_dynamic_quote_wording() {
        let order = sample_order();
        let quote = RepriceQuote {
            order_id: order.id.clone(),
            original_total: Money::from_rupees(100000),
            original_rate: 7500.0,
            quoted_total: Money::from_rupees(104000),
            quoted_rate: 7800.0,
            total_paid: Money::zero(),
            quoted_balance: Money::from_rupees(104000),
        };
        let message = dynamic_quote(&order, &quote);
        assert_eq!(message.kind, MessageKind::DynamicQuote);
        assert!(message.text.contains("₹4,000 more"));
        assert!(message.text.contains("₹7800/g"));
    }
}
