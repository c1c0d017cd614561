//! Status vocabularies for the order lifecycle.
//!
//! Fulfillment status and payment status are independent axes. Both are
//! stored as lowercase strings, so this module offers typed enums for code
//! that owns a known-good value and raw-string mappings for display paths
//! that must tolerate whatever the database hands back. Unknown raw values
//! are passed through unchanged rather than treated as errors.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Fulfillment status of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
    Refunded,
}

/// Payment status of an order, independent from fulfillment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Presentation-agnostic display token. Frontends map these to their own
/// palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisplayTier {
    Warning,
    Info,
    Accent,
    Success,
    Danger,
    Neutral,
}

/// The linear fulfillment sequence rendered as a step tracker. This ordering
/// is fixed; it is not derived from the transition table.
pub const FULFILLMENT_STEPS: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }

    pub fn display_tier(&self) -> DisplayTier {
        match self {
            OrderStatus::Pending => DisplayTier::Warning,
            OrderStatus::Processing => DisplayTier::Info,
            OrderStatus::Shipped => DisplayTier::Accent,
            OrderStatus::Delivered => DisplayTier::Success,
            OrderStatus::Cancelled => DisplayTier::Danger,
            OrderStatus::Refunded => DisplayTier::Neutral,
        }
    }

    /// Whether an order may move from `self` to `to`. Same-status updates are
    /// permitted no-ops so that repeated form submissions stay harmless.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        if *self == to {
            return true;
        }
        matches!(
            (*self, to),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
                | (Processing, Refunded)
                | (Shipped, Refunded)
                | (Delivered, Refunded)
                | (Cancelled, Refunded)
        )
    }

    /// Position of this status within [`FULFILLMENT_STEPS`], or `None` for
    /// the terminal off-path states (no progress tracker is shown).
    pub fn progress_index(&self) -> Option<usize> {
        FULFILLMENT_STEPS.iter().position(|step| step == self)
    }
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Pending => "Payment Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Payment Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    pub fn display_tier(&self) -> DisplayTier {
        match self {
            PaymentStatus::Unpaid => DisplayTier::Warning,
            PaymentStatus::Pending => DisplayTier::Info,
            PaymentStatus::Paid => DisplayTier::Success,
            PaymentStatus::Failed => DisplayTier::Danger,
            PaymentStatus::Refunded => DisplayTier::Neutral,
        }
    }

    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        if *self == to {
            return true;
        }
        matches!(
            (*self, to),
            (Unpaid, Pending)
                | (Unpaid, Paid)
                | (Unpaid, Failed)
                | (Pending, Paid)
                | (Pending, Failed)
                | (Failed, Pending)
                | (Failed, Paid)
                | (Paid, Refunded)
        )
    }
}

/// Human label for a raw fulfillment status string. Unknown values are
/// returned unchanged (fallback policy, not an error).
pub fn label_for_status(raw: &str) -> String {
    match OrderStatus::from_str(raw) {
        Ok(status) => status.label().to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Display tier for a raw fulfillment status string; unknown values map to
/// [`DisplayTier::Neutral`].
pub fn tier_for_status(raw: &str) -> DisplayTier {
    OrderStatus::from_str(raw)
        .map(|status| status.display_tier())
        .unwrap_or(DisplayTier::Neutral)
}

/// Human label for a raw payment status string, with the same fallback
/// policy as [`label_for_status`].
pub fn label_for_payment_status(raw: &str) -> String {
    match PaymentStatus::from_str(raw) {
        Ok(status) => status.label().to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn tier_for_payment_status(raw: &str) -> DisplayTier {
    PaymentStatus::from_str(raw)
        .map(|status| status.display_tier())
        .unwrap_or(DisplayTier::Neutral)
}

/// Progress index for a raw status string: `Some(0..=3)` along the happy
/// path, `None` for cancelled, refunded and anything unrecognized.
pub fn progress_index(raw: &str) -> Option<usize> {
    OrderStatus::from_str(raw)
        .ok()
        .and_then(|status| status.progress_index())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_nonempty_label_and_tier() {
        for status in OrderStatus::iter() {
            assert!(!status.label().is_empty());
            assert_eq!(label_for_status(&status.to_string()), status.label());
            assert_eq!(tier_for_status(&status.to_string()), status.display_tier());
        }
        for status in PaymentStatus::iter() {
            assert!(!status.label().is_empty());
            assert_eq!(
                label_for_payment_status(&status.to_string()),
                status.label()
            );
        }
    }

    #[test]
    fn unknown_status_falls_back_to_raw_value() {
        assert_eq!(label_for_status("backordered"), "backordered");
        assert_eq!(tier_for_status("backordered"), DisplayTier::Neutral);
        assert_eq!(label_for_payment_status("chargeback"), "chargeback");
        assert_eq!(tier_for_payment_status("chargeback"), DisplayTier::Neutral);
    }

    #[test]
    fn progress_index_follows_fixed_step_order() {
        assert_eq!(progress_index("pending"), Some(0));
        assert_eq!(progress_index("processing"), Some(1));
        assert_eq!(progress_index("shipped"), Some(2));
        assert_eq!(progress_index("delivered"), Some(3));
        assert_eq!(progress_index("cancelled"), None);
        assert_eq!(progress_index("refunded"), None);
        assert_eq!(progress_index("garbage"), None);
    }

    #[test]
    fn happy_path_transitions_are_allowed() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn non_monotonic_transitions_are_rejected() {
        use OrderStatus::*;
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Refunded.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn terminal_states_reachable_and_absorbing() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Delivered.can_transition_to(Refunded));
        assert!(Cancelled.can_transition_to(Refunded));
        for status in OrderStatus::iter() {
            // Refunded never leads anywhere but itself.
            assert_eq!(
                Refunded.can_transition_to(status),
                status == Refunded
            );
        }
    }

    #[test]
    fn same_status_is_a_noop_transition() {
        for status in OrderStatus::iter() {
            assert!(status.can_transition_to(status));
        }
        for status in PaymentStatus::iter() {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn payment_axis_transitions() {
        use PaymentStatus::*;
        assert!(Unpaid.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Unpaid));
    }

    #[test]
    fn canceled_spelling_parses_as_cancelled() {
        assert_eq!(
            OrderStatus::from_str("canceled").unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(label_for_status("canceled"), "Cancelled");
    }
}
