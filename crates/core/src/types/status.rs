//! Order status progression.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the four order statuses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct StatusParseError(pub String);

/// Where an order is in the tailoring workflow.
///
/// Variants are declared in progression order and `Ord` follows it. The order
/// is only used for rendering progress; admins may move an order to any status,
/// backwards included.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Fabric and materials are being bought.
    #[default]
    Shopping,
    /// The garment is being stitched.
    Stitching,
    /// The garment is on its way to the customer.
    Shipping,
    /// Delivered and settled.
    Paid,
}

impl OrderStatus {
    /// All statuses in progression order.
    pub const ALL: [Self; 4] = [Self::Shopping, Self::Stitching, Self::Shipping, Self::Paid];

    /// Wire value stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shopping => "shopping",
            Self::Stitching => "stitching",
            Self::Shipping => "shipping",
            Self::Paid => "paid",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shopping => "Shopping",
            Self::Stitching => "Stitching",
            Self::Shipping => "Shipping",
            Self::Paid => "Paid",
        }
    }

    /// Zero-based position in the progression.
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// Share of the progress bar filled at this status (25, 50, 75, 100).
    #[must_use]
    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::Shopping => 25,
            Self::Stitching => 50,
            Self::Shipping => 75,
            Self::Paid => 100,
        }
    }

    /// Whether a progress step for `step` should render as reached.
    #[must_use]
    pub fn has_reached(self, step: Self) -> bool {
        self >= step
    }

    /// Badge colour used by the order info view.
    ///
    /// `Paid` has no accent colour and renders with the default badge.
    #[must_use]
    pub const fn badge_color(self) -> Option<&'static str> {
        match self {
            Self::Shopping => Some("primary"),
            Self::Stitching => Some("accent"),
            Self::Shipping => Some("warn"),
            Self::Paid => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_order() {
        assert!(OrderStatus::Shopping < OrderStatus::Stitching);
        assert!(OrderStatus::Stitching < OrderStatus::Shipping);
        assert!(OrderStatus::Shipping < OrderStatus::Paid);
        assert_eq!(OrderStatus::Paid.position(), 3);
    }

    #[test]
    fn test_progress_percent() {
        let percents: Vec<u8> = OrderStatus::ALL
            .iter()
            .map(|s| s.progress_percent())
            .collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_has_reached() {
        assert!(OrderStatus::Shipping.has_reached(OrderStatus::Stitching));
        assert!(OrderStatus::Shipping.has_reached(OrderStatus::Shipping));
        assert!(!OrderStatus::Shipping.has_reached(OrderStatus::Paid));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Stitching).unwrap();
        assert_eq!(json, "\"stitching\"");
        let parsed: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(parsed, OrderStatus::Paid);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Shipping".parse::<OrderStatus>().unwrap(), OrderStatus::Shipping);
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_badge_colors() {
        assert_eq!(OrderStatus::Shopping.badge_color(), Some("primary"));
        assert_eq!(OrderStatus::Stitching.badge_color(), Some("accent"));
        assert_eq!(OrderStatus::Shipping.badge_color(), Some("warn"));
        assert_eq!(OrderStatus::Paid.badge_color(), None);
    }
}
