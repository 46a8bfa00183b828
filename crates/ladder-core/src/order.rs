//! Order-related types: sides, live offers and mutation operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Price, Size};

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Whether price `a` is more competitive than `b` for a resting order on
    /// this side (lower asks, higher bids).
    #[must_use]
    pub fn is_better(&self, a: Price, b: Price) -> bool {
        match self {
            Self::Sell => a < b,
            Self::Buy => a > b,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Venue-assigned identifier of a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub u64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live order resting on the venue, in pair terms
/// (price in quote per base, amount in base).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub side: OrderSide,
    pub price: Price,
    pub amount: Size,
}

impl Offer {
    pub fn new(id: u64, side: OrderSide, price: Price, amount: Size) -> Self {
        Self {
            id: OfferId(id),
            side,
            price,
            amount,
        }
    }

    /// Build the operation that cancels this offer. Nothing is executed.
    #[must_use]
    pub fn cancel(&self) -> Operation {
        Operation::Delete {
            offer_id: self.id,
            side: self.side,
        }
    }

    /// Price seen by the seller of the asset this offer gives away.
    ///
    /// Bids sell quote for base, so their frame price is the reciprocal.
    #[must_use]
    pub fn frame_price(&self) -> Option<Price> {
        match self.side {
            OrderSide::Sell => Some(self.price),
            OrderSide::Buy => self.price.invert(),
        }
    }

    /// Amount of the asset this offer gives away (quote units for bids).
    #[must_use]
    pub fn frame_amount(&self) -> Size {
        match self.side {
            OrderSide::Sell => self.amount,
            OrderSide::Buy => Size::new(self.amount.notional(self.price)),
        }
    }
}

/// Coarse classification used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Modify,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

/// A proposed mutation of the venue's resting orders, in pair terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Create {
        side: OrderSide,
        price: Price,
        amount: Size,
    },
    Modify {
        offer_id: OfferId,
        side: OrderSide,
        price: Price,
        amount: Size,
    },
    Delete {
        offer_id: OfferId,
        side: OrderSide,
    },
}

impl Operation {
    #[must_use]
    pub fn side(&self) -> OrderSide {
        match self {
            Self::Create { side, .. } | Self::Modify { side, .. } | Self::Delete { side, .. } => {
                *side
            }
        }
    }

    #[must_use]
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::Create { .. } => None,
            Self::Modify { offer_id, .. } | Self::Delete { offer_id, .. } => Some(*offer_id),
        }
    }

    /// Price of the resulting order; deletes have none.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        match self {
            Self::Create { price, .. } | Self::Modify { price, .. } => Some(*price),
            Self::Delete { .. } => None,
        }
    }

    /// Amount of the resulting order; zero for deletes.
    #[must_use]
    pub fn amount(&self) -> Size {
        match self {
            Self::Create { amount, .. } | Self::Modify { amount, .. } => *amount,
            Self::Delete { .. } => Size::ZERO,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Modify { .. } => OperationKind::Modify,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create {
                side,
                price,
                amount,
            } => write!(f, "create {side} {amount} @ {price}"),
            Self::Modify {
                offer_id,
                side,
                price,
                amount,
            } => write!(f, "modify {side} #{offer_id} -> {amount} @ {price}"),
            Self::Delete { offer_id, side } => write!(f, "delete {side} #{offer_id}"),
        }
    }
}
