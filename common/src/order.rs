use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{subtotal, CartItem};
use crate::currency::pesos;
use crate::identity::{generate_id, UserId};

/// Unique order identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fulfilment status. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Received,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn ordinal(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Received => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
        }
    }

    /// Returns true if moving from self to `next` is valid. Steps may be
    /// skipped but never reversed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        next.ordinal() > self.ordinal()
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendiente",
            OrderStatus::Received => "Recibido",
            OrderStatus::Shipped => "Enviado",
            OrderStatus::Delivered => "Entregado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Received => "received",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// Immutable snapshot of a merchant's cart lines for one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub supplier_id: UserId,
    pub merchant_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    pub items: Vec<CartItem>,
    #[serde(with = "pesos")]
    pub total: u64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub is_read_by_supplier: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending, unread order. The total is derived from the lines.
    pub fn place(
        supplier_id: UserId,
        merchant_id: UserId,
        merchant_name: Option<String>,
        items: Vec<CartItem>,
        now: DateTime<Utc>,
    ) -> Self {
        let total = subtotal(&items);
        Self {
            id: OrderId(generate_id("ord", now)),
            supplier_id,
            merchant_id,
            merchant_name,
            items,
            total,
            status: OrderStatus::Pending,
            is_read_by_supplier: false,
            created_at: now,
        }
    }

    /// True when the stored total matches the lines.
    pub fn is_consistent(&self) -> bool {
        subtotal(&self.items) == self.total
    }

    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn involves(&self, user: &UserId) -> bool {
        &self.supplier_id == user || &self.merchant_id == user
    }
}

/// Supplier dashboard figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub orders: usize,
    pub unread: usize,
    pub pending: usize,
    #[serde(with = "pesos")]
    pub total_sales: u64,
}

impl SalesSummary {
    pub fn for_supplier(orders: &[Order], supplier: &UserId) -> Self {
        orders
            .iter()
            .filter(|o| &o.supplier_id == supplier)
            .fold(Self::default(), |mut acc, o| {
                acc.orders += 1;
                acc.total_sales = acc.total_sales.saturating_add(o.total);
                if !o.is_read_by_supplier {
                    acc.unread += 1;
                }
                if o.status == OrderStatus::Pending {
                    acc.pending += 1;
                }
                acc
            })
    }
}
