use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::format_pesos;
use crate::identity::{generate_id, UserId};
use crate::order::{Order, OrderId, OrderStatus};
use crate::product::Product;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Stock,
    Order,
    Message,
}

/// An event addressed to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    pub receiver_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
}

impl Notification {
    fn about_order(
        prefix: &str,
        order: &Order,
        receiver: &UserId,
        title: &str,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId(generate_id(prefix, now)),
            kind: NotificationKind::Order,
            title: title.to_string(),
            message,
            time: now,
            read: false,
            receiver_id: receiver.clone(),
            order_id: Some(order.id.clone()),
            sender_id: None,
        }
    }

    /// Tells the supplier a merchant placed an order.
    pub fn order_received(order: &Order, merchant_business: &str, now: DateTime<Utc>) -> Self {
        let mut n = Self::about_order(
            "notif",
            order,
            &order.supplier_id,
            "Nuevo Pedido Recibido",
            format!(
                "{merchant_business} ha enviado un pedido por {}.",
                format_pesos(order.total)
            ),
            now,
        );
        n.sender_id = Some(order.merchant_id.clone());
        n
    }

    /// Tells the merchant the supplier opened their order.
    pub fn order_opened(order: &Order, supplier_business: &str, now: DateTime<Utc>) -> Self {
        let mut n = Self::about_order(
            "notif-read",
            order,
            &order.merchant_id,
            "Pedido Abierto",
            format!("{supplier_business} ha visto tu pedido #{}.", order.id),
            now,
        );
        n.sender_id = Some(order.supplier_id.clone());
        n
    }

    /// Tells the merchant their order moved to a new status.
    pub fn order_status(order: &Order, status: OrderStatus, now: DateTime<Utc>) -> Self {
        let mut n = Self::about_order(
            "notif-status",
            order,
            &order.merchant_id,
            "Estado del Pedido",
            format!("Tu pedido #{} está {}.", order.id, status.label().to_lowercase()),
            now,
        );
        n.sender_id = Some(order.supplier_id.clone());
        n
    }

    /// Tells the supplier a product is at or below its minimum stock.
    pub fn low_stock(product: &Product, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId(generate_id("notif-stock", now)),
            kind: NotificationKind::Stock,
            title: "Stock Bajo".into(),
            message: format!(
                "{} ({}) tiene {} unidades; mínimo {}.",
                product.name, product.product_number, product.stock, product.min_stock
            ),
            time: now,
            read: false,
            receiver_id: product.supplier_id.clone(),
            order_id: None,
            sender_id: None,
        }
    }
}

/// Notifications addressed to `user`, newest first as stored.
pub fn for_receiver<'a>(all: &'a [Notification], user: &UserId) -> Vec<&'a Notification> {
    all.iter().filter(|n| &n.receiver_id == user).collect()
}

pub fn unread_count(all: &[Notification], user: &UserId) -> usize {
    all.iter()
        .filter(|n| &n.receiver_id == user && !n.read)
        .count()
}

/// Mark the viewer's notifications about `order` as read. Returns how many
/// changed.
pub fn mark_order_read(all: &mut [Notification], viewer: &UserId, order: &OrderId) -> usize {
    let mut changed = 0;
    for n in all
        .iter_mut()
        .filter(|n| &n.receiver_id == viewer && n.order_id.as_ref() == Some(order))
    {
        if !n.read {
            n.read = true;
            changed += 1;
        }
    }
    changed
}
