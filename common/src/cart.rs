use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::currency::{pesos, MAX_AMOUNT};
use crate::error::MarketError;
use crate::identity::{User, UserId};
use crate::product::{Product, ProductId};

/// A product snapshot plus the quantity the merchant wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Price × quantity. Saturates; carts keep their totals within
    /// [`MAX_AMOUNT`].
    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(u64::from(self.quantity))
    }
}

/// Sum of price × quantity over the given lines.
pub fn subtotal<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> u64 {
    items
        .into_iter()
        .fold(0, |acc: u64, item| acc.saturating_add(item.line_total()))
}

/// The lines of one supplier, with the minimum-order check applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierGroup {
    pub supplier_id: UserId,
    pub supplier_name: Option<String>,
    pub items: Vec<CartItem>,
    #[serde(with = "pesos")]
    pub subtotal: u64,
    #[serde(with = "pesos")]
    pub minimum: u64,
    pub below_minimum: bool,
}

/// Client-session shopping cart. Cleared when the order is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product`, merging with an existing line.
    pub fn add(&mut self, product: &Product) -> Result<u32, MarketError> {
        if !product.in_stock() {
            return Err(MarketError::OutOfStock(product.id.0.clone()));
        }
        match self.items.iter().position(|i| i.product.id == product.id) {
            Some(idx) => {
                let line = &self.items[idx];
                let quantity = line.quantity.saturating_add(1);
                self.check_line(&line.product, line.quantity, quantity)?;
                self.items[idx].quantity = quantity;
                Ok(quantity)
            }
            None => {
                self.check_line(product, 0, 1)?;
                self.items.push(CartItem {
                    product: product.clone(),
                    quantity: 1,
                });
                Ok(1)
            }
        }
    }

    /// Change a line's quantity by `delta`, never going below one.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i64) -> Result<u32, MarketError> {
        let idx = self
            .items
            .iter()
            .position(|i| &i.product.id == id)
            .ok_or_else(|| MarketError::ProductNotFound(id.0.clone()))?;
        let line = &self.items[idx];
        let quantity = i64::from(line.quantity)
            .saturating_add(delta)
            .clamp(1, i64::from(u32::MAX)) as u32;
        self.check_line(&line.product, line.quantity, quantity)?;
        self.items[idx].quantity = quantity;
        Ok(quantity)
    }

    /// Reject a line change that would push the cart total past [`MAX_AMOUNT`].
    fn check_line(&self, product: &Product, from: u32, to: u32) -> Result<(), MarketError> {
        let others = self
            .total()
            .saturating_sub(product.price.saturating_mul(u64::from(from)));
        let within = product
            .price
            .checked_mul(u64::from(to))
            .and_then(|line| line.checked_add(others))
            .is_some_and(|total| total <= MAX_AMOUNT);
        if within {
            Ok(())
        } else {
            Err(MarketError::AmountTooLarge(product.id.0.clone()))
        }
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product.id != id);
        self.items.len() != before
    }

    /// Drop only the lines of one supplier.
    pub fn clear_supplier(&mut self, supplier: &UserId) -> usize {
        let before = self.items.len();
        self.items.retain(|i| &i.product.supplier_id != supplier);
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn total(&self) -> u64 {
        subtotal(&self.items)
    }

    /// Lines grouped by supplier, in order of first appearance.
    pub fn partition(&self) -> Vec<(UserId, Vec<CartItem>)> {
        let mut positions: HashMap<&UserId, usize> = HashMap::new();
        let mut parts: Vec<(UserId, Vec<CartItem>)> = Vec::new();
        for item in &self.items {
            let supplier = &item.product.supplier_id;
            match positions.get(supplier) {
                Some(&idx) => parts[idx].1.push(item.clone()),
                None => {
                    positions.insert(supplier, parts.len());
                    parts.push((supplier.clone(), vec![item.clone()]));
                }
            }
        }
        parts
    }

    /// Per-supplier subtotals, flagged when under that supplier's minimum
    /// order (or `default_minimum` when the supplier sets none).
    pub fn groups(&self, users: &[User], default_minimum: u64) -> Vec<SupplierGroup> {
        self.partition()
            .into_iter()
            .map(|(supplier_id, items)| {
                let supplier = users.iter().find(|u| u.id == supplier_id);
                let minimum = supplier.map_or(default_minimum, |s| s.minimum_order(default_minimum));
                let subtotal = subtotal(&items);
                SupplierGroup {
                    supplier_name: supplier.map(|s| s.business_name.clone()),
                    supplier_id,
                    items,
                    subtotal,
                    minimum,
                    below_minimum: subtotal < minimum,
                }
            })
            .collect()
    }
}
