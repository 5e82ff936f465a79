use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::pesos;
use crate::geography::CATEGORIES;
use crate::identity::{generate_id, UserId};

/// Unique product identifier (timestamp-based).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage requirement of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConservationType {
    #[default]
    #[serde(rename = "Seco")]
    Dry,
    #[serde(rename = "Frío")]
    Cold,
    #[serde(rename = "Congelado")]
    Frozen,
    #[serde(rename = "Conveniencia")]
    Convenience,
}

impl ConservationType {
    pub fn all() -> &'static [ConservationType] {
        &[
            ConservationType::Dry,
            ConservationType::Cold,
            ConservationType::Frozen,
            ConservationType::Convenience,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ConservationType::Dry => "Seco",
            ConservationType::Cold => "Frío",
            ConservationType::Frozen => "Congelado",
            ConservationType::Convenience => "Conveniencia",
        }
    }
}

/// A product listing owned by exactly one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub product_number: String,
    pub supplier_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unit price in centésimos.
    #[serde(with = "pesos")]
    pub price: u64,
    #[serde(default, with = "pesos::option", skip_serializing_if = "Option::is_none")]
    pub old_price: Option<u64>,
    pub brand: String,
    #[serde(default)]
    pub conservation: ConservationType,
    pub unit: String,
    pub stock: u32,
    pub min_stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_ends_at: Option<NaiveDate>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Key under which identical items from different suppliers are grouped.
    pub fn group_key(&self) -> String {
        format!("{}-{}", self.name, self.brand).to_lowercase()
    }
}

/// Editable product fields as submitted by a supplier. Missing fields take
/// the catalog defaults for a new product and keep their stored value when
/// an existing one is edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub id: Option<ProductId>,
    pub product_number: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    #[serde(default, with = "pesos::option")]
    pub price: Option<u64>,
    #[serde(default, with = "pesos::option")]
    pub old_price: Option<u64>,
    pub brand: Option<String>,
    pub conservation: Option<ConservationType>,
    pub unit: Option<String>,
    pub stock: Option<u32>,
    pub min_stock: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
    pub is_sale: Option<bool>,
    pub sale_ends_at: Option<NaiveDate>,
}

impl ProductDraft {
    pub fn into_product(self, supplier: &UserId, now: DateTime<Utc>) -> Product {
        Product {
            id: self
                .id
                .unwrap_or_else(|| ProductId(generate_id("p", now))),
            product_number: non_blank(self.product_number)
                .unwrap_or_else(|| format!("ART-{}", now.timestamp_millis())),
            supplier_id: supplier.clone(),
            name: non_blank(self.name).unwrap_or_else(|| "Producto sin nombre".into()),
            description: self.description.unwrap_or_default(),
            category: non_blank(self.category).unwrap_or_else(|| CATEGORIES[0].into()),
            image: self.image,
            price: self.price.unwrap_or(0),
            old_price: self.old_price,
            brand: non_blank(self.brand).unwrap_or_else(|| "Genérica".into()),
            conservation: self.conservation.unwrap_or_default(),
            unit: non_blank(self.unit).unwrap_or_else(|| "Unidad".into()),
            stock: self.stock.unwrap_or(100),
            min_stock: self.min_stock.unwrap_or(5),
            expiry_date: self.expiry_date,
            is_sale: self.is_sale.unwrap_or(false),
            sale_ends_at: self.sale_ends_at,
        }
    }

    /// Overwrite the fields of `product` that this draft sets. The id and
    /// owner never change; blank names, categories, brands and units are
    /// ignored.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(number) = non_blank(self.product_number) {
            product.product_number = number;
        }
        if let Some(name) = non_blank(self.name) {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category) = non_blank(self.category) {
            product.category = category;
        }
        if self.image.is_some() {
            product.image = self.image;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if self.old_price.is_some() {
            product.old_price = self.old_price;
        }
        if let Some(brand) = non_blank(self.brand) {
            product.brand = brand;
        }
        if let Some(conservation) = self.conservation {
            product.conservation = conservation;
        }
        if let Some(unit) = non_blank(self.unit) {
            product.unit = unit;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(min_stock) = self.min_stock {
            product.min_stock = min_stock;
        }
        if self.expiry_date.is_some() {
            product.expiry_date = self.expiry_date;
        }
        if let Some(is_sale) = self.is_sale {
            product.is_sale = is_sale;
        }
        if self.sale_ends_at.is_some() {
            product.sale_ends_at = self.sale_ends_at;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Replace every product owned by `supplier` with `updated`, leaving other
/// suppliers' listings in place and in order.
pub fn replace_supplier_products(all: &mut Vec<Product>, supplier: &UserId, updated: Vec<Product>) {
    all.retain(|p| &p.supplier_id != supplier);
    all.extend(updated.into_iter().map(|mut p| {
        p.supplier_id = supplier.clone();
        p
    }));
}
