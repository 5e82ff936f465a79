use serde::{Deserialize, Serialize};

use crate::currency::pesos;
use crate::order::Order;

/// One line of an order as exported for the supplier's spreadsheet.
/// Serialized with the Spanish column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Producto")]
    pub product: String,
    #[serde(rename = "Marca")]
    pub brand: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Cantidad")]
    pub quantity: u32,
    #[serde(rename = "Precio Unit.", with = "pesos")]
    pub unit_price: u64,
    #[serde(rename = "Subtotal", with = "pesos")]
    pub subtotal: u64,
}

pub fn export_order(order: &Order) -> Vec<ExportRow> {
    order
        .items
        .iter()
        .map(|item| ExportRow {
            product: item.product.name.clone(),
            brand: item.product.brand.clone(),
            sku: item.product.product_number.clone(),
            quantity: item.quantity,
            unit_price: item.product.price,
            subtotal: item.line_total(),
        })
        .collect()
}

/// Suggested file name, e.g. `Pedido_Almacen Pepe_ord-1.json`.
pub fn export_file_name(order: &Order) -> String {
    let merchant = order.merchant_name.as_deref().unwrap_or(&order.merchant_id.0);
    format!("Pedido_{merchant}_{}.json", order.id)
}
