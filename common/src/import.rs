//! Bulk product import from spreadsheet rows.
//!
//! Rows arrive as JSON objects keyed by the sheet's header cells, the shape a
//! spreadsheet-to-JSON conversion produces. Header matching ignores case and
//! accents, so `Código` and `codigo` both map to the product number.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::currency::pesos_to_minor;
use crate::error::ImportError;
use crate::geography::{fold, CATEGORIES};
use crate::identity::UserId;
use crate::product::{ConservationType, Product, ProductId};

pub type Row = Map<String, Value>;

const DEFAULT_STOCK: u32 = 100;
const DEFAULT_MIN_STOCK: u32 = 10;

/// Convert every row into a product owned by `supplier`.
///
/// The import is all-or-nothing: the first malformed number aborts it and
/// nothing is returned. Row numbers in errors are 1-based, counting data rows.
pub fn import_rows(rows: &[Row], supplier: &UserId, now: DateTime<Utc>) -> Result<Vec<Product>, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    let millis = now.timestamp_millis();
    rows.iter()
        .enumerate()
        .map(|(idx, row)| import_row(row, idx, millis, supplier))
        .collect()
}

fn import_row(row: &Row, idx: usize, millis: i64, supplier: &UserId) -> Result<Product, ImportError> {
    let line = idx + 1;
    let price = money(row, &["Precio"], line)?.unwrap_or(0);
    let old_price = money(row, &["PrecioAnterior", "Precio Anterior"], line)?;

    Ok(Product {
        id: ProductId(format!("p-bulk-{millis}-{idx}")),
        product_number: text(row, &["SKU", "ID", "Codigo"]).unwrap_or_else(|| format!("ART-{idx}")),
        supplier_id: supplier.clone(),
        name: text(row, &["Nombre", "Producto"]).unwrap_or_else(|| "Nuevo Producto".into()),
        description: text(row, &["Descripcion"]).unwrap_or_default(),
        category: text(row, &["Categoria"]).unwrap_or_else(|| CATEGORIES[0].into()),
        image: text(row, &["Imagen"]),
        price,
        old_price,
        brand: text(row, &["Marca"]).unwrap_or_else(|| "Genérica".into()),
        conservation: ConservationType::Dry,
        unit: text(row, &["Unidad"]).unwrap_or_else(|| "Unidad".into()),
        stock: count(row, "Stock", line, DEFAULT_STOCK)?,
        min_stock: count(row, "Minimo", line, DEFAULT_MIN_STOCK)?,
        expiry_date: None,
        is_sale: cell(row, &["Oferta"]).is_some_and(truthy),
        sale_ends_at: None,
    })
}

/// First non-blank cell under any of `columns`.
fn cell<'a>(row: &'a Row, columns: &[&str]) -> Option<&'a Value> {
    columns.iter().find_map(|column| {
        let wanted = fold(column);
        row.iter()
            .find(|(key, _)| fold(key.trim()) == wanted)
            .map(|(_, value)| value)
            .filter(|value| !is_blank(value))
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn text(row: &Row, columns: &[&str]) -> Option<String> {
    cell(row, columns).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

fn number(value: &Value, row: usize, column: &'static str) -> Result<f64, ImportError> {
    let invalid = || ImportError::InvalidNumber {
        row,
        column,
        value: value.to_string(),
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    if !parsed.is_finite() {
        return Err(invalid());
    }
    if parsed < 0.0 {
        return Err(ImportError::Negative { row, column });
    }
    Ok(parsed)
}

/// A peso amount converted to centésimos, if the column is filled in.
fn money(row: &Row, columns: &[&'static str], line: usize) -> Result<Option<u64>, ImportError> {
    let Some(value) = cell(row, columns) else {
        return Ok(None);
    };
    let pesos = number(value, line, columns[0])?;
    pesos_to_minor(pesos)
        .map(Some)
        .ok_or_else(|| ImportError::InvalidNumber {
            row: line,
            column: columns[0],
            value: value.to_string(),
        })
}

fn count(row: &Row, column: &'static str, line: usize, default: u32) -> Result<u32, ImportError> {
    let Some(value) = cell(row, &[column]) else {
        return Ok(default);
    };
    let n = number(value, line, column)?;
    if n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return Err(ImportError::InvalidNumber {
            row: line,
            column,
            value: value.to_string(),
        });
    }
    Ok(n as u32)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(fold(s.trim()).as_str(), "" | "0" | "no" | "false"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_columns_and_defaults() {
        let now = Utc::now();
        let sheet = rows(json!([
            {
                "SKU": "AR-1",
                "Nombre": "Arroz Saman 1kg",
                "Marca": "Saman",
                "Categoria": "Arroz",
                "Precio": 89.9,
                "Stock": "40",
                "Minimo": 5,
                "Unidad": "Fardo",
                "Oferta": "si"
            },
            { "Producto": "Yerba" }
        ]));
        let supplier = UserId("s1".into());
        let products = import_rows(&sheet, &supplier, now).unwrap();
        assert_eq!(products.len(), 2);

        let rice = &products[0];
        assert_eq!(rice.id.0, format!("p-bulk-{}-0", now.timestamp_millis()));
        assert_eq!(rice.product_number, "AR-1");
        assert_eq!(rice.price, 8_990);
        assert_eq!((rice.stock, rice.min_stock), (40, 5));
        assert_eq!(rice.unit, "Fardo");
        assert!(rice.is_sale);
        assert_eq!(rice.supplier_id, supplier);

        let yerba = &products[1];
        assert_eq!(yerba.name, "Yerba");
        assert_eq!(yerba.product_number, "ART-1");
        assert_eq!(yerba.brand, "Genérica");
        assert_eq!(yerba.category, CATEGORIES[0]);
        assert_eq!((yerba.price, yerba.stock, yerba.min_stock), (0, 100, 10));
        assert_eq!(yerba.conservation, ConservationType::Dry);
        assert!(!yerba.is_sale);
    }

    #[test]
    fn headers_ignore_case_and_accents() {
        let sheet = rows(json!([{ "código": 7791, "DESCRIPCIÓN": "Caja x 12", "precio": "$ 120,50" }]));
        let p = &import_rows(&sheet, &UserId("s1".into()), Utc::now()).unwrap()[0];
        assert_eq!(p.product_number, "7791");
        assert_eq!(p.description, "Caja x 12");
        assert_eq!(p.price, 12_050);
    }

    #[test]
    fn bad_number_aborts_whole_import() {
        let sheet = rows(json!([
            { "Nombre": "Azúcar", "Precio": 50 },
            { "Nombre": "Aceite", "Precio": "caro" }
        ]));
        assert_eq!(
            import_rows(&sheet, &UserId("s1".into()), Utc::now()),
            Err(ImportError::InvalidNumber {
                row: 2,
                column: "Precio",
                value: "\"caro\"".into(),
            })
        );
    }

    #[test]
    fn negative_and_fractional_counts_are_rejected() {
        let negative = rows(json!([{ "Stock": -3 }]));
        assert_eq!(
            import_rows(&negative, &UserId("s1".into()), Utc::now()),
            Err(ImportError::Negative { row: 1, column: "Stock" })
        );
        let fractional = rows(json!([{ "Minimo": 2.5 }]));
        assert!(matches!(
            import_rows(&fractional, &UserId("s1".into()), Utc::now()),
            Err(ImportError::InvalidNumber { column: "Minimo", .. })
        ));
    }

    #[test]
    fn empty_sheet_is_an_error() {
        assert_eq!(import_rows(&[], &UserId("s1".into()), Utc::now()), Err(ImportError::Empty));
    }
}
