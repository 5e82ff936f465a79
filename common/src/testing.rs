//! Fixtures shared by the unit tests of this crate.

use crate::coverage::{Coverage, CoverageArea, DeliverySchedule, LocalityCoverage};
use crate::identity::{User, UserId, UserRole};
use crate::product::{ConservationType, Product, ProductId};

pub fn product(id: &str, supplier: &str, name: &str, brand: &str, price: u64) -> Product {
    Product {
        id: ProductId(id.into()),
        product_number: format!("SKU-{id}"),
        supplier_id: UserId(supplier.into()),
        name: name.into(),
        description: String::new(),
        category: "Arroz".into(),
        image: None,
        price,
        old_price: None,
        brand: brand.into(),
        conservation: ConservationType::Dry,
        unit: "Unidad".into(),
        stock: 10,
        min_stock: 2,
        expiry_date: None,
        is_sale: false,
        sale_ends_at: None,
    }
}

pub fn user(id: &str, role: UserRole) -> User {
    User {
        id: UserId(id.into()),
        name: id.into(),
        email: format!("{id}@example.com.uy"),
        role,
        business_name: format!("Empresa {id}"),
        is_verified: true,
        location: None,
        coverage: match role {
            UserRole::Supplier => Some(Coverage::default()),
            UserRole::Merchant => None,
        },
        min_order_value: None,
    }
}

/// A supplier delivering to the given `(department, [localities])` pairs.
pub fn supplier_covering(id: &str, areas: &[(&str, &[&str])]) -> User {
    let mut s = user(id, UserRole::Supplier);
    s.coverage = Some(Coverage(
        areas
            .iter()
            .map(|(dept, locs)| CoverageArea {
                department: dept.to_string(),
                localities: locs
                    .iter()
                    .map(|l| LocalityCoverage {
                        name: l.to_string(),
                        schedule: DeliverySchedule::default(),
                    })
                    .collect(),
            })
            .collect(),
    ));
    s
}
