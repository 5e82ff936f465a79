use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::currency::pesos;
use crate::identity::{Location, User, UserId};
use crate::product::{ConservationType, Product};

/// Catalog search criteria. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    /// Case-insensitive substring of name, brand or product number.
    pub query: Option<String>,
    pub category: Option<String>,
    pub conservation: Option<ConservationType>,
    /// Inclusive lower price bound, in centésimos.
    #[serde(with = "pesos::option")]
    pub min_price: Option<u64>,
    /// Inclusive upper price bound, in centésimos.
    #[serde(with = "pesos::option")]
    pub max_price: Option<u64>,
    pub only_on_sale: bool,
    pub only_in_stock: bool,
    pub brand: Option<String>,
    pub department: Option<String>,
    /// Only meaningful together with `department`.
    pub locality: Option<String>,
}

impl CatalogFilter {
    /// Filter to suppliers that deliver to the given address.
    pub fn near(location: &Location) -> Self {
        Self {
            department: Some(location.department.clone()),
            locality: Some(location.locality.clone()),
            ..Default::default()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
            || self.category.is_some()
            || self.conservation.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.only_on_sale
            || self.only_in_stock
            || self.brand.is_some()
            || self.department.is_some()
            || self.locality.is_some()
    }

    /// True if `product` satisfies every active predicate. `supplier` is the
    /// product's owner, when known.
    pub fn matches(&self, product: &Product, supplier: Option<&User>) -> bool {
        self.matches_query(product)
            && self.category.as_ref().is_none_or(|c| &product.category == c)
            && self.conservation.is_none_or(|c| product.conservation == c)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && (!self.only_on_sale || product.is_sale)
            && (!self.only_in_stock || product.in_stock())
            && self.brand.as_ref().is_none_or(|b| &product.brand == b)
            && self.matches_location(supplier)
    }

    fn matches_query(&self, product: &Product) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        [&product.name, &product.brand, &product.product_number]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_location(&self, supplier: Option<&User>) -> bool {
        let Some(department) = self.department.as_deref() else {
            return true;
        };
        supplier
            .and_then(|s| s.coverage.as_ref())
            .is_some_and(|c| c.covers(department, self.locality.as_deref()))
    }
}

/// Suppliers indexed by id, for coverage lookups while filtering.
pub fn supplier_index(users: &[User]) -> HashMap<&UserId, &User> {
    users
        .iter()
        .filter(|u| u.is_supplier())
        .map(|u| (&u.id, u))
        .collect()
}

/// Products matching `filter`, in catalog order.
pub fn filter<'a>(products: &'a [Product], suppliers: &[User], filter: &CatalogFilter) -> Vec<&'a Product> {
    let index = supplier_index(suppliers);
    products
        .iter()
        .filter(|p| filter.matches(p, index.get(&p.supplier_id).copied()))
        .collect()
}

/// The same item (by name and brand) as offered by one or more suppliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub key: String,
    pub offers: Vec<Product>,
}

impl ProductGroup {
    /// Representative listing used for the card title.
    pub fn head(&self) -> &Product {
        &self.offers[0]
    }

    pub fn cheapest(&self) -> &Product {
        self.offers
            .iter()
            .min_by_key(|p| p.price)
            .unwrap_or(&self.offers[0])
    }
}

/// Group products by lowercase `name-brand`. Groups keep first-appearance
/// order and offers keep catalog order.
pub fn group(products: &[&Product]) -> Vec<ProductGroup> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ProductGroup> = Vec::new();
    for product in products {
        let key = product.group_key();
        match positions.get(&key) {
            Some(&idx) => groups[idx].offers.push((*product).clone()),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(ProductGroup {
                    key,
                    offers: vec![(*product).clone()],
                });
            }
        }
    }
    groups
}

/// Filter then group: what a merchant sees when browsing.
pub fn browse(products: &[Product], suppliers: &[User], criteria: &CatalogFilter) -> Vec<ProductGroup> {
    group(&filter(products, suppliers, criteria))
}

/// Distinct brands across the catalog, sorted.
pub fn brands(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.brand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
