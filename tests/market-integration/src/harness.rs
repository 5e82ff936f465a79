use std::path::Path;

use tempfile::TempDir;

use mayorista_common::identity::{User, UserId, UserRole};
use mayorista_common::product::{Product, ProductDraft, ProductId};
use mayorista_common::MarketConfig;
use mayorista_delegate::MarketDelegate;
use mayorista_node::JsonFileStore;

use crate::{client, registration};

/// A supplier participant with its own session over the shared data dir.
pub struct Supplier {
    pub name: String,
    pub user: User,
    pub client: MarketDelegate<JsonFileStore>,
}

impl Supplier {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }

    /// List a product with a minimum stock of 2.
    pub fn add_product(&mut self, name: &str, brand: &str, price: u64, stock: u32) -> Product {
        self.client
            .save_product(ProductDraft {
                name: Some(name.to_string()),
                brand: Some(brand.to_string()),
                price: Some(price),
                stock: Some(stock),
                min_stock: Some(2),
                ..Default::default()
            })
            .unwrap_or_else(|e| panic!("{} could not list {name}: {e}", self.name))
    }

    /// Deliver to the given localities of one department.
    pub fn cover(&mut self, department: &str, localities: &[&str]) {
        for locality in localities {
            let selected = self
                .client
                .toggle_locality(department, locality)
                .unwrap_or_else(|e| panic!("{} could not cover {locality}: {e}", self.name));
            assert!(selected, "{locality} was already covered");
        }
    }
}

/// A merchant participant.
pub struct Merchant {
    pub name: String,
    pub user: User,
    pub client: MarketDelegate<JsonFileStore>,
}

impl Merchant {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }

    /// Put `quantity` units of a product in the cart.
    pub fn buy(&mut self, product: &ProductId, quantity: u32) {
        self.client
            .add_to_cart(product)
            .unwrap_or_else(|e| panic!("{} could not add {product}: {e}", self.name));
        if quantity > 1 {
            self.client
                .update_cart_quantity(product, i64::from(quantity) - 1)
                .unwrap_or_else(|e| panic!("{} could not set quantity: {e}", self.name));
        }
    }
}

/// Top-level test fixture: two suppliers and two merchants sharing one
/// data directory, each with their own session.
pub struct TestHarness {
    pub sur: Supplier,
    pub norte: Supplier,
    pub ana: Merchant,
    pub beto: Merchant,
    dir: TempDir,
}

impl TestHarness {
    pub fn setup() -> Self {
        Self::with_config(MarketConfig::default())
    }

    pub fn with_config(config: MarketConfig) -> Self {
        tracing_subscriber::fmt::try_init().ok();
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

        let supplier = |name: &str, email: &str, department: &str, locality: &str| {
            let mut client = client(dir.path(), config.clone());
            let user = client
                .register(&registration(email, UserRole::Supplier, name, department, locality))
                .unwrap_or_else(|e| panic!("register {name}: {e}"));
            Supplier {
                name: name.to_string(),
                user,
                client,
            }
        };
        let merchant = |name: &str, email: &str, department: &str, locality: &str| {
            let mut client = client(dir.path(), config.clone());
            let user = client
                .register(&registration(email, UserRole::Merchant, name, department, locality))
                .unwrap_or_else(|e| panic!("register {name}: {e}"));
            Merchant {
                name: name.to_string(),
                user,
                client,
            }
        };

        let sur = supplier("Distribuidora Sur", "ventas@sur.com.uy", "Montevideo", "Centro");
        let norte = supplier("Mayorista Norte", "pedidos@norte.com.uy", "Salto", "Salto");
        let ana = merchant("Almacén Ana", "ana@almacen.com.uy", "Montevideo", "Pocitos");
        let beto = merchant("Autoservice Beto", "beto@autoservice.com.uy", "Canelones", "Pando");

        Self {
            sur,
            norte,
            ana,
            beto,
            dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// A fresh, logged-out client over the same data.
    pub fn new_client(&self) -> MarketDelegate<JsonFileStore> {
        client(self.dir.path(), self.sur.client.config().clone())
    }
}
