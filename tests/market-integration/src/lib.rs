use std::path::Path;

use mayorista_common::identity::{RegistrationForm, UserRole};
use mayorista_common::MarketConfig;
use mayorista_delegate::MarketDelegate;
use mayorista_node::JsonFileStore;

pub mod harness;

/// A logged-out client over the partitions in `dir`.
pub fn client(dir: &Path, config: MarketConfig) -> MarketDelegate<JsonFileStore> {
    MarketDelegate::new(JsonFileStore::new(dir), config)
}

pub fn registration(
    email: &str,
    role: UserRole,
    business: &str,
    department: &str,
    locality: &str,
) -> RegistrationForm {
    RegistrationForm {
        email: email.to_string(),
        role,
        business_name: business.to_string(),
        department: department.to_string(),
        locality: locality.to_string(),
    }
}
