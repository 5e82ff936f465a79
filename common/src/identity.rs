use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage::Coverage;
use crate::currency::pesos;
use crate::error::MarketError;
use crate::geography;

/// Build a timestamp-based identifier with a short random suffix so that two
/// records created in the same millisecond still get distinct ids.
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{prefix}-{}-{:04x}",
        now.timestamp_millis(),
        rand::random::<u16>()
    )
}

/// Unique user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self(generate_id("u", now))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Merchant,
    Supplier,
}

impl UserRole {
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Merchant => "Comercio",
            UserRole::Supplier => "Distribuidor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Merchant => write!(f, "MERCHANT"),
            UserRole::Supplier => write!(f, "SUPPLIER"),
        }
    }
}

/// Home address of a business, at locality granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub department: String,
    pub locality: String,
}

/// A registered account. Suppliers additionally carry their coverage areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub business_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    /// Supplier-specific minimum order; falls back to the configured default.
    #[serde(default, with = "pesos::option", skip_serializing_if = "Option::is_none")]
    pub min_order_value: Option<u64>,
}

impl User {
    /// Create a verified account from a validated registration form.
    pub fn register(form: &RegistrationForm, now: DateTime<Utc>) -> Result<Self, MarketError> {
        form.validate()?;
        let email = form.email.trim().to_string();
        let name = email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            id: UserId::generate(now),
            name,
            email,
            role: form.role,
            business_name: form.business_name.trim().to_string(),
            is_verified: true,
            location: Some(Location {
                department: form.department.clone(),
                locality: form.locality.clone(),
            }),
            coverage: match form.role {
                UserRole::Supplier => Some(Coverage::default()),
                UserRole::Merchant => None,
            },
            min_order_value: None,
        })
    }

    pub fn is_supplier(&self) -> bool {
        self.role == UserRole::Supplier
    }

    pub fn is_merchant(&self) -> bool {
        self.role == UserRole::Merchant
    }

    /// Minimum order value for this supplier, or `default` when unset.
    pub fn minimum_order(&self, default: u64) -> u64 {
        self.min_order_value.unwrap_or(default)
    }

    /// Case-insensitive email comparison.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Registration input as submitted by the sign-up form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub email: String,
    pub role: UserRole,
    pub business_name: String,
    pub department: String,
    pub locality: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), MarketError> {
        if !is_plausible_email(self.email.trim()) {
            return Err(MarketError::InvalidRegistration(format!(
                "invalid email address: {:?}",
                self.email
            )));
        }
        if self.business_name.trim().is_empty() {
            return Err(MarketError::InvalidRegistration(
                "business name is required".into(),
            ));
        }
        if !geography::is_known_locality(&self.department, &self.locality) {
            return Err(MarketError::UnknownLocality {
                department: self.department.clone(),
                locality: self.locality.clone(),
            });
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
