use thiserror::Error;

use crate::identity::{UserId, UserRole};
use crate::order::OrderStatus;
use crate::store::Partition;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer saved the partition since it was read.
    #[error("{partition} changed concurrently (expected revision {expected}, found {found})")]
    Conflict {
        partition: Partition,
        expected: u64,
        found: u64,
    },

    #[error("{partition} holds malformed data: {source}")]
    Corrupt {
        partition: Partition,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize {partition}: {source}")]
    Serialize {
        partition: Partition,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage I/O failed for {partition}: {source}")]
    Io {
        partition: Partition,
        #[source]
        source: std::io::Error,
    },
}

/// Rejection of a bulk product import. Nothing is imported when this occurs.
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("the sheet has no product rows")]
    Empty,

    #[error("row {row}: column {column} is not a valid number ({value})")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: column {column} must not be negative")]
    Negative { row: usize, column: &'static str },
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("account not found for {email} as {role}")]
    UserNotFound { email: String, role: UserRole },

    #[error("an account is already registered for {0}")]
    AlreadyRegistered(String),

    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("this action requires a {required} account")]
    WrongRole { required: UserRole },

    #[error("unknown user {0}")]
    UnknownUser(UserId),

    #[error("{locality} is not a locality of {department}")]
    UnknownLocality {
        department: String,
        locality: String,
    },

    #[error("unknown department {0}")]
    UnknownDepartment(String),

    #[error("invalid delivery hours: {0}")]
    InvalidHours(String),

    #[error("no locality is selected for schedule editing")]
    NoFocusedLocality,

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error("product {0} is out of stock")]
    OutOfStock(String),

    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("the cart is empty")]
    EmptyCart,

    #[error("the cart total would exceed the largest supported amount (product {0})")]
    AmountTooLarge(String),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("import rejected: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
