/// Prices are stored in centésimos (1/100 of a peso uruguayo).
pub const MINOR_PER_PESO: u64 = 100;

/// Largest amount, in centésimos, that a JavaScript number holds exactly.
/// Prices and order totals never exceed it.
pub const MAX_AMOUNT: u64 = (1 << 53) - 1;

/// Format an amount in centésimos as pesos, e.g. `$ 1.234,50`.
pub fn format_pesos(amount_minor: u64) -> String {
    let pesos = amount_minor / MINOR_PER_PESO;
    let cents = amount_minor % MINOR_PER_PESO;
    let digits = pesos.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("$ {grouped},{cents:02}")
}

/// Convert a decimal peso amount (as typed in a sheet or form) to centésimos.
/// Returns `None` for negative or non-finite values and for anything above
/// [`MAX_AMOUNT`].
pub fn pesos_to_minor(pesos: f64) -> Option<u64> {
    if !pesos.is_finite() || pesos < 0.0 {
        return None;
    }
    let minor = (pesos * MINOR_PER_PESO as f64).round();
    if minor > MAX_AMOUNT as f64 {
        return None;
    }
    Some(minor as u64)
}

/// Parse a peso amount written with either `.` or `,` as decimal separator.
pub fn parse_pesos(input: &str) -> Option<u64> {
    let cleaned = input.trim().trim_start_matches('$').trim().replace(',', ".");
    cleaned.parse::<f64>().ok().and_then(pesos_to_minor)
}

/// Serde adapter for amounts: centésimos in memory, decimal pesos in JSON,
/// which is how the browser build keeps them in local storage.
///
/// ```ignore
/// #[serde(with = "mayorista_common::currency::pesos")]
/// pub price: u64,
/// ```
pub mod pesos {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{pesos_to_minor, MINOR_PER_PESO};

    pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        if amount % MINOR_PER_PESO == 0 {
            serializer.serialize_u64(amount / MINOR_PER_PESO)
        } else {
            serializer.serialize_f64(*amount as f64 / MINOR_PER_PESO as f64)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let pesos = f64::deserialize(deserializer)?;
        pesos_to_minor(pesos).ok_or_else(|| D::Error::custom(format!("invalid amount {pesos}")))
    }

    /// Same, for optional amounts. Pair with `#[serde(default)]`.
    pub mod option {
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::pesos_to_minor;

        pub fn serialize<S: Serializer>(amount: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
            match amount {
                Some(amount) => super::serialize(amount, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|pesos| pesos_to_minor(pesos).ok_or_else(|| D::Error::custom(format!("invalid amount {pesos}"))))
                .transpose()
        }
    }
}
