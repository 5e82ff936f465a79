use serde::{Deserialize, Serialize};

use crate::coverage::HourRange;
use crate::currency::{pesos, MINOR_PER_PESO};

/// Marketplace-wide settings. Every field has a default, so a partial (or
/// empty) config file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketConfig {
    /// Minimum order per supplier for suppliers that set none. Written in
    /// pesos in the config file.
    #[serde(with = "pesos")]
    pub default_min_order_value: u64,
    /// Hours given to a newly selected delivery locality.
    pub default_delivery_hours: HourRange,
    /// Emit a stock notification when a saved product is at or below its minimum.
    pub notify_low_stock: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            default_min_order_value: 2_000 * MINOR_PER_PESO,
            default_delivery_hours: HourRange::BUSINESS_HOURS,
            notify_low_stock: true,
        }
    }
}
