//! # Billing Configuration
//!
//! Store-level settings the billing engine needs.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`OPTIKA_*`)
//! 2. Defaults (this file)
//!
//! Read-only after startup; orders copy the values they need.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::money::Money;
use crate::types::TaxContext;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Billing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingConfig {
    /// Store name (printed on receipts by the host).
    pub store_name: String,

    /// State the store supplies from. `None` until configured; orders built
    /// from an unconfigured store report `AmbiguousJurisdiction`.
    pub store_state: Option<String>,

    /// Currency symbol for display.
    pub currency_symbol: String,

    /// Maximum lines in one order.
    pub max_order_lines: usize,

    /// Maximum quantity on one line.
    pub max_item_quantity: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            store_name: "Optika Optical Store".to_string(),
            store_state: None,
            currency_symbol: "₹".to_string(),
            max_order_lines: MAX_ORDER_LINES,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

impl BillingConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `OPTIKA_STORE_NAME`
    /// - `OPTIKA_STORE_STATE`: e.g. `"Maharashtra"` or GST code `"27"`
    /// - `OPTIKA_CURRENCY_SYMBOL`
    /// - `OPTIKA_MAX_ORDER_LINES`
    /// - `OPTIKA_MAX_ITEM_QUANTITY`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = BillingConfig::default();

        if let Some(name) = lookup("OPTIKA_STORE_NAME") {
            config.store_name = name;
        }

        if let Some(state) = lookup("OPTIKA_STORE_STATE") {
            let state = state.trim();
            if !state.is_empty() {
                config.store_state = Some(state.to_string());
            }
        }

        if let Some(symbol) = lookup("OPTIKA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("OPTIKA_MAX_ORDER_LINES") {
            match raw.trim().parse::<usize>() {
                Ok(v) if v > 0 => config.max_order_lines = v,
                _ => warn!(value = %raw, "Ignoring invalid OPTIKA_MAX_ORDER_LINES"),
            }
        }

        if let Some(raw) = lookup("OPTIKA_MAX_ITEM_QUANTITY") {
            match raw.trim().parse::<i64>() {
                Ok(v) if v > 0 => config.max_item_quantity = v,
                _ => warn!(value = %raw, "Ignoring invalid OPTIKA_MAX_ITEM_QUANTITY"),
            }
        }

        config
    }

    /// Tax context for a sale from this store to `destination_state`.
    ///
    /// Pass the store's own state for walk-in customers. `None` leaves the
    /// destination unknown, which the tax resolver reports as ambiguous.
    pub fn tax_context_for(&self, destination_state: Option<&str>) -> TaxContext {
        TaxContext {
            origin_state: self.store_state.clone(),
            destination_state: destination_state.map(str::to_string),
        }
    }

    /// Formats an amount with the configured symbol.
    ///
    /// ```rust
    /// use optika_core::config::BillingConfig;
    /// use optika_core::money::Money;
    ///
    /// let config = BillingConfig::default();
    /// assert_eq!(config.format_amount(Money::from_paise(201_800)), "₹2018.00");
    /// assert_eq!(config.format_amount(Money::from_paise(-20)), "-₹0.20");
    /// ```
    pub fn format_amount(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            amount.rupees().abs(),
            amount.paise_part()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BillingConfig::from_lookup(|_| None);
        assert_eq!(config, BillingConfig::default());
        assert!(config.store_state.is_none());
        assert_eq!(config.max_item_quantity, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_overrides() {
        let config = BillingConfig::from_lookup(lookup_from(&[
            ("OPTIKA_STORE_NAME", "Lens Lane"),
            ("OPTIKA_STORE_STATE", " Karnataka "),
            ("OPTIKA_MAX_ORDER_LINES", "20"),
            ("OPTIKA_MAX_ITEM_QUANTITY", "10"),
            ("OPTIKA_CURRENCY_SYMBOL", "Rs."),
        ]));
        assert_eq!(config.store_name, "Lens Lane");
        assert_eq!(config.store_state.as_deref(), Some("Karnataka"));
        assert_eq!(config.max_order_lines, 20);
        assert_eq!(config.max_item_quantity, 10);
        assert_eq!(config.format_amount(Money::from_paise(1050)), "Rs.10.50");
    }

    #[test]
    fn test_invalid_numbers_ignored() {
        let config = BillingConfig::from_lookup(lookup_from(&[
            ("OPTIKA_MAX_ORDER_LINES", "many"),
            ("OPTIKA_MAX_ITEM_QUANTITY", "-4"),
        ]));
        assert_eq!(config.max_order_lines, MAX_ORDER_LINES);
        assert_eq!(config.max_item_quantity, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_tax_context_for() {
        let config = BillingConfig::from_lookup(lookup_from(&[("OPTIKA_STORE_STATE", "Goa")]));
        assert!(!config.tax_context_for(Some("Goa")).is_inter_state().unwrap());
        assert!(config.tax_context_for(Some("Kerala")).is_inter_state().unwrap());
        assert!(config.tax_context_for(None).is_inter_state().is_err());

        let unconfigured = BillingConfig::default();
        assert!(unconfigured.tax_context_for(Some("Goa")).is_inter_state().is_err());
    }
}
