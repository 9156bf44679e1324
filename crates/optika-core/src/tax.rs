//! # Tax Resolver
//!
//! Splits GST on a taxable value into CGST + SGST (intra-state supply) or
//! IGST (inter-state supply). The two are mutually exclusive.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  origin == destination   →  CGST = SGST = value × rate / 200, IGST = 0  │
//! │  origin != destination   →  IGST = value × rate / 100, CGST = SGST = 0  │
//! │  either side unknown     →  Err(AmbiguousJurisdiction)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing state is never treated as intra-state. The caller has to fix
//! the jurisdiction data (or build the context deliberately, e.g. a
//! walk-in sale supplied in the store's own state).
//!
//! Tax is resolved per line so lines with different GST slabs are taxed
//! at their own rate. Each component is rounded to the paisa, half away
//! from zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Rate, TaxContext};

/// Tax components on one taxable value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

impl TaxSplit {
    #[inline]
    pub fn total(&self) -> Money {
        self.cgst + self.sgst + self.igst
    }
}

impl std::ops::Add for TaxSplit {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        TaxSplit {
            cgst: self.cgst + other.cgst,
            sgst: self.sgst + other.sgst,
            igst: self.igst + other.igst,
        }
    }
}

impl std::ops::AddAssign for TaxSplit {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

fn known_state(state: &Option<String>) -> Option<&str> {
    state.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TaxContext {
    /// Whether the supply crosses a state border.
    ///
    /// States are compared trimmed and case-insensitively, so
    /// `"Karnataka"` and `"karnataka "` are the same state.
    ///
    /// ## Errors
    /// `AmbiguousJurisdiction` when either state is missing or blank.
    pub fn is_inter_state(&self) -> CoreResult<bool> {
        let origin = known_state(&self.origin_state).ok_or_else(|| CoreError::AmbiguousJurisdiction {
            missing: "origin".to_string(),
        })?;
        let destination =
            known_state(&self.destination_state).ok_or_else(|| CoreError::AmbiguousJurisdiction {
                missing: "destination".to_string(),
            })?;

        Ok(!origin.eq_ignore_ascii_case(destination))
    }

    /// Place of supply printed on the invoice (the destination state).
    pub fn place_of_supply(&self) -> Option<&str> {
        known_state(&self.destination_state)
    }
}

/// Splits tax on `taxable_value` at `gst_rate`.
///
/// ```rust
/// use optika_core::money::Money;
/// use optika_core::tax::resolve;
/// use optika_core::types::Rate;
///
/// let intra = resolve(Money::from_rupees(2000), Rate::from_percent(18), false);
/// assert_eq!(intra.cgst, Money::from_rupees(180));
/// assert_eq!(intra.sgst, Money::from_rupees(180));
/// assert!(intra.igst.is_zero());
///
/// let inter = resolve(Money::from_rupees(2000), Rate::from_percent(18), true);
/// assert_eq!(inter.igst, Money::from_rupees(360));
/// assert!(inter.cgst.is_zero() && inter.sgst.is_zero());
/// ```
pub fn resolve(taxable_value: Money, gst_rate: Rate, is_inter_state: bool) -> TaxSplit {
    if is_inter_state {
        TaxSplit {
            igst: taxable_value.apply_rate(gst_rate),
            ..TaxSplit::default()
        }
    } else {
        let half = taxable_value.apply_half_rate(gst_rate);
        TaxSplit {
            cgst: half,
            sgst: half,
            igst: Money::zero(),
        }
    }
}

/// Resolves the jurisdiction from `context`, then splits tax.
pub fn resolve_for(context: &TaxContext, taxable_value: Money, gst_rate: Rate) -> CoreResult<TaxSplit> {
    Ok(resolve(taxable_value, gst_rate, context.is_inter_state()?))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intra_state_split() {
        let split = resolve(Money::from_rupees(1710), Rate::from_percent(18), false);
        assert_eq!(split.cgst, Money::from_paise(15_390));
        assert_eq!(split.sgst, Money::from_paise(15_390));
        assert_eq!(split.igst, Money::zero());
        assert_eq!(split.total(), Money::from_paise(30_780));
    }

    #[test]
    fn test_inter_state_split() {
        let split = resolve(Money::from_rupees(1710), Rate::from_percent(18), true);
        assert_eq!(split.igst, Money::from_paise(30_780));
        assert_eq!(split.cgst + split.sgst, Money::zero());
    }

    #[test]
    fn test_halves_round_independently() {
        // ₹0.25 at 18%: full tax 4.5 paise, each half 2.25 → 2
        let split = resolve(Money::from_paise(25), Rate::from_percent(18), false);
        assert_eq!(split.cgst, Money::from_paise(2));
        assert_eq!(split.sgst, Money::from_paise(2));
    }

    #[test]
    fn test_zero_rate() {
        let split = resolve(Money::from_rupees(500), Rate::zero(), false);
        assert_eq!(split.total(), Money::zero());
    }

    #[test]
    fn test_jurisdiction_comparison() {
        assert!(!TaxContext::new("Maharashtra", "maharashtra ").is_inter_state().unwrap());
        assert!(TaxContext::new("Maharashtra", "Karnataka").is_inter_state().unwrap());
    }

    #[test]
    fn test_missing_state_is_ambiguous() {
        let ctx = TaxContext {
            origin_state: Some("Maharashtra".to_string()),
            destination_state: None,
        };
        assert!(matches!(
            ctx.is_inter_state(),
            Err(CoreError::AmbiguousJurisdiction { ref missing }) if missing == "destination"
        ));

        let ctx = TaxContext {
            origin_state: Some("  ".to_string()),
            destination_state: Some("Goa".to_string()),
        };
        assert!(matches!(
            resolve_for(&ctx, Money::from_rupees(100), Rate::from_percent(5)),
            Err(CoreError::AmbiguousJurisdiction { ref missing }) if missing == "origin"
        ));
    }

    #[test]
    fn test_place_of_supply() {
        assert_eq!(TaxContext::new("Goa", " Kerala ").place_of_supply(), Some("Kerala"));
        assert_eq!(TaxContext::default().place_of_supply(), None);
    }

    #[test]
    fn test_split_addition() {
        let a = resolve(Money::from_rupees(100), Rate::from_percent(18), false);
        let b = resolve(Money::from_rupees(200), Rate::from_percent(12), false);
        let mut sum = a;
        sum += b;
        assert_eq!(sum.cgst, Money::from_rupees(9 + 12));
        assert_eq!(sum.total(), a.total() + b.total());
    }
}
