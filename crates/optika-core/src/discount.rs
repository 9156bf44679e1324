//! # Discount Authorizer
//!
//! Computes item-level and order-level discount amounts and checks them
//! against the acting role's ceiling.
//!
//! ## Two Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  compute_discount()          pure, advisory                             │
//! │  ├── clamps the input (percent to [0,100], amount to [0,base])          │
//! │  ├── derives the other half (amount ↔ percent)                          │
//! │  └── reports exceeds_cap, never refuses                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  DiscountAuthorizer          enforcing                                  │
//! │  ├── authorize()             Err(DiscountCapExceeded) over the cap      │
//! │  └── authorize_with_approval()  re-checks against the approver's cap    │
//! │                                                                         │
//! │  Neither layer touches a line or a total. The order commits the         │
//! │  outcome only after authorization succeeds.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use optika_core::discount::{compute_discount, DiscountInput};
//! use optika_core::money::Money;
//! use optika_core::types::Rate;
//!
//! let outcome = compute_discount(
//!     Money::from_rupees(2000),
//!     DiscountInput::percent(Rate::from_percent(20)),
//!     Rate::from_percent(15),
//! );
//! assert_eq!(outcome.discount_amount, Money::from_rupees(400));
//! assert!(outcome.exceeds_cap);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{div_round_half_away, parse_hundredths, Money, BPS_SCALE};
use crate::types::{DiscountPolicy, OrderLine, Rate};

// =============================================================================
// Inputs & Outcomes
// =============================================================================

/// Whether a discount was typed as a percentage or a rupee amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percent,
    Amount,
}

/// A requested discount, before clamping.
///
/// Percentages are basis points held in an `i64` so that out-of-range
/// requests (negative, above 100%) can be represented and clamped rather
/// than silently wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountInput {
    Percent(i64),
    Amount(Money),
}

impl DiscountInput {
    /// A percentage discount from a [`Rate`].
    pub fn percent(rate: Rate) -> Self {
        DiscountInput::Percent(rate.bps() as i64)
    }

    /// A fixed rupee-amount discount.
    pub fn amount(amount: Money) -> Self {
        DiscountInput::Amount(amount)
    }

    /// Parses the text of a discount field.
    ///
    /// `"12.5"` as [`DiscountKind::Percent`] is 12.5%; `"150"` as
    /// [`DiscountKind::Amount`] is ₹150.00.
    ///
    /// ## Errors
    /// `InvalidDiscountInput` for non-numeric text, more than two decimal
    /// places, or a negative value.
    ///
    /// ```rust
    /// use optika_core::discount::{DiscountInput, DiscountKind};
    ///
    /// assert_eq!(
    ///     DiscountInput::parse(DiscountKind::Percent, "12.5").unwrap(),
    ///     DiscountInput::Percent(1250)
    /// );
    /// assert!(DiscountInput::parse(DiscountKind::Amount, "ten").is_err());
    /// assert!(DiscountInput::parse(DiscountKind::Percent, "-5").is_err());
    /// ```
    pub fn parse(kind: DiscountKind, text: &str) -> CoreResult<Self> {
        let hundredths = parse_hundredths(text).ok_or_else(|| CoreError::InvalidDiscountInput {
            reason: format!("'{}' is not a number with at most two decimals", text.trim()),
        })?;

        let input = match kind {
            DiscountKind::Percent => DiscountInput::Percent(hundredths),
            DiscountKind::Amount => DiscountInput::Amount(Money::from_paise(hundredths)),
        };
        input.ensure_non_negative()?;
        Ok(input)
    }

    pub fn kind(&self) -> DiscountKind {
        match self {
            DiscountInput::Percent(_) => DiscountKind::Percent,
            DiscountInput::Amount(_) => DiscountKind::Amount,
        }
    }

    /// Rejects negative requests at an apply boundary.
    pub fn ensure_non_negative(&self) -> CoreResult<()> {
        let negative = match self {
            DiscountInput::Percent(bps) => *bps < 0,
            DiscountInput::Amount(amount) => amount.is_negative(),
        };
        if negative {
            return Err(CoreError::InvalidDiscountInput {
                reason: "discount cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Result of evaluating a discount against a base amount and a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountOutcome {
    pub discount_percent: Rate,
    pub discount_amount: Money,
    /// The caller must not commit this outcome when set.
    pub exceeds_cap: bool,
}

impl DiscountOutcome {
    pub const fn none() -> Self {
        DiscountOutcome {
            discount_percent: Rate::zero(),
            discount_amount: Money::zero(),
            exceeds_cap: false,
        }
    }
}

// =============================================================================
// Pure Computation
// =============================================================================

/// Evaluates `input` against `base` (the amount being discounted).
///
/// ## Rules
/// - Percent: clamped to [0, 100]; amount = round(base × percent / 100)
/// - Amount: clamped to [0, base]; percent = amount / base × 100, or 0
///   when base is 0
/// - `exceeds_cap` = percent > cap. For amount inputs the comparison is
///   done exactly (`amount × 10000 > cap × base`), not on the rounded
///   percent, so a 15.004% discount is over a 15% cap.
pub fn compute_discount(base: Money, input: DiscountInput, cap: Rate) -> DiscountOutcome {
    let base = base.non_negative();

    match input {
        DiscountInput::Percent(bps) => {
            let rate = Rate::from_bps(bps.clamp(0, Rate::FULL.bps() as i64) as u32);
            DiscountOutcome {
                discount_percent: rate,
                discount_amount: base.apply_rate(rate),
                exceeds_cap: rate > cap,
            }
        }
        DiscountInput::Amount(requested) => {
            let amount = requested.non_negative().min(base);
            if base.is_zero() {
                return DiscountOutcome::none();
            }

            let scaled = amount.paise() as i128 * BPS_SCALE;
            let percent = div_round_half_away(scaled, base.paise() as i128) as u32;
            DiscountOutcome {
                discount_percent: Rate::from_bps(percent),
                discount_amount: amount,
                exceeds_cap: scaled > cap.bps() as i128 * base.paise() as i128,
            }
        }
    }
}

/// Evaluates an item-level discount on `line`'s undiscounted total.
pub fn compute_item_discount(line: &OrderLine, input: DiscountInput, cap: Rate) -> DiscountOutcome {
    compute_discount(line.line_total(), input, cap)
}

/// Evaluates the order-level discount. It is applied once, to the subtotal
/// left after every item-level discount.
pub fn compute_order_discount(
    subtotal_after_item_discount: Money,
    input: DiscountInput,
    cap: Rate,
) -> DiscountOutcome {
    compute_discount(subtotal_after_item_discount, input, cap)
}

/// Resets a line's discount to zero.
pub fn clear_discount(line: &mut OrderLine) {
    line.discount_percent = Rate::zero();
    line.discount_amount = Money::zero();
    line.discount = None;
}

// =============================================================================
// Enforcing Authorizer
// =============================================================================

/// Enforces a role's discount ceiling.
///
/// Built from the session's [`DiscountPolicy`]; the override path takes a
/// second policy (the approver's) explicitly.
#[derive(Debug, Clone)]
pub struct DiscountAuthorizer<'a> {
    policy: &'a DiscountPolicy,
}

impl<'a> DiscountAuthorizer<'a> {
    pub fn new(policy: &'a DiscountPolicy) -> Self {
        DiscountAuthorizer { policy }
    }

    pub fn cap(&self) -> Rate {
        self.policy.max_discount
    }

    /// Evaluates `input` against `base` and refuses it when over the cap.
    pub fn authorize(&self, base: Money, input: DiscountInput) -> CoreResult<DiscountOutcome> {
        input.ensure_non_negative()?;
        let outcome = compute_discount(base, input, self.policy.max_discount);

        debug!(
            role = %self.policy.role,
            base = %base,
            percent = %outcome.discount_percent,
            amount = %outcome.discount_amount,
            exceeds_cap = outcome.exceeds_cap,
            "Discount evaluated"
        );

        if outcome.exceeds_cap {
            warn!(
                role = %self.policy.role,
                requested = %outcome.discount_percent,
                cap = %self.policy.max_discount,
                "Discount blocked: over role ceiling"
            );
            return Err(CoreError::DiscountCapExceeded {
                requested: outcome.discount_percent,
                cap: self.policy.max_discount,
            });
        }

        Ok(outcome)
    }

    /// Elevated override: the request is re-checked against `approver`'s
    /// ceiling instead of the session role's.
    pub fn authorize_with_approval(
        &self,
        base: Money,
        input: DiscountInput,
        approver: &DiscountPolicy,
    ) -> CoreResult<DiscountOutcome> {
        let outcome = DiscountAuthorizer::new(approver).authorize(base, input)?;
        debug!(
            role = %self.policy.role,
            approver = %approver.role,
            percent = %outcome.discount_percent,
            "Discount approved by override"
        );
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CartLineInput;

    fn line(unit_rupees: i64, quantity: i64) -> OrderLine {
        OrderLine::from_input(CartLineInput {
            product_id: "prod-frame-01".to_string(),
            sku: "FRM-01".to_string(),
            unit_price: Money::from_rupees(unit_rupees),
            quantity,
            hsn_code: "9004".to_string(),
            gst_rate: Rate::from_percent(18),
        })
    }

    fn cashier() -> DiscountPolicy {
        DiscountPolicy::new("cashier", Rate::from_percent(15))
    }

    #[test]
    fn test_percent_discount() {
        let outcome = compute_item_discount(
            &line(1000, 2),
            DiscountInput::percent(Rate::from_percent(10)),
            Rate::from_percent(15),
        );
        assert_eq!(outcome.discount_amount, Money::from_rupees(200));
        assert_eq!(outcome.discount_percent, Rate::from_percent(10));
        assert!(!outcome.exceeds_cap);
    }

    #[test]
    fn test_percent_clamps_to_range() {
        let base = Money::from_rupees(500);
        let over = compute_discount(base, DiscountInput::Percent(15_000), Rate::FULL);
        assert_eq!(over.discount_percent, Rate::FULL);
        assert_eq!(over.discount_amount, base);

        let negative = compute_discount(base, DiscountInput::Percent(-500), Rate::zero());
        assert_eq!(negative, DiscountOutcome::none());
    }

    #[test]
    fn test_amount_discount_derives_percent() {
        let outcome = compute_discount(
            Money::from_rupees(2000),
            DiscountInput::amount(Money::from_rupees(150)),
            Rate::from_percent(15),
        );
        assert_eq!(outcome.discount_amount, Money::from_rupees(150));
        assert_eq!(outcome.discount_percent, Rate::from_bps(750));
        assert!(!outcome.exceeds_cap);
    }

    #[test]
    fn test_amount_clamps_to_base() {
        let outcome = compute_discount(
            Money::from_rupees(100),
            DiscountInput::amount(Money::from_rupees(250)),
            Rate::FULL,
        );
        assert_eq!(outcome.discount_amount, Money::from_rupees(100));
        assert_eq!(outcome.discount_percent, Rate::FULL);

        let negative = compute_discount(
            Money::from_rupees(100),
            DiscountInput::amount(Money::from_rupees(-20)),
            Rate::FULL,
        );
        assert_eq!(negative.discount_amount, Money::zero());
    }

    #[test]
    fn test_amount_on_zero_base() {
        let outcome = compute_discount(
            Money::zero(),
            DiscountInput::amount(Money::from_rupees(50)),
            Rate::zero(),
        );
        assert_eq!(outcome, DiscountOutcome::none());
    }

    #[test]
    fn test_amount_cap_check_is_exact() {
        // ₹150.01 on ₹1000 is 15.001%: rounds to 15.00% but is over a 15% cap
        let outcome = compute_discount(
            Money::from_rupees(1000),
            DiscountInput::amount(Money::from_paise(15_001)),
            Rate::from_percent(15),
        );
        assert_eq!(outcome.discount_percent, Rate::from_percent(15));
        assert!(outcome.exceeds_cap);

        let at_cap = compute_discount(
            Money::from_rupees(1000),
            DiscountInput::amount(Money::from_rupees(150)),
            Rate::from_percent(15),
        );
        assert!(!at_cap.exceeds_cap);
    }

    #[test]
    fn test_exceeds_cap_reported() {
        let outcome = compute_item_discount(
            &line(1000, 2),
            DiscountInput::percent(Rate::from_percent(20)),
            Rate::from_percent(15),
        );
        assert!(outcome.exceeds_cap);
        assert_eq!(outcome.discount_amount, Money::from_rupees(400));
    }

    #[test]
    fn test_order_discount() {
        let outcome = compute_order_discount(
            Money::from_rupees(1800),
            DiscountInput::percent(Rate::from_percent(5)),
            Rate::from_percent(15),
        );
        assert_eq!(outcome.discount_amount, Money::from_rupees(90));
    }

    #[test]
    fn test_clear_discount() {
        let mut l = line(1000, 1);
        l.discount_amount = Money::from_rupees(100);
        l.discount_percent = Rate::from_percent(10);
        clear_discount(&mut l);
        assert_eq!(l.discount_amount, Money::zero());
        assert_eq!(l.discount_percent, Rate::zero());
        assert!(l.discount.is_none());
    }

    #[test]
    fn test_authorizer_blocks_over_cap() {
        let policy = cashier();
        let authorizer = DiscountAuthorizer::new(&policy);
        let err = authorizer
            .authorize(Money::from_rupees(2000), DiscountInput::percent(Rate::from_percent(20)))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DiscountCapExceeded { requested, cap }
                if requested == Rate::from_percent(20) && cap == Rate::from_percent(15)
        ));
    }

    #[test]
    fn test_authorizer_rejects_negative_input() {
        let policy = cashier();
        let err = DiscountAuthorizer::new(&policy)
            .authorize(Money::from_rupees(100), DiscountInput::Percent(-100))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscountInput { .. }));
    }

    #[test]
    fn test_override_uses_approver_cap() {
        let policy = cashier();
        let manager = DiscountPolicy::new("manager", Rate::from_percent(30));
        let outcome = DiscountAuthorizer::new(&policy)
            .authorize_with_approval(
                Money::from_rupees(2000),
                DiscountInput::percent(Rate::from_percent(20)),
                &manager,
            )
            .unwrap();
        assert_eq!(outcome.discount_amount, Money::from_rupees(400));

        let err = DiscountAuthorizer::new(&policy)
            .authorize_with_approval(
                Money::from_rupees(2000),
                DiscountInput::percent(Rate::from_percent(40)),
                &manager,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DiscountCapExceeded { .. }));
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(
            DiscountInput::parse(DiscountKind::Amount, "150.50").unwrap(),
            DiscountInput::Amount(Money::from_paise(15_050))
        );
        assert_eq!(
            DiscountInput::parse(DiscountKind::Percent, " 10 ").unwrap().kind(),
            DiscountKind::Percent
        );
        assert!(matches!(
            DiscountInput::parse(DiscountKind::Percent, "10.125"),
            Err(CoreError::InvalidDiscountInput { .. })
        ));
        assert!(DiscountInput::parse(DiscountKind::Amount, "").is_err());
    }
}
