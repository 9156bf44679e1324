//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    1710 × 0.09 = 153.89999999999998  ❌ WRONG!                          │
//! │                                                                         │
//! │  A cart panel, a billing screen and an invoice that each redo that     │
//! │  math in floats can disagree by a paisa, and GST returns won't tie.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    171000 paise × 900 bps / 10000 = 15390 paise (exact)                 │
//! │    Every rounding step is explicit and happens in ONE place            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Rule
//! There is exactly one rounding rule in the engine: **round half away from
//! zero**. It is applied to discount amounts and tax components (to the
//! paisa) and to the grand total (to the whole rupee).
//!
//! ## Usage
//! ```rust
//! use optika_core::money::Money;
//!
//! let price = Money::from_paise(99_900); // ₹999.00
//! let line = price * 2i64;               // ₹1998.00
//! assert_eq!(line.paise(), 199_800);
//! assert_eq!(line.to_string(), "₹1998.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

/// Paise per rupee.
pub const PAISE_PER_RUPEE: i64 = 100;

/// Basis points in 100%.
pub(crate) const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Rounding Primitive
// =============================================================================

/// Divides `numerator` by a positive `denominator`, rounding half away from
/// zero.
///
/// ```text
///   2.5 →  3      -2.5 → -3
///   2.4 →  2      -2.4 → -2
/// ```
///
/// Every rounded quantity in the crate goes through this function.
pub(crate) fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    }
}

/// Parses a decimal string with at most two fractional digits into
/// hundredths. `"12.5"` → `1250`, `"-3"` → `-300`.
///
/// Returns `None` for anything that is not a plain decimal number
/// (exponents, thousands separators, three or more fraction digits).
pub(crate) fn parse_hundredths(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_value: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    let magnitude = whole_value.checked_mul(100)?.checked_add(frac_value)?;
    Some(if negative { -magnitude } else { magnitude })
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: round-off deltas and balances can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as a bare integer** of paise
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CartLineInput.unit_price ──► line total ──► item discount             │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │  order discount ──► taxable value ──► CGST/SGST or IGST                 │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │  pre-round total ──► grand total ──► PaymentLedger.balance_due          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees_paise(10, 99).paise(), 1099);
    /// assert_eq!(Money::from_rupees_paise(-5, 50).paise(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts only the rupee part carries the sign.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * PAISE_PER_RUPEE - paise)
        } else {
            Money(rupees * PAISE_PER_RUPEE + paise)
        }
    }

    /// Parses a rupee amount such as `"150"` or `"150.50"`.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    ///
    /// assert_eq!(Money::parse_rupees("150.5"), Some(Money::from_paise(15050)));
    /// assert_eq!(Money::parse_rupees("1,500"), None);
    /// ```
    pub fn parse_rupees(text: &str) -> Option<Money> {
        parse_hundredths(text).map(Money)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns `self × rate`, rounded half away from zero to the paisa.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    /// use optika_core::types::Rate;
    ///
    /// // ₹2000.00 × 18% = ₹360.00
    /// let tax = Money::from_rupees(2000).apply_rate(Rate::from_percent(18));
    /// assert_eq!(tax, Money::from_rupees(360));
    ///
    /// // ₹0.05 × 10% = 0.5 paise → 1 paisa
    /// assert_eq!(Money::from_paise(5).apply_rate(Rate::from_percent(10)).paise(), 1);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money(div_round_half_away(scaled, BPS_SCALE) as i64)
    }

    /// Returns `self × rate / 2`, rounded half away from zero to the paisa.
    ///
    /// Used for the CGST and SGST halves so each half is rounded from the
    /// exact product rather than from an already-rounded full tax.
    pub fn apply_half_rate(&self, rate: Rate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money(div_round_half_away(scaled, 2 * BPS_SCALE) as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    ///
    /// let frame = Money::from_rupees(1000);
    /// assert_eq!(frame.multiply_quantity(2), Money::from_rupees(2000));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Rounds to the nearest whole rupee, half away from zero.
    ///
    /// ```rust
    /// use optika_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(201_780).round_to_rupee(), Money::from_rupees(2018));
    /// assert_eq!(Money::from_paise(201_750).round_to_rupee(), Money::from_rupees(2018));
    /// assert_eq!(Money::from_paise(201_749).round_to_rupee(), Money::from_rupees(2017));
    /// ```
    pub fn round_to_rupee(&self) -> Money {
        let rupees = div_round_half_away(self.0 as i128, PAISE_PER_RUPEE as i128);
        Money(rupees as i64 * PAISE_PER_RUPEE)
    }

    /// Splits `self` across `weights` proportionally, so that the parts
    /// sum to exactly `self`.
    ///
    /// ## Largest Remainder Method
    /// ```text
    /// total = 100 paise, weights = [1, 1, 1]
    ///
    ///   exact shares:   33.33  33.33  33.33
    ///   floor:          33     33     33     (sum 99, 1 paisa left)
    ///   largest rem.:   +1 to the first line (ties go to the earlier line)
    ///   result:         34     33     33
    /// ```
    ///
    /// `self` and all weights are expected to be non-negative. When every
    /// weight is zero the result is all zeros.
    pub fn allocate(&self, weights: &[Money]) -> Vec<Money> {
        let total_weight: i128 = weights.iter().map(|w| w.0 as i128).sum();
        if total_weight <= 0 || self.0 == 0 {
            return vec![Money::zero(); weights.len()];
        }

        let amount = self.0 as i128;
        let mut shares = Vec::with_capacity(weights.len());
        let mut remainders = Vec::with_capacity(weights.len());
        let mut assigned: i128 = 0;

        for (index, weight) in weights.iter().enumerate() {
            let product = amount * weight.0 as i128;
            let share = product / total_weight;
            shares.push(share);
            remainders.push((product % total_weight, index));
            assigned += share;
        }

        // Largest remainder first; stable sort keeps earlier lines first on ties.
        remainders.sort_by(|a, b| b.0.cmp(&a.0));
        let leftover = (amount - assigned) as usize;
        for &(_, index) in remainders.iter().take(leftover) {
            shares[index] += 1;
        }

        shares.into_iter().map(|s| Money(s as i64)).collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount as `₹1234.50`. Hosts format for locale themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_rupees(2018).to_string(), "₹2018.00");
        assert_eq!(Money::from_paise(-20).to_string(), "-₹0.20");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_div_round_half_away() {
        assert_eq!(div_round_half_away(25, 10), 3);
        assert_eq!(div_round_half_away(24, 10), 2);
        assert_eq!(div_round_half_away(-25, 10), -3);
        assert_eq!(div_round_half_away(-24, 10), -2);
        assert_eq!(div_round_half_away(0, 10), 0);
        assert_eq!(div_round_half_away(30, 10), 3);
    }

    #[test]
    fn test_round_to_rupee() {
        assert_eq!(Money::from_paise(236_000).round_to_rupee().paise(), 236_000);
        assert_eq!(Money::from_paise(201_780).round_to_rupee().paise(), 201_800);
        assert_eq!(Money::from_paise(50).round_to_rupee().paise(), 100);
        assert_eq!(Money::from_paise(49).round_to_rupee().paise(), 0);
        assert_eq!(Money::from_paise(-50).round_to_rupee().paise(), -100);
    }

    #[test]
    fn test_apply_rate_rounds_half_away_from_zero() {
        // 171000 × 9% = 15390 exactly
        assert_eq!(Money::from_paise(171_000).apply_half_rate(Rate::from_percent(18)).paise(), 15_390);
        // 333 × 18% = 59.94 → 60
        assert_eq!(Money::from_paise(333).apply_rate(Rate::from_percent(18)).paise(), 60);
        // 25 × 2% = 0.5 → 1
        assert_eq!(Money::from_paise(25).apply_rate(Rate::from_percent(2)).paise(), 1);
    }

    #[test]
    fn test_allocate_sums_exactly() {
        let parts = Money::from_paise(100).allocate(&[
            Money::from_paise(1),
            Money::from_paise(1),
            Money::from_paise(1),
        ]);
        assert_eq!(parts, vec![Money::from_paise(34), Money::from_paise(33), Money::from_paise(33)]);

        let parts = Money::from_paise(9_000).allocate(&[Money::from_paise(180_000)]);
        assert_eq!(parts, vec![Money::from_paise(9_000)]);
    }

    #[test]
    fn test_allocate_proportional() {
        let parts = Money::from_paise(1_000).allocate(&[Money::from_paise(3_000), Money::from_paise(1_000)]);
        assert_eq!(parts, vec![Money::from_paise(750), Money::from_paise(250)]);
    }

    #[test]
    fn test_allocate_zero_weights() {
        let parts = Money::from_paise(500).allocate(&[Money::zero(), Money::zero()]);
        assert_eq!(parts, vec![Money::zero(), Money::zero()]);
    }

    #[test]
    fn test_parse_hundredths() {
        assert_eq!(parse_hundredths("12.5"), Some(1250));
        assert_eq!(parse_hundredths("12.50"), Some(1250));
        assert_eq!(parse_hundredths(" 7 "), Some(700));
        assert_eq!(parse_hundredths("-3"), Some(-300));
        assert_eq!(parse_hundredths(".5"), Some(50));
        assert_eq!(parse_hundredths("12.345"), None);
        assert_eq!(parse_hundredths("abc"), None);
        assert_eq!(parse_hundredths(""), None);
        assert_eq!(parse_hundredths("."), None);
        assert_eq!(parse_hundredths("1e3"), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_paise(100), Money::from_paise(250)].iter().sum();
        assert_eq!(total.paise(), 350);
    }
}
