//! # Validation Module
//!
//! Input validation for everything that enters the billing engine from a
//! collaborator (catalog lines, tenders, jurisdiction data).
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Billing screen                                                │
//! │  ├── Basic format checks (empty, length)                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: optika-core (THIS MODULE)                                     │
//! │  ├── Field checks on every line and tender                              │
//! │  └── Runs again on the trusted side, whatever the UI did                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (discount caps, overpayment, completion)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use optika_core::validation::{validate_hsn_code, validate_quantity};
//!
//! assert!(validate_hsn_code("9004").is_ok());
//! assert!(validate_quantity(2, 999).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLineInput, Rate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Highest unit price accepted from the catalog (₹1 crore).
pub const MAX_UNIT_PRICE: Money = Money::from_rupees(1_00_00_000);

/// Highest `unit_price × quantity` on one line (₹100 crore).
pub const MAX_LINE_TOTAL: Money = Money::from_rupees(100_00_00_000);

/// Highest order subtotal (₹10,000 crore). Keeps every later sum, tax
/// included, well inside `i64` paise.
pub const MAX_ORDER_SUBTOTAL: Money = Money::from_rupees(10_000_00_00_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use optika_core::validation::validate_sku;
///
/// assert!(validate_sku("FRM-RB-3025").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product reference from the catalog.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }
    Ok(())
}

/// Validates an HSN code.
///
/// ## Rules
/// - Digits only
/// - 4, 6 or 8 digits (chapter, heading, full tariff item)
///
/// ```rust
/// use optika_core::validation::validate_hsn_code;
///
/// assert!(validate_hsn_code("9004").is_ok());      // spectacles
/// assert!(validate_hsn_code("90013000").is_ok());  // contact lenses
/// assert!(validate_hsn_code("900").is_err());
/// assert!(validate_hsn_code("90A4").is_err());
/// ```
pub fn validate_hsn_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "hsn_code".to_string(),
        });
    }

    if !code.chars().all(|c| c.is_ascii_digit()) || !matches!(code.len(), 4 | 6 | 8) {
        return Err(ValidationError::InvalidFormat {
            field: "hsn_code".to_string(),
            reason: "must be 4, 6 or 8 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a state name or GST state code used for jurisdiction.
pub fn validate_state(state: &str, field: &str) -> ValidationResult<()> {
    let state = state.trim();

    if state.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if state.len() > 60 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 60,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Billing: Add Item                                                      │
/// │                                                                         │
/// │  User enters quantity: 2 (pair of lenses)                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(2, max) ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"               │
/// │       ├── qty > max? → Error: "quantity must be between 1 and max"      │
/// │       └── OK → line is added                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (complimentary items).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE.paise(),
        });
    }

    Ok(())
}

/// Validates `unit_price × quantity` without overflowing.
pub fn validate_line_total(price: Money, quantity: i64) -> ValidationResult<()> {
    let within = price
        .paise()
        .checked_mul(quantity)
        .is_some_and(|total| (0..=MAX_LINE_TOTAL.paise()).contains(&total));
    if !within {
        return Err(ValidationError::OutOfRange {
            field: "line_total".to_string(),
            min: 0,
            max: MAX_LINE_TOTAL.paise(),
        });
    }

    Ok(())
}

/// Validates the sum of an order's line totals without overflowing.
pub fn validate_order_subtotal<I>(line_totals: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = Money>,
{
    let out_of_range = || ValidationError::OutOfRange {
        field: "subtotal".to_string(),
        min: 0,
        max: MAX_ORDER_SUBTOTAL.paise(),
    };

    let subtotal = line_totals
        .into_iter()
        .try_fold(0i64, |acc, total| acc.checked_add(total.paise()))
        .ok_or_else(out_of_range)?;
    if subtotal > MAX_ORDER_SUBTOTAL.paise() {
        return Err(out_of_range());
    }

    Ok(())
}

/// Validates a payment amount. Must be strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a GST rate.
///
/// ## Rules
/// - Between 0% and 100% (0..=10000 bps)
/// - Real slabs are 0, 0.25, 3, 5, 12, 18 and 28%, but the slab table
///   belongs to the catalog, so any rate in range is accepted
pub fn validate_gst_rate(rate: Rate) -> ValidationResult<()> {
    if rate > Rate::FULL {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0,
            max: Rate::FULL.bps() as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a catalog line.
pub fn validate_cart_line(input: &CartLineInput, max_quantity: i64) -> ValidationResult<()> {
    validate_product_id(&input.product_id)?;
    validate_sku(&input.sku)?;
    validate_hsn_code(&input.hsn_code)?;
    validate_unit_price(input.unit_price)?;
    validate_quantity(input.quantity, max_quantity)?;
    validate_line_total(input.unit_price, input.quantity)?;
    validate_gst_rate(input.gst_rate)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
