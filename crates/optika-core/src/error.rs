//! # Error Types
//!
//! Domain-specific error types for optika-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  CoreError                                                              │
//! │  ├── Discounts    InvalidDiscountInput, DiscountCapExceeded             │
//! │  ├── Tax          AmbiguousJurisdiction                                 │
//! │  ├── Payments     InsufficientPayment, OverpaymentRejected,             │
//! │  │                MissingPaymentReference, PaymentNotFound              │
//! │  ├── Order        LineNotFound, InvalidOrderStatus, CartTooLarge,       │
//! │  │                QuantityTooLarge                                      │
//! │  ├── Registry     OrderNotFound, VersionConflict                        │
//! │  └── Validation   (wraps ValidationError)                               │
//! │                                                                         │
//! │  Every variant is recoverable. A failed call leaves the order exactly   │
//! │  as it was before the call.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line id, amounts, caps)
//! 3. Errors are enum variants, never String
//! 4. Each variant has a stable machine code via [`CoreError::code`]

use thiserror::Error;

use crate::money::Money;
use crate::types::{PaymentMode, Rate};

// =============================================================================
// Core Error
// =============================================================================

/// Billing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Discount input is not a usable number.
    ///
    /// ## When This Occurs
    /// - Text like `"ten"` or `"1,000"` typed into the discount box
    /// - A negative value submitted to an apply action
    #[error("Invalid discount input: {reason}")]
    InvalidDiscountInput { reason: String },

    /// Requested discount is above the ceiling for the acting role.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier (cap 15%) enters 20% on a frame
    ///      │
    ///      ▼
    /// DiscountCapExceeded { requested: 20%, cap: 15% }
    ///      │
    ///      ▼
    /// UI asks for a manager to approve (elevated override)
    /// ```
    #[error("Discount of {requested} exceeds the {cap} limit for this role")]
    DiscountCapExceeded { requested: Rate, cap: Rate },

    /// Origin or destination state is unknown, so CGST+SGST vs IGST can't
    /// be decided.
    #[error("Cannot determine GST jurisdiction: {missing} state is missing")]
    AmbiguousJurisdiction { missing: String },

    /// `complete()` called while a balance is still due.
    #[error("Cannot complete order: {balance_due} still due")]
    InsufficientPayment { balance_due: Money },

    /// A non-cash tender larger than the balance due, or any tender when
    /// nothing is due.
    #[error("{mode} payment of {amount} exceeds balance due of {balance_due}")]
    OverpaymentRejected {
        mode: PaymentMode,
        amount: Money,
        balance_due: Money,
    },

    /// Repricing would drop the grand total below card/UPI/other non-cash
    /// money already taken. That tender has to be removed (and reversed at
    /// the gateway) before the change.
    #[error("Grand total {grand_total} is below non-cash payments of {non_cash_paid}")]
    TenderExceedsTotal {
        non_cash_paid: Money,
        grand_total: Money,
    },

    /// UPI / bank transfer recorded without a transaction reference.
    #[error("{mode} payment requires a reference")]
    MissingPaymentReference { mode: PaymentMode },

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Order line not found: {0}")]
    LineNotFound(String),

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding or removing a payment after `complete()`
    /// - Changing lines or discounts on a completed order
    /// - Completing an order twice
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    #[error("Order cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Optimistic concurrency check failed in the registry.
    #[error("Order {order_id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        order_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Stable machine-readable code for hosts that map errors to responses.
    pub const fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidDiscountInput { .. } => "INVALID_DISCOUNT_INPUT",
            CoreError::DiscountCapExceeded { .. } => "DISCOUNT_CAP_EXCEEDED",
            CoreError::AmbiguousJurisdiction { .. } => "AMBIGUOUS_JURISDICTION",
            CoreError::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            CoreError::OverpaymentRejected { .. } => "OVERPAYMENT_REJECTED",
            CoreError::TenderExceedsTotal { .. } => "TENDER_EXCEEDS_TOTAL",
            CoreError::MissingPaymentReference { .. } => "MISSING_PAYMENT_REFERENCE",
            CoreError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            CoreError::LineNotFound(_) => "LINE_NOT_FOUND",
            CoreError::InvalidOrderStatus { .. } => "INVALID_ORDER_STATUS",
            CoreError::CartTooLarge { .. } => "CART_TOO_LARGE",
            CoreError::QuantityTooLarge { .. } => "QUANTITY_TOO_LARGE",
            CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CoreError::VersionConflict { .. } => "VERSION_CONFLICT",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., HSN code with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
