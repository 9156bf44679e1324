//! # optika-core: Billing Engine for Optika POS
//!
//! Prices an optical-store order, applies role-capped discounts, splits GST
//! into CGST/SGST or IGST, rounds the grand total and reconciles tenders
//! against it. Pure logic: no database, no network, no UI.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Optika POS Billing                               │
//! │                                                                         │
//! │  catalog lines   role policy   store/customer state   tenders           │
//! │        │              │                 │                 │             │
//! │  ┌─────▼──────────────▼─────────────────▼─────────────────▼─────────┐   │
//! │  │               ★ optika-core (THIS CRATE) ★                       │   │
//! │  │                                                                  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │   │
//! │  │   │ discount  │  │    tax    │  │  totals   │  │  ledger   │    │   │
//! │  │   │ authorize │  │ CGST/SGST │  │ aggregate │  │ tenders   │    │   │
//! │  │   │ cap check │  │   IGST    │  │  round    │  │ complete  │    │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │   │
//! │  │                         ▲                                        │   │
//! │  │                 order (finalizer) ◄── registry (concurrent)      │   │
//! │  └─────────────────────────────┬────────────────────────────────────┘   │
//! │                                │ Receipt                                │
//! │                                ▼                                        │
//! │                  persistence / receipt rendering (host)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in integer paise, rate application, rounding
//! - [`types`] - Domain types (lines, policies, payments, statuses)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`config`] - Store-level billing configuration
//! - [`discount`] - Discount computation and the role ceiling
//! - [`tax`] - GST component split
//! - [`totals`] - Order totals, invoice lines and HSN summary
//! - [`ledger`] - Payment ledger
//! - [`order`] - The order finalizer
//! - [`registry`] - Open orders shared between tasks
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: All amounts are paise (i64), rates are basis points
//! 2. **One Rounding Rule**: half away from zero, everywhere
//! 3. **Recompute, Don't Patch**: totals are derived from lines on every call
//! 4. **Explicit Errors**: blocking conditions are typed errors, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use optika_core::{BillingConfig, CartLineInput, DiscountPolicy, Money, Order, PaymentMode, Rate};
//! use optika_core::discount::DiscountInput;
//!
//! let config = BillingConfig {
//!     store_state: Some("Maharashtra".to_string()),
//!     ..BillingConfig::default()
//! };
//! let ctx = config.tax_context_for(Some("Maharashtra"));
//! let mut order = Order::new(&config, ctx, DiscountPolicy::new("cashier", Rate::from_percent(15)));
//!
//! let line = order.add_line(CartLineInput {
//!     product_id: "prod-frame-01".to_string(),
//!     sku: "FRM-RB-3025".to_string(),
//!     unit_price: Money::from_rupees(1000),
//!     quantity: 2,
//!     hsn_code: "9004".to_string(),
//!     gst_rate: Rate::from_percent(18),
//! }).unwrap();
//! order.apply_item_discount(&line, DiscountInput::percent(Rate::from_percent(10))).unwrap();
//! order.apply_order_discount(DiscountInput::amount(Money::from_rupees(90))).unwrap();
//!
//! let totals = order.totals().unwrap();
//! assert_eq!(totals.taxable_amount, Money::from_rupees(1710));
//! assert_eq!(totals.total_cgst, Money::from_paise(15_390));
//! assert_eq!(totals.grand_total, Money::from_rupees(2018));
//!
//! order.add_payment(PaymentMode::Cash, Money::from_rupees(2018), None).unwrap();
//! let receipt = order.complete().unwrap();
//! assert!(receipt.change_due.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod discount;
pub mod error;
pub mod ledger;
pub mod money;
pub mod order;
pub mod registry;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use optika_core::Money` instead of
// `use optika_core::money::Money`

pub use config::BillingConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{LedgerSummary, PaymentLedger};
pub use money::Money;
pub use order::{Order, Receipt};
pub use registry::OrderRegistry;
pub use totals::{HsnSummary, OrderTotals, PricedLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order
///
/// ## Business Reason
/// Prevents runaway orders. Overridable through [`BillingConfig`].
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Catches typing 1000 instead of 10. Overridable through [`BillingConfig`].
pub const MAX_ITEM_QUANTITY: i64 = 999;
