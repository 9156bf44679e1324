//! # Domain Types
//!
//! Core domain types shared by the billing components.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CartLineInput  │   │    OrderLine    │   │    Payment      │       │
//! │  │  ─────────────  │──►│  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  line_id (UUID) │   │  id (UUID)      │       │
//! │  │  sku, hsn_code  │   │  quantity       │   │  mode           │       │
//! │  │  unit_price     │   │  discount_*     │   │  amount         │       │
//! │  │  gst_rate       │   │  discount basis │   │  reference      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │ DiscountPolicy  │   │   TaxContext    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  role           │   │  origin_state   │       │
//! │  │  1800 = 18%     │   │  max_discount   │   │  dest_state     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountInput;
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% GST, 1250 bps = a 12.5% discount
///
/// Used for GST rates, discount percentages and discount ceilings alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100%.
    pub const FULL: Rate = Rate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Cart Line Input
// =============================================================================

/// A line as supplied by the catalog collaborator.
///
/// The engine never decides the HSN code or GST rate; both arrive here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineInput {
    pub product_id: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub hsn_code: String,
    pub gst_rate: Rate,
}

// =============================================================================
// Order Line
// =============================================================================

/// How a line's discount was authorized.
///
/// The requested input is kept (not just the resulting amount) so that a
/// quantity change can re-derive the amount and re-check it against the
/// same ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountGrant {
    pub input: DiscountInput,
    /// Ceiling the discount was checked against.
    pub authorized_cap: Rate,
    /// Role of the approver when an elevated override was used.
    pub approved_by: Option<String>,
}

/// A line in an open order.
///
/// ## Invariant
/// `0 ≤ discount_amount ≤ unit_price × quantity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub line_id: String,
    pub product_id: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub hsn_code: String,
    pub gst_rate: Rate,
    pub discount_percent: Rate,
    pub discount_amount: Money,
    pub discount: Option<DiscountGrant>,
}

impl OrderLine {
    /// Creates an undiscounted line from catalog input.
    pub fn from_input(input: CartLineInput) -> Self {
        OrderLine {
            line_id: uuid::Uuid::new_v4().to_string(),
            product_id: input.product_id,
            sku: input.sku,
            unit_price: input.unit_price,
            quantity: input.quantity,
            hsn_code: input.hsn_code,
            gst_rate: input.gst_rate,
            discount_percent: Rate::zero(),
            discount_amount: Money::zero(),
            discount: None,
        }
    }

    /// `unit_price × quantity`, before any discount.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Line total after the item-level discount.
    #[inline]
    pub fn net_of_item_discount(&self) -> Money {
        self.line_total() - self.discount_amount
    }
}

// =============================================================================
// Discount Policy
// =============================================================================

/// Discount ceiling for a role, supplied by the identity collaborator.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountPolicy {
    pub role: String,
    pub max_discount: Rate,
}

impl DiscountPolicy {
    pub fn new(role: impl Into<String>, max_discount: Rate) -> Self {
        DiscountPolicy {
            role: role.into(),
            max_discount,
        }
    }
}

// =============================================================================
// Tax Context
// =============================================================================

/// Jurisdiction data for an order: where the store is and where the goods
/// are supplied to.
///
/// Either side may be unknown; see [`TaxContext::is_inter_state`] for how
/// that is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxContext {
    pub origin_state: Option<String>,
    pub destination_state: Option<String>,
}

impl TaxContext {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        TaxContext {
            origin_state: Some(origin.into()),
            destination_state: Some(destination.into()),
        }
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// A tender type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Physical cash. The only tender that may exceed the balance.
    Cash,
    Upi,
    Card,
    BankTransfer,
    Cheque,
    Wallet,
}

impl PaymentMode {
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMode::Cash)
    }

    /// Tenders that can't be reconciled without a transaction reference.
    #[inline]
    pub const fn requires_reference(&self) -> bool {
        matches!(self, PaymentMode::Upi | PaymentMode::BankTransfer)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Upi => "UPI",
            PaymentMode::Card => "CARD",
            PaymentMode::BankTransfer => "BANK_TRANSFER",
            PaymentMode::Cheque => "CHEQUE",
            PaymentMode::Wallet => "WALLET",
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A single tender recorded against an order.
///
/// Immutable once recorded; it can only be removed while the order is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub mode: PaymentMode,
    pub amount: Money,
    /// UPI transaction id, card auth code, cheque number, etc.
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Statuses
// =============================================================================

/// Settlement status derived from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet.
    Pending,
    /// Some tender recorded, balance still due.
    Partial,
    /// Balance due is zero or negative.
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Lifecycle of an order. `Completed` is entered only by an explicit
/// `complete()` call, never automatically on full payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Completed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
