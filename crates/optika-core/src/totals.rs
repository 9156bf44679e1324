//! # Totals Aggregator
//!
//! Folds order lines and discounts into the order's totals. This is the
//! only place in the system where order arithmetic happens; the cart
//! panel, the billing screen and the invoice all read [`OrderTotals`].
//!
//! ## Fixed Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. subtotal                   = Σ unit_price × quantity                │
//! │  2. item_discount_total        = Σ line.discount_amount                 │
//! │  3. subtotal_after_item_disc.  = subtotal − item_discount_total         │
//! │  4. order_discount_amount      = authorizer(step 3, order discount)     │
//! │  5. taxable_amount             = step 3 − order_discount_amount         │
//! │        (order discount apportioned to lines, largest remainder)         │
//! │  6. CGST/SGST or IGST          = Σ per-line tax resolver                │
//! │  7. pre_round_total            = taxable_amount + total_tax             │
//! │  8. grand_total                = round_half_away(step 7) to ₹1          │
//! │     roundoff_amount            = grand_total − pre_round_total          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`compute_totals`] is a pure function: no hidden state, integer math
//! only, so calling it twice on the same input gives identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::discount::{compute_order_discount, DiscountOutcome};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::tax::{resolve, TaxSplit};
use crate::types::{DiscountGrant, OrderLine, Rate, TaxContext};

// =============================================================================
// Output Types
// =============================================================================

/// One line as it appears on the tax invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub line_id: String,
    pub product_id: String,
    pub sku: String,
    pub hsn_code: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// `unit_price × quantity`
    pub gross_amount: Money,
    pub discount_percent: Rate,
    pub discount_amount: Money,
    /// This line's portion of the order-level discount.
    pub order_discount_share: Money,
    pub taxable_value: Money,
    pub gst_rate: Rate,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    /// Taxable value plus tax.
    pub line_total: Money,
}

/// Tax totals for one `(HSN code, GST rate)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HsnSummary {
    pub hsn_code: String,
    pub gst_rate: Rate,
    pub quantity: i64,
    pub taxable_value: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_tax: Money,
}

/// The order aggregate.
///
/// ## Invariants
/// - `grand_total` is a whole number of rupees
/// - `grand_total − roundoff_amount == pre_round_total`
/// - `total_cgst + total_sgst` and `total_igst` are never both non-zero
/// - `Σ lines.taxable_value == taxable_amount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub item_discount_total: Money,
    pub subtotal_after_item_discount: Money,
    pub order_discount_percent: Rate,
    pub order_discount_amount: Money,
    pub taxable_amount: Money,
    pub total_cgst: Money,
    pub total_sgst: Money,
    pub total_igst: Money,
    pub total_tax: Money,
    pub pre_round_total: Money,
    pub grand_total: Money,
    /// Signed: `grand_total − pre_round_total`.
    pub roundoff_amount: Money,
    pub is_inter_state: bool,
    pub place_of_supply: String,
    pub lines: Vec<PricedLine>,
    pub hsn_summary: Vec<HsnSummary>,
}

// =============================================================================
// Computation
// =============================================================================

/// Evaluates the order-level discount against the subtotal left after item
/// discounts. Separate from [`compute_totals`] so a cap re-check doesn't
/// need jurisdiction data.
pub fn order_discount_outcome(lines: &[OrderLine], order_discount: Option<&DiscountGrant>) -> DiscountOutcome {
    match order_discount {
        Some(grant) => {
            let base: Money = lines.iter().map(OrderLine::net_of_item_discount).sum();
            compute_order_discount(base, grant.input, grant.authorized_cap)
        }
        None => DiscountOutcome::none(),
    }
}

/// Computes the totals for `lines` under `order_discount` and `tax_context`.
///
/// ## Errors
/// - `AmbiguousJurisdiction` when the tax context is incomplete
/// - `DiscountCapExceeded` when the stored order discount, evaluated on the
///   current subtotal, is over the ceiling it was authorized with
pub fn compute_totals(
    lines: &[OrderLine],
    order_discount: Option<&DiscountGrant>,
    tax_context: &TaxContext,
) -> CoreResult<OrderTotals> {
    let is_inter_state = tax_context.is_inter_state()?;
    let place_of_supply = tax_context.place_of_supply().unwrap_or_default().to_string();

    // Steps 1-3
    let subtotal: Money = lines.iter().map(OrderLine::line_total).sum();
    let item_discount_total: Money = lines.iter().map(|l| l.discount_amount).sum();
    let subtotal_after_item_discount = subtotal - item_discount_total;

    // Step 4
    let order_outcome = order_discount_outcome(lines, order_discount);
    if order_outcome.exceeds_cap {
        if let Some(grant) = order_discount {
            return Err(CoreError::DiscountCapExceeded {
                requested: order_outcome.discount_percent,
                cap: grant.authorized_cap,
            });
        }
    }
    let order_discount_amount = order_outcome.discount_amount;

    // Step 5
    let taxable_amount = subtotal_after_item_discount - order_discount_amount;
    let net_values: Vec<Money> = lines.iter().map(OrderLine::net_of_item_discount).collect();
    let shares = order_discount_amount.allocate(&net_values);

    // Step 6
    let mut tax = TaxSplit::default();
    let mut priced = Vec::with_capacity(lines.len());
    let mut hsn: BTreeMap<(String, Rate), HsnSummary> = BTreeMap::new();

    for ((line, net), share) in lines.iter().zip(net_values).zip(shares) {
        let taxable_value = net - share;
        let split = resolve(taxable_value, line.gst_rate, is_inter_state);
        tax += split;

        let entry = hsn
            .entry((line.hsn_code.clone(), line.gst_rate))
            .or_insert_with(|| HsnSummary {
                hsn_code: line.hsn_code.clone(),
                gst_rate: line.gst_rate,
                quantity: 0,
                taxable_value: Money::zero(),
                cgst: Money::zero(),
                sgst: Money::zero(),
                igst: Money::zero(),
                total_tax: Money::zero(),
            });
        entry.quantity += line.quantity;
        entry.taxable_value += taxable_value;
        entry.cgst += split.cgst;
        entry.sgst += split.sgst;
        entry.igst += split.igst;
        entry.total_tax += split.total();

        priced.push(PricedLine {
            line_id: line.line_id.clone(),
            product_id: line.product_id.clone(),
            sku: line.sku.clone(),
            hsn_code: line.hsn_code.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            gross_amount: line.line_total(),
            discount_percent: line.discount_percent,
            discount_amount: line.discount_amount,
            order_discount_share: share,
            taxable_value,
            gst_rate: line.gst_rate,
            cgst: split.cgst,
            sgst: split.sgst,
            igst: split.igst,
            line_total: taxable_value + split.total(),
        });
    }

    // Steps 7-8
    let total_tax = tax.total();
    let pre_round_total = taxable_amount + total_tax;
    let grand_total = pre_round_total.round_to_rupee();
    let roundoff_amount = grand_total - pre_round_total;

    debug!(
        lines = lines.len(),
        subtotal = %subtotal,
        taxable = %taxable_amount,
        tax = %total_tax,
        grand_total = %grand_total,
        roundoff = %roundoff_amount,
        inter_state = is_inter_state,
        "Totals computed"
    );

    Ok(OrderTotals {
        subtotal,
        item_discount_total,
        subtotal_after_item_discount,
        order_discount_percent: order_outcome.discount_percent,
        order_discount_amount,
        taxable_amount,
        total_cgst: tax.cgst,
        total_sgst: tax.sgst,
        total_igst: tax.igst,
        total_tax,
        pre_round_total,
        grand_total,
        roundoff_amount,
        is_inter_state,
        place_of_supply,
        lines: priced,
        hsn_summary: hsn.into_values().collect(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
