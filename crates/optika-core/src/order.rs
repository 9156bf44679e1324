//! # Order Finalizer
//!
//! The one entry point the rest of the application calls. It owns an
//! open order's lines, discounts and payment ledger, and sequences the
//! other components.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  catalog line ──► add_line / update_quantity / remove_line             │
//! │                                                                         │
//! │  discount request ──► DiscountAuthorizer ──► committed only if allowed  │
//! │                                                                         │
//! │  totals() ──► Totals Aggregator ──► Tax Resolver (per line)             │
//! │                     │                                                   │
//! │                     ▼ grand_total                                       │
//! │  add_payment / remove_payment ──► PaymentLedger                         │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  complete() ──► Receipt (immutable)        abandon() ──► dropped        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Every mutation is built on a copy of the affected state and swapped in
//! only after every check passes. A returned `Err` means nothing changed.
//!
//! ## Recomputation
//! Lines store only what the cashier chose (product, quantity, discount
//! request). Totals are recomputed from scratch by [`Order::totals`] on
//! every call, never patched incrementally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::discount::{
    clear_discount, compute_discount, compute_item_discount, DiscountAuthorizer, DiscountInput,
    DiscountOutcome,
};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{LedgerSummary, PaymentLedger};
use crate::money::Money;
use crate::totals::{compute_totals, order_discount_outcome, OrderTotals};
use crate::types::{
    CartLineInput, DiscountGrant, DiscountPolicy, OrderLine, OrderStatus, Payment, PaymentMode,
    PaymentStatus, TaxContext,
};
use crate::validation::{validate_cart_line, validate_order_subtotal};

// =============================================================================
// Receipt
// =============================================================================

/// Terminal snapshot handed to the receipt/completion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub order_id: String,
    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
    pub totals: OrderTotals,
    pub payments: Vec<Payment>,
    pub amount_paid: Money,
    pub change_due: Money,
    pub status: PaymentStatus,
}

// =============================================================================
// Order
// =============================================================================

/// An order being billed by one cashier session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: String,
    status: OrderStatus,
    tax_context: TaxContext,
    policy: DiscountPolicy,
    max_order_lines: usize,
    max_item_quantity: i64,
    lines: Vec<OrderLine>,
    order_discount: Option<DiscountGrant>,
    ledger: PaymentLedger,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Opens an empty order.
    ///
    /// `policy` is the acting cashier's discount ceiling for the session.
    pub fn new(config: &BillingConfig, tax_context: TaxContext, policy: DiscountPolicy) -> Self {
        let id = Uuid::new_v4().to_string();
        debug!(order_id = %id, role = %policy.role, "Order opened");

        Order {
            ledger: PaymentLedger::new(id.clone(), Money::zero()),
            id,
            status: OrderStatus::Open,
            tax_context,
            policy,
            max_order_lines: config.max_order_lines,
            max_item_quantity: config.max_item_quantity,
            lines: Vec::new(),
            order_discount: None,
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn tax_context(&self) -> &TaxContext {
        &self.tax_context
    }

    pub fn policy(&self) -> &DiscountPolicy {
        &self.policy
    }

    pub fn order_discount(&self) -> Option<&DiscountGrant> {
        self.order_discount.as_ref()
    }

    pub fn payments(&self) -> &[Payment] {
        self.ledger.payments()
    }

    // -------------------------------------------------------------------------
    // Totals (the single computation path)
    // -------------------------------------------------------------------------

    /// Computes the order's totals from its current lines and discounts.
    pub fn totals(&self) -> CoreResult<OrderTotals> {
        compute_totals(&self.lines, self.order_discount.as_ref(), &self.tax_context)
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Replaces the jurisdiction data (e.g. once the customer is chosen).
    pub fn set_tax_context(&mut self, tax_context: TaxContext) -> CoreResult<()> {
        self.ensure_open()?;
        self.ensure_reprice_allowed(&self.lines, self.order_discount.as_ref(), &tax_context)?;
        self.tax_context = tax_context;
        Ok(())
    }

    /// Adds a catalog line and returns its line id.
    ///
    /// Adding a product already on the order (same product, SKU, price, HSN
    /// and rate) increases that line's quantity instead.
    pub fn add_line(&mut self, input: CartLineInput) -> CoreResult<String> {
        self.ensure_open()?;
        validate_cart_line(&input, self.max_item_quantity)?;

        let existing = self.lines.iter().find(|l| {
            l.product_id == input.product_id
                && l.sku == input.sku
                && l.unit_price == input.unit_price
                && l.hsn_code == input.hsn_code
                && l.gst_rate == input.gst_rate
        });
        if let Some(line) = existing {
            let line_id = line.line_id.clone();
            let quantity = line.quantity.saturating_add(input.quantity);
            self.update_quantity(&line_id, quantity)?;
            return Ok(line_id);
        }

        if self.lines.len() >= self.max_order_lines {
            return Err(CoreError::CartTooLarge {
                max: self.max_order_lines,
            });
        }

        let line = OrderLine::from_input(input);
        let line_id = line.line_id.clone();
        let mut candidate = self.lines.clone();
        candidate.push(line);
        ensure_order_discount_within_cap(&candidate, self.order_discount.as_ref())?;
        self.ensure_reprice_allowed(&candidate, self.order_discount.as_ref(), &self.tax_context)?;
        self.lines = candidate;

        info!(order_id = %self.id, line_id = %line_id, lines = self.lines.len(), "Line added");
        Ok(line_id)
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// An existing discount is re-derived for the new quantity and
    /// re-checked against the ceiling that authorized it.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        self.ensure_open()?;
        if quantity == 0 {
            return self.remove_line(line_id).map(|_| ());
        }
        if quantity > self.max_item_quantity {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: self.max_item_quantity,
            });
        }

        let index = self.line_index(line_id)?;
        let mut candidate = self.lines.clone();
        let line = &mut candidate[index];
        validate_cart_line(
            &CartLineInput {
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                unit_price: line.unit_price,
                quantity,
                hsn_code: line.hsn_code.clone(),
                gst_rate: line.gst_rate,
            },
            self.max_item_quantity,
        )?;
        line.quantity = quantity;
        reapply_line_discount(line)?;
        ensure_order_discount_within_cap(&candidate, self.order_discount.as_ref())?;
        self.ensure_reprice_allowed(&candidate, self.order_discount.as_ref(), &self.tax_context)?;
        self.lines = candidate;

        info!(order_id = %self.id, line_id = %line_id, quantity, "Line quantity updated");
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<OrderLine> {
        self.ensure_open()?;
        let index = self.line_index(line_id)?;

        let mut candidate = self.lines.clone();
        let removed = candidate.remove(index);
        ensure_order_discount_within_cap(&candidate, self.order_discount.as_ref())?;
        self.ensure_reprice_allowed(&candidate, self.order_discount.as_ref(), &self.tax_context)?;
        self.lines = candidate;

        info!(order_id = %self.id, line_id = %line_id, lines = self.lines.len(), "Line removed");
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Discounts
    // -------------------------------------------------------------------------

    /// Evaluates an item discount for display without applying it.
    pub fn preview_item_discount(&self, line_id: &str, input: DiscountInput) -> CoreResult<DiscountOutcome> {
        let index = self.line_index(line_id)?;
        Ok(compute_item_discount(
            &self.lines[index],
            input,
            self.policy.max_discount,
        ))
    }

    /// Applies an item discount within the session role's ceiling.
    pub fn apply_item_discount(&mut self, line_id: &str, input: DiscountInput) -> CoreResult<DiscountOutcome> {
        self.commit_item_discount(line_id, input, None)
    }

    /// Applies an item discount under an elevated role's ceiling.
    pub fn apply_item_discount_with_approval(
        &mut self,
        line_id: &str,
        input: DiscountInput,
        approver: &DiscountPolicy,
    ) -> CoreResult<DiscountOutcome> {
        self.commit_item_discount(line_id, input, Some(approver))
    }

    pub fn clear_item_discount(&mut self, line_id: &str) -> CoreResult<()> {
        self.ensure_open()?;
        let index = self.line_index(line_id)?;

        let mut candidate = self.lines.clone();
        clear_discount(&mut candidate[index]);
        ensure_order_discount_within_cap(&candidate, self.order_discount.as_ref())?;
        self.ensure_reprice_allowed(&candidate, self.order_discount.as_ref(), &self.tax_context)?;
        self.lines = candidate;

        info!(order_id = %self.id, line_id = %line_id, "Item discount cleared");
        Ok(())
    }

    /// Evaluates the order discount for display without applying it.
    pub fn preview_order_discount(&self, input: DiscountInput) -> DiscountOutcome {
        compute_discount(self.subtotal_after_item_discount(), input, self.policy.max_discount)
    }

    /// Applies the order-level discount within the session role's ceiling.
    pub fn apply_order_discount(&mut self, input: DiscountInput) -> CoreResult<DiscountOutcome> {
        self.commit_order_discount(input, None)
    }

    /// Applies the order-level discount under an elevated role's ceiling.
    pub fn apply_order_discount_with_approval(
        &mut self,
        input: DiscountInput,
        approver: &DiscountPolicy,
    ) -> CoreResult<DiscountOutcome> {
        self.commit_order_discount(input, Some(approver))
    }

    pub fn clear_order_discount(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        self.ensure_reprice_allowed(&self.lines, None, &self.tax_context)?;
        self.order_discount = None;
        info!(order_id = %self.id, "Order discount cleared");
        Ok(())
    }

    fn commit_item_discount(
        &mut self,
        line_id: &str,
        input: DiscountInput,
        approver: Option<&DiscountPolicy>,
    ) -> CoreResult<DiscountOutcome> {
        self.ensure_open()?;
        let index = self.line_index(line_id)?;

        let mut candidate = self.lines.clone();
        let line = &mut candidate[index];
        let (outcome, grant) = authorize(&self.policy, line.line_total(), input, approver)?;
        line.discount_percent = outcome.discount_percent;
        line.discount_amount = outcome.discount_amount;
        line.discount = Some(grant);
        ensure_order_discount_within_cap(&candidate, self.order_discount.as_ref())?;
        self.ensure_reprice_allowed(&candidate, self.order_discount.as_ref(), &self.tax_context)?;
        self.lines = candidate;

        info!(
            order_id = %self.id,
            line_id = %line_id,
            percent = %outcome.discount_percent,
            amount = %outcome.discount_amount,
            approved_by = approver.map(|a| a.role.as_str()).unwrap_or("-"),
            "Item discount applied"
        );
        Ok(outcome)
    }

    fn commit_order_discount(
        &mut self,
        input: DiscountInput,
        approver: Option<&DiscountPolicy>,
    ) -> CoreResult<DiscountOutcome> {
        self.ensure_open()?;

        let base = self.subtotal_after_item_discount();
        let (outcome, grant) = authorize(&self.policy, base, input, approver)?;
        self.ensure_reprice_allowed(&self.lines, Some(&grant), &self.tax_context)?;
        self.order_discount = Some(grant);

        info!(
            order_id = %self.id,
            percent = %outcome.discount_percent,
            amount = %outcome.discount_amount,
            approved_by = approver.map(|a| a.role.as_str()).unwrap_or("-"),
            "Order discount applied"
        );
        Ok(outcome)
    }

    fn subtotal_after_item_discount(&self) -> Money {
        self.lines.iter().map(OrderLine::net_of_item_discount).sum()
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Ledger brought up to date with the current grand total.
    fn synced_ledger(&self) -> CoreResult<PaymentLedger> {
        let totals = self.totals()?;
        let mut ledger = self.ledger.clone();
        ledger.retarget(totals.grand_total)?;
        Ok(ledger)
    }

    /// Amount paid, balance, change and status against the current total.
    pub fn payment_summary(&self) -> CoreResult<LedgerSummary> {
        if self.status == OrderStatus::Completed {
            return Ok(self.ledger.summary());
        }
        Ok(self.synced_ledger()?.summary())
    }

    /// Records a tender against the current grand total.
    pub fn add_payment(
        &mut self,
        mode: PaymentMode,
        amount: Money,
        reference: Option<String>,
    ) -> CoreResult<Payment> {
        self.ensure_open()?;
        let mut ledger = self.synced_ledger()?;
        let payment = ledger.add_payment(mode, amount, reference)?.clone();
        self.ledger = ledger;
        Ok(payment)
    }

    pub fn remove_payment(&mut self, payment_id: &str) -> CoreResult<Payment> {
        self.ensure_open()?;
        self.ledger.remove_payment(payment_id)
    }

    /// True iff nothing is left to pay on the current total.
    pub fn can_complete(&self) -> CoreResult<bool> {
        if self.status == OrderStatus::Completed {
            return Ok(false);
        }
        Ok(self.synced_ledger()?.can_complete())
    }

    /// Completes the order: freezes the ledger and returns the receipt.
    ///
    /// ## Errors
    /// - `InsufficientPayment` while a balance is due
    /// - `InvalidOrderStatus` if already completed
    /// - `AmbiguousJurisdiction` if totals can't be computed
    pub fn complete(&mut self) -> CoreResult<Receipt> {
        self.ensure_open()?;

        let totals = self.totals()?;
        let mut ledger = self.ledger.clone();
        ledger.retarget(totals.grand_total)?;
        let snapshot = ledger.complete()?;

        self.ledger = ledger;
        self.status = OrderStatus::Completed;

        let receipt = Receipt {
            order_id: self.id.clone(),
            completed_at: Utc::now(),
            totals,
            payments: snapshot.payments,
            amount_paid: snapshot.summary.amount_paid,
            change_due: snapshot.summary.change_due,
            status: snapshot.summary.status,
        };

        info!(
            order_id = %self.id,
            grand_total = %receipt.totals.grand_total,
            amount_paid = %receipt.amount_paid,
            change_due = %receipt.change_due,
            payments = receipt.payments.len(),
            "Order completed"
        );
        Ok(receipt)
    }

    /// Discards an open order. Nothing outside this value was committed, so
    /// dropping it is the whole operation.
    pub fn abandon(self) {
        info!(
            order_id = %self.id,
            lines = self.lines.len(),
            payments = self.ledger.payments().len(),
            "Order abandoned"
        );
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn ensure_open(&self) -> CoreResult<()> {
        if self.status == OrderStatus::Completed {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.id.clone(),
                current_status: "completed".to_string(),
            });
        }
        Ok(())
    }

    /// Checks a candidate state before it replaces the current one.
    ///
    /// The subtotal must stay in range. Once card/UPI/other non-cash money
    /// has been taken, the candidate's grand total may not drop below it:
    /// that excess can't be handed back as cash change, so the tender has
    /// to be removed first.
    fn ensure_reprice_allowed(
        &self,
        lines: &[OrderLine],
        order_discount: Option<&DiscountGrant>,
        tax_context: &TaxContext,
    ) -> CoreResult<()> {
        validate_order_subtotal(lines.iter().map(OrderLine::line_total))?;

        if self.ledger.non_cash_paid().is_zero() {
            return Ok(());
        }
        let totals = compute_totals(lines, order_discount, tax_context)?;
        self.ledger.clone().retarget(totals.grand_total)
    }

    fn line_index(&self, line_id: &str) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }
}

/// Runs the authorizer with either the session policy or an approver's.
fn authorize(
    policy: &DiscountPolicy,
    base: Money,
    input: DiscountInput,
    approver: Option<&DiscountPolicy>,
) -> CoreResult<(DiscountOutcome, DiscountGrant)> {
    let authorizer = DiscountAuthorizer::new(policy);
    match approver {
        Some(approver) => {
            let outcome = authorizer.authorize_with_approval(base, input, approver)?;
            let grant = DiscountGrant {
                input,
                authorized_cap: approver.max_discount,
                approved_by: Some(approver.role.clone()),
            };
            Ok((outcome, grant))
        }
        None => {
            let outcome = authorizer.authorize(base, input)?;
            let grant = DiscountGrant {
                input,
                authorized_cap: authorizer.cap(),
                approved_by: None,
            };
            Ok((outcome, grant))
        }
    }
}

/// Re-derives a line's discount after its quantity changed.
fn reapply_line_discount(line: &mut OrderLine) -> CoreResult<()> {
    if let Some(grant) = line.discount.clone() {
        let outcome = compute_item_discount(line, grant.input, grant.authorized_cap);
        if outcome.exceeds_cap {
            return Err(CoreError::DiscountCapExceeded {
                requested: outcome.discount_percent,
                cap: grant.authorized_cap,
            });
        }
        line.discount_percent = outcome.discount_percent;
        line.discount_amount = outcome.discount_amount;
    }
    Ok(())
}

/// An amount-type order discount grows as a share of a shrinking subtotal;
/// refuse changes that would push it over the ceiling it was granted under.
fn ensure_order_discount_within_cap(lines: &[OrderLine], grant: Option<&DiscountGrant>) -> CoreResult<()> {
    let outcome = order_discount_outcome(lines, grant);
    match grant {
        Some(grant) if outcome.exceeds_cap => Err(CoreError::DiscountCapExceeded {
            requested: outcome.discount_percent,
            cap: grant.authorized_cap,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
