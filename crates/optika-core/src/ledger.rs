//! # Payment Ledger
//!
//! Records tenders against an order's grand total and decides when the
//! order may be completed.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            add_payment            add_payment                           │
//! │   PENDING ─────────────► PARTIAL ─────────────► PAID                    │
//! │      ▲                    │  ▲                   │                      │
//! │      └────────────────────┘  └───────────────────┘                      │
//! │         remove_payment           remove_payment                         │
//! │                                                                         │
//! │   PENDING ⇔ amount_paid = 0                                             │
//! │   PAID    ⇔ balance_due ≤ 0                                             │
//! │   PARTIAL   otherwise                                                   │
//! │                                                                         │
//! │   complete() is separate from PAID: it needs balance_due ≤ 0, freezes   │
//! │   the ledger and returns a snapshot. After that nothing changes.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tender Rules
//! - Amount must be positive
//! - UPI and bank transfer need a reference
//! - Non-cash tenders may not exceed the balance due
//! - Cash may exceed it; the excess is change due
//! - No tender is accepted once nothing is due
//! - The total may not be repriced below the non-cash amount taken
//!
//! A zero-total order is `Paid` from the start.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Payment, PaymentMode, PaymentStatus};
use crate::validation::validate_payment_amount;

/// Derived view of the ledger at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSummary {
    pub grand_total: Money,
    pub amount_paid: Money,
    /// Signed: negative when cash tendered exceeds the total.
    pub balance_due: Money,
    pub change_due: Money,
    pub status: PaymentStatus,
}

/// Frozen ledger returned by [`PaymentLedger::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSnapshot {
    pub payments: Vec<Payment>,
    pub summary: LedgerSummary,
}

/// Tenders recorded against one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLedger {
    order_id: String,
    grand_total: Money,
    payments: Vec<Payment>,
    frozen: bool,
}

impl PaymentLedger {
    pub fn new(order_id: impl Into<String>, grand_total: Money) -> Self {
        PaymentLedger {
            order_id: order_id.into(),
            grand_total,
            payments: Vec::new(),
            frozen: false,
        }
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    pub fn grand_total(&self) -> Money {
        self.grand_total
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Σ payment amounts.
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// `grand_total − amount_paid`. Negative when cash was over-tendered.
    pub fn balance_due(&self) -> Money {
        self.grand_total - self.amount_paid()
    }

    /// Balance due clamped at zero.
    pub fn outstanding(&self) -> Money {
        self.balance_due().non_negative()
    }

    /// Cash to hand back: the overpayment, bounded by the cash tendered.
    pub fn change_due(&self) -> Money {
        let overpaid = (self.amount_paid() - self.grand_total).non_negative();
        let cash: Money = self
            .payments
            .iter()
            .filter(|p| p.mode.is_cash())
            .map(|p| p.amount)
            .sum();
        overpaid.min(cash)
    }

    pub fn status(&self) -> PaymentStatus {
        if !self.balance_due().is_positive() {
            PaymentStatus::Paid
        } else if self.amount_paid().is_zero() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            grand_total: self.grand_total,
            amount_paid: self.amount_paid(),
            balance_due: self.balance_due(),
            change_due: self.change_due(),
            status: self.status(),
        }
    }

    /// True iff `balance_due ≤ 0`.
    pub fn can_complete(&self) -> bool {
        !self.balance_due().is_positive()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    fn ensure_open(&self) -> CoreResult<()> {
        if self.frozen {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.order_id.clone(),
                current_status: "completed".to_string(),
            });
        }
        Ok(())
    }

    /// Σ card, UPI, bank-transfer, cheque and wallet amounts.
    pub fn non_cash_paid(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| !p.mode.is_cash())
            .map(|p| p.amount)
            .sum()
    }

    /// Moves the ledger to a new grand total after the order was repriced.
    ///
    /// ## Errors
    /// - `InvalidOrderStatus` once the ledger is frozen
    /// - `TenderExceedsTotal` when the new total is below the non-cash
    ///   amount already taken; only cash can be handed back as change
    pub fn retarget(&mut self, grand_total: Money) -> CoreResult<()> {
        self.ensure_open()?;

        let non_cash_paid = self.non_cash_paid();
        if grand_total < non_cash_paid {
            warn!(
                order_id = %self.order_id,
                grand_total = %grand_total,
                non_cash_paid = %non_cash_paid,
                "Repricing rejected: below non-cash tender"
            );
            return Err(CoreError::TenderExceedsTotal {
                non_cash_paid,
                grand_total,
            });
        }

        self.grand_total = grand_total;
        Ok(())
    }

    /// Records a tender.
    ///
    /// ## Errors
    /// - `InvalidOrderStatus` once the ledger is frozen
    /// - `Validation` for a zero or negative amount
    /// - `MissingPaymentReference` for UPI / bank transfer without one
    /// - `OverpaymentRejected` for a non-cash amount above the balance, or
    ///   any amount when nothing is due
    pub fn add_payment(
        &mut self,
        mode: PaymentMode,
        amount: Money,
        reference: Option<String>,
    ) -> CoreResult<&Payment> {
        self.ensure_open()?;
        validate_payment_amount(amount)?;

        let reference = reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty() && !mode.is_cash());
        if mode.requires_reference() && reference.is_none() {
            return Err(CoreError::MissingPaymentReference { mode });
        }

        let balance_due = self.balance_due();
        if !balance_due.is_positive() || (!mode.is_cash() && amount > balance_due) {
            warn!(
                order_id = %self.order_id,
                mode = %mode,
                amount = %amount,
                balance_due = %balance_due,
                "Payment rejected: overpayment"
            );
            return Err(CoreError::OverpaymentRejected {
                mode,
                amount,
                balance_due: balance_due.non_negative(),
            });
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            mode,
            amount,
            reference,
            recorded_at: Utc::now(),
        };
        self.payments.push(payment);

        info!(
            order_id = %self.order_id,
            mode = %mode,
            amount = %amount,
            amount_paid = %self.amount_paid(),
            balance_due = %self.balance_due(),
            status = ?self.status(),
            "Payment recorded"
        );

        let index = self.payments.len() - 1;
        Ok(&self.payments[index])
    }

    /// Removes a tender by id.
    pub fn remove_payment(&mut self, payment_id: &str) -> CoreResult<Payment> {
        self.ensure_open()?;

        let index = self
            .payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;
        let removed = self.payments.remove(index);

        info!(
            order_id = %self.order_id,
            payment_id = %payment_id,
            amount = %removed.amount,
            balance_due = %self.balance_due(),
            status = ?self.status(),
            "Payment removed"
        );

        Ok(removed)
    }

    /// Freezes the ledger and returns its final state.
    ///
    /// ## Errors
    /// - `InsufficientPayment` while a balance is due
    /// - `InvalidOrderStatus` if already completed
    pub fn complete(&mut self) -> CoreResult<LedgerSnapshot> {
        self.ensure_open()?;

        if !self.can_complete() {
            return Err(CoreError::InsufficientPayment {
                balance_due: self.balance_due(),
            });
        }

        self.frozen = true;
        Ok(LedgerSnapshot {
            payments: self.payments.clone(),
            summary: self.summary(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
