//! End-to-end checkout flows through the public API.

use optika_core::discount::{DiscountInput, DiscountKind};
use optika_core::{
    BillingConfig, CartLineInput, CoreError, DiscountPolicy, Money, Order, OrderStatus, PaymentMode,
    PaymentStatus, Rate, TaxContext,
};

fn store() -> BillingConfig {
    BillingConfig {
        store_state: Some("Maharashtra".to_string()),
        ..BillingConfig::default()
    }
}

fn cashier() -> DiscountPolicy {
    DiscountPolicy::new("cashier", Rate::from_percent(15))
}

fn walk_in_order() -> Order {
    let config = store();
    let ctx = config.tax_context_for(Some("Maharashtra"));
    Order::new(&config, ctx, cashier())
}

fn frames(quantity: i64) -> CartLineInput {
    CartLineInput {
        product_id: "prod-frame-01".to_string(),
        sku: "FRM-RB-3025".to_string(),
        unit_price: Money::from_rupees(1000),
        quantity,
        hsn_code: "9004".to_string(),
        gst_rate: Rate::from_percent(18),
    }
}

/// Scenario 3: ₹2000 of frames, 10% item discount, 5% order discount.
fn discounted_order() -> Order {
    let mut order = walk_in_order();
    let line = order.add_line(frames(2)).unwrap();
    order
        .apply_item_discount(&line, DiscountInput::percent(Rate::from_percent(10)))
        .unwrap();
    order
        .apply_order_discount(DiscountInput::percent(Rate::from_percent(5)))
        .unwrap();
    order
}

#[test]
fn test_plain_intra_state_order() {
    let mut order = walk_in_order();
    order.add_line(frames(2)).unwrap();

    let totals = order.totals().unwrap();
    assert_eq!(totals.subtotal, Money::from_rupees(2000));
    assert_eq!(totals.taxable_amount, Money::from_rupees(2000));
    assert_eq!(totals.total_cgst, Money::from_rupees(180));
    assert_eq!(totals.total_sgst, Money::from_rupees(180));
    assert_eq!(totals.total_igst, Money::zero());
    assert_eq!(totals.total_tax, Money::from_rupees(360));
    assert_eq!(totals.grand_total, Money::from_rupees(2360));
    assert_eq!(totals.roundoff_amount, Money::zero());
}

#[test]
fn test_item_discount_reduces_taxable_value() {
    let mut order = walk_in_order();
    let line = order.add_line(frames(2)).unwrap();
    let outcome = order
        .apply_item_discount(&line, DiscountInput::percent(Rate::from_percent(10)))
        .unwrap();
    assert_eq!(outcome.discount_amount, Money::from_rupees(200));

    let totals = order.totals().unwrap();
    assert_eq!(totals.subtotal_after_item_discount, Money::from_rupees(1800));
    assert_eq!(totals.taxable_amount, Money::from_rupees(1800));
    assert_eq!(totals.total_cgst, Money::from_rupees(162));
    assert_eq!(totals.total_sgst, Money::from_rupees(162));
    assert_eq!(totals.grand_total, Money::from_rupees(2124));
}

#[test]
fn test_order_discount_and_round_off() {
    let order = discounted_order();
    let totals = order.totals().unwrap();

    assert_eq!(totals.order_discount_amount, Money::from_rupees(90));
    assert_eq!(totals.taxable_amount, Money::from_rupees(1710));
    assert_eq!(totals.total_tax, Money::from_paise(30_780));
    assert_eq!(totals.pre_round_total, Money::from_paise(201_780));
    assert_eq!(totals.grand_total, Money::from_rupees(2018));
    assert_eq!(totals.roundoff_amount, Money::from_paise(20));
}

#[test]
fn test_discount_over_role_cap_is_not_applied() {
    let mut order = walk_in_order();
    let line = order.add_line(frames(2)).unwrap();
    let request = DiscountInput::percent(Rate::from_percent(20));

    assert!(order.preview_item_discount(&line, request).unwrap().exceeds_cap);
    let err = order.apply_item_discount(&line, request).unwrap_err();
    assert_eq!(err.code(), "DISCOUNT_CAP_EXCEEDED");
    assert_eq!(order.line(&line).unwrap().discount_amount, Money::zero());
    assert_eq!(order.totals().unwrap().grand_total, Money::from_rupees(2360));
}

#[test]
fn test_exact_cash_completes() {
    let mut order = discounted_order();
    order
        .add_payment(PaymentMode::Cash, Money::from_rupees(2018), None)
        .unwrap();

    let summary = order.payment_summary().unwrap();
    assert_eq!(summary.balance_due, Money::zero());
    assert!(order.can_complete().unwrap());

    let receipt = order.complete().unwrap();
    assert_eq!(receipt.status, PaymentStatus::Paid);
    assert_eq!(receipt.change_due, Money::zero());
    assert_eq!(order.status(), OrderStatus::Completed);
}

#[test]
fn test_cash_overpayment_gives_change() {
    let mut order = discounted_order();
    order
        .add_payment(PaymentMode::Cash, Money::from_rupees(2500), None)
        .unwrap();

    let summary = order.payment_summary().unwrap();
    assert_eq!(summary.change_due, Money::from_rupees(482));
    assert_eq!(summary.status, PaymentStatus::Paid);

    let receipt = order.complete().unwrap();
    assert_eq!(receipt.amount_paid, Money::from_rupees(2500));
    assert_eq!(receipt.change_due, Money::from_rupees(482));
}

#[test]
fn test_split_tender() {
    let mut order = discounted_order();
    order
        .add_payment(PaymentMode::Card, Money::from_rupees(1000), Some("AUTH-1192".to_string()))
        .unwrap();
    assert_eq!(order.payment_summary().unwrap().status, PaymentStatus::Partial);

    assert!(matches!(
        order.add_payment(PaymentMode::Upi, Money::from_rupees(1018), None),
        Err(CoreError::MissingPaymentReference { .. })
    ));
    assert!(matches!(
        order.add_payment(PaymentMode::Upi, Money::from_rupees(1100), Some("UPI-77".to_string())),
        Err(CoreError::OverpaymentRejected { .. })
    ));
    order
        .add_payment(PaymentMode::Upi, Money::from_rupees(1018), Some("UPI-77".to_string()))
        .unwrap();

    let receipt = order.complete().unwrap();
    assert_eq!(receipt.payments.len(), 2);
    assert_eq!(receipt.amount_paid, receipt.totals.grand_total);
}

#[test]
fn test_removing_a_payment_reopens_balance() {
    let mut order = discounted_order();
    let payment = order
        .add_payment(PaymentMode::Cash, Money::from_rupees(2018), None)
        .unwrap();
    order.remove_payment(&payment.id).unwrap();

    assert_eq!(order.payment_summary().unwrap().status, PaymentStatus::Pending);
    assert!(matches!(order.complete(), Err(CoreError::InsufficientPayment { .. })));
    assert!(matches!(
        order.remove_payment(&payment.id),
        Err(CoreError::PaymentNotFound(_))
    ));
}

#[test]
fn test_inter_state_customer() {
    let config = store();
    let ctx = config.tax_context_for(Some("Karnataka"));
    let mut order = Order::new(&config, ctx, cashier());
    order.add_line(frames(2)).unwrap();

    let totals = order.totals().unwrap();
    assert!(totals.is_inter_state);
    assert_eq!(totals.place_of_supply, "Karnataka");
    assert_eq!(totals.total_igst, Money::from_rupees(360));
    assert_eq!(totals.total_cgst + totals.total_sgst, Money::zero());
}

#[test]
fn test_unknown_customer_state_blocks_totals() {
    let config = store();
    let mut order = Order::new(&config, config.tax_context_for(None), cashier());
    order.add_line(frames(1)).unwrap();

    assert!(matches!(
        order.totals(),
        Err(CoreError::AmbiguousJurisdiction { .. })
    ));
    order
        .set_tax_context(TaxContext::new("Maharashtra", "Maharashtra"))
        .unwrap();
    assert_eq!(order.totals().unwrap().grand_total, Money::from_rupees(1180));
}

#[test]
fn test_manager_override() {
    let mut order = walk_in_order();
    let line = order.add_line(frames(2)).unwrap();
    let manager = DiscountPolicy::new("manager", Rate::from_percent(30));

    let request = DiscountInput::parse(DiscountKind::Percent, "25").unwrap();
    assert!(order.apply_item_discount(&line, request).is_err());
    order
        .apply_item_discount_with_approval(&line, request, &manager)
        .unwrap();

    let totals = order.totals().unwrap();
    assert_eq!(totals.item_discount_total, Money::from_rupees(500));
    assert_eq!(totals.grand_total, Money::from_rupees(1770));
}

#[test]
fn test_mixed_slabs_and_hsn_summary() {
    let mut order = walk_in_order();
    order.add_line(frames(1)).unwrap();
    order
        .add_line(CartLineInput {
            product_id: "prod-lens-07".to_string(),
            sku: "LNS-PROG-167".to_string(),
            unit_price: Money::from_rupees(2500),
            quantity: 2,
            hsn_code: "90015000".to_string(),
            gst_rate: Rate::from_percent(12),
        })
        .unwrap();
    order
        .add_line(CartLineInput {
            product_id: "prod-case-03".to_string(),
            sku: "CASE-HARD".to_string(),
            unit_price: Money::from_rupees(200),
            quantity: 1,
            hsn_code: "9004".to_string(),
            gst_rate: Rate::from_percent(18),
        })
        .unwrap();

    let totals = order.totals().unwrap();
    // 1200 × 18% + 5000 × 12%
    assert_eq!(totals.total_tax, Money::from_rupees(216 + 600));
    assert_eq!(totals.hsn_summary.len(), 2);

    let frames_group = totals
        .hsn_summary
        .iter()
        .find(|h| h.hsn_code == "9004")
        .unwrap();
    assert_eq!(frames_group.quantity, 2);
    assert_eq!(frames_group.taxable_value, Money::from_rupees(1200));

    let line_sum: Money = totals.lines.iter().map(|l| l.line_total).sum();
    assert_eq!(line_sum, totals.pre_round_total);
}

#[test]
fn test_completed_order_is_immutable() {
    let mut order = discounted_order();
    order
        .add_payment(PaymentMode::Cash, Money::from_rupees(2018), None)
        .unwrap();
    let receipt = order.complete().unwrap();

    let line = order.lines()[0].line_id.clone();
    for err in [
        order.add_line(frames(1)).unwrap_err(),
        order.remove_line(&line).unwrap_err(),
        order.clear_order_discount().unwrap_err(),
        order
            .add_payment(PaymentMode::Cash, Money::from_rupees(1), None)
            .unwrap_err(),
    ] {
        assert_eq!(err.code(), "INVALID_ORDER_STATUS");
    }
    assert_eq!(order.totals().unwrap(), receipt.totals);
}

#[test]
fn test_zero_total_order_completes_without_payment() {
    let mut order = walk_in_order();
    order
        .add_line(CartLineInput {
            product_id: "prod-cloth-09".to_string(),
            sku: "MICROFIBRE".to_string(),
            unit_price: Money::zero(),
            quantity: 1,
            hsn_code: "6307".to_string(),
            gst_rate: Rate::from_percent(12),
        })
        .unwrap();

    assert!(order.can_complete().unwrap());
    assert!(matches!(
        order.add_payment(PaymentMode::Cash, Money::from_rupees(10), None),
        Err(CoreError::OverpaymentRejected { .. })
    ));
    let receipt = order.complete().unwrap();
    assert_eq!(receipt.status, PaymentStatus::Paid);
    assert!(receipt.payments.is_empty());
}
