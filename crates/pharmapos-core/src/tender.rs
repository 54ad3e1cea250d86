//! # Tender
//!
//! Split payments towards a sale total and the change owed back.
//!
//! ## Change Calculation
//! ```text
//! total = $100.00
//! payments: Card $30.00, Cash $80.00
//!
//! remaining      = max(0, 100 − 110)        = $0.00
//! owed in cash   = max(0, 100 − 30)         = $70.00
//! change_due     = max(0, 80 − 70)          = $10.00
//! ```
//!
//! Only cash can exceed what is owed. A card, GCash or Maya payment larger
//! than the remaining balance is refused.
//!
//! A single payment is capped at [`MAX_PAYMENT_CENTS`] and a sale takes at
//! most [`MAX_PAYMENTS`] of them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Payment, PaymentMethod};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Most split payments one sale accepts.
pub const MAX_PAYMENTS: usize = 20;

/// Largest single payment: the most a full cart can cost.
pub const MAX_PAYMENT_CENTS: i64 = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64;

/// Payments collected against a fixed sale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TenderLedger {
    pub total_cents: i64,
    pub payments: Vec<Payment>,
}

impl TenderLedger {
    pub fn new(total: Money) -> Self {
        TenderLedger {
            total_cents: total.cents(),
            payments: Vec::new(),
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Records a payment.
    ///
    /// `None` or zero pays exactly the remaining balance.
    /// Returns the payment recorded, or `None` when nothing was owed.
    ///
    /// ## Errors
    /// - `InvalidPaymentAmount` for a negative or oversized amount, or once
    ///   [`MAX_PAYMENTS`] are recorded
    /// - `Overpayment` when a non-cash amount exceeds the remaining balance
    pub fn add_payment(
        &mut self,
        method: PaymentMethod,
        amount: Option<Money>,
    ) -> CoreResult<Option<Payment>> {
        if self.payments.len() >= MAX_PAYMENTS {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("at most {MAX_PAYMENTS} payments per sale"),
            });
        }
        let remaining = self.amount_remaining();
        let amount = match amount {
            Some(a) if a.is_negative() => {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("{method} amount cannot be negative"),
                })
            }
            Some(a) if a.cents() > MAX_PAYMENT_CENTS => {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("{method} amount is too large"),
                })
            }
            Some(a) if a.is_positive() => a,
            _ => remaining,
        };

        if !method.is_cash() && amount > remaining {
            return Err(CoreError::Overpayment {
                method: method.to_string(),
            });
        }
        if !amount.is_positive() {
            return Ok(None);
        }

        let payment = Payment::new(method, amount);
        self.payments.push(payment);
        Ok(Some(payment))
    }

    pub fn remove_payment(&mut self, index: usize) -> Option<Payment> {
        if index < self.payments.len() {
            Some(self.payments.remove(index))
        } else {
            None
        }
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount()).sum()
    }

    pub fn cash_paid(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method.is_cash())
            .map(|p| p.amount())
            .sum()
    }

    pub fn non_cash_paid(&self) -> Money {
        self.total_paid() - self.cash_paid()
    }

    /// `max(0, total − paid)`
    pub fn amount_remaining(&self) -> Money {
        (self.total() - self.total_paid()).clamp_non_negative()
    }

    /// Cash handed back. Zero while anything is still owed.
    pub fn change_due(&self) -> Money {
        if self.amount_remaining().is_positive() {
            return Money::zero();
        }
        let owed_in_cash = (self.total() - self.non_cash_paid()).clamp_non_negative();
        (self.cash_paid() - owed_in_cash).clamp_non_negative()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.amount_remaining().is_zero()
    }

    /// Fails with `PaymentIncomplete` unless the total is covered.
    pub fn ensure_complete(&self) -> CoreResult<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(CoreError::PaymentIncomplete {
                remaining_cents: self.amount_remaining().cents(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Option<Money> {
        Some(Money::from_cents(c))
    }

    #[test]
    fn test_cash_overpay_gives_change() {
        let mut ledger = TenderLedger::new(Money::from_cents(8_750));
        ledger.add_payment(PaymentMethod::Cash, cents(10_000)).unwrap();

        assert!(ledger.is_complete());
        assert_eq!(ledger.change_due().cents(), 1_250);
    }

    #[test]
    fn test_split_tender_change() {
        let mut ledger = TenderLedger::new(Money::from_cents(10_000));
        ledger.add_payment(PaymentMethod::Card, cents(3_000)).unwrap();
        ledger.add_payment(PaymentMethod::Cash, cents(8_000)).unwrap();

        assert_eq!(ledger.amount_remaining(), Money::zero());
        assert_eq!(ledger.change_due().cents(), 1_000);
    }

    #[test]
    fn test_no_change_while_balance_remains() {
        let mut ledger = TenderLedger::new(Money::from_cents(5_000));
        ledger.add_payment(PaymentMethod::Cash, cents(2_000)).unwrap();

        assert_eq!(ledger.amount_remaining().cents(), 3_000);
        assert_eq!(ledger.change_due(), Money::zero());
        assert!(matches!(
            ledger.ensure_complete(),
            Err(CoreError::PaymentIncomplete { remaining_cents: 3_000 })
        ));
    }

    #[test]
    fn test_non_cash_cannot_overpay() {
        let mut ledger = TenderLedger::new(Money::from_cents(5_000));
        let err = ledger
            .add_payment(PaymentMethod::GCash, cents(6_000))
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot overpay with GCash");
        assert!(ledger.payments.is_empty());
    }

    #[test]
    fn test_missing_amount_pays_remainder() {
        let mut ledger = TenderLedger::new(Money::from_cents(5_000));
        ledger.add_payment(PaymentMethod::Cash, cents(1_000)).unwrap();
        let p = ledger.add_payment(PaymentMethod::Maya, None).unwrap().unwrap();

        assert_eq!(p.amount_cents, 4_000);
        assert!(ledger.is_complete());
        assert_eq!(ledger.change_due(), Money::zero());
    }

    #[test]
    fn test_nothing_recorded_when_settled() {
        let mut ledger = TenderLedger::new(Money::from_cents(1_000));
        ledger.add_payment(PaymentMethod::Card, None).unwrap();
        assert_eq!(ledger.add_payment(PaymentMethod::Card, cents(0)).unwrap(), None);
        assert_eq!(ledger.payments.len(), 1);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut ledger = TenderLedger::new(Money::from_cents(1_000));
        let err = ledger
            .add_payment(PaymentMethod::Cash, cents(-500))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));
        assert!(ledger.payments.is_empty());
    }

    #[test]
    fn test_oversized_payments_rejected() {
        let mut ledger = TenderLedger::new(Money::from_cents(1_000));
        for _ in 0..2 {
            assert!(matches!(
                ledger.add_payment(PaymentMethod::Cash, cents(i64::MAX)),
                Err(CoreError::InvalidPaymentAmount { .. })
            ));
        }
        assert!(ledger.payments.is_empty());

        for _ in 0..MAX_PAYMENTS {
            ledger.add_payment(PaymentMethod::Cash, cents(1)).unwrap();
        }
        assert!(ledger.add_payment(PaymentMethod::Cash, cents(1)).is_err());
        assert_eq!(ledger.total_paid().cents(), MAX_PAYMENTS as i64);
    }

    #[test]
    fn test_remove_payment() {
        let mut ledger = TenderLedger::new(Money::from_cents(1_000));
        ledger.add_payment(PaymentMethod::Cash, cents(400)).unwrap();
        assert!(ledger.remove_payment(0).is_some());
        assert!(ledger.remove_payment(0).is_none());
        assert_eq!(ledger.amount_remaining().cents(), 1_000);
    }

    #[test]
    fn test_zero_total_completes_immediately() {
        let ledger = TenderLedger::new(Money::zero());
        assert!(ledger.is_complete());
        assert_eq!(ledger.change_due(), Money::zero());
    }
}
