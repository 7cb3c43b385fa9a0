use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::types::{PeriodValue, SequenceId};

/// last day of month every payment date can land on
pub const LAST_BILLING_DAY: u32 = 28;

/// one month of the amortization
///
/// `balance` is the closing balance after this period's payment, signed like
/// the loan's initial balance: negative while owed, zero once repaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodNode {
    pub sequence_id: SequenceId,
    pub monthly_rate: Rate,
    pub target_installment: Money,
    pub date: NaiveDate,
    pub balance: Money,
    pub value: PeriodValue,
    /// index of the preceding node in the owning schedule
    pub prev: Option<SequenceId>,
    /// index of the following node, set once the successor exists
    pub next: Option<SequenceId>,
}

impl PeriodNode {
    /// the disbursement node: no payment, only the opening balance rounded
    pub fn seed(
        monthly_rate: Rate,
        target_installment: Money,
        date: NaiveDate,
        initial_balance: Money,
    ) -> Self {
        Self {
            sequence_id: 0,
            monthly_rate,
            target_installment,
            date,
            balance: initial_balance.round_cents(),
            value: PeriodValue::default(),
            prev: None,
            next: None,
        }
    }

    /// build a period from its opening balance and apply its payment
    fn open(
        sequence_id: SequenceId,
        monthly_rate: Rate,
        target_installment: Money,
        date: NaiveDate,
        opening_balance: Money,
    ) -> Self {
        let owed = opening_balance.abs();
        let interest = owed.apply_rate(monthly_rate).round_cents();

        let (principal, balance) = if owed + interest <= target_installment {
            // final payment, may be smaller than the target
            (owed, Money::ZERO)
        } else {
            let principal = (target_installment - interest).max(Money::ZERO);
            (principal, -(owed - principal).round_cents())
        };

        Self {
            sequence_id,
            monthly_rate,
            target_installment,
            date,
            balance,
            value: PeriodValue::new(sequence_id, principal, interest).rounded(),
            prev: sequence_id.checked_sub(1),
            next: None,
        }
    }

    /// amount still owed after this period
    pub fn outstanding(&self) -> Money {
        self.balance.abs()
    }

    pub fn is_paid_off(&self) -> bool {
        self.balance.is_zero()
    }

    /// the seed node carries no payment
    pub fn is_disbursement(&self) -> bool {
        self.sequence_id == 0
    }

    /// the following period, or `None` once the balance reached zero
    pub fn successor(&self) -> Result<Option<PeriodNode>> {
        if self.is_paid_off() {
            return Ok(None);
        }
        let date = next_payment_date(self.date)?;
        Ok(Some(PeriodNode::open(
            self.sequence_id + 1,
            self.monthly_rate,
            self.target_installment,
            date,
            self.balance,
        )))
    }
}

/// add one calendar month, clamping days after the 28th to the 28th first
pub fn next_payment_date(date: NaiveDate) -> Result<NaiveDate> {
    let clamped = if date.day() > LAST_BILLING_DAY {
        date.with_day(LAST_BILLING_DAY).ok_or_else(|| ScheduleError::InvalidDate {
            message: format!("cannot clamp {date} to day {LAST_BILLING_DAY}"),
        })?
    } else {
        date
    };

    clamped
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ScheduleError::InvalidDate {
            message: format!("{clamped} plus one month is out of range"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed(installment: Money, balance: Money) -> PeriodNode {
        PeriodNode::seed(
            Rate::from_bps(345).monthly_rate(),
            installment,
            date(2024, 8, 1),
            balance,
        )
    }

    #[test]
    fn test_seed_rounds_balance_only() {
        let node = seed(Money::from_major(30), Money::from(dec!(-5000.004)));
        assert_eq!(node.balance, Money::from_major(-5000));
        assert_eq!(node.value, PeriodValue::default());
        assert!(node.is_disbursement());
        assert_eq!(node.prev, None);
    }

    #[test]
    fn test_first_regular_period() {
        let node = seed(Money::from_major(30), Money::from_major(-5000));
        let first = node.successor().unwrap().unwrap();

        assert_eq!(first.sequence_id, 1);
        assert_eq!(first.date, date(2024, 9, 1));
        assert_eq!(first.value.interest, Money::from(dec!(14.38)));
        assert_eq!(first.value.principal, Money::from(dec!(15.62)));
        assert_eq!(first.value.installment, Money::from_major(30));
        assert_eq!(first.balance, Money::from(dec!(-4984.38)));
        assert_eq!(first.prev, Some(0));
    }

    #[test]
    fn test_final_payment_is_clamped() {
        let node = seed(Money::from_major(30), Money::from(dec!(-20.00)));
        let last = node.successor().unwrap().unwrap();

        // 20.00 * 0.002875 = 0.0575 -> 0.06
        assert_eq!(last.value.interest, Money::from(dec!(0.06)));
        assert_eq!(last.value.principal, Money::from(dec!(20.00)));
        assert_eq!(last.value.installment, Money::from(dec!(20.06)));
        assert!(last.value.installment <= last.target_installment);
        assert!(last.is_paid_off());
        assert_eq!(last.successor().unwrap(), None);
    }

    #[test]
    fn test_exact_payoff_counts_as_final() {
        let node = PeriodNode::seed(
            Rate::ZERO,
            Money::from_major(30),
            date(2024, 1, 1),
            Money::from_major(-30),
        );
        let last = node.successor().unwrap().unwrap();
        assert!(last.is_paid_off());
        assert_eq!(last.value.installment, Money::from_major(30));
    }

    #[test]
    fn test_principal_clamps_to_zero() {
        // interest 10.00 on 1200.00 at 10% equals the installment
        let node = PeriodNode::seed(
            Rate::from_percentage(10).monthly_rate(),
            Money::from_major(10),
            date(2024, 1, 1),
            Money::from_major(-1200),
        );
        let next = node.successor().unwrap().unwrap();
        assert_eq!(next.value.principal, Money::ZERO);
        assert_eq!(next.balance, Money::from_major(-1200));

        let smaller = PeriodNode::seed(
            Rate::from_percentage(10).monthly_rate(),
            Money::from_major(5),
            date(2024, 1, 1),
            Money::from_major(-1200),
        );
        let next = smaller.successor().unwrap().unwrap();
        assert_eq!(next.value.principal, Money::ZERO);
        assert_eq!(next.value.installment, next.value.interest);
    }

    #[test]
    fn test_installment_equals_principal_plus_interest() {
        let mut node = seed(Money::from_major(30), Money::from_major(-500));
        while let Some(next) = node.successor().unwrap() {
            assert!(next.value.is_balanced());
            assert_eq!(next.value.installment, next.value.principal + next.value.interest);
            node = next;
        }
        assert!(node.is_paid_off());
    }

    #[test]
    fn test_next_payment_date() {
        assert_eq!(next_payment_date(date(2024, 8, 1)).unwrap(), date(2024, 9, 1));
        assert_eq!(next_payment_date(date(2024, 12, 15)).unwrap(), date(2025, 1, 15));
        assert_eq!(next_payment_date(date(2024, 1, 28)).unwrap(), date(2024, 2, 28));
    }

    #[test]
    fn test_next_payment_date_clamps_late_days() {
        assert_eq!(next_payment_date(date(2024, 1, 31)).unwrap(), date(2024, 2, 28));
        assert_eq!(next_payment_date(date(2024, 1, 29)).unwrap(), date(2024, 2, 28));
        assert_eq!(next_payment_date(date(2024, 3, 30)).unwrap(), date(2024, 4, 28));
        // once clamped, billing stays on the 28th
        assert_eq!(next_payment_date(date(2024, 2, 28)).unwrap(), date(2024, 3, 28));
    }

    #[test]
    fn test_next_payment_date_out_of_range() {
        assert!(matches!(
            next_payment_date(NaiveDate::MAX),
            Err(ScheduleError::InvalidDate { .. })
        ));
    }
}
