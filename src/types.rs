use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// index of a period in its schedule; 0 is the disbursement
pub type SequenceId = usize;

/// monetary movement of one period, or the pivot of several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PeriodValue {
    pub sequence_id: SequenceId,
    pub principal: Money,
    pub interest: Money,
    pub installment: Money,
}

impl PeriodValue {
    pub fn new(sequence_id: SequenceId, principal: Money, interest: Money) -> Self {
        Self {
            sequence_id,
            principal,
            interest,
            installment: principal + interest,
        }
    }

    /// all amounts rounded to cents
    pub fn rounded(self) -> Self {
        Self {
            sequence_id: self.sequence_id,
            principal: self.principal.round_cents(),
            interest: self.interest.round_cents(),
            installment: self.installment.round_cents(),
        }
    }

    /// check `installment == principal + interest` on the rounded values
    pub fn is_balanced(&self) -> bool {
        let rounded = self.rounded();
        rounded.installment == (rounded.principal + rounded.interest).round_cents()
    }
}

/// input of [`pivot`]: a single period or a nested group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotItem {
    Period(PeriodValue),
    Aggregate(Vec<PivotItem>),
}

impl PivotItem {
    /// the value this item contributes to an enclosing pivot
    pub fn value(&self) -> PeriodValue {
        match self {
            PivotItem::Period(value) => *value,
            PivotItem::Aggregate(items) => pivot(items),
        }
    }
}

impl From<PeriodValue> for PivotItem {
    fn from(value: PeriodValue) -> Self {
        PivotItem::Period(value)
    }
}

/// sum items elementwise, in order
///
/// `sequence_id` is taken from the last item visited, so for a chronological
/// slice it is the id of the final period. The sum is rounded once, at the end.
/// An empty slice yields the zero value.
pub fn pivot(items: &[PivotItem]) -> PeriodValue {
    pivot_values(items.iter().map(PivotItem::value))
}

pub(crate) fn pivot_values(values: impl IntoIterator<Item = PeriodValue>) -> PeriodValue {
    let mut total = PeriodValue::default();
    for value in values {
        total.sequence_id = value.sequence_id;
        total.principal += value.principal;
        total.interest += value.interest;
        total.installment += value.installment;
    }
    total.rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn value(id: SequenceId, principal: Money, interest: Money) -> PeriodValue {
        PeriodValue::new(id, principal, interest)
    }

    #[test]
    fn test_pivot_sums_and_keeps_last_id() {
        let items = vec![
            PivotItem::from(value(3, Money::from(dec!(15.62)), Money::from(dec!(14.38)))),
            PivotItem::from(value(4, Money::from(dec!(15.67)), Money::from(dec!(14.33)))),
        ];
        let total = pivot(&items);
        assert_eq!(total.sequence_id, 4);
        assert_eq!(total.principal, Money::from(dec!(31.29)));
        assert_eq!(total.interest, Money::from(dec!(28.71)));
        assert_eq!(total.installment, Money::from_major(60));
    }

    #[test]
    fn test_pivot_id_follows_visit_order_not_maximum() {
        let items = vec![
            PivotItem::from(value(9, Money::ONE, Money::ZERO)),
            PivotItem::from(value(2, Money::ONE, Money::ZERO)),
        ];
        assert_eq!(pivot(&items).sequence_id, 2);
    }

    #[test]
    fn test_nested_pivot() {
        let quarter_a = PivotItem::Aggregate(vec![
            value(1, Money::from_major(10), Money::from_major(2)).into(),
            value(2, Money::from_major(11), Money::from_major(1)).into(),
        ]);
        let quarter_b =
            PivotItem::Aggregate(vec![value(3, Money::from_major(12), Money::ZERO).into()]);
        let year = PivotItem::Aggregate(vec![quarter_a.clone(), quarter_b.clone()]);

        let total = year.value();
        assert_eq!(total.sequence_id, 3);
        assert_eq!(total.principal, Money::from_major(33));
        assert_eq!(total.installment, Money::from_major(36));
        assert_eq!(
            total.installment,
            quarter_a.value().installment + quarter_b.value().installment
        );
    }

    #[test]
    fn test_pivot_mixed_levels() {
        let first = value(4, Money::from_major(20), Money::from_major(3));
        let middle = PivotItem::Aggregate(vec![
            value(5, Money::from_major(21), Money::from_major(2)).into(),
            value(6, Money::from_major(22), Money::from_major(1)).into(),
        ]);
        let last = value(3, Money::from_major(23), Money::ZERO);

        let total = pivot(&[first.into(), middle, last.into()]);
        assert_eq!(total.principal, Money::from_major(86));
        assert_eq!(total.interest, Money::from_major(6));
        assert_eq!(total.installment, Money::from_major(92));
        assert_eq!(total.sequence_id, last.sequence_id);
    }

    #[test]
    fn test_pivot_rounds_once() {
        let items = vec![
            PivotItem::from(PeriodValue::new(1, Money::from(dec!(0.004)), Money::ZERO)),
            PivotItem::from(PeriodValue::new(2, Money::from(dec!(0.004)), Money::ZERO)),
        ];
        assert_eq!(pivot(&items).principal, Money::CENT);
    }

    #[test]
    fn test_empty_pivot() {
        assert_eq!(pivot(&[]), PeriodValue::default());
    }
}
