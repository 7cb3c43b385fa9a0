use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{LoanTerms, MAX_AMOUNT};
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};

/// outcome of the interest-to-installment check done before generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentCheck {
    /// first month's interest, unrounded
    pub monthly_interest: Money,
    pub ratio: Decimal,
    pub max_ratio: Decimal,
    pub configured_installment: Money,
    /// the installment the schedule runs with
    pub installment: Money,
    /// ratio under the raised installment, when it was raised
    pub new_ratio: Option<Decimal>,
}

impl InstallmentCheck {
    pub fn adjusted(&self) -> bool {
        self.new_ratio.is_some()
    }
}

/// raise an installment that would be eaten up by interest
///
/// When the first month's interest exceeds `max_ratio` of the installment, the
/// installment becomes the smallest whole currency amount that brings the
/// ratio back to `max_ratio` or below. An installment that already passes
/// the check is returned unchanged.
pub fn check_installment(terms: &LoanTerms, max_ratio: Decimal) -> Result<InstallmentCheck> {
    if !terms.installment.is_positive() {
        return Err(ScheduleError::invalid_configuration(format!(
            "installment must be positive, got {}",
            terms.installment
        )));
    }
    if max_ratio <= Decimal::ZERO {
        return Err(ScheduleError::invalid_configuration(format!(
            "max interest ratio must be positive, got {max_ratio}"
        )));
    }

    let monthly_interest = terms
        .loan_amount()
        .apply_rate(terms.nominal_annual_rate.monthly_rate());
    let ratio = monthly_interest.as_decimal() / terms.installment.as_decimal();

    let mut check = InstallmentCheck {
        monthly_interest,
        ratio,
        max_ratio,
        configured_installment: terms.installment,
        installment: terms.installment,
        new_ratio: None,
    };

    if ratio > max_ratio {
        let installment = monthly_interest
            .as_decimal()
            .checked_div(max_ratio)
            .map(|raised| Money::from(raised).ceil_major())
            .filter(|raised| raised.as_decimal() <= MAX_AMOUNT)
            .ok_or_else(|| {
                ScheduleError::invalid_configuration(format!(
                    "installment would have to exceed {MAX_AMOUNT} to keep interest \
                     below {max_ratio} of it"
                ))
            })?;
        let new_ratio = monthly_interest.as_decimal() / installment.as_decimal();
        tracing::warn!(
            configured = %terms.installment,
            raised = %installment,
            %ratio,
            %new_ratio,
            "installment too small to amortize, raising it"
        );
        check.installment = installment;
        check.new_ratio = Some(new_ratio);
    } else {
        tracing::debug!(
            installment = %terms.installment,
            %ratio,
            "installment passes interest check"
        );
    }

    Ok(check)
}
