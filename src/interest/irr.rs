use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SolverConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::interest::{annualize, PERIODS_PER_YEAR};

/// lowest periodic rate the newton iteration may step to
const MIN_RATE: Decimal = dec!(-0.99);
/// upper end of the bisection bracket
const MAX_BRACKET_RATE: Decimal = dec!(1.0);

/// npv of a periodic cash-flow series and its derivative with respect to the rate
///
/// Returns `None` when `1 + rate` is not positive or the discounting overflows.
pub fn net_present_value(cash_flows: &[Money], rate: Decimal) -> Option<(Decimal, Decimal)> {
    let base = Decimal::ONE.checked_add(rate)?;
    if base <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    // 1 / (1 + r)^t
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_div(base)?;
        }
        let cf = cf.as_decimal();
        if cf.is_zero() {
            continue;
        }
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr cf / (1+r)^t = -t * cf / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(cf)?
                .checked_mul(discount)?
                .checked_div(base)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv, dnpv))
}

/// periodic internal rate of return: the rate at which the npv is zero
///
/// Newton-Raphson from `guess`; when that does not converge, bisection on
/// `[0, 1]`, which brackets the root of a disbursement followed by payments
/// that at least repay it.
pub fn internal_rate_of_return(
    cash_flows: &[Money],
    guess: Decimal,
    solver: &SolverConfig,
) -> Result<Decimal> {
    let has_outflow = cash_flows.iter().any(Money::is_negative);
    let has_inflow = cash_flows.iter().any(Money::is_positive);
    if !has_outflow || !has_inflow {
        return Err(ScheduleError::RateNotFound {
            iterations: 0,
            message: format!(
                "cash flows need a sign change, got {} flows",
                cash_flows.len()
            ),
        });
    }

    match newton(cash_flows, guess, solver) {
        Some(rate) => Ok(rate),
        None => {
            tracing::debug!("newton iteration did not converge, falling back to bisection");
            bisection(cash_flows, solver).ok_or_else(|| ScheduleError::RateNotFound {
                iterations: solver.max_iterations,
                message: "no root found by newton iteration or bisection".to_string(),
            })
        }
    }
}

fn newton(cash_flows: &[Money], guess: Decimal, solver: &SolverConfig) -> Option<Decimal> {
    let mut r = guess;

    for iteration in 0..solver.max_iterations {
        let (npv, dnpv) = net_present_value(cash_flows, r)?;

        if npv.abs() < solver.tolerance {
            tracing::trace!(iteration, rate = %r, "newton converged on residual");
            return Some(r);
        }
        if dnpv.is_zero() {
            return None;
        }

        let step = npv.checked_div(dnpv)?;
        r = (r - step).max(MIN_RATE);

        if step.abs() < solver.tolerance {
            tracing::trace!(iteration, rate = %r, "newton converged on step");
            return Some(r);
        }
    }

    None
}

fn bisection(cash_flows: &[Money], solver: &SolverConfig) -> Option<Decimal> {
    let mut lo = Decimal::ZERO;
    let mut hi = MAX_BRACKET_RATE;
    let (npv_lo, _) = net_present_value(cash_flows, lo)?;
    let (npv_hi, _) = net_present_value(cash_flows, hi)?;

    if npv_lo.is_zero() {
        return Some(lo);
    }
    if npv_lo.is_sign_negative() == npv_hi.is_sign_negative() {
        return None;
    }

    for _ in 0..solver.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let (npv_mid, _) = net_present_value(cash_flows, mid)?;
        if npv_mid.abs() < solver.tolerance || (hi - lo) < solver.tolerance {
            return Some(mid);
        }
        if npv_mid.is_sign_negative() == npv_lo.is_sign_negative() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    None
}

/// effective annual rate of a monthly cash-flow series: (1 + irr)^12 - 1
pub fn effective_annual_rate(
    cash_flows: &[Money],
    guess: Decimal,
    solver: &SolverConfig,
) -> Result<Rate> {
    let periodic = internal_rate_of_return(cash_flows, guess, solver)?;
    Ok(annualize(periodic, PERIODS_PER_YEAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flows(values: &[i64]) -> Vec<Money> {
        values.iter().map(|v| Money::from_major(*v)).collect()
    }

    #[test]
    fn test_npv_at_zero_is_sum() {
        let (npv, dnpv) = net_present_value(&flows(&[-100, 60, 60]), Decimal::ZERO).unwrap();
        assert_eq!(npv, dec!(20));
        assert_eq!(dnpv, dec!(-180));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(net_present_value(&flows(&[-100, 110]), dec!(-1)).is_none());
    }

    #[test]
    fn test_irr_single_period() {
        let rate =
            internal_rate_of_return(&flows(&[-100, 110]), dec!(0.01), &SolverConfig::default())
                .unwrap();
        assert!((rate - dec!(0.1)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_annuity() {
        // 1000 repaid by 12 payments of 88.85 is roughly 1% per month
        let mut cash_flows = vec![Money::from_major(-1000)];
        cash_flows.extend(std::iter::repeat(Money::from(dec!(88.85))).take(12));
        let rate =
            internal_rate_of_return(&cash_flows, dec!(0.005), &SolverConfig::default()).unwrap();
        assert!((rate - dec!(0.01)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_zero_interest() {
        let rate = internal_rate_of_return(
            &flows(&[-300, 100, 100, 100]),
            Decimal::ZERO,
            &SolverConfig::default(),
        )
        .unwrap();
        assert_eq!(rate, Decimal::ZERO);
    }

    #[test]
    fn test_irr_without_sign_change() {
        let solver = SolverConfig::default();
        assert!(matches!(
            internal_rate_of_return(&flows(&[-5000, 0]), dec!(0.01), &solver),
            Err(ScheduleError::RateNotFound { .. })
        ));
        assert!(matches!(
            internal_rate_of_return(&flows(&[-5000]), dec!(0.01), &solver),
            Err(ScheduleError::RateNotFound { .. })
        ));
        assert!(internal_rate_of_return(&[], dec!(0.01), &solver).is_err());
    }

    #[test]
    fn test_bisection_fallback() {
        // a single newton step cannot converge, bisection still finds the root
        let solver = SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        };
        assert!(newton(&flows(&[-100, 110]), dec!(0.5), &solver).is_none());

        let solver = SolverConfig {
            max_iterations: 200,
            ..SolverConfig::default()
        };
        let rate = bisection(&flows(&[-100, 110]), &solver).unwrap();
        assert!((rate - dec!(0.1)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_effective_annual_rate() {
        let mut cash_flows = vec![Money::from_major(-1000)];
        cash_flows.extend(std::iter::repeat(Money::from(dec!(88.85))).take(12));
        let effective =
            effective_annual_rate(&cash_flows, dec!(0.01), &SolverConfig::default()).unwrap();
        assert!(effective.as_percentage() > dec!(12.6));
        assert!(effective.as_percentage() < dec!(12.8));
    }
}
