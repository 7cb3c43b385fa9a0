use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// interest-to-installment ratio above which the installment gets raised
pub const DEFAULT_MAX_INTEREST_RATIO: Decimal = dec!(0.90);

/// 100 years of monthly periods
pub const DEFAULT_MAX_PERIODS: u32 = 1200;

pub const DEFAULT_CURRENCY: &str = "EUR";

/// largest loan amount or installment accepted; keeps every sum a schedule
/// builds inside `Decimal` range
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

/// largest nominal annual rate accepted (10000%)
pub const MAX_ANNUAL_RATE: Decimal = dec!(100);

/// loan terms
///
/// `initial_balance` is signed: a disbursed loan is a negative balance and the
/// schedule counts it up towards zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub nominal_annual_rate: Rate,
    pub installment: Money,
    pub initial_balance: Money,
    pub start_date: NaiveDate,
    /// display label only, no conversion is ever done
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub max_interest_ratio: Decimal,
    pub max_periods: u32,
    pub solver: SolverConfig,
}

/// effective-rate solver budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: u32,
    /// accepted absolute npv residual and rate step
    pub tolerance: Decimal,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_interest_ratio: DEFAULT_MAX_INTEREST_RATIO,
            max_periods: DEFAULT_MAX_PERIODS,
            solver: SolverConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: dec!(0.0000000001),
        }
    }
}

impl LoanTerms {
    pub fn new(
        nominal_annual_rate: Rate,
        installment: Money,
        initial_balance: Money,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            nominal_annual_rate,
            installment,
            initial_balance,
            start_date,
            currency: default_currency(),
        }
    }

    /// the amount still owed at disbursement
    pub fn loan_amount(&self) -> Money {
        self.initial_balance.abs()
    }

    /// reject terms that cannot describe a repayable loan
    pub fn validate(&self) -> Result<()> {
        if !self.installment.is_positive() {
            return Err(ScheduleError::invalid_configuration(format!(
                "installment must be positive, got {}",
                self.installment
            )));
        }
        if !self.initial_balance.is_negative() {
            return Err(ScheduleError::invalid_configuration(format!(
                "initial balance must be negative (amount owed), got {}",
                self.initial_balance
            )));
        }
        if self.nominal_annual_rate.is_negative() {
            return Err(ScheduleError::invalid_configuration(format!(
                "interest rate must not be negative, got {}",
                self.nominal_annual_rate
            )));
        }
        if self.installment.as_decimal() > MAX_AMOUNT
            || self.loan_amount().as_decimal() > MAX_AMOUNT
        {
            return Err(ScheduleError::invalid_configuration(format!(
                "installment and loan amount must not exceed {MAX_AMOUNT}"
            )));
        }
        if self.nominal_annual_rate.as_decimal() > MAX_ANNUAL_RATE {
            return Err(ScheduleError::invalid_configuration(format!(
                "interest rate must not exceed {MAX_ANNUAL_RATE}, got {}",
                self.nominal_annual_rate.as_decimal()
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScheduleError::invalid_configuration(format!("loan terms: {e}")))
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_interest_ratio <= Decimal::ZERO || self.max_interest_ratio > Decimal::ONE {
            return Err(ScheduleError::invalid_configuration(format!(
                "max interest ratio must be in (0, 1], got {}",
                self.max_interest_ratio
            )));
        }
        if self.max_periods == 0 {
            return Err(ScheduleError::invalid_configuration(
                "max periods must be at least 1",
            ));
        }
        if self.solver.max_iterations == 0 || self.solver.tolerance <= Decimal::ZERO {
            return Err(ScheduleError::invalid_configuration(
                "solver needs a positive iteration budget and tolerance",
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScheduleError::invalid_configuration(format!("schedule config: {e}")))
    }
}
