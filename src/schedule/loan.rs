use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::config::{LoanTerms, ScheduleConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::interest::effective_annual_rate;
use crate::schedule::aggregate::{QuarterAggregate, YearAggregate};
use crate::schedule::period::PeriodNode;
use crate::schedule::safeguard::{check_installment, InstallmentCheck};
use crate::types::{pivot_values, PeriodValue, PivotItem, SequenceId};

/// repayment schedule of a fixed-installment loan
///
/// Created with the installment check already applied; [`LoanSchedule::generate`]
/// then runs the monthly recurrence until the balance reaches zero. Until it
/// succeeds the schedule has no periods and no effective rate.
#[derive(Debug, Clone)]
pub struct LoanSchedule {
    terms: LoanTerms,
    config: ScheduleConfig,
    installment_check: InstallmentCheck,
    periods: Vec<PeriodNode>,
    years: Vec<YearAggregate>,
    effective_annual_rate: Option<Rate>,
}

impl LoanSchedule {
    /// validate the terms and apply the installment check
    pub fn new(mut terms: LoanTerms, config: ScheduleConfig) -> Result<Self> {
        config.validate()?;
        terms.installment = terms.installment.round_cents();
        terms.validate()?;

        let installment_check = check_installment(&terms, config.max_interest_ratio)?;
        terms.installment = installment_check.installment;

        Ok(Self {
            terms,
            config,
            installment_check,
            periods: Vec::new(),
            years: Vec::new(),
            effective_annual_rate: None,
        })
    }

    /// builder for creating schedules
    pub fn builder() -> LoanScheduleBuilder {
        LoanScheduleBuilder::new()
    }

    /// run the recurrence from the start date until the loan is repaid
    pub fn generate(&mut self) -> Result<()> {
        if self.is_generated() {
            return Err(ScheduleError::AlreadyGenerated);
        }

        let mut periods: Vec<PeriodNode> = Vec::new();
        let mut years: Vec<YearAggregate> = Vec::new();

        let mut current = Some(PeriodNode::seed(
            self.terms.nominal_annual_rate.monthly_rate(),
            self.terms.installment,
            self.terms.start_date,
            self.terms.initial_balance,
        ));

        while let Some(mut node) = current {
            tracing::trace!(
                id = node.sequence_id,
                date = %node.date,
                balance = %node.balance,
                installment = %node.value.installment,
                "period"
            );
            if !node.is_paid_off() && node.sequence_id >= self.config.max_periods as usize {
                return Err(ScheduleError::NonAmortizing {
                    periods: self.config.max_periods,
                    outstanding: node.outstanding(),
                });
            }

            route(&mut years, &node);
            current = node.successor()?;
            node.next = current.as_ref().map(|next| next.sequence_id);
            periods.push(node);
        }

        let cash_flows = cash_flows_of(self.terms.initial_balance, &periods);
        let rate = effective_annual_rate(
            &cash_flows,
            self.terms.nominal_annual_rate.monthly_rate().as_decimal(),
            &self.config.solver,
        )?;

        tracing::debug!(
            payments = periods.len() - 1,
            years = years.len(),
            effective_rate = %rate,
            "schedule generated"
        );

        self.periods = periods;
        self.years = years;
        self.effective_annual_rate = Some(rate);
        Ok(())
    }

    pub fn is_generated(&self) -> bool {
        self.effective_annual_rate.is_some()
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// diagnostics of the installment check done at creation
    pub fn installment_check(&self) -> &InstallmentCheck {
        &self.installment_check
    }

    pub fn nominal_annual_rate(&self) -> Rate {
        self.terms.nominal_annual_rate
    }

    /// installment after the interest check
    pub fn target_installment(&self) -> Money {
        self.terms.installment
    }

    pub fn initial_balance(&self) -> Money {
        self.terms.initial_balance
    }

    pub fn start_date(&self) -> NaiveDate {
        self.terms.start_date
    }

    pub fn currency(&self) -> &str {
        &self.terms.currency
    }

    /// set once generation succeeded
    pub fn effective_annual_rate(&self) -> Option<Rate> {
        self.effective_annual_rate
    }

    /// all periods in order, the disbursement first
    pub fn periods(&self) -> &[PeriodNode] {
        &self.periods
    }

    pub fn period(&self, sequence_id: SequenceId) -> Option<&PeriodNode> {
        self.periods.get(sequence_id)
    }

    pub fn previous(&self, node: &PeriodNode) -> Option<&PeriodNode> {
        node.prev.and_then(|id| self.period(id))
    }

    pub fn following(&self, node: &PeriodNode) -> Option<&PeriodNode> {
        node.next.and_then(|id| self.period(id))
    }

    pub fn last_period(&self) -> Option<&PeriodNode> {
        self.periods.last()
    }

    /// number of payments, not counting the disbursement
    pub fn payment_count(&self) -> usize {
        self.periods.len().saturating_sub(1)
    }

    pub fn years(&self) -> &[YearAggregate] {
        &self.years
    }

    pub fn year(&self, year: i32) -> Option<&YearAggregate> {
        self.years.iter().find(|y| y.year == year)
    }

    pub fn quarter_months<'a>(
        &'a self,
        quarter: &'a QuarterAggregate,
    ) -> impl Iterator<Item = &'a PeriodNode> + 'a {
        quarter.months(&self.periods)
    }

    pub fn quarter_pivot(&self, quarter: &QuarterAggregate) -> PeriodValue {
        quarter.pivot(&self.periods)
    }

    pub fn year_pivot(&self, year: &YearAggregate) -> PeriodValue {
        year.pivot(&self.periods)
    }

    /// whole-loan totals, summed over the year pivots
    pub fn pivot(&self) -> PeriodValue {
        pivot_values(self.years.iter().map(|y| y.pivot(&self.periods)))
    }

    /// the schedule as a nested pivot tree: years of quarters of periods
    pub fn pivot_item(&self) -> PivotItem {
        PivotItem::Aggregate(self.years.iter().map(|y| y.pivot_item(&self.periods)).collect())
    }

    /// signed initial balance followed by every period's installment
    pub fn cash_flows(&self) -> Vec<Money> {
        cash_flows_of(self.terms.initial_balance, &self.periods)
    }
}

/// bucket a period into its year, opening the year on first use
fn route(years: &mut Vec<YearAggregate>, node: &PeriodNode) {
    let number = node.date.year();
    let index = match years.iter().position(|y| y.year == number) {
        Some(index) => index,
        None => {
            years.push(YearAggregate::new(number));
            years.len() - 1
        }
    };
    years[index].add_month(node);
}

fn cash_flows_of(initial_balance: Money, periods: &[PeriodNode]) -> Vec<Money> {
    std::iter::once(initial_balance)
        .chain(periods.iter().map(|node| node.value.installment))
        .collect()
}

pub struct LoanScheduleBuilder {
    rate: Option<Rate>,
    installment: Option<Money>,
    initial_balance: Option<Money>,
    start_date: Option<NaiveDate>,
    currency: Option<String>,
    config: ScheduleConfig,
}

impl LoanScheduleBuilder {
    pub fn new() -> Self {
        Self {
            rate: None,
            installment: None,
            initial_balance: None,
            start_date: None,
            currency: None,
            config: ScheduleConfig::default(),
        }
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn installment(mut self, installment: Money) -> Self {
        self.installment = Some(installment);
        self
    }

    /// signed, negative for an amount owed
    pub fn initial_balance(mut self, balance: Money) -> Self {
        self.initial_balance = Some(balance);
        self
    }

    /// convenience for a positive loan amount
    pub fn loan_amount(mut self, amount: Money) -> Self {
        self.initial_balance = Some(-amount.abs());
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn max_interest_ratio(mut self, ratio: Decimal) -> Self {
        self.config.max_interest_ratio = ratio;
        self
    }

    pub fn max_periods(mut self, periods: u32) -> Self {
        self.config.max_periods = periods;
        self
    }

    pub fn config(mut self, config: ScheduleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<LoanSchedule> {
        let missing =
            |field: &str| ScheduleError::invalid_configuration(format!("{field} is required"));

        let mut terms = LoanTerms::new(
            self.rate.ok_or_else(|| missing("rate"))?,
            self.installment.ok_or_else(|| missing("installment"))?,
            self.initial_balance.ok_or_else(|| missing("initial balance"))?,
            self.start_date.ok_or_else(|| missing("start date"))?,
        );
        if let Some(currency) = self.currency {
            terms.currency = currency;
        }

        LoanSchedule::new(terms, self.config)
    }

    /// build and generate in one go
    pub fn generate(self) -> Result<LoanSchedule> {
        let mut schedule = self.build()?;
        schedule.generate()?;
        Ok(schedule)
    }
}

impl Default for LoanScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
