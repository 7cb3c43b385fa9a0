/// serialization support for schedules
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::schedule::{LoanSchedule, PeriodNode, QuarterAggregate, YearAggregate};
use crate::types::{PeriodValue, SequenceId};

/// serializable, read-only view of a generated schedule
///
/// Carries exactly what a repayment plan report prints: the loan overview,
/// then per year and quarter the period rows and their totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub overview: OverviewView,
    pub years: Vec<YearView>,
    pub total: PeriodValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverviewView {
    pub start_date: NaiveDate,
    pub loan_amount: Money,
    pub nominal_rate: Rate,
    pub effective_rate: Option<Rate>,
    pub installment: Money,
    pub configured_installment: Money,
    pub installment_adjusted: bool,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct YearView {
    pub year: i32,
    pub quarters: Vec<QuarterView>,
    pub total: PeriodValue,
    pub closing_balance: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuarterView {
    pub quarter: u8,
    pub months: Vec<PeriodRow>,
    pub total: PeriodValue,
    pub closing_balance: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodRow {
    pub id: SequenceId,
    pub date: NaiveDate,
    pub balance: Money,
    pub principal: Money,
    pub interest: Money,
    pub installment: Money,
}

impl ScheduleView {
    pub fn from_schedule(schedule: &LoanSchedule) -> Self {
        let check = schedule.installment_check();
        ScheduleView {
            overview: OverviewView {
                start_date: schedule.start_date(),
                loan_amount: schedule.initial_balance().abs(),
                nominal_rate: schedule.nominal_annual_rate(),
                effective_rate: schedule.effective_annual_rate(),
                installment: schedule.target_installment(),
                configured_installment: check.configured_installment,
                installment_adjusted: check.adjusted(),
                currency: schedule.currency().to_string(),
            },
            years: schedule
                .years()
                .iter()
                .map(|year| YearView::from_year(schedule, year))
                .collect(),
            total: schedule.pivot(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl YearView {
    fn from_year(schedule: &LoanSchedule, year: &YearAggregate) -> Self {
        let quarters: Vec<QuarterView> = year
            .quarters
            .iter()
            .map(|quarter| QuarterView::from_quarter(schedule, quarter))
            .collect();
        let closing_balance = quarters
            .last()
            .map(|q| q.closing_balance)
            .unwrap_or(Money::ZERO);

        YearView {
            year: year.year,
            quarters,
            total: schedule.year_pivot(year),
            closing_balance,
        }
    }
}

impl QuarterView {
    fn from_quarter(schedule: &LoanSchedule, quarter: &QuarterAggregate) -> Self {
        let months: Vec<PeriodRow> =
            schedule.quarter_months(quarter).map(PeriodRow::from).collect();
        let closing_balance = months.last().map(|row| row.balance).unwrap_or(Money::ZERO);

        QuarterView {
            quarter: quarter.quarter,
            months,
            total: schedule.quarter_pivot(quarter),
            closing_balance,
        }
    }
}

impl From<&PeriodNode> for PeriodRow {
    fn from(node: &PeriodNode) -> Self {
        PeriodRow {
            id: node.sequence_id,
            date: node.date,
            balance: node.balance,
            principal: node.value.principal,
            interest: node.value.interest,
            installment: node.value.installment,
        }
    }
}
