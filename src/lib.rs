pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod schedule;
pub mod serialization;
pub mod types;

// re-export key types
pub use config::{LoanTerms, ScheduleConfig, SolverConfig};
pub use decimal::{Money, Rate};
pub use errors::{Result, ScheduleError};
pub use interest::{annualize, effective_annual_rate, internal_rate_of_return};
pub use schedule::{
    check_installment, next_payment_date, InstallmentCheck, LoanSchedule, LoanScheduleBuilder,
    PeriodNode, QuarterAggregate, YearAggregate,
};
pub use serialization::ScheduleView;
pub use types::{pivot, PeriodValue, PivotItem, SequenceId};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
