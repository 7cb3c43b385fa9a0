pub mod aggregate;
pub mod loan;
pub mod period;
pub mod safeguard;

pub use aggregate::{quarter_of, slot_of, QuarterAggregate, YearAggregate};
pub use loan::{LoanSchedule, LoanScheduleBuilder};
pub use period::{next_payment_date, PeriodNode, LAST_BILLING_DAY};
pub use safeguard::{check_installment, InstallmentCheck};
