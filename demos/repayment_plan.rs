/// repayment plan - generate a schedule and print it as json
use repayment_schedule::chrono::NaiveDate;
use repayment_schedule::{LoanSchedule, Money, Rate, ScheduleView};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 5,000 at 3.45% nominal, 30 per month
    let schedule = LoanSchedule::builder()
        .rate(Rate::from_bps(345))
        .installment(Money::from_major(30))
        .loan_amount(Money::from_major(5000))
        .start_date(NaiveDate::from_ymd_opt(2024, 8, 1).ok_or("invalid start date")?)
        .generate()?;

    let total = schedule.pivot();
    println!(
        "{} payments, {} interest, effective rate {}",
        schedule.payment_count(),
        total.interest,
        schedule.effective_annual_rate().unwrap_or_default(),
    );

    println!("{}", ScheduleView::from_schedule(&schedule).to_json_pretty()?);

    Ok(())
}
