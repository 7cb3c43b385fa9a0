pub mod irr;

use rust_decimal::Decimal;

use crate::decimal::Rate;

pub use irr::{effective_annual_rate, internal_rate_of_return, net_present_value};

/// payment periods per year of a monthly schedule
pub const PERIODS_PER_YEAR: u32 = 12;

/// compound a periodic rate over `periods` periods: (1 + r)^n - 1
pub fn annualize(periodic_rate: Decimal, periods: u32) -> Rate {
    let mut compound_factor = Decimal::ONE;
    let base = Decimal::ONE + periodic_rate;
    for _ in 0..periods {
        compound_factor *= base;
    }
    Rate::from_decimal(compound_factor - Decimal::ONE)
}
