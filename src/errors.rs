use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("non-amortizing schedule: {outstanding} still owed after {periods} periods")]
    NonAmortizing {
        periods: u32,
        outstanding: Money,
    },

    #[error("effective rate not found after {iterations} iterations: {message}")]
    RateNotFound {
        iterations: u32,
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("schedule already generated")]
    AlreadyGenerated,
}

impl ScheduleError {
    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        ScheduleError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
