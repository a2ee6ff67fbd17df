use thiserror::Error;
use time::Date;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    #[error("first day of week must be in 0..=6, got {0}")]
    InvalidWeekday(u8),
    #[error("minimum date {min} is after maximum date {max}")]
    InvalidDateBounds { min: Date, max: Date },
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub struct OutOfTimeError;
