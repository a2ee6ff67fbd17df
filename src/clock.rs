use time::{Date, OffsetDateTime};

/// Source of the current calendar day
pub trait Clock {
    fn today(&self) -> Date;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> Date {
        (**self).today()
    }
}

/// The local date according to the system clock.  Falls back to UTC when the
/// local offset cannot be determined.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        match OffsetDateTime::now_local() {
            Ok(now) => now.date(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to determine local date; using UTC");
                OffsetDateTime::now_utc().date()
            }
        }
    }
}

/// A clock that always reports the same day
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
