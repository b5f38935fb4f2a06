use time::{Date, OffsetDateTime};

/// Source of "today" for scoping planning entries.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Calendar day in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
