use std::fmt::Display;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::{DateTime, Duration};

/// Half-open interval of instants: start included, end excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeRange {
    start: DateTime,
    end: DateTime,
}

impl Display for DateTimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl DateTimeRange {
    pub fn new(start: DateTime, end: DateTime) -> Self {
        Self { start, end }
    }

    pub fn window(start: DateTime, length: Duration) -> Self {
        Self::new(start, start + length)
    }

    /// The full calendar day in the given timezone, from local midnight to
    /// the next day's local midnight.
    pub fn calendar_day(date: NaiveDate, tz: Tz) -> Self {
        //failing only at the edges of what can be stored in a date
        let next = date.succ_opt().unwrap();
        Self::new(day_start(date, tz), day_start(next, tz))
    }

    pub fn start(&self) -> &DateTime {
        &self.start
    }

    pub fn end(&self) -> &DateTime {
        &self.end
    }
}

/// Earliest valid instant of the calendar day in the given timezone.
fn day_start(date: NaiveDate, tz: Tz) -> DateTime {
    let mut naive = date.and_time(chrono::NaiveTime::MIN);

    //local midnight can fall into a DST gap, advance until the day has started
    for _ in 0..3 {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt.into();
        }
        naive = naive + chrono::Duration::hours(1);
    }

    tz.from_utc_datetime(&naive).into()
}
