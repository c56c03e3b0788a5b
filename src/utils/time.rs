//! Timestamp utilities.
//!
//! Wire timestamps are milliseconds since the Unix epoch, derived from a
//! wall-clock calendar reading via a deliberately simplified day count:
//! every February is 28 days and every year is 365 days, with no leap-year
//! correction. Timestamps produced here therefore drift from calendar-exact
//! epoch time by roughly a day per leap year since 1970. Peers all apply
//! the same conversion, so relative ordering across the mesh holds; callers
//! must not rely on the absolute values being calendar-exact.
//!
//! The conversion is isolated behind this module so an exact calendar
//! implementation can replace it without touching the codecs.

use time::OffsetDateTime;

/// A wall-clock calendar reading, as an RTC provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: u16,
    /// 1-based month.
    pub month: u8,
    /// 1-based day of month.
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CalendarTime {
    /// Read the current UTC wall-clock time.
    pub fn now_utc() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            year: now.year().max(1970) as u16,
            month: u8::from(now.month()),
            day: now.day(),
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
        }
    }

    /// Milliseconds since the Unix epoch under the simplified day count.
    pub fn epoch_millis(&self) -> u64 {
        let mut days = u64::from(self.day);
        for month in 1..self.month {
            days += match month {
                2 => 28,
                4 | 6 | 9 | 11 => 30,
                _ => 31,
            };
        }
        days += u64::from(self.year.saturating_sub(1970)) * 365;

        let seconds = days * 86_400
            + u64::from(self.hour) * 3_600
            + u64::from(self.minute) * 60
            + u64::from(self.second);

        seconds * 1_000
    }
}

/// Current timestamp in milliseconds, via the simplified calendar
/// conversion all peers share.
pub fn current_timestamp_ms() -> u64 {
    CalendarTime::now_utc().epoch_millis()
}
