//! Display formatting for stored timestamps.
//!
//! Everything is stored in UTC; conversion to the display zone happens only
//! when a response is serialized.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// India Standard Time, UTC+05:30
const DISPLAY_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// A point in time that can be pinned to UTC.
pub trait AsUtc {
    fn as_utc(&self) -> DateTime<Utc>;
}

/// Naive values carry no zone and are taken to be UTC.
impl AsUtc for NaiveDateTime {
    fn as_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(self)
    }
}

impl<Tz: TimeZone> AsUtc for DateTime<Tz> {
    fn as_utc(&self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).expect("display offset is within +/-24h")
}

/// Renders `t` in the display zone as ISO-8601 with offset, e.g.
/// `2024-03-01T15:30:00.000000+05:30`. Absent in, absent out.
pub fn format_timestamp<T: AsUtc>(t: Option<&T>) -> Option<String> {
    t.map(|t| {
        t.as_utc()
            .with_timezone(&display_offset())
            .to_rfc3339_opts(SecondsFormat::Micros, false)
    })
}
