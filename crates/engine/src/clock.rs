//! Wall clock and the two timestamp renderings used by the ledger.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format of the ledger timestamp column, e.g. `2026年10月19日 08:05`.
pub const TIMESTAMP_FORMAT: &str = "%Y年%m月%d日 %H:%M";

/// Calendar month prefix of [`TIMESTAMP_FORMAT`], e.g. `2026年10月`.
pub const MONTH_FORMAT: &str = "%Y年%m月";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Current time in the configured time zone.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clock frozen at a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(DateTime<Tz>);

impl FixedClock {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self(at)
    }

    /// Local wall-clock time in `tz`. Returns `None` for nonexistent or
    /// ambiguous local times.
    pub fn at_local(tz: Tz, year: i32, month: u32, day: u32, hour: u32, min: u32) -> Option<Self> {
        tz.with_ymd_and_hms(year, month, day, hour, min, 0)
            .single()
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}

pub fn format_timestamp(at: &DateTime<Tz>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_month(at: &DateTime<Tz>) -> String {
    at.format(MONTH_FORMAT).to_string()
}
