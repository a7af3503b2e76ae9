//! Wall-clock and monotonic tick sources.

use std::time::Instant;
use time::{OffsetDateTime, UtcOffset};

/// Local time broken into the fields the route request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub year: i32,
    pub month: u8,
    /// 1 = Sunday .. 7 = Saturday.
    pub weekday: u8,
    pub tz_offset_hours: i8,
}

impl LocalTime {
    pub fn minutes_since_midnight(&self) -> i32 {
        i32::from(self.hour) * 60 + i32::from(self.minute)
    }

    fn from_datetime(datetime: OffsetDateTime, tz_offset_hours: i8) -> Self {
        Self {
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: datetime.second(),
            year: datetime.year(),
            month: u8::from(datetime.month()),
            weekday: datetime.weekday().number_from_sunday(),
            tz_offset_hours,
        }
    }
}

pub trait WallClock: Send {
    fn now(&self) -> LocalTime;
}

/// System clock shifted by a fixed whole-hour offset from UTC.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
    offset_hours: i8,
}

impl SystemClock {
    pub fn new(offset_hours: i8) -> Result<Self, time::error::ComponentRange> {
        Ok(Self {
            offset: UtcOffset::from_hms(offset_hours, 0, 0)?,
            offset_hours,
        })
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> LocalTime {
        let datetime = OffsetDateTime::now_utc().to_offset(self.offset);
        LocalTime::from_datetime(datetime, self.offset_hours)
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub time: LocalTime,
}

impl FixedClock {
    pub fn at(hour: u8, minute: u8) -> Self {
        Self {
            time: LocalTime {
                hour,
                minute,
                second: 0,
                year: 2024,
                month: 5,
                weekday: 4,
                tz_offset_hours: -7,
            },
        }
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> LocalTime {
        self.time
    }
}

/// Millisecond tick counter that wraps at `u32::MAX`.
///
/// Callers compare ticks with `wrapping_sub`, so the wrap after ~49.7 days is
/// harmless as long as compared intervals stay below `u32::MAX`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn millis(&self) -> u32 {
        // Truncation is the wrap.
        self.start.elapsed().as_millis() as u32
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
