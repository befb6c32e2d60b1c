use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Weekly betting window: open from Monday 00:00 until the lock instant,
/// closed from then through Sunday, all in a fixed reference time zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockWindow {
    tz: Tz,
    lock_weekday: Weekday,
    lock_time: NaiveTime,
}

impl Default for LockWindow {
    /// Thursday 20:20 US Eastern
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            lock_weekday: Weekday::Thu,
            lock_time: NaiveTime::from_hms_opt(20, 20, 0).unwrap_or_default(),
        }
    }
}

impl LockWindow {
    pub fn new(tz: Tz, lock_weekday: Weekday, lock_time: NaiveTime) -> Self {
        Self {
            tz,
            lock_weekday,
            lock_time,
        }
    }

    /// Whether new wagers must be refused at `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        let minute_of_week = local.weekday().num_days_from_monday() * MINUTES_PER_DAY
            + local.hour() * 60
            + local.minute();
        let lock_minute = self.lock_weekday.num_days_from_monday() * MINUTES_PER_DAY
            + self.lock_time.hour() * 60
            + self.lock_time.minute();
        minute_of_week >= lock_minute
    }
}
