// --- File: crates/salonsync_common/src/time.rs ---
//! Salon-local civil time.
//!
//! Dates shown to owners and used for reminders are reckoned in a fixed UTC+9
//! offset, whatever the timezone of the host.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

pub const SALON_UTC_OFFSET_HOURS: i32 = 9;

pub fn salon_offset() -> FixedOffset {
    FixedOffset::east_opt(SALON_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// The salon-local date at `now`.
pub fn salon_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&salon_offset()).date_naive()
}

/// The salon-local date following `now`'s date.
pub fn salon_tomorrow(now: DateTime<Utc>) -> NaiveDate {
    salon_today(now) + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tomorrow_rolls_over_at_utc_15() {
        let before = Utc.with_ymd_and_hms(2025, 5, 5, 14, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 5, 5, 15, 0, 0).unwrap();
        assert_eq!(salon_tomorrow(before), NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        assert_eq!(salon_tomorrow(after), NaiveDate::from_ymd_opt(2025, 5, 7).unwrap());
    }
}
