#[cfg(test)]
mod tests {
    use crate::calendar::{build_month_grid, grid_bounds, is_business_day, WeeklySchedule, GRID_CELLS};
    use chrono::{Datelike, NaiveDate, Weekday};
    use salonsync_common::models::ScheduleEntry;
    use salonsync_common::SalonError;
    use salonsync_config::ScheduleConfig;
    use std::collections::HashSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekend_closed() -> WeeklySchedule {
        WeeklySchedule::closed_on(&[Weekday::Sat, Weekday::Sun])
    }

    #[test]
    fn test_business_day_example_week() {
        let schedule = weekend_closed();
        let holidays: HashSet<NaiveDate> = [d(2025, 5, 5)].into_iter().collect();

        assert!(!is_business_day(&schedule, d(2025, 5, 3), &holidays)); // Saturday
        assert!(!is_business_day(&schedule, d(2025, 5, 5), &holidays)); // Monday holiday
        assert!(is_business_day(&schedule, d(2025, 5, 6), &holidays)); // Tuesday
    }

    #[test]
    fn test_absent_holiday_never_reopens_closed_weekday() {
        let schedule = weekend_closed();
        let holidays = HashSet::new();
        assert!(!is_business_day(&schedule, d(2025, 5, 4), &holidays));
    }

    #[test]
    fn test_missing_entries_fall_back_to_default() {
        let default = WeeklySchedule::closed_on(&[Weekday::Sun]);
        let entries = vec![
            ScheduleEntry { weekday: Weekday::Mon, is_open: false },
            ScheduleEntry { weekday: Weekday::Sun, is_open: true },
        ];
        let schedule = WeeklySchedule::from_entries(&entries, &default);

        assert!(!schedule.is_open(Weekday::Mon));
        assert!(schedule.is_open(Weekday::Sun));
        assert!(schedule.is_open(Weekday::Wed));
    }

    #[test]
    fn test_default_schedule_from_config() {
        let config = ScheduleConfig {
            default_closed_weekdays: vec!["sat".into(), "Sunday".into()],
        };
        let schedule = WeeklySchedule::from_config(&config).unwrap();
        assert_eq!(schedule, weekend_closed());

        let bad = ScheduleConfig {
            default_closed_weekdays: vec!["someday".into()],
        };
        assert!(matches!(
            WeeklySchedule::from_config(&bad),
            Err(SalonError::ConfigError(_))
        ));
    }

    #[test]
    fn test_month_grid_is_monday_first_and_42_cells() {
        // May 2025 starts on a Thursday
        let today = d(2025, 5, 10);
        let holidays: HashSet<NaiveDate> = [d(2025, 5, 5)].into_iter().collect();
        let cells = build_month_grid(2025, 5, today, &weekend_closed(), &holidays).unwrap();

        assert_eq!(cells.len(), GRID_CELLS);
        assert_eq!(cells[0].date, d(2025, 4, 28));
        assert_eq!(cells[0].date.weekday(), Weekday::Mon);
        assert!(!cells[0].in_month);
        assert!(cells[3].in_month);
        assert_eq!(cells[41].date, d(2025, 6, 8));

        let may_5 = cells.iter().find(|c| c.date == d(2025, 5, 5)).unwrap();
        assert!(may_5.is_irregular_holiday);
        assert!(!may_5.is_weekly_holiday);
        assert!(may_5.is_past);
        assert!(!may_5.is_bookable());

        let may_10 = cells.iter().find(|c| c.date == today).unwrap();
        assert!(!may_10.is_past, "today is not in the past");
        assert!(may_10.is_weekly_holiday);
    }

    #[test]
    fn test_grid_of_month_starting_on_monday() {
        // September 2025 starts on a Monday
        let (start, end) = grid_bounds(2025, 9).unwrap();
        assert_eq!(start, d(2025, 9, 1));
        assert_eq!(end, d(2025, 10, 12));
    }

    #[test]
    fn test_invalid_month_is_validation_error() {
        let result = build_month_grid(2025, 13, d(2025, 1, 1), &weekend_closed(), &HashSet::new());
        assert!(matches!(result, Err(SalonError::ValidationError(_))));
    }

    #[test]
    fn test_grid_past_last_representable_date_is_validation_error() {
        let result = build_month_grid(262142, 12, d(2025, 1, 1), &weekend_closed(), &HashSet::new());
        assert!(matches!(result, Err(SalonError::ValidationError(_))));
    }
}
