#[cfg(test)]
mod tests {
    use crate::conflict::{find_conflict, SlotRequest, TimeInterval};
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;
    use salonsync_common::models::{Appointment, AppointmentStatus, DayAppointment};

    fn time(minutes: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
    }

    fn existing(start: u32, end: u32) -> DayAppointment {
        DayAppointment {
            appointment: Appointment {
                id: 1,
                salon_id: 1,
                customer_id: 1,
                date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
                start_time: time(start),
                end_time: Some(time(end)),
                status: AppointmentStatus::Scheduled,
                treatment_record_id: None,
                menus: vec![],
            },
            customer_name: "Aiko".to_string(),
        }
    }

    fn request(start: u32, end: u32) -> SlotRequest {
        SlotRequest {
            salon_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            interval: TimeInterval::new(start, end).unwrap(),
            exclude: None,
        }
    }

    proptest! {
        // Conflict iff s < e2 && s2 < e
        #[test]
        fn test_conflict_matches_half_open_overlap(
            s in 0..1380u32, len in 1..60u32,
            s2 in 0..1380u32, len2 in 1..60u32,
        ) {
            let (e, e2) = (s + len, s2 + len2);
            let day = vec![existing(s2, e2)];
            let found = find_conflict(&request(s, e), &day).is_some();
            prop_assert_eq!(found, s < e2 && s2 < e);
        }

        #[test]
        fn test_touching_intervals_never_conflict(
            s in 60..1300u32, len in 1..60u32, len2 in 1..60u32,
        ) {
            // Candidate right after the existing booking, then right before it
            let after = vec![existing(s - len2.min(s), s)];
            prop_assert!(find_conflict(&request(s, s + len), &after).is_none());

            let before = vec![existing(s + len, s + len + len2)];
            prop_assert!(find_conflict(&request(s, s + len), &before).is_none());
        }

        #[test]
        fn test_overlap_is_symmetric(
            a in 0..1400u32, la in 1..40u32,
            b in 0..1400u32, lb in 1..40u32,
        ) {
            let x = TimeInterval::new(a, a + la).unwrap();
            let y = TimeInterval::new(b, b + lb).unwrap();
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
        }

        #[test]
        fn test_non_positive_intervals_are_rejected(start in 0..1440u32, back in 0..60u32) {
            prop_assert!(TimeInterval::new(start, start.saturating_sub(back)).is_err());
        }
    }
}
