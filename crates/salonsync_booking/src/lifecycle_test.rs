#[cfg(test)]
mod tests {
    use crate::lifecycle::{
        ensure_deletable, ensure_editable, materialize_snapshots, total_duration_minutes,
        transition, Transition,
    };
    use chrono::{NaiveDate, NaiveTime};
    use salonsync_common::models::{Appointment, AppointmentStatus, MenuItem};
    use salonsync_common::SalonError;

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 7,
            salon_id: 1,
            customer_id: 2,
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0),
            status,
            treatment_record_id: None,
            menus: vec![],
        }
    }

    fn menu(id: i64, name: &str, price: i64, duration: i32) -> MenuItem {
        MenuItem {
            id,
            salon_id: 1,
            name: name.to_string(),
            price,
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_scheduled_moves_to_either_terminal_status() {
        assert_eq!(
            transition(AppointmentStatus::Scheduled, Transition::Complete).unwrap(),
            AppointmentStatus::Completed
        );
        assert_eq!(
            transition(AppointmentStatus::Scheduled, Transition::Cancel).unwrap(),
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn test_terminal_statuses_reject_every_transition() {
        for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for step in [Transition::Complete, Transition::Cancel] {
                let result = transition(status, step);
                assert!(
                    matches!(result, Err(SalonError::ValidationError(ref m)) if m.contains(status.as_str())),
                    "{:?} -> {:?} gave {:?}",
                    status,
                    step,
                    result
                );
            }
        }
    }

    #[test]
    fn test_only_scheduled_is_editable() {
        assert!(ensure_editable(&appointment(AppointmentStatus::Scheduled)).is_ok());
        assert!(ensure_editable(&appointment(AppointmentStatus::Completed)).is_err());
        assert!(ensure_editable(&appointment(AppointmentStatus::Cancelled)).is_err());
    }

    #[test]
    fn test_linked_treatment_record_blocks_delete() {
        let mut linked = appointment(AppointmentStatus::Completed);
        assert!(ensure_deletable(&linked).is_ok());

        linked.treatment_record_id = Some(99);
        assert!(matches!(
            ensure_deletable(&linked),
            Err(SalonError::ValidationError(_))
        ));
    }

    #[test]
    fn test_snapshots_follow_selection_order() {
        let catalog = vec![menu(1, "Cut", 4000, 45), menu(2, "Color", 8000, 90)];
        let snapshots = materialize_snapshots(&[2, 1], &catalog).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name, "Color");
        assert_eq!(snapshots[0].position, 0);
        assert_eq!(snapshots[0].menu_id, Some(2));
        assert_eq!(snapshots[1].name, "Cut");
        assert_eq!(snapshots[1].price, 4000);
        assert_eq!(snapshots[1].position, 1);
        assert_eq!(total_duration_minutes(&snapshots).unwrap(), 135);
    }

    #[test]
    fn test_unknown_menu_is_not_found() {
        let catalog = vec![menu(1, "Cut", 4000, 45)];
        let result = materialize_snapshots(&[1, 3], &catalog);
        assert!(matches!(result, Err(SalonError::NotFoundError(ref m)) if m.contains('3')));
    }

    #[test]
    fn test_oversized_durations_are_validation_error() {
        let catalog = vec![menu(1, "Marathon", 0, i32::MAX)];
        let snapshots = materialize_snapshots(&[1, 1, 1], &catalog).unwrap();
        assert!(matches!(
            total_duration_minutes(&snapshots),
            Err(SalonError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_selection_has_no_duration() {
        let snapshots = materialize_snapshots(&[], &[]).unwrap();
        assert!(snapshots.is_empty());
        assert_eq!(total_duration_minutes(&snapshots).unwrap(), 0);
    }
}
