#[cfg(test)]
mod tests {
    use crate::test_support::{active_channel, dispatcher, test_vault, FakeProfiles, RecordingTransport};
    use crate::worker::{EventWorker, Job};
    use chrono::{NaiveDate, NaiveTime};
    use salonsync_common::models::{Appointment, AppointmentStatus, DeliveryStatus, MessageType, SalonId};
    use salonsync_common::services::BookingNotifier;
    use salonsync_common::testing::{memory_repositories, MemoryStore};
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
        worker: EventWorker,
        salon_id: SalonId,
    }

    fn fixture(profiles: Arc<FakeProfiles>) -> Fixture {
        let (store, repos) = memory_repositories();
        let vault = test_vault();
        let transport = RecordingTransport::new();
        let salon = store.add_salon("Hair Atelier");
        store.put_channel(active_channel(&vault, salon.id));
        let worker = EventWorker::new(
            repos,
            vault.clone(),
            dispatcher(vault, transport.clone(), store.clone()),
            profiles,
        );
        Fixture {
            store,
            transport,
            worker,
            salon_id: salon.id,
        }
    }

    fn webhook(salon_id: SalonId, events: Value) -> Job {
        Job::Webhook {
            salon_id,
            body: json!({ "events": events }).to_string().into_bytes(),
        }
    }

    fn follow(user_id: &str) -> Value {
        json!({ "type": "follow", "source": { "type": "user", "userId": user_id } })
    }

    #[tokio::test]
    async fn test_follow_creates_link_with_display_name() {
        let f = fixture(FakeProfiles::new().with("U1", "Aiko T."));
        f.worker
            .process(webhook(f.salon_id, json!([follow("U1")])))
            .await;

        let links = f.store.links();
        assert_eq!(links.len(), 1);
        assert!(links[0].is_following);
        assert_eq!(links[0].display_name.as_deref(), Some("Aiko T."));
    }

    #[tokio::test]
    async fn test_follow_survives_failed_profile_lookup() {
        let f = fixture(FakeProfiles::new());
        f.worker
            .process(webhook(f.salon_id, json!([follow("U1")])))
            .await;

        let links = f.store.links();
        assert_eq!(links.len(), 1);
        assert!(links[0].is_following);
        assert_eq!(links[0].display_name, None);
    }

    #[tokio::test]
    async fn test_unfollow_then_message_keeps_one_link() {
        let f = fixture(FakeProfiles::new());
        f.store.add_link(f.salon_id, "U1", None, true);

        f.worker
            .process(webhook(
                f.salon_id,
                json!([
                    { "type": "unfollow", "source": { "userId": "U1" } },
                    {
                        "type": "message",
                        "source": { "userId": "U1" },
                        "message": { "type": "text", "text": "hi" }
                    },
                    {
                        "type": "message",
                        "source": { "userId": "U2" },
                        "message": { "type": "sticker" }
                    },
                    { "type": "beacon" }
                ]),
            ))
            .await;

        let links = f.store.links();
        assert_eq!(links.len(), 2);
        let u1 = links.iter().find(|l| l.platform_user_id == "U1").unwrap();
        assert!(!u1.is_following, "a message does not re-follow");
        let u2 = links.iter().find(|l| l.platform_user_id == "U2").unwrap();
        assert!(u2.is_following);
    }

    #[tokio::test]
    async fn test_malformed_webhook_body_is_dropped() {
        let f = fixture(FakeProfiles::new());
        let bodies: [&[u8]; 2] = [b"not json", br#"{"events":"oops"}"#];
        for body in bodies {
            f.worker
                .process(Job::Webhook {
                    salon_id: f.salon_id,
                    body: body.to_vec(),
                })
                .await;
        }
        // The worker keeps going after a bad body
        f.worker.process(webhook(f.salon_id, json!([follow("U1")]))).await;

        let links = f.store.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].platform_user_id, "U1");
    }

    fn book(store: &MemoryStore, salon_id: SalonId, customer_id: i64) -> i64 {
        let appointment = store.put_appointment(Appointment {
            id: 0,
            salon_id,
            customer_id,
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0),
            status: AppointmentStatus::Scheduled,
            treatment_record_id: None,
            menus: vec![],
        });
        appointment.id
    }

    #[tokio::test]
    async fn test_confirmation_job_sends_to_linked_customer() {
        let f = fixture(FakeProfiles::new());
        let customer = f.store.add_customer(f.salon_id, "Aiko");
        f.store.add_link(f.salon_id, "U1", Some(customer.id), true);
        let appointment_id = book(&f.store, f.salon_id, customer.id);

        f.worker
            .process(Job::Confirmation {
                salon_id: f.salon_id,
                appointment_id,
            })
            .await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, "U1");
        let logs = f.store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].entry.message_type, MessageType::Confirmation);
        assert_eq!(logs[0].entry.status, DeliveryStatus::Sent);
        assert_eq!(logs[0].entry.related_appointment_id, Some(appointment_id));
    }

    #[tokio::test]
    async fn test_confirmation_for_unknown_appointment_does_nothing() {
        let f = fixture(FakeProfiles::new());
        f.worker
            .process(Job::Confirmation {
                salon_id: f.salon_id,
                appointment_id: 999,
            })
            .await;
        assert!(f.transport.sent().is_empty());
        assert!(f.store.logs().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_worker_drains_queue() {
        let f = fixture(FakeProfiles::new());
        let customer = f.store.add_customer(f.salon_id, "Aiko");
        f.store.add_link(f.salon_id, "U1", Some(customer.id), true);
        let appointment_id = book(&f.store, f.salon_id, customer.id);
        let store = f.store.clone();
        let salon_id = f.salon_id;

        let (handle, task) = f.worker.spawn();
        handle.booking_created(salon_id, appointment_id);
        handle
            .enqueue(webhook(salon_id, json!([follow("U9")])))
            .unwrap();
        drop(handle);
        task.await.unwrap();

        assert_eq!(store.logs().len(), 1);
        assert!(store.links().iter().any(|l| l.platform_user_id == "U9"));
    }
}
