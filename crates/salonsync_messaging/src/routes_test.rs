#[cfg(test)]
mod tests {
    use crate::handlers::MessagingState;
    use crate::reminder::{ReminderScheduler, SystemClock};
    use crate::routes::routes;
    use crate::test_support::{
        active_channel, dispatcher, test_vault, FakeProfiles, RecordingTransport, CHANNEL_SECRET,
    };
    use crate::vault::{CredentialVault, KEY_LEN};
    use crate::webhook::{sign, SIGNATURE_HEADER};
    use crate::worker::EventWorker;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use salonsync_common::context::SALON_ID_HEADER;
    use salonsync_common::testing::{memory_repositories, MemoryStore};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::task::JoinHandle;
    use tower::ServiceExt;

    const CRON_SECRET: &str = "cron-secret";

    struct TestApp {
        app: Router,
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
        worker_task: JoinHandle<()>,
        salon_id: i64,
    }

    fn test_app() -> TestApp {
        let (store, repos) = memory_repositories();
        let vault = test_vault();
        let transport = RecordingTransport::new();
        let profiles = FakeProfiles::new().with("U1", "Aiko T.");
        let dispatcher = dispatcher(vault.clone(), transport.clone(), store.clone());
        let (worker, worker_task) = EventWorker::new(
            repos.clone(),
            vault.clone(),
            dispatcher.clone(),
            profiles.clone(),
        )
        .spawn();
        let reminders = Arc::new(ReminderScheduler::new(
            repos.clone(),
            dispatcher.clone(),
            Arc::new(SystemClock),
        ));
        let salon = store.add_salon("Hair Atelier");

        let state = Arc::new(MessagingState {
            repos,
            vault,
            dispatcher,
            reminders,
            profiles,
            worker,
            cron_secret: CRON_SECRET.to_string(),
        });
        TestApp {
            app: routes(state),
            store,
            transport,
            worker_task,
            salon_id: salon.id,
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn owner_request(method: &str, uri: &str, salon_id: i64, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(SALON_ID_HEADER, salon_id.to_string());
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn webhook_request(token: &str, body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/webhook/{}", token))
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn cron_request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/cron/reminders");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_webhook_status_codes() {
        let t = test_app();
        let vault = test_vault();
        t.store.put_channel(active_channel(&vault, t.salon_id));
        let token = format!("token-{}", t.salon_id);
        let body = r#"{"events":[]}"#;

        let (status, _) = send(&t.app, webhook_request("nope", body, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        // A valid signature does not make an unknown token acceptable
        let signed = sign(CHANNEL_SECRET, body.as_bytes()).unwrap();
        let (status, _) = send(&t.app, webhook_request("nope", body, Some(signed))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&t.app, webhook_request(&token, body, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let forged = sign("wrong-secret", body.as_bytes()).unwrap();
        let (status, _) = send(&t.app, webhook_request(&token, body, Some(forged))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Malformed but signed bodies are acknowledged and dropped by the worker
        for garbage in ["not json", r#"{"events":"oops"}"#] {
            let signature = sign(CHANNEL_SECRET, garbage.as_bytes()).unwrap();
            let (status, json) =
                send(&t.app, webhook_request(&token, garbage, Some(signature))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, json!({ "ok": true }));
        }

        let signature = sign(CHANNEL_SECRET, body.as_bytes()).unwrap();
        let (status, json) = send(&t.app, webhook_request(&token, body, Some(signature))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_webhook_acknowledged_when_queue_is_gone() {
        let t = test_app();
        t.store.put_channel(active_channel(&test_vault(), t.salon_id));
        t.worker_task.abort();
        assert!(t.worker_task.await.unwrap_err().is_cancelled());

        let body = r#"{"events":[{"type":"follow","source":{"type":"user","userId":"U1"}}]}"#;
        let signature = sign(CHANNEL_SECRET, body.as_bytes()).unwrap();
        let (status, json) = send(
            &t.app,
            webhook_request(&format!("token-{}", t.salon_id), body, Some(signature)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "ok": true }));
        assert!(t.store.links().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_channel_acknowledges_without_verification() {
        let t = test_app();
        let mut channel = active_channel(&test_vault(), t.salon_id);
        channel.is_active = false;
        t.store.put_channel(channel);

        let (status, json) = send(
            &t.app,
            webhook_request(&format!("token-{}", t.salon_id), "whatever", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_verified_follow_is_processed_in_background() {
        let t = test_app();
        t.store.put_channel(active_channel(&test_vault(), t.salon_id));
        let body = r#"{"events":[{"type":"follow","source":{"type":"user","userId":"U1"}}]}"#;
        let signature = sign(CHANNEL_SECRET, body.as_bytes()).unwrap();

        let (status, _) = send(
            &t.app,
            webhook_request(&format!("token-{}", t.salon_id), body, Some(signature)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Dropping the router closes the queue; the worker finishes what it has
        let TestApp {
            app,
            store,
            worker_task,
            ..
        } = t;
        drop(app);
        worker_task.await.unwrap();

        let links = store.links();
        assert_eq!(links.len(), 1);
        assert!(links[0].is_following);
        assert_eq!(links[0].display_name.as_deref(), Some("Aiko T."));
    }

    #[tokio::test]
    async fn test_cron_requires_bearer_secret() {
        let t = test_app();

        let (status, _) = send(&t.app, cron_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&t.app, cron_request(Some("Bearer wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&t.app, cron_request(Some(CRON_SECRET))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, json) = send(
            &t.app,
            cron_request(Some(&format!("Bearer {}", CRON_SECRET))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sent"], 0);
        assert_eq!(json["failed"], 0);
        assert_eq!(json["date"].as_str().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_channel_settings_lifecycle() {
        let t = test_app();

        let (status, _) = send(
            &t.app,
            owner_request("PUT", "/channel", t.salon_id, Some(json!({ "channel_secret": "s" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, created) = send(
            &t.app,
            owner_request(
                "PUT",
                "/channel",
                t.salon_id,
                Some(json!({ "channel_secret": "plain-secret", "access_token": "plain-token" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["is_active"], true);
        let path = created["webhook_path"].as_str().unwrap().to_string();
        assert!(path.starts_with("/api/webhook/"));
        assert!(!created.to_string().contains("plain-secret"));

        let (status, updated) = send(
            &t.app,
            owner_request(
                "PUT",
                "/channel",
                t.salon_id,
                Some(json!({ "reminder_enabled": false })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["reminder_enabled"], false);
        assert_eq!(updated["webhook_path"], path.as_str());

        let (status, fetched) = send(&t.app, owner_request("GET", "/channel", t.salon_id, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);

        let (status, _) = send(&t.app, owner_request("DELETE", "/channel", t.salon_id, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&t.app, owner_request("GET", "/channel", t.salon_id, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_channel_routes_need_owner_context() {
        let t = test_app();
        let request = Request::builder()
            .method("GET")
            .uri("/channel")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&t.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_test_message_is_sent_and_logged() {
        let t = test_app();
        t.store.put_channel(active_channel(&test_vault(), t.salon_id));
        let link = t.store.add_link(t.salon_id, "U1", None, true);

        let (status, json) = send(
            &t.app,
            owner_request("POST", "/channel/test", t.salon_id, Some(json!({ "link_id": link.id }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "sent");
        assert_eq!(t.transport.sent().len(), 1);
        assert_eq!(t.store.logs().len(), 1);

        let (status, _) = send(
            &t.app,
            owner_request("POST", "/channel/test", t.salon_id, Some(json!({ "link_id": 999 }))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sync_followers_reports_counts_and_reconfigure_hint() {
        let t = test_app();
        t.store.put_channel(active_channel(&test_vault(), t.salon_id));
        t.store.add_link(t.salon_id, "U1", None, true);
        t.store.add_link(t.salon_id, "U2", None, true);

        let (status, json) = send(
            &t.app,
            owner_request("POST", "/channel/sync-followers", t.salon_id, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "updated": 1, "failed": 1 }));

        // Secrets sealed under a key the server no longer has
        let stale = CredentialVault::new(&[9u8; KEY_LEN]).unwrap();
        t.store.put_channel(active_channel(&stale, t.salon_id));
        let (status, json) = send(
            &t.app,
            owner_request("POST", "/channel/sync-followers", t.salon_id, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], 422);
    }

    #[tokio::test]
    async fn test_link_and_unlink_customer() {
        let t = test_app();
        let customer = t.store.add_customer(t.salon_id, "Aiko");
        let other = t.store.add_salon("Elsewhere");
        let stranger = t.store.add_customer(other.id, "Ben");
        let link = t.store.add_link(t.salon_id, "U1", None, true);
        let uri = format!("/channel/links/{}/customer", link.id);

        let (status, json) = send(
            &t.app,
            owner_request("PUT", &uri, t.salon_id, Some(json!({ "customer_id": customer.id }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["customer_id"], customer.id);

        let (status, _) = send(
            &t.app,
            owner_request("PUT", &uri, t.salon_id, Some(json!({ "customer_id": stranger.id }))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = send(
            &t.app,
            owner_request("PUT", &uri, t.salon_id, Some(json!({ "customer_id": null }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["customer_id"], Value::Null);

        let (status, _) = send(
            &t.app,
            owner_request("PUT", &uri, other.id, Some(json!({ "customer_id": null }))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
