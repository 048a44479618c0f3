// --- File: crates/services/salonsync_backend/src/app_state.rs ---
use axum::Router;
use salonsync_booking::{BookingService, WeeklySchedule};
use salonsync_common::{log_error, Repositories, SalonError};
use salonsync_config::AppConfig;
use salonsync_db::{init_schema, DbClient, SqlStore};
use salonsync_messaging::dispatcher::NotificationDispatcher;
use salonsync_messaging::reminder::{ReminderScheduler, SystemClock};
use salonsync_messaging::{
    CredentialVault, EventWorker, LineMessagingClient, MessagingState,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Everything the server shares across routes, wired once at start-up.
pub struct AppState {
    pub booking: Arc<BookingService>,
    pub messaging: Arc<MessagingState>,
    /// The background event worker; it stops once every handle is dropped.
    pub worker_task: JoinHandle<()>,
}

impl AppState {
    /// Opens the database, builds the services and starts the event worker.
    pub async fn new(config: &AppConfig) -> Result<Self, SalonError> {
        let db_client = DbClient::new(config).await?;
        init_schema(&db_client).await?;
        let repos = Repositories::shared(Arc::new(SqlStore::new(db_client)));

        let vault = Arc::new(CredentialVault::from_config(&config.vault)?);
        let line_client = Arc::new(LineMessagingClient::new(&config.messaging)?);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            vault.clone(),
            line_client.clone(),
            repos.message_logs.clone(),
        ));

        let (worker, worker_task) = EventWorker::new(
            repos.clone(),
            vault.clone(),
            dispatcher.clone(),
            line_client.clone(),
        )
        .spawn();

        let reminders = Arc::new(ReminderScheduler::new(
            repos.clone(),
            dispatcher.clone(),
            Arc::new(SystemClock),
        ));

        let booking = BookingService::new(
            repos.clone(),
            WeeklySchedule::from_config(&config.schedule)?,
        )
        .with_notifier(Arc::new(worker.clone()));

        let messaging = MessagingState {
            repos,
            vault,
            dispatcher,
            reminders,
            profiles: line_client,
            worker,
            cron_secret: config.reminder.cron_secret.clone(),
        };

        info!("Application state initialized");
        Ok(Self {
            booking: Arc::new(booking),
            messaging: Arc::new(messaging),
            worker_task,
        })
    }

    /// All API routes, nested under `/api`.
    pub fn router(&self) -> Router {
        let api = salonsync_common::routes::routes()
            .merge(salonsync_booking::routes::routes(self.booking.clone()))
            .merge(salonsync_messaging::routes(self.messaging.clone()));
        Router::new().nest("/api", api)
    }

    /// Drops the worker handles held here and waits for queued jobs to drain.
    ///
    /// Call after the server has stopped, so the router's handles are gone too.
    pub async fn shutdown(self) {
        let Self {
            booking,
            messaging,
            worker_task,
        } = self;
        drop(booking);
        drop(messaging);
        if let Err(e) = worker_task.await {
            log_error(e, "Event worker ended abnormally");
        }
    }
}
