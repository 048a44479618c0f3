// --- File: crates/salonsync_messaging/src/lib.rs ---

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod followers;
pub mod handlers;
pub mod line_client;
pub mod reminder;
pub mod routes;
#[cfg(test)]
mod routes_test;
#[cfg(test)]
mod test_support;
pub mod transport;
pub mod vault;
pub mod webhook;
pub mod worker;
#[cfg(test)]
mod worker_test;

// Re-export for main backend
pub use routes::routes;
pub use error::{TransportError, VaultError};
pub use handlers::MessagingState;
pub use line_client::LineMessagingClient;
pub use vault::CredentialVault;
pub use worker::{EventWorker, WorkerHandle};
