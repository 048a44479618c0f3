// --- File: crates/salonsync_common/src/lib.rs ---

pub mod context; // Per-request owner context
pub mod error; // Error handling
pub mod handlers; // Shared HTTP handlers
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Domain models
pub mod routes; // Route definitions
pub mod services; // Storage ports
pub mod time; // Salon-local dates

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use routes::routes;

pub use error::{
    config_error, conflict, external_service_error, internal_error, not_found, validation_error,
    HttpStatusCode, SalonError,
};

pub use http::{client::create_client, IntoHttpResponse, RECONFIGURE_CHANNEL_MESSAGE};

pub use logging::{init, init_with_level, log_error, log_result};

pub use context::OwnerContext;
pub use services::Repositories;
