// --- File: crates/salonsync_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all SalonSync errors.
///
/// Crate specific errors (database, vault, transport) convert into this enum
/// so handlers only ever deal with one taxonomy.
#[derive(Error, Debug)]
pub enum SalonError {
    /// Malformed input: bad interval, missing field, illegal transition
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The requested slot overlaps an existing booking
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Unknown appointment, customer, channel or webhook token
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Missing or incorrect credentials (bearer secret)
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Credentials were presented but rejected (webhook signature)
    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    /// An external call (push transport, profile API) failed
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// A stored credential can no longer be decrypted with the current key.
    /// Not retried; the salon owner has to re-enter the secret.
    #[error("Decryption error: {0}")]
    DecryptionError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for SalonError {
    fn status_code(&self) -> u16 {
        match self {
            SalonError::ValidationError(_) => 400,
            SalonError::ConflictError(_) => 409,
            SalonError::NotFoundError(_) => 404,
            SalonError::AuthError(_) => 401,
            SalonError::ForbiddenError(_) => 403,
            SalonError::ExternalServiceError { .. } => 502,
            SalonError::DecryptionError(_) => 422,
            SalonError::ParseError(_) => 400,
            SalonError::DatabaseError(_) => 500,
            SalonError::ConfigError(_) => 500,
            SalonError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for SalonError {
    fn from(err: reqwest::Error) -> Self {
        external_service_error("HTTP", err)
    }
}

impl From<serde_json::Error> for SalonError {
    fn from(err: serde_json::Error) -> Self {
        SalonError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> SalonError {
    SalonError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> SalonError {
    SalonError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> SalonError {
    SalonError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> SalonError {
    SalonError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> SalonError {
    SalonError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> SalonError {
    SalonError::InternalError(message.to_string())
}
