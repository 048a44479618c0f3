// --- File: crates/salonsync_messaging/src/error.rs ---
use salonsync_common::{external_service_error, HttpStatusCode, SalonError};
use thiserror::Error;

/// Failures of the credential vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The configured key is not base64 or not 32 bytes long
    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    /// Sealing failed or no nonce could be generated
    #[error("Encryption failed")]
    EncryptionFailed,

    /// Wrong key, tampered or malformed ciphertext
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

impl From<VaultError> for SalonError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InvalidKey(msg) => SalonError::ConfigError(format!("Vault key: {}", msg)),
            VaultError::EncryptionFailed => {
                SalonError::InternalError("Credential encryption failed".to_string())
            }
            VaultError::DecryptionFailed(msg) => SalonError::DecryptionError(msg),
        }
    }
}

impl HttpStatusCode for VaultError {
    fn status_code(&self) -> u16 {
        match self {
            VaultError::InvalidKey(_) | VaultError::EncryptionFailed => 500,
            VaultError::DecryptionFailed(_) => 422,
        }
    }
}

/// Failures talking to the messaging platform.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP request itself failed
    #[error("Messaging platform request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The platform answered with a non-success status
    #[error("Messaging platform returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// The response body did not have the expected shape
    #[error("Failed to parse messaging platform response: {0}")]
    ParseError(String),
}

impl From<TransportError> for SalonError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::RequestError(e) => {
                external_service_error("Messaging platform", format!("Request error: {}", e))
            }
            TransportError::ApiError {
                status_code,
                message,
            } => external_service_error(
                "Messaging platform",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            TransportError::ParseError(msg) => SalonError::ParseError(format!(
                "Messaging platform response parse error: {}",
                msg
            )),
        }
    }
}

impl HttpStatusCode for TransportError {
    fn status_code(&self) -> u16 {
        match self {
            TransportError::RequestError(_) => 502,
            TransportError::ApiError { .. } => 502,
            TransportError::ParseError(_) => 502,
        }
    }
}
