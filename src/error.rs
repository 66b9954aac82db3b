use thiserror::Error;

#[derive(Error, Debug)]
pub enum DonationError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Donation initiation failed: {message}")]
    Initiation { message: String },
    #[error("Verification of payment {pidx} failed: {message}")]
    Verification { pidx: String, message: String },
    #[error("Verification of payment {pidx} attempted {attempts} times, giving up")]
    RetryExhausted { pidx: String, attempts: u32 },
    #[error("Backend responded with {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl DonationError {
    /// The message a user should see for a failed backend call.
    ///
    /// Backend rejections carry their own text; everything else falls back to
    /// the error's display form.
    pub fn backend_message(&self) -> String {
        match self {
            DonationError::Backend { message, .. } | DonationError::Unauthorized(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for DonationError {
    fn from(err: std::io::Error) -> Self {
        DonationError::InternalError(Box::new(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for DonationError {
    fn from(err: rocksdb::Error) -> Self {
        DonationError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, DonationError>;
