use thiserror::Error;
use uuid::Uuid;

use crate::types::Platform;

pub type OutreachResult<T> = Result<T, OutreachError>;

/// Failure taxonomy for a campaign run. Quota exhaustion is deliberately
/// absent: it is a control signal that pauses the campaign, not an error.
/// Per-target soft failures are carried as `ActionOutcome` values, not
/// errors.
#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed for account {account_id}: {reason}")]
    Authentication { account_id: Uuid, reason: String },

    #[error("Security challenge detected for account {account_id} at {location}")]
    SecurityChallenge { account_id: Uuid, location: String },

    #[error("Unsupported platform: {}", .0.as_str())]
    UnsupportedPlatform(Platform),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OutreachError {
    /// Fatal before any session is acquired; maps to a distinct process
    /// exit code.
    pub fn is_configuration(&self) -> bool {
        matches!(self, OutreachError::Config(_))
    }
}
