use thiserror::Error;

use crate::request::{RequestId, RequestStatus};

/// A required field was missing or malformed. Shown inline next to the field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure reading or writing a storage slot.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage quota exceeded: need {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("slot `{slot}` is unreadable: {source}")]
    Corrupt {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("slot `{slot}` holds an id at the top of the id range; no newer id can be assigned")]
    IdsExhausted { slot: String },

    #[error("I/O error on slot `{slot}`: {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },
}

/// A resolution that the request lifecycle does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no purchase request with id {0}")]
    UnknownRequest(RequestId),

    #[error("request {id} is already {status}")]
    AlreadyResolved { id: RequestId, status: RequestStatus },

    #[error("`{0}` is not a resolution; use accepted or rejected")]
    NotAResolution(RequestStatus),
}

/// Every error a ledger operation can surface. None of them are fatal to the host.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),

    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
