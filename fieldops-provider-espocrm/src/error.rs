use fieldops_core::error::FieldOpsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EspoError {
    #[error(transparent)]
    Config(#[from] FieldOpsError),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Request to {entity} failed: {source}")]
    Http {
        entity: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{entity} returned HTTP {status}: {body}")]
    Status {
        entity: String,
        status: u16,
        body: String,
    },

    #[error("Could not decode {entity} response: {reason}")]
    Decode { entity: String, reason: String },

    #[error("{entity} did not answer within {secs}s")]
    Timeout { entity: String, secs: u64 },
}

impl EspoError {
    /// 401/403: the stored token is wrong or expired
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EspoError::Status { status: 401 | 403, .. })
    }
}

pub type EspoResult<T> = Result<T, EspoError>;
