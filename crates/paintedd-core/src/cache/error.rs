use thiserror::Error;

use super::LifecycleState;
use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache manager is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },

    #[error("Install failed fetching {url}: {source}")]
    InstallFailed {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Network(#[from] ApiError),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Cache storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Corrupt cache data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Background revalidation aborted: {0}")]
    Background(String),
}
