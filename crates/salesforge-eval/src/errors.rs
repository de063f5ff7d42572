use salesforge_store::StoreError;
use thiserror::Error;

/// Errors emitted by the audit.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("audit failed with {0} violation(s)")]
    Violations(u64),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
