use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("missing reference: {0}")]
    MissingReference(String),
    #[error("row {row} of '{table}' still violates a unique constraint after {attempts} attempts")]
    Exhausted {
        table: String,
        row: u64,
        attempts: u32,
    },
}
