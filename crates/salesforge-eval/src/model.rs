use serde::{Deserialize, Serialize};

/// Options for the post-population audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditOptions {
    /// Fail when any check reports a violation.
    pub strict: bool,
    /// Limit the number of violations listed in the markdown report.
    pub max_examples: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_examples: 20,
        }
    }
}

/// Structured violation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub path: String,
    pub message: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}
