use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryBankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid project path: {0}")]
    InvalidProjectPath(String),

    #[error("Unknown agent role '{name}'. Valid roles: {valid}")]
    UnknownAgentRole { name: String, valid: String },

    #[error("API key must be provided via --api-key or the {0} environment variable")]
    MissingCredentials(String),

    #[error("No existing memory bank found at {0}. Use 'init' first.")]
    MemoryBankNotFound(String),

    #[error("Agent invocation failed: {0}")]
    AgentInvocation(String),

    #[error("Agent timed out after {0} seconds")]
    AgentTimeout(u64),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Report error: {0}")]
    Report(String),
}

impl MemoryBankError {
    /// Validation errors abort the invocation before any agent runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MemoryBankError::InvalidProjectPath(_)
                | MemoryBankError::UnknownAgentRole { .. }
                | MemoryBankError::MissingCredentials(_)
                | MemoryBankError::MemoryBankNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MemoryBankError>;
