/// Errors from storage backend operations and routing.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} on '{target}' failed ({status}): {stderr}")]
    CommandFailed {
        op: &'static str,
        target: String,
        status: String,
        stderr: String,
    },

    #[error("Malformed {op} output for '{target}': {message}")]
    Malformed {
        op: &'static str,
        target: String,
        message: String,
    },

    #[error("All storage targets are full ({tried} checked)")]
    AllTargetsFull { tried: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn malformed(op: &'static str, target: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            op,
            target: target.to_string(),
            message: message.into(),
        }
    }
}
