use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Transport-level failures worth retrying (timeouts, resets, refused connections).
    pub fn is_transient(&self) -> bool {
        match self {
            BridgeError::Timeout(_) => true,
            BridgeError::OperationFailed(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("connection") || msg.contains("timed out") || msg.contains("reset")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
