use thiserror::Error;

/// Every failure is terminal, nothing is retried.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The provider failed or had no signer to hand out
    #[error("provider error: {0}")]
    Provider(String),

    #[error("no artifact found for contract {0}")]
    ArtifactNotFound(String),

    /// The artifact exists but can't be deployed as is
    #[error("invalid artifact for contract {name}: {reason}")]
    InvalidArtifact { name: String, reason: String },

    /// The deployment transaction was rejected before inclusion
    #[error("failed to submit deployment transaction: {0}")]
    Submission(String),

    /// The deployment transaction was submitted but never confirmed
    #[error("deployment was not confirmed: {0}")]
    Confirmation(String),
}

impl DeploymentError {
    pub fn invalid_artifact(name: impl ToString, reason: impl ToString) -> Self {
        Self::InvalidArtifact {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
