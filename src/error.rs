use crate::services::MatchingServiceError;
use thiserror::Error;

/// Errors surfaced by the approval workflow controller
///
/// All of them are displayable and leave the controller in a consistent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed query input, detected before any request is issued
    #[error("invalid query: {0}")]
    Validation(String),

    /// The matching service could not be reached or answered with a failure status
    #[error("matching service error: {0}")]
    Transport(String),

    /// The matching service answered but refused the operation
    #[error("{0}")]
    Application(String),

    /// An approval for the same student and job is already in flight
    #[error("approval for student {student_id} is already in progress")]
    ApprovalInProgress { student_id: String },
}

impl WorkflowError {
    /// Short machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::Transport(_) => "transport_error",
            WorkflowError::Application(_) => "application_error",
            WorkflowError::ApprovalInProgress { .. } => "approval_in_progress",
        }
    }
}

impl From<MatchingServiceError> for WorkflowError {
    fn from(err: MatchingServiceError) -> Self {
        WorkflowError::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        WorkflowError::Validation(errors.to_string())
    }
}
