use crate::error::WorkflowError;
use crate::models::MatchQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of an approval: one student for one job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApprovalKey {
    pub job_source: String,
    pub job_id: String,
    pub student_id: String,
}

impl ApprovalKey {
    pub fn new(query: &MatchQuery, student_id: &str) -> Self {
        Self {
            job_source: query.job_source.clone(),
            job_id: query.job_id.clone(),
            student_id: student_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Unapproved,
    Approving,
    Approved,
}

/// Result of a successful `approve` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    /// The service accepted the approval
    Approved,
    /// Nothing to do, no request was sent
    AlreadyApproved,
}

/// Per-triple approval state machine.
///
/// `Unapproved -> Approving -> Approved`; a failed request drops back to
/// `Unapproved`. `Approved` is never left.
#[derive(Debug, Default)]
pub struct ApprovalLedger {
    states: HashMap<ApprovalKey, ApprovalState>,
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &ApprovalKey) -> ApprovalState {
        self.states.get(key).copied().unwrap_or(ApprovalState::Unapproved)
    }

    /// Move `key` into `Approving`.
    ///
    /// Returns `Some(AlreadyApproved)` when there is nothing to do and `None`
    /// when the caller should issue the request.
    pub fn begin(&mut self, key: &ApprovalKey) -> Result<Option<ApprovalOutcome>, WorkflowError> {
        match self.state(key) {
            ApprovalState::Approved => Ok(Some(ApprovalOutcome::AlreadyApproved)),
            ApprovalState::Approving => Err(WorkflowError::ApprovalInProgress {
                student_id: key.student_id.clone(),
            }),
            ApprovalState::Unapproved => {
                self.states.insert(key.clone(), ApprovalState::Approving);
                Ok(None)
            }
        }
    }

    pub fn succeed(&mut self, key: &ApprovalKey) {
        self.states.insert(key.clone(), ApprovalState::Approved);
    }

    /// Revert a failed approval; no partial state is kept
    pub fn fail(&mut self, key: &ApprovalKey) {
        if self.state(key) == ApprovalState::Approving {
            self.states.remove(key);
        }
    }

    /// Drop settled entries for every job except the one `query` points at.
    /// In-flight approvals are kept until they finish.
    pub fn retain_job(&mut self, query: &MatchQuery) {
        self.states.retain(|key, state| {
            *state == ApprovalState::Approving
                || (key.job_source == query.job_source && key.job_id == query.job_id)
        });
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Record an approval observed in server data
    pub fn observe_approved(&mut self, key: ApprovalKey) {
        self.states.insert(key, ApprovalState::Approved);
    }
}
