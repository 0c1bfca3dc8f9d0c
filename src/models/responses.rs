use serde::{Deserialize, Serialize};
use crate::models::domain::{CandidateJobMatch, EligibilityResult, JobSummary, MatchEntry};

/// Payload of the matching service's match list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMatchesResponse {
    pub job: JobSummary,
    pub total: usize,
    #[serde(default)]
    pub matches: Vec<MatchEntry>,
}

/// Payload of the matching service's approval endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankMatchesResponse {
    pub matches: Vec<CandidateJobMatch>,
    pub total_results: usize,
}

/// A displayed match row, annotated when the job carries eligibility criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRow {
    #[serde(flatten)]
    pub entry: MatchEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<EligibilityResult>,
}

/// Approval endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub success: bool,
    pub outcome: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
