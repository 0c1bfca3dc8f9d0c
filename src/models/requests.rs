use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{CandidateJobMatch, CandidateProfile, JobEligibilityCriteria, MatchQuery};

/// Request to classify a single profile against a job's criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub profile: CandidateProfile,
    pub criteria: JobEligibilityCriteria,
}

/// Request to rank and filter an arbitrary match list
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankMatchesRequest {
    #[serde(default)]
    pub matches: Vec<CandidateJobMatch>,
    #[validate(nested)]
    pub query: MatchQuery,
}

/// Request to approve a student for the job currently under review
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApproveRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "student_id", rename = "studentId")]
    pub student_id: String,
}
