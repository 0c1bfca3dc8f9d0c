use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Academic snapshot of a candidate, as supplied by the matching service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub cgpa: f64,
    pub branch: String,
    pub batch: u16,
    #[serde(rename = "hasActiveBacklogs", default)]
    pub has_active_backlogs: bool,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Eligibility rules attached to a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEligibilityCriteria {
    #[serde(rename = "minCgpa")]
    pub min_cgpa: f64,
    #[serde(rename = "eligibleBranches")]
    pub eligible_branches: BTreeSet<String>,
    #[serde(rename = "eligibleBatches")]
    pub eligible_batches: BTreeSet<u16>,
    #[serde(rename = "noBacklogsAllowed", default)]
    pub no_backlogs_allowed: bool,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    PartiallyEligible,
    NotEligible,
}

/// Outcome of classifying a profile against a job. `reasons` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub status: EligibilityStatus,
    pub reasons: Vec<String>,
}

/// A candidate/job pair scored by the matching service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateJobMatch {
    pub id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    /// `None` means unknown, which is distinct from a score of zero.
    #[serde(rename = "skillMatchScore", default)]
    pub skill_match_score: Option<f64>,
    #[serde(rename = "atsScore", default)]
    pub ats_score: Option<f64>,
    #[serde(default)]
    pub approved: bool,
}

/// Parameters of a match list request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MatchQuery {
    #[validate(length(min = 1))]
    #[serde(rename = "jobSource")]
    pub job_source: String,
    #[validate(length(min = 1))]
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_limit")]
    pub limit: u16,
    #[serde(rename = "maxScoreThreshold", default)]
    pub max_score_threshold: Option<f64>,
    #[serde(rename = "approvedOnly", default)]
    pub approved_only: bool,
}

fn default_limit() -> u16 {
    50
}

impl MatchQuery {
    pub fn new(job_source: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            job_source: job_source.into(),
            job_id: job_id.into(),
            limit: default_limit(),
            max_score_threshold: None,
            approved_only: false,
        }
    }

    /// Whether switching from `other` to `self` requires a new fetch.
    ///
    /// `limit` only shapes the upstream request and is not part of the key.
    pub fn needs_refetch(&self, other: &MatchQuery) -> bool {
        self.job_source != other.job_source
            || self.job_id != other.job_id
            || self.approved_only != other.approved_only
            || !same_threshold(self.max_score_threshold, other.max_score_threshold)
    }
}

fn same_threshold(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.to_bits() == y.to_bits(),
        _ => false,
    }
}

/// Job header returned alongside a match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub eligibility: Option<JobEligibilityCriteria>,
}

/// Candidate profile plus identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: CandidateProfile,
}

/// One row of a match list as delivered by the matching service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub student: StudentRecord,
    #[serde(rename = "match")]
    pub candidate_match: CandidateJobMatch,
}
