// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateJobMatch, CandidateProfile, EligibilityResult, EligibilityStatus,
    JobEligibilityCriteria, JobSummary, MatchEntry, MatchQuery, StudentRecord,
};
pub use requests::{ApproveRequest, ClassifyRequest, RankMatchesRequest};
pub use responses::{
    ApprovalResponse, ApproveResponse, ErrorResponse, FetchMatchesResponse, HealthResponse,
    MatchRow, RankMatchesResponse,
};
