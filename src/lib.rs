//! Placement Engine - eligibility, ranking and approval core of the campus placement portal
//!
//! This library decides whether a candidate qualifies for a job, orders and
//! filters externally scored candidate/job matches, and drives the approval
//! workflow on top of that list against the matching service.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod workflow;

// Re-export commonly used types
pub use crate::core::{classify, rank_and_filter, EligibilityClassifier};
pub use error::WorkflowError;
pub use models::{CandidateJobMatch, CandidateProfile, EligibilityResult, EligibilityStatus, JobEligibilityCriteria, MatchQuery};
pub use workflow::{ApprovalController, ApprovalOutcome, MatchView, SessionContext};
