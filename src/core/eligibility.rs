use crate::core::skills::skill_overlap;
use crate::models::{CandidateProfile, EligibilityResult, EligibilityStatus, JobEligibilityCriteria};

/// Reason reported when every rule passes
pub const ELIGIBLE_MESSAGE: &str = "meets all eligibility criteria.";

/// Eligibility classifier
///
/// Every rule is evaluated on every call; reasons accumulate and the status is
/// decided only once all checks have run.
///
/// # Rules
/// 1. Hard: minimum CGPA, branch, batch, active backlogs
/// 2. Soft: required skill overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityClassifier {
    include_skill_gaps_when_ineligible: bool,
}

impl EligibilityClassifier {
    pub fn new(include_skill_gaps_when_ineligible: bool) -> Self {
        Self { include_skill_gaps_when_ineligible }
    }

    /// Classify `profile` against `criteria`. Never fails; NaN inputs fail
    /// the rule they take part in.
    pub fn classify(
        &self,
        profile: &CandidateProfile,
        criteria: &JobEligibilityCriteria,
    ) -> EligibilityResult {
        let mut hard_violations = Vec::new();
        let mut skill_gaps = Vec::new();

        // `!(a >= b)` so that NaN on either side counts as a failure
        if !(profile.cgpa >= criteria.min_cgpa) {
            hard_violations.push(format!(
                "CGPA {} is below the required minimum {}",
                profile.cgpa, criteria.min_cgpa
            ));
        }

        if !criteria.eligible_branches.contains(&profile.branch) {
            hard_violations.push(format!(
                "branch {} is not eligible (allowed: {})",
                profile.branch,
                join_or_none(criteria.eligible_branches.iter())
            ));
        }

        if !criteria.eligible_batches.contains(&profile.batch) {
            hard_violations.push(format!(
                "batch {} is not eligible (allowed: {})",
                profile.batch,
                join_or_none(criteria.eligible_batches.iter())
            ));
        }

        if criteria.no_backlogs_allowed && profile.has_active_backlogs {
            hard_violations.push("has active backlogs but the job allows none".to_string());
        }

        let overlap = skill_overlap(&profile.skills, &criteria.required_skills);
        if overlap.is_none() {
            skill_gaps.push(format!("missing all required skills: {}", overlap.missing.join(", ")));
        } else if !overlap.is_full() {
            skill_gaps.push(format!("missing some skills: {}", overlap.missing.join(", ")));
        }

        if !hard_violations.is_empty() {
            if self.include_skill_gaps_when_ineligible {
                hard_violations.extend(skill_gaps);
            }
            EligibilityResult {
                status: EligibilityStatus::NotEligible,
                reasons: hard_violations,
            }
        } else if !skill_gaps.is_empty() {
            EligibilityResult {
                status: EligibilityStatus::PartiallyEligible,
                reasons: skill_gaps,
            }
        } else {
            EligibilityResult {
                status: EligibilityStatus::Eligible,
                reasons: vec![ELIGIBLE_MESSAGE.to_string()],
            }
        }
    }
}

/// Classify with the default classifier (skill gaps omitted from ineligible results)
pub fn classify(profile: &CandidateProfile, criteria: &JobEligibilityCriteria) -> EligibilityResult {
    EligibilityClassifier::default().classify(profile, criteria)
}

fn join_or_none<T: ToString>(items: impl Iterator<Item = T>) -> String {
    let joined = items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}
