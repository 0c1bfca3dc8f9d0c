// Core algorithm exports
pub mod eligibility;
pub mod ranking;
pub mod skills;

pub use eligibility::{classify, EligibilityClassifier, ELIGIBLE_MESSAGE};
pub use ranking::{rank_and_filter, rank_and_filter_by};
pub use skills::{normalize_skill, skill_overlap, SkillOverlap};
