use std::collections::HashSet;

/// Normalise a skill token for comparison
#[inline]
pub fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Overlap between a candidate's skills and a job's required skills
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkillOverlap {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillOverlap {
    pub fn is_full(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_none(&self) -> bool {
        self.matched.is_empty() && !self.missing.is_empty()
    }
}

/// Split `required` into the skills the candidate has and the ones they lack.
///
/// Matching is exact per token after trimming and lowercasing. Both lists keep
/// the order and spelling of `required`.
pub fn skill_overlap(candidate: &[String], required: &[String]) -> SkillOverlap {
    let owned: HashSet<String> = candidate.iter().map(|s| normalize_skill(s)).collect();

    let (matched, missing): (Vec<String>, Vec<String>) = required
        .iter()
        .cloned()
        .partition(|skill| owned.contains(&normalize_skill(skill)));

    SkillOverlap { matched, missing }
}
