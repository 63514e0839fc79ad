//! Skill-Gap Analyzer
//!
//! Compares a profile's skills with a role's required and emphasized soft
//! skills. Pure and uncached: every call reflects the skills passed in.

use super::knowledge::RoleRecord;
use super::text::normalize_skill;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Matched and missing skills, both sorted ascending in normalized form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillGapAnalysis {
    pub role_key: String,
    pub matching: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillGapAnalysis {
    pub fn is_strong_foundation(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillGapOutcome {
    /// No skills on file, nothing to compare
    NeedsSkills,
    Analysis(SkillGapAnalysis),
}

/// Target skill set of a role in normalized form
pub fn target_skills(role: &RoleRecord) -> BTreeSet<String> {
    role.required_skills
        .iter()
        .chain(role.soft_skills_emphasis.iter())
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn analyze<'a, I>(role: &RoleRecord, possessed: I) -> SkillGapOutcome
where
    I: IntoIterator<Item = &'a String>,
{
    let possessed: BTreeSet<String> = possessed
        .into_iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect();

    if possessed.is_empty() {
        return SkillGapOutcome::NeedsSkills;
    }

    let target = target_skills(role);
    SkillGapOutcome::Analysis(SkillGapAnalysis {
        role_key: role.key.clone(),
        matching: target.intersection(&possessed).cloned().collect(),
        missing: target.difference(&possessed).cloned().collect(),
    })
}
