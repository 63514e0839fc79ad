//! Career Knowledge Base
//!
//! Read-only table of career paths the coach can talk about. Records keep
//! their declaration order; every scan over the table (role matching,
//! listings) walks that order so replies are reproducible.

use super::text::mentions_term;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CAREER_PATHS: &str = include_str!("../../data/career_paths.json");

/// One learning-resource category for a role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LearningResource {
    pub category: String,
    pub description: String,
}

/// A career path entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    pub key: String,
    pub name: String,
    /// Alias phrases, stored lower-case
    pub keywords: Vec<String>,
    pub responsibilities_summary: String,
    /// Skill tokens in underscore-separated canonical form
    pub required_skills: Vec<String>,
    pub soft_skills_emphasis: Vec<String>,
    pub salary_range: String,
    #[serde(default)]
    pub common_next_steps: Vec<String>,
    pub learning_resources: Vec<LearningResource>,
    pub interview_focus: Vec<String>,
    pub example_projects: Vec<String>,
}

impl RoleRecord {
    /// Display name lower-cased for matching
    pub fn match_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn resource(&self, category: &str) -> Option<&LearningResource> {
        self.learning_resources.iter().find(|r| r.category == category)
    }
}

#[derive(Debug, Deserialize)]
struct CareerPathsFile {
    roles: Vec<RoleRecord>,
}

#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    #[error("Failed to read career paths file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid career paths JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Duplicate role key: {0}")]
    DuplicateKey(String),

    #[error("Role '{0}' has an empty display name")]
    EmptyName(String),

    #[error("Career paths table is empty")]
    Empty,
}

/// Immutable role table with canonical ordering
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    roles: Vec<RoleRecord>,
}

impl KnowledgeBase {
    /// Build from records, validating key uniqueness
    pub fn new(mut roles: Vec<RoleRecord>) -> Result<Self, KnowledgeBaseError> {
        if roles.is_empty() {
            return Err(KnowledgeBaseError::Empty);
        }

        let mut seen = HashSet::new();
        for role in &mut roles {
            if role.name.trim().is_empty() {
                return Err(KnowledgeBaseError::EmptyName(role.key.clone()));
            }
            if !seen.insert(role.key.clone()) {
                return Err(KnowledgeBaseError::DuplicateKey(role.key.clone()));
            }
            for keyword in &mut role.keywords {
                *keyword = keyword.trim().to_lowercase();
            }
            role.keywords.retain(|k| !k.is_empty());
        }

        Ok(Self { roles })
    }

    /// The table shipped with the crate
    pub fn builtin() -> Result<Self, KnowledgeBaseError> {
        Self::from_json(BUILTIN_CAREER_PATHS)
    }

    pub fn from_json(json: &str) -> Result<Self, KnowledgeBaseError> {
        let file: CareerPathsFile = serde_json::from_str(json)?;
        Self::new(file.roles)
    }

    pub fn load(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let json = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// All roles in canonical order
    pub fn all_roles(&self) -> &[RoleRecord] {
        &self.roles
    }

    /// Case-sensitive key lookup
    pub fn role_by_key(&self, key: &str) -> Option<&RoleRecord> {
        self.roles.iter().find(|r| r.key == key)
    }

    /// Resolve a message to a role. First tier wins: exact name, then keyword
    /// containment, then name containment. A contained term must start a word
    /// and may carry a suffix ("data scientists"); short aliases like "pm" must
    /// stand alone, so they do not fire inside "development".
    pub fn match_role(&self, message: &str) -> Option<&RoleRecord> {
        let msg = message.trim().to_lowercase();
        if msg.is_empty() {
            return None;
        }

        self.roles
            .iter()
            .find(|r| r.match_name() == msg)
            .or_else(|| {
                self.roles
                    .iter()
                    .find(|r| r.keywords.iter().any(|k| mentions_term(&msg, k)))
            })
            .or_else(|| {
                self.roles
                    .iter()
                    .find(|r| mentions_term(&msg, &r.match_name()))
            })
    }

    /// True if the message mentions any role keyword or display name
    pub fn mentions_role(&self, normalized: &str) -> bool {
        self.roles.iter().any(|r| {
            r.keywords.iter().any(|k| mentions_term(normalized, k))
                || mentions_term(normalized, &r.match_name())
        })
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_role(key: &str, name: &str, keywords: &[&str]) -> RoleRecord {
        RoleRecord {
            key: key.to_string(),
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            responsibilities_summary: format!("{} things", name),
            required_skills: vec!["python".to_string()],
            soft_skills_emphasis: vec![],
            salary_range: "$1 - $2".to_string(),
            common_next_steps: vec![],
            learning_resources: vec![],
            interview_focus: vec![],
            example_projects: vec![],
        }
    }

    #[test]
    fn test_builtin_table_order() {
        let kb = KnowledgeBase::builtin().unwrap();
        let keys: Vec<&str> = kb.all_roles().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "software_engineer",
                "data_scientist",
                "product_manager",
                "ux_ui_designer",
                "digital_marketing_specialist",
                "human_resources_manager",
                "graphic_designer",
                "teacher_educator",
            ]
        );
        let se = kb.role_by_key("software_engineer").unwrap();
        assert_eq!(se.learning_resources[0].category, "foundational");
        assert!(se.required_skills.contains(&"algorithms".to_string()));
    }

    #[test]
    fn test_key_lookup_is_case_sensitive() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(kb.role_by_key("data_scientist").is_some());
        assert!(kb.role_by_key("Data_Scientist").is_none());
    }

    #[test]
    fn test_match_role_tiers() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.match_role("Software Engineer").unwrap().key, "software_engineer");
        assert_eq!(
            kb.match_role("I want to be a Data Scientist").unwrap().key,
            "data_scientist"
        );
        assert_eq!(kb.match_role("maybe a ux designer?").unwrap().key, "ux_ui_designer");
        assert!(kb.match_role("astronaut").is_none());
        assert!(kb.match_role("   ").is_none());
    }

    #[test]
    fn test_match_role_uses_declaration_order() {
        // "visual designer" is an alias of both design roles; the first declared wins
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.match_role("visual designer").unwrap().key, "ux_ui_designer");

        let kb = KnowledgeBase::new(vec![
            sample_role("b_role", "Beta", &["shared alias"]),
            sample_role("a_role", "Alpha", &["shared alias"]),
        ])
        .unwrap();
        assert_eq!(kb.match_role("my shared alias").unwrap().key, "b_role");
    }

    #[test]
    fn test_exact_name_beats_keyword() {
        let kb = KnowledgeBase::new(vec![
            sample_role("first", "First", &["second"]),
            sample_role("second", "Second", &[]),
        ])
        .unwrap();
        assert_eq!(kb.match_role("second").unwrap().key, "second");
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = KnowledgeBase::new(vec![
            sample_role("dup", "One", &[]),
            sample_role("dup", "Two", &[]),
        ]);
        assert!(matches!(result, Err(KnowledgeBaseError::DuplicateKey(k)) if k == "dup"));
    }

    #[test]
    fn test_keywords_lowercased_on_load() {
        let kb = KnowledgeBase::new(vec![sample_role("x", "X Role", &["  Big Alias "])]).unwrap();
        assert_eq!(kb.all_roles()[0].keywords, vec!["big alias"]);
        assert!(kb.mentions_role("this big alias here"));
    }

    #[test]
    fn test_load_errors() {
        let missing = KnowledgeBase::load(Path::new("/nonexistent/career_paths.json"));
        assert!(matches!(missing, Err(KnowledgeBaseError::Io { .. })));

        assert!(matches!(
            KnowledgeBase::from_json(r#"{"roles": "nope"}"#),
            Err(KnowledgeBaseError::InvalidJson(_))
        ));
        assert!(matches!(
            KnowledgeBase::from_json(r#"{"roles": []}"#),
            Err(KnowledgeBaseError::Empty)
        ));
    }

    #[test]
    fn test_short_aliases_need_word_boundaries() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(!kb.mentions_role("areas for development"));
        assert!(!kb.mentions_role("that answer helps"));
        assert!(kb.mentions_role("salary for a pm?"));
        assert_eq!(kb.match_role("maybe pm").unwrap().key, "product_manager");
    }

    #[test]
    fn test_inflected_role_names_match() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(
            kb.match_role("I'm interested in software engineering").unwrap().key,
            "software_engineer"
        );
        assert_eq!(
            kb.match_role("I'd like to work with data scientists").unwrap().key,
            "data_scientist"
        );
        assert!(kb.mentions_role("what do developers earn"));
        assert!(!kb.mentions_role("more pms please"));
    }
}
