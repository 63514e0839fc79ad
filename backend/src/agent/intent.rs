//! Intent Classifier
//!
//! Maps (stage, message) to a symbolic intent with an ordered rule list.
//! Slot-filling stages force their slot intent; in `general` the first
//! matching keyword rule wins. Keyword tables are slices, so evaluation
//! order never depends on hashing.

use super::knowledge::KnowledgeBase;
use super::text::{has_name_introduction, normalize_message, word_count};
use super::types::Stage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProvideName,
    ProvideCurrentRole,
    ProvideDesiredRole,
    ProvideSkills,
    GetHelp,
    ResetConversation,
    DiscussRole,
    ExploreRoles,
    SkillAnalysis,
    GetResources,
    InterviewPrep,
    SalaryInfo,
    ProjectIdeas,
    NextSteps,
    Acknowledge,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ProvideName => "provide_name",
            Intent::ProvideCurrentRole => "provide_current_role",
            Intent::ProvideDesiredRole => "provide_desired_role",
            Intent::ProvideSkills => "provide_skills",
            Intent::GetHelp => "get_help",
            Intent::ResetConversation => "reset_conversation",
            Intent::DiscussRole => "discuss_role",
            Intent::ExploreRoles => "explore_roles",
            Intent::SkillAnalysis => "skill_analysis",
            Intent::GetResources => "get_resources",
            Intent::InterviewPrep => "interview_prep",
            Intent::SalaryInfo => "salary_info",
            Intent::ProjectIdeas => "project_ideas",
            Intent::NextSteps => "next_steps",
            Intent::Acknowledge => "acknowledge",
            Intent::Unknown => "unknown",
        }
    }
}

const HELP_KEYWORDS: &[&str] = &["help", "options", "what can you do"];
pub(crate) const RESET_KEYWORDS: &[&str] = &["reset", "start over"];
pub(crate) const EXPLORE_KEYWORDS: &[&str] = &["explore", "career paths", "list roles", "what roles"];

/// Keyword rules checked after the name and role rules, in priority order
const TOPIC_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::SkillAnalysis,
        &["skill", "skills", "what should i learn", "gap analysis"],
    ),
    (Intent::GetResources, &["resources", "learn", "courses", "books"]),
    (Intent::InterviewPrep, &["interview", "preparation", "tips"]),
    (Intent::SalaryInfo, &["salary", "pay", "compensation"]),
    (
        Intent::ProjectIdeas,
        &[
            "projects",
            "project ideas",
            "portfolio",
            "examples",
            "accomplishments",
        ],
    ),
    (
        Intent::NextSteps,
        &["next career steps", "next steps", "career growth", "promotion"],
    ),
    (Intent::Acknowledge, &["thank", "thanks", "cool", "ok", "got it"]),
];

/// Maximum words in a bare message taken as a name while none is on file
const BARE_NAME_MAX_WORDS: usize = 3;

fn contains_any(normalized: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| normalized.contains(k))
}

/// Whole-message reset command, honoured even while a slot is being filled
fn is_reset_command(normalized: &str) -> bool {
    RESET_KEYWORDS.contains(&normalized)
}

/// Free-form skill declaration: "I know Rust" or "python, sql"
fn is_skill_declaration(normalized: &str) -> bool {
    normalized.starts_with("i know ") || normalized.contains(',')
}

/// Classify one user message.
///
/// `has_name` tells whether a name is already on file; a short bare message
/// is only read as a name while none is.
pub fn classify(stage: Stage, message: &str, has_name: bool, kb: &KnowledgeBase) -> Intent {
    let msg = normalize_message(message);

    let slot_intent = match stage {
        Stage::Greeting | Stage::AwaitingName => Some(Intent::ProvideName),
        Stage::AwaitingCurrentRole => Some(Intent::ProvideCurrentRole),
        Stage::AwaitingDesiredRole => Some(Intent::ProvideDesiredRole),
        Stage::AwaitingSkills => Some(Intent::ProvideSkills),
        Stage::General => None,
    };
    if let Some(intent) = slot_intent {
        if is_reset_command(&msg) {
            return Intent::ResetConversation;
        }
        return intent;
    }

    if contains_any(&msg, HELP_KEYWORDS) {
        return Intent::GetHelp;
    }
    if contains_any(&msg, RESET_KEYWORDS) {
        return Intent::ResetConversation;
    }
    if has_name_introduction(&msg) || (!has_name && word_count(&msg) <= BARE_NAME_MAX_WORDS) {
        return Intent::ProvideName;
    }
    if kb.mentions_role(&msg) {
        return Intent::DiscussRole;
    }
    if contains_any(&msg, EXPLORE_KEYWORDS) {
        return Intent::ExploreRoles;
    }

    for (intent, keywords) in TOPIC_RULES {
        if contains_any(&msg, keywords) {
            return *intent;
        }
    }

    if is_skill_declaration(&msg) {
        return Intent::ProvideSkills;
    }

    Intent::Unknown
}
