//! Career Coach Types
//!
//! Core data structures shared by the classifier, the dialogue controller
//! and the stores: conversation stage, session profile, replies and the
//! chat log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================
// CONVERSATION STAGE
// ============================================================

/// Slot-filling position of a session's conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    AwaitingName,
    AwaitingCurrentRole,
    AwaitingDesiredRole,
    AwaitingSkills,
    General,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::AwaitingName => "awaiting_name",
            Stage::AwaitingCurrentRole => "awaiting_current_role",
            Stage::AwaitingDesiredRole => "awaiting_desired_role",
            Stage::AwaitingSkills => "awaiting_skills",
            Stage::General => "general",
        }
    }

    /// Parse a persisted stage name. Accepts the legacy `get_*` and
    /// `general_query` spellings written by earlier schema versions.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "greeting" => Some(Stage::Greeting),
            "awaiting_name" | "get_name" => Some(Stage::AwaitingName),
            "awaiting_current_role" | "get_current_role" => Some(Stage::AwaitingCurrentRole),
            "awaiting_desired_role" | "get_desired_role" => Some(Stage::AwaitingDesiredRole),
            "awaiting_skills" | "get_skills" => Some(Stage::AwaitingSkills),
            "general" | "general_query" => Some(Stage::General),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// CHAT TOPIC
// ============================================================

/// Last topic discussed. Advisory only; the controller never branches on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatTopic {
    RoleOverview,
    RoleList,
    SkillGapResults,
    ResourcesProvided,
    InterviewTipsProvided,
    SalaryDiscussed,
    ProjectIdeasProvided,
    NextStepsProvided,
}

// ============================================================
// SESSION PROFILE
// ============================================================

/// Everything the coach remembers about one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionProfile {
    pub session_id: String,
    pub name: Option<String>,
    /// Self-reported current role, stored verbatim
    pub current_role_text: Option<String>,
    /// Key into the knowledge base
    pub desired_role_key: Option<String>,
    /// Lower-cased, trimmed skill tokens
    pub skills: BTreeSet<String>,
    pub goals: Vec<String>,
    pub stage: Stage,
    pub chat_topic: Option<ChatTopic>,
}

impl SessionProfile {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            name: None,
            current_role_text: None,
            desired_role_key: None,
            skills: BTreeSet::new(),
            goals: Vec::new(),
            stage: Stage::Greeting,
            chat_topic: None,
        }
    }

    /// Clear every field back to a brand-new session, keeping the id
    pub fn reset(&mut self) {
        *self = Self::new(&self.session_id);
    }

    /// Merge skill tokens into the set. Returns how many were new.
    pub fn merge_skills<I>(&mut self, skills: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.skills.len();
        self.skills.extend(skills);
        self.skills.len() - before
    }

    /// Name to address the user with, if one was given and is not the placeholder
    pub fn personal_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty() && *n != crate::agent::text::PLACEHOLDER_NAME)
    }
}

// ============================================================
// REPLY
// ============================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    #[default]
    Text,
    QuickReplyPrompt,
}

impl ReplyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Text => "text",
            ReplyKind::QuickReplyPrompt => "quick_reply_prompt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ReplyKind::Text),
            "quick_reply_prompt" => Some(ReplyKind::QuickReplyPrompt),
            _ => None,
        }
    }
}

/// Structured assistant reply: Markdown text plus suggested quick replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
    pub quick_replies: Vec<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::Text,
            quick_replies: Vec::new(),
        }
    }

    pub fn prompt<S: Into<String>>(text: impl Into<String>, quick_replies: Vec<S>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::QuickReplyPrompt,
            quick_replies: quick_replies.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================
// CHAT MESSAGE LOG
// ============================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "assistant" | "ai" => Some(Sender::Assistant),
            _ => None,
        }
    }
}

/// One append-only chat history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub session_id: String,
    pub sender: Sender,
    pub body: String,
    pub reply_kind: ReplyKind,
    pub suggested_replies: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn from_user(session_id: &str, body: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            sender: Sender::User,
            body: body.to_string(),
            reply_kind: ReplyKind::Text,
            suggested_replies: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_reply(session_id: &str, reply: &Reply) -> Self {
        Self {
            session_id: session_id.to_string(),
            sender: Sender::Assistant,
            body: reply.text.clone(),
            reply_kind: reply.kind,
            suggested_replies: reply.quick_replies.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_legacy_names() {
        assert_eq!(Stage::from_str("general_query"), Some(Stage::General));
        assert_eq!(Stage::from_str("get_skills"), Some(Stage::AwaitingSkills));
        assert_eq!(Stage::from_str("nonsense"), None);
        assert_eq!(Stage::from_str(Stage::AwaitingName.as_str()), Some(Stage::AwaitingName));
    }

    #[test]
    fn test_reset_keeps_session_id() {
        let mut profile = SessionProfile::new("abc");
        profile.name = Some("Alex".to_string());
        profile.stage = Stage::General;
        profile.merge_skills(vec!["python".to_string()]);
        profile.goals.push("ship a side project".to_string());

        profile.reset();
        assert_eq!(profile, SessionProfile::new("abc"));
    }

    #[test]
    fn test_merge_skills_is_union() {
        let mut profile = SessionProfile::new("abc");
        assert_eq!(profile.merge_skills(vec!["python".into(), "sql".into()]), 2);
        assert_eq!(profile.merge_skills(vec!["sql".into(), "excel".into()]), 1);
        let skills: Vec<&str> = profile.skills.iter().map(String::as_str).collect();
        assert_eq!(skills, vec!["excel", "python", "sql"]);
    }

    #[test]
    fn test_reply_kind_serializes_snake_case() {
        let reply = Reply::prompt("pick one", vec!["a", "b"]);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["kind"], "quick_reply_prompt");
        assert_eq!(json["quick_replies"][1], "b");
    }
}
