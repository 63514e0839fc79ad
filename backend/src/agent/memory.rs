//! Coach Memory Module
//!
//! SQLite-backed persistence for session profiles and the chat log.
//! The profile row keeps structured columns for the slots and a small
//! `conversation_context` JSON document holding the stage and last topic.
//! Rows written by older schema versions (legacy stage names, missing or
//! malformed JSON) still load; broken parts fall back to defaults.

use super::store::{lock, MessageLog, ProfileStore, StoreError};
use super::types::{ChatMessage, ChatTopic, ReplyKind, Sender, SessionProfile, Stage};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS profiles (
        session_id TEXT PRIMARY KEY,
        name TEXT,
        current_role TEXT,
        desired_role_key TEXT,
        skills TEXT NOT NULL DEFAULT '[]',
        goals TEXT NOT NULL DEFAULT '[]',
        conversation_context TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        last_active TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chat_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        sender TEXT NOT NULL,
        body TEXT NOT NULL,
        reply_kind TEXT NOT NULL DEFAULT 'text',
        suggested_replies TEXT NOT NULL DEFAULT '[]',
        timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_history_session ON chat_history(session_id);
";

// ============================================================
// CONVERSATION CONTEXT
// ============================================================

/// Persisted shape of the `conversation_context` column
#[derive(Debug, Serialize)]
struct ConversationContext<'a> {
    stage: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_topic: Option<ChatTopic>,
}

/// Lenient read side of [`ConversationContext`]
#[derive(Debug, Default, Deserialize)]
struct StoredContext {
    stage: Option<String>,
    chat_topic: Option<serde_json::Value>,
}

fn decode_context(session_id: &str, raw: &str) -> (Stage, Option<ChatTopic>) {
    let context: StoredContext = match serde_json::from_str(raw) {
        Ok(context) => context,
        Err(e) => {
            log::warn!(
                "Session {}: unreadable conversation context ({}), resuming at 'general'",
                session_id,
                e
            );
            return (Stage::General, None);
        }
    };

    let stage = match context.stage.as_deref().and_then(Stage::from_str) {
        Some(stage) => stage,
        None => {
            log::warn!(
                "Session {}: unknown stage {:?}, resuming at 'general'",
                session_id,
                context.stage
            );
            Stage::General
        }
    };

    // Topics are advisory; an unknown one is simply dropped
    let chat_topic = context
        .chat_topic
        .and_then(|v| serde_json::from_value::<ChatTopic>(v).ok());

    (stage, chat_topic)
}

fn decode_string_list(session_id: &str, column: &str, raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::warn!(
            "Session {}: unreadable {} column ({}), treating as empty",
            session_id,
            column,
            e
        );
        Vec::new()
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ============================================================
// MEMORY STORE (SQLite-backed)
// ============================================================

/// SQLite-backed profile store and message log
#[derive(Clone)]
pub struct MemoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl MemoryStore {
    /// Open (or create) the database at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Write a raw `conversation_context` value. Used to exercise the
    /// legacy and malformed-row paths.
    #[cfg(test)]
    pub(crate) fn write_raw_context(&self, session_id: &str, raw: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn, "sqlite connection")?;
        conn.execute(
            "UPDATE profiles SET conversation_context = ?2 WHERE session_id = ?1",
            params![session_id, raw],
        )?;
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionProfile>, StoreError> {
        let conn = lock(&self.conn, "sqlite connection")?;
        let row = conn
            .query_row(
                "SELECT name, current_role, desired_role_key, skills, goals, conversation_context
                 FROM profiles WHERE session_id = ?1",
                [session_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, current_role, desired_role_key, skills, goals, context)) = row else {
            return Ok(None);
        };

        let (stage, chat_topic) = decode_context(session_id, &context);
        let skills: BTreeSet<String> = decode_string_list(session_id, "skills", &skills)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Some(SessionProfile {
            session_id: session_id.to_string(),
            name,
            current_role_text: current_role,
            desired_role_key,
            skills,
            goals: decode_string_list(session_id, "goals", &goals),
            stage,
            chat_topic,
        }))
    }

    fn save(&self, profile: &SessionProfile) -> Result<(), StoreError> {
        let skills = serde_json::to_string(&profile.skills)?;
        let goals = serde_json::to_string(&profile.goals)?;
        let context = serde_json::to_string(&ConversationContext {
            stage: profile.stage.as_str(),
            chat_topic: profile.chat_topic,
        })?;
        let now = Utc::now().to_rfc3339();

        let conn = lock(&self.conn, "sqlite connection")?;
        conn.execute(
            "INSERT INTO profiles
                (session_id, name, current_role, desired_role_key, skills, goals,
                 conversation_context, created_at, last_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(session_id) DO UPDATE SET
                name = excluded.name,
                current_role = excluded.current_role,
                desired_role_key = excluded.desired_role_key,
                skills = excluded.skills,
                goals = excluded.goals,
                conversation_context = excluded.conversation_context,
                last_active = excluded.last_active",
            params![
                profile.session_id,
                profile.name,
                profile.current_role_text,
                profile.desired_role_key,
                skills,
                goals,
                context,
                now,
            ],
        )?;
        Ok(())
    }
}

impl MessageLog for MemoryStore {
    fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let suggested = serde_json::to_string(&message.suggested_replies)?;
        let conn = lock(&self.conn, "sqlite connection")?;
        conn.execute(
            "INSERT INTO chat_history (session_id, sender, body, reply_kind, suggested_replies, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.session_id,
                message.sender.as_str(),
                message.body,
                message.reply_kind.as_str(),
                suggested,
                message.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let conn = lock(&self.conn, "sqlite connection")?;
        let mut stmt = conn.prepare(
            "SELECT sender, body, reply_kind, suggested_replies, timestamp
             FROM chat_history
             WHERE session_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (sender, body, reply_kind, suggested, timestamp) = row?;
            let Some(sender) = Sender::from_str(&sender) else {
                log::warn!("Session {}: skipping message with sender '{}'", session_id, sender);
                continue;
            };
            messages.push(ChatMessage {
                session_id: session_id.to_string(),
                sender,
                body,
                reply_kind: ReplyKind::from_str(&reply_kind).unwrap_or_default(),
                suggested_replies: decode_string_list(session_id, "suggested_replies", &suggested),
                timestamp: parse_timestamp(&timestamp),
            });
        }
        Ok(messages)
    }
}
