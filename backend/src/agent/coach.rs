//! Career Coach Service
//!
//! Session-facing façade over the dialogue controller and the stores.
//! A turn is load → classify/respond → save → log. Turns for the same
//! session are serialized by a per-session lock; different sessions run
//! in parallel.

use super::dialogue::{DialogueController, Turn};
use super::knowledge::KnowledgeBase;
use super::store::{lock, MessageLog, ProfileStore, StoreError};
use super::types::{ChatMessage, Reply, SessionProfile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),
}

pub struct CareerCoach {
    controller: DialogueController,
    profiles: Arc<dyn ProfileStore>,
    messages: Arc<dyn MessageLog>,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CareerCoach {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        profiles: Arc<dyn ProfileStore>,
        messages: Arc<dyn MessageLog>,
    ) -> Self {
        Self {
            controller: DialogueController::new(kb),
            profiles,
            messages,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.controller.knowledge()
    }

    /// Stored profile, or a fresh default one for an unknown session
    pub fn get_profile(&self, session_id: &str) -> Result<SessionProfile, CoachError> {
        Ok(self
            .profiles
            .load(session_id)?
            .unwrap_or_else(|| SessionProfile::new(session_id)))
    }

    pub fn session_exists(&self, session_id: &str) -> Result<bool, CoachError> {
        Ok(self.profiles.load(session_id)?.is_some())
    }

    /// Create and persist a new session with a random id
    pub fn start_session(&self) -> Result<SessionProfile, CoachError> {
        let profile = SessionProfile::new(&Uuid::new_v4().to_string());
        self.profiles.save(&profile)?;
        log::info!("Started session {}", profile.session_id);
        Ok(profile)
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, CoachError> {
        Ok(self.messages.history(session_id)?)
    }

    /// Run one turn and return the reply. The profile is saved before this returns.
    pub fn handle_turn(&self, session_id: &str, message: &str) -> Result<Reply, CoachError> {
        self.turn(session_id, message).map(|turn| turn.reply)
    }

    /// Like [`handle_turn`](Self::handle_turn) but also returns the saved profile
    /// and the intents that fired.
    pub fn turn(&self, session_id: &str, message: &str) -> Result<Turn, CoachError> {
        let result = {
            let session_lock = self.turn_lock(session_id)?;
            let _guard = lock(&*session_lock, "session turn")?;
            self.run_turn(session_id, message)
        };
        self.prune_turn_locks();
        result
    }

    fn run_turn(&self, session_id: &str, message: &str) -> Result<Turn, CoachError> {
        let profile = self.get_profile(session_id)?;
        let turn = self.controller.respond(&profile, message);
        self.profiles.save(&turn.profile)?;

        self.log_message(&ChatMessage::from_user(session_id, message));
        self.log_message(&ChatMessage::from_reply(session_id, &turn.reply));
        Ok(turn)
    }

    /// Best effort: a failed append never fails the turn
    fn log_message(&self, message: &ChatMessage) {
        if let Err(e) = self.messages.append(message) {
            log::warn!(
                "Session {}: failed to log {} message: {}",
                message.session_id,
                message.sender.as_str(),
                e
            );
        }
    }

    fn turn_lock(&self, session_id: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = lock(&self.turn_locks, "turn locks")?;
        Ok(locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drop locks no turn is holding or waiting on
    fn prune_turn_locks(&self) {
        if let Ok(mut locks) = self.turn_locks.lock() {
            locks.retain(|_, l| Arc::strong_count(l) > 1);
        }
    }

    #[cfg(test)]
    fn tracked_sessions(&self) -> usize {
        self.turn_locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::store::InMemoryStore;
    use crate::agent::types::{Sender, Stage};
    use std::thread;

    struct BrokenLog;

    impl MessageLog for BrokenLog {
        fn append(&self, _message: &ChatMessage) -> Result<(), StoreError> {
            Err(StoreError::LockPoisoned("log"))
        }

        fn history(&self, _session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn coach() -> (CareerCoach, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let kb = Arc::new(KnowledgeBase::builtin().unwrap());
        (CareerCoach::new(kb, store.clone(), store.clone()), store)
    }

    #[test]
    fn test_unknown_session_gets_default_profile() {
        let (coach, _) = coach();
        let profile = coach.get_profile("nobody").unwrap();
        assert_eq!(profile, SessionProfile::new("nobody"));
        assert!(!coach.session_exists("nobody").unwrap());
    }

    #[test]
    fn test_start_session_persists() {
        let (coach, _) = coach();
        let profile = coach.start_session().unwrap();
        assert_eq!(profile.session_id.len(), 36);
        assert!(coach.session_exists(&profile.session_id).unwrap());
    }

    #[test]
    fn test_turn_saves_profile_and_logs() {
        let (coach, store) = coach();
        coach.handle_turn("s1", "Hi").unwrap();

        let saved = store.load("s1").unwrap().unwrap();
        assert_eq!(saved.stage, Stage::AwaitingName);

        let history = coach.history("s1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].body, "Hi");
        assert_eq!(history[1].sender, Sender::Assistant);
    }

    #[test]
    fn test_log_failure_does_not_fail_turn() {
        let store = Arc::new(InMemoryStore::new());
        let kb = Arc::new(KnowledgeBase::builtin().unwrap());
        let coach = CareerCoach::new(kb, store.clone(), Arc::new(BrokenLog));

        assert!(coach.handle_turn("s1", "Hi").is_ok());
        assert_eq!(store.load("s1").unwrap().unwrap().stage, Stage::AwaitingName);
    }

    #[test]
    fn test_turn_locks_are_pruned() {
        let (coach, _) = coach();
        coach.handle_turn("a", "Hi").unwrap();
        coach.handle_turn("b", "Hi").unwrap();
        assert_eq!(coach.tracked_sessions(), 0);
    }

    #[test]
    fn test_concurrent_turns_on_one_session_serialize() {
        let (coach, _) = coach();
        let coach = Arc::new(coach);
        coach.handle_turn("s1", "Hi").unwrap();
        coach.handle_turn("s1", "Alex").unwrap();
        coach.handle_turn("s1", "Barista").unwrap();
        coach.handle_turn("s1", "Data Scientist").unwrap();

        let handles: Vec<_> = ["python", "sql", "statistics", "excel"]
            .into_iter()
            .map(|skill| {
                let coach = Arc::clone(&coach);
                thread::spawn(move || {
                    coach.handle_turn("s1", &format!("I know {}", skill)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // No lost updates: every skill survived
        let profile = coach.get_profile("s1").unwrap();
        for skill in ["python", "sql", "statistics", "excel"] {
            assert!(profile.skills.contains(skill), "missing {}", skill);
        }
        assert_eq!(coach.history("s1").unwrap().len(), 16);
    }
}
