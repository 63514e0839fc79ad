//! Agent Module - Core of the Career Coach
//!
//! Rule-based conversational coach. A session walks a short slot-filling
//! dialogue (name, current role, target role, skills) and then answers
//! free-form questions about the target role.
//!
//! Architecture:
//! - Knowledge: Read-only career path table
//! - Intent: Ordered keyword rules mapping a message to an intent
//! - Dialogue: Stage machine producing the reply and the next profile
//! - Skill Gap: Matched/missing skills for a role
//! - Store / Memory: Profile persistence and chat history (in-process or SQLite)
//! - Coach: Session façade tying the above together

pub mod coach;
pub mod dialogue;
pub mod intent;
pub mod knowledge;
pub mod memory;
pub mod skill_gap;
pub mod store;
pub mod text;
pub mod types;

pub use coach::{CareerCoach, CoachError};
pub use dialogue::{DialogueController, Turn};
pub use intent::{classify, Intent};
pub use knowledge::{KnowledgeBase, KnowledgeBaseError, LearningResource, RoleRecord};
pub use memory::MemoryStore;
pub use skill_gap::{SkillGapAnalysis, SkillGapOutcome};
pub use store::{CachedProfileStore, InMemoryStore, MessageLog, ProfileStore, StoreError};
pub use types::*;
