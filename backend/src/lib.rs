//! Career Coach Backend
//!
//! A rule-based career coaching chatbot with:
//! - Slot-filling onboarding dialogue
//! - Keyword intent classification
//! - Skill-gap analysis against a career knowledge base
//! - Persistent session profiles and chat history

pub mod agent;
pub mod api;
pub mod config;

pub use agent::*;
pub use config::CoachConfig;
