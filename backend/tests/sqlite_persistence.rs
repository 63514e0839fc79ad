use career_coach::{
    CachedProfileStore, CareerCoach, KnowledgeBase, MemoryStore, ProfileStore, Sender, Stage,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn sqlite_coach(path: &Path) -> CareerCoach {
    let store = Arc::new(MemoryStore::new(path).unwrap());
    let kb = Arc::new(KnowledgeBase::builtin().unwrap());
    let profiles = Arc::new(CachedProfileStore::new(store.clone(), 8));
    CareerCoach::new(kb, profiles, store)
}

#[test]
fn test_session_survives_restart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("coach.db");

    {
        let coach = sqlite_coach(&db);
        coach.handle_turn("s1", "Hi").unwrap();
        coach.handle_turn("s1", "call me Riley").unwrap();
        coach.handle_turn("s1", "Graphic designer at an agency").unwrap();
        coach.handle_turn("s1", "Product Manager").unwrap();
        coach.handle_turn("s1", "I know scrum, communication").unwrap();
    }

    let coach = sqlite_coach(&db);
    let profile = coach.get_profile("s1").unwrap();
    assert_eq!(profile.name.as_deref(), Some("Riley"));
    assert_eq!(
        profile.current_role_text.as_deref(),
        Some("Graphic designer at an agency")
    );
    assert_eq!(profile.desired_role_key.as_deref(), Some("product_manager"));
    assert!(profile.skills.contains("scrum"));
    assert!(profile.skills.contains("communication"));
    assert_eq!(profile.stage, Stage::General);

    let history = coach.history("s1").unwrap();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[0].body, "Hi");
    assert_eq!(history[9].sender, Sender::Assistant);

    // The conversation picks up where it left off
    let reply = coach.handle_turn("s1", "salary").unwrap();
    assert!(reply.text.contains("**Product Manager**"));
}

#[test]
fn test_started_session_is_persisted() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("coach.db");

    let id = sqlite_coach(&db).start_session().unwrap().session_id;

    let store = MemoryStore::new(&db).unwrap();
    let profile = store.load(&id).unwrap().unwrap();
    assert_eq!(profile.stage, Stage::Greeting);
    assert!(profile.skills.is_empty());
}
