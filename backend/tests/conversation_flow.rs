use career_coach::{
    CareerCoach, InMemoryStore, KnowledgeBase, ReplyKind, SessionProfile, Stage,
};
use std::sync::Arc;

fn coach() -> CareerCoach {
    let store = Arc::new(InMemoryStore::new());
    let kb = Arc::new(KnowledgeBase::builtin().unwrap());
    CareerCoach::new(kb, store.clone(), store)
}

fn stage_rank(stage: Stage) -> usize {
    [
        Stage::Greeting,
        Stage::AwaitingName,
        Stage::AwaitingCurrentRole,
        Stage::AwaitingDesiredRole,
        Stage::AwaitingSkills,
        Stage::General,
    ]
    .iter()
    .position(|s| *s == stage)
    .unwrap()
}

/// Walk a session through onboarding up to the target-role question
fn onboard(coach: &CareerCoach, session: &str) {
    coach.handle_turn(session, "Hi").unwrap();
    coach.handle_turn(session, "Alex").unwrap();
    coach.handle_turn(session, "Backend Engineer").unwrap();
}

#[test]
fn test_five_turn_scenario() {
    let coach = coach();
    let session = "scenario";

    let reply = coach.handle_turn(session, "Hi").unwrap();
    assert_eq!(reply.kind, ReplyKind::QuickReplyPrompt);
    assert_eq!(coach.get_profile(session).unwrap().stage, Stage::AwaitingName);

    let reply = coach.handle_turn(session, "Alex").unwrap();
    assert!(reply.text.contains("**Alex**"));

    let reply = coach.handle_turn(session, "Backend Engineer").unwrap();
    assert!(reply.text.contains("Backend Engineer"));
    assert_eq!(reply.quick_replies.last().map(String::as_str), Some("Something else..."));

    let reply = coach.handle_turn(session, "Software Engineer").unwrap();
    assert!(reply.text.contains("**Software Engineer**"));
    assert!(reply.text.contains("$90,000 - $170,000 USD"));

    let reply = coach.handle_turn(session, "python, git").unwrap();
    let development = reply
        .text
        .find("Areas for Development")
        .expect("gap section present");
    let algorithms = reply.text.find("- Algorithms").expect("algorithms listed");
    assert!(algorithms > development);

    let profile = coach.get_profile(session).unwrap();
    assert_eq!(profile.name.as_deref(), Some("Alex"));
    assert_eq!(profile.current_role_text.as_deref(), Some("Backend Engineer"));
    assert_eq!(profile.desired_role_key.as_deref(), Some("software_engineer"));
    assert_eq!(profile.stage, Stage::General);
    assert_eq!(coach.history(session).unwrap().len(), 10);
}

#[test]
fn test_stage_only_moves_forward_without_reset() {
    let coach = coach();
    let session = "monotonic";
    let messages = [
        "Hello there",
        "Jamie",
        "Teacher",
        "not sure yet",
        "astronaut",
        "Product Manager",
        "what skills do I need",
        "market research, scrum",
        "salary?",
        "thanks",
    ];

    let mut last = stage_rank(Stage::Greeting);
    let mut reached_general = false;
    for message in messages {
        coach.handle_turn(session, message).unwrap();
        let stage = coach.get_profile(session).unwrap().stage;
        if reached_general {
            // Past onboarding the only detour is the skills prompt
            assert!(matches!(stage, Stage::General | Stage::AwaitingSkills));
        } else {
            assert!(stage_rank(stage) >= last, "stage went back on {:?}", message);
            last = stage_rank(stage);
        }
        reached_general |= stage == Stage::General;
    }
    assert!(reached_general);
}

#[test]
fn test_name_sanitization() {
    let coach = coach();

    coach.handle_turn("a", "Hi").unwrap();
    coach.handle_turn("a", "My name is John Smith").unwrap();
    assert_eq!(coach.get_profile("a").unwrap().name.as_deref(), Some("John Smith"));

    coach.handle_turn("b", "Hi").unwrap();
    coach.handle_turn("b", "I'm 12345").unwrap();
    assert_eq!(coach.get_profile("b").unwrap().name.as_deref(), Some("Explorer"));

    coach.handle_turn("c", "Hi").unwrap();
    let reply = coach.handle_turn("c", "I prefer to stay anonymous for now.").unwrap();
    assert!(reply.text.contains("**Explorer**"));
}

#[test]
fn test_desired_role_from_sentence() {
    let coach = coach();
    onboard(&coach, "p3");

    coach.handle_turn("p3", "I want to be a Data Scientist").unwrap();
    let profile = coach.get_profile("p3").unwrap();
    assert_eq!(profile.desired_role_key.as_deref(), Some("data_scientist"));
    assert_eq!(profile.stage, Stage::General);
}

#[test]
fn test_skill_analysis_is_idempotent() {
    let coach = coach();
    onboard(&coach, "p4");
    coach.handle_turn("p4", "Data Scientist").unwrap();
    coach.handle_turn("p4", "python, sql").unwrap();

    let first = coach.handle_turn("p4", "Skill gap analysis").unwrap();
    let second = coach.handle_turn("p4", "Skill gap analysis").unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.quick_replies, second.quick_replies);
}

#[test]
fn test_skill_merge_is_union() {
    let coach = coach();
    onboard(&coach, "p5");
    coach.handle_turn("p5", "Data Scientist").unwrap();

    coach.handle_turn("p5", "Python, SQL").unwrap();
    coach.handle_turn("p5", "sql, Excel").unwrap();

    let skills: Vec<String> = coach
        .get_profile("p5")
        .unwrap()
        .skills
        .into_iter()
        .collect();
    assert_eq!(skills, vec!["excel", "python", "sql"]);
}

#[test]
fn test_reset_is_total() {
    let coach = coach();
    onboard(&coach, "p6");
    coach.handle_turn("p6", "Software Engineer").unwrap();
    coach.handle_turn("p6", "python, git").unwrap();

    coach.handle_turn("p6", "let's start over").unwrap();
    assert_eq!(coach.get_profile("p6").unwrap(), SessionProfile::new("p6"));

    // The next message begins a new onboarding
    coach.handle_turn("p6", "hello again").unwrap();
    assert_eq!(coach.get_profile("p6").unwrap().stage, Stage::AwaitingName);
}

#[test]
fn test_reset_while_filling_a_slot() {
    let coach = coach();
    onboard(&coach, "slot");
    assert_eq!(coach.get_profile("slot").unwrap().stage, Stage::AwaitingDesiredRole);

    coach.handle_turn("slot", "reset").unwrap();
    assert_eq!(coach.get_profile("slot").unwrap(), SessionProfile::new("slot"));
}

#[test]
fn test_unrecognized_role_then_recovery() {
    let coach = coach();
    onboard(&coach, "norole");
    coach.handle_turn("norole", "astronaut").unwrap();
    assert_eq!(coach.get_profile("norole").unwrap().stage, Stage::AwaitingDesiredRole);

    coach.handle_turn("norole", "UX Designer").unwrap();
    let reply = coach.handle_turn("norole", "Interview tips").unwrap();
    assert!(reply.text.contains("**UX/UI Designer** Interviews"));
}
