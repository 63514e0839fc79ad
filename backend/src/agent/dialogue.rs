//! Dialogue Controller
//!
//! The conversation state machine. One call to [`DialogueController::respond`]
//! is one user turn: classify the message, run the matching handler against a
//! copy of the profile, and return the updated profile with the reply.
//!
//! A handler may hand a follow-up intent back to the turn loop instead of a
//! reply (recording skills asks for a skill analysis). The loop consumes at
//! most one follow-up per turn, against the profile the first step produced.

use super::intent::{classify, Intent, EXPLORE_KEYWORDS};
use super::knowledge::{KnowledgeBase, RoleRecord};
use super::skill_gap::{self, SkillGapOutcome};
use super::text::{
    contains_phrase, extract_name, humanize_token, normalize_message, parse_skill_list,
    title_case, PLACEHOLDER_NAME,
};
use super::types::{ChatTopic, Reply, SessionProfile, Stage};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Follow-up inputs a single turn may consume
const MAX_FOLLOW_UPS: usize = 1;

const SUGGESTED_ROLE_COUNT: usize = 3;
const OVERVIEW_SKILL_COUNT: usize = 5;
const MAX_RESOURCE_ENTRIES: usize = 5;

const SOMETHING_ELSE: &str = "Something else...";
const ANONYMOUS_REPLY: &str = "I prefer to stay anonymous for now.";

const FALLBACK_TEXT: &str = "I'm exploring how best to assist you. Could you clarify or try a different question? Type 'help' for options.";

/// Result of one controller step
#[derive(Debug)]
enum Step {
    Reply(Reply),
    /// Re-enter the controller with this intent and synthetic message
    FollowUp {
        intent: Intent,
        message: &'static str,
    },
}

/// Outcome of a full user turn
#[derive(Debug, Clone)]
pub struct Turn {
    pub profile: SessionProfile,
    pub reply: Reply,
    /// Intent classified from the user's message
    pub intent: Intent,
    /// Synthetic intent consumed inside the same turn, if any
    pub follow_up: Option<Intent>,
}

/// Stateless apart from the knowledge base; safe to share across sessions
#[derive(Debug, Clone)]
pub struct DialogueController {
    kb: Arc<KnowledgeBase>,
}

impl DialogueController {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Run one user turn against `profile`
    pub fn respond(&self, profile: &SessionProfile, message: &str) -> Turn {
        let mut profile = profile.clone();
        let intent = classify(profile.stage, message, profile.name.is_some(), &self.kb);

        log::info!(
            "Session {}: intent '{}', stage '{}'",
            profile.session_id,
            intent.as_str(),
            profile.stage
        );

        let mut step = self.step(&mut profile, intent, message);
        let mut follow_up = None;
        let mut follow_ups = 0;

        let reply = loop {
            match step {
                Step::Reply(reply) => break reply,
                Step::FollowUp { intent: next, message } if follow_ups < MAX_FOLLOW_UPS => {
                    follow_ups += 1;
                    follow_up = Some(next);
                    log::debug!(
                        "Session {}: follow-up '{}' within the same turn",
                        profile.session_id,
                        next.as_str()
                    );
                    step = self.step(&mut profile, next, message);
                }
                Step::FollowUp { intent: next, .. } => {
                    log::error!(
                        "Session {}: follow-up '{}' exceeds {} per turn, answering with fallback",
                        profile.session_id,
                        next.as_str(),
                        MAX_FOLLOW_UPS
                    );
                    break Reply::text(FALLBACK_TEXT);
                }
            }
        };

        Turn {
            profile,
            reply,
            intent,
            follow_up,
        }
    }

    fn step(&self, profile: &mut SessionProfile, intent: Intent, message: &str) -> Step {
        let reply = match intent {
            Intent::ResetConversation => self.reset(profile),
            Intent::ProvideName if profile.stage == Stage::Greeting => self.greet(profile),
            Intent::ProvideName => self.record_name(profile, message),
            Intent::ProvideCurrentRole => self.record_current_role(profile, message),
            Intent::ProvideDesiredRole | Intent::DiscussRole => {
                self.record_desired_role(profile, message)
            }
            Intent::ProvideSkills => return self.record_skills(profile, message),
            Intent::SkillAnalysis => self.skill_analysis(profile),
            Intent::ExploreRoles => self.explore_roles(profile),
            Intent::GetResources => self.resources(profile, message),
            Intent::InterviewPrep => self.interview_prep(profile),
            Intent::SalaryInfo => self.salary_info(profile),
            Intent::ProjectIdeas => self.project_ideas(profile),
            Intent::NextSteps => self.next_steps(profile),
            Intent::GetHelp => self.help(profile),
            Intent::Acknowledge => self.acknowledge(profile),
            Intent::Unknown => self.unknown(profile),
        };
        Step::Reply(reply)
    }

    // ============================================================
    // SLOT FILLING
    // ============================================================

    fn reset(&self, profile: &mut SessionProfile) -> Reply {
        profile.reset();
        Reply::text(
            "Okay, let's start fresh! I'm your AI Career Coach. Say hello whenever you're ready and we'll begin.",
        )
    }

    fn greet(&self, profile: &mut SessionProfile) -> Reply {
        profile.stage = Stage::AwaitingName;
        Reply::prompt(
            "Hello! I'm your AI Career Coach. It's wonderful to connect with you! To personalize our chat, what's your first name?",
            vec![ANONYMOUS_REPLY],
        )
    }

    fn record_name(&self, profile: &mut SessionProfile, message: &str) -> Reply {
        let name = extract_name(message);
        profile.name = Some(name.clone());

        if profile.stage == Stage::General && profile.current_role_text.is_some() {
            return Reply::text(format!(
                "Got it, I'll call you **{}** from now on. What would you like to explore next?",
                name
            ));
        }

        profile.stage = Stage::AwaitingCurrentRole;
        Reply::text(format!(
            "Great to meet you, **{}**! What is your current role or primary area of study?",
            name
        ))
    }

    fn record_current_role(&self, profile: &mut SessionProfile, message: &str) -> Reply {
        let current_role = message.trim().to_string();
        profile.stage = Stage::AwaitingDesiredRole;

        let mut options = self.sample_role_names();
        let text = format!(
            "Understood, {}. Now, what career path are you most interested in exploring or pursuing? For example: {}.",
            current_role,
            format_examples(&options)
        );
        profile.current_role_text = Some(current_role);

        if self.kb.all_roles().len() > SUGGESTED_ROLE_COUNT {
            options.push(SOMETHING_ELSE.to_string());
        }
        Reply::prompt(text, options)
    }

    fn record_desired_role(&self, profile: &mut SessionProfile, message: &str) -> Reply {
        if let Some(role) = self.kb.match_role(message) {
            profile.desired_role_key = Some(role.key.clone());
            profile.chat_topic = Some(ChatTopic::RoleOverview);
            profile.stage = Stage::General;
            return role_overview(role);
        }

        let msg = normalize_message(message);
        if profile.stage == Stage::AwaitingDesiredRole
            && (EXPLORE_KEYWORDS.iter().any(|k| msg.contains(k)) || msg.contains("roles"))
        {
            return self.explore_roles(profile);
        }

        Reply::prompt(
            "I'm not familiar with that specific role in my current database. Could you try phrasing it differently? \
             You can also ask to 'explore career paths' to see a list of careers I know about.",
            vec!["Explore career paths"],
        )
    }

    fn record_skills(&self, profile: &mut SessionProfile, message: &str) -> Step {
        let added = profile.merge_skills(parse_skill_list(message));
        log::debug!(
            "Session {}: merged {} new skill(s), {} on file",
            profile.session_id,
            added,
            profile.skills.len()
        );

        if self.desired_role(profile).is_some() {
            return Step::FollowUp {
                intent: Intent::SkillAnalysis,
                message: "skill gap analysis",
            };
        }

        let listed = if profile.skills.is_empty() {
            String::from("Got it.")
        } else {
            format!("Got it. Your skills: {}.", join_skills(profile))
        };
        self.ask_for_role_with_suggestions(
            profile,
            &format!("{} What's your target career path for a skill analysis?", listed),
        )
        .into()
    }

    // ============================================================
    // GENERAL HANDLERS
    // ============================================================

    fn skill_analysis(&self, profile: &mut SessionProfile) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return self.ask_for_role_with_suggestions(
                profile,
                "To perform a skill gap analysis, I first need to know your target career path. What role are you aiming for?",
            );
        };

        let analysis = match skill_gap::analyze(role, &profile.skills) {
            SkillGapOutcome::NeedsSkills => {
                profile.stage = Stage::AwaitingSkills;
                return Reply::text(
                    "Sure, I can help with that! Please list your current technical and soft skills, separated by commas (e.g., Python, Project Management, Communication).",
                );
            }
            SkillGapOutcome::Analysis(analysis) => analysis,
        };

        let mut parts = vec![format!(
            "Okay, **{}**, here's a skill assessment for the **{}** role based on your listed skills ({}):",
            profile.name.as_deref().unwrap_or(PLACEHOLDER_NAME),
            role.name,
            join_skills(profile)
        )];

        if analysis.matching.is_empty() {
            parts.push(format!(
                "\nIt seems we haven't listed skills that directly match the core requirements or emphasized soft skills for {} yet. Let's identify them!",
                role.name
            ));
        } else {
            parts.push(format!(
                "\n### Strengths (Skills you have that match):\n{}",
                bullet_list(analysis.matching.iter().map(|s| title_case(s)))
            ));
        }

        let quick_replies = if analysis.is_strong_foundation() {
            parts.push(format!(
                "\nBased on your listed skills and the core requirements for {0}, you have a strong foundation! Consider exploring advanced topics or specializations within {0}.",
                role.name
            ));
            vec![
                "Project ideas/accomplishments".to_string(),
                "Next career steps".to_string(),
                "Interview tips".to_string(),
            ]
        } else {
            parts.push(format!(
                "\n### Areas for Development (Key skills to acquire/strengthen for {}):\n{}",
                role.name,
                bullet_list(analysis.missing.iter().map(|s| title_case(s)))
            ));
            parts.push("\nI can suggest learning resources for these. What do you think?".to_string());
            vec![
                format!("Resources for {}", title_case(&analysis.missing[0])),
                "Tell me more about these skills".to_string(),
                "Interview tips".to_string(),
            ]
        };

        profile.stage = Stage::General;
        profile.chat_topic = Some(ChatTopic::SkillGapResults);
        Reply::prompt(parts.join("\n"), quick_replies)
    }

    fn explore_roles(&self, profile: &mut SessionProfile) -> Reply {
        let roles = self.kb.all_roles();
        let lines = roles.iter().map(|r| {
            format!(
                "**{}**: {}",
                r.name,
                first_sentence(&r.responsibilities_summary)
            )
        });
        let text = format!(
            "Here are the career paths I know about:\n{}\n\nWhich one would you like to explore?",
            bullet_list(lines)
        );

        profile.chat_topic = Some(ChatTopic::RoleList);
        let suggestions: Vec<&str> = roles
            .iter()
            .take(SUGGESTED_ROLE_COUNT)
            .map(|r| r.name.as_str())
            .collect();
        Reply::prompt(text, suggestions)
    }

    fn resources(&self, profile: &mut SessionProfile, message: &str) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return ask_for_role(
                profile,
                "To suggest the most relevant resources, I need to know your target role. What are you aiming for?",
            );
        };

        let msg = normalize_message(message);
        let specific = role.learning_resources.iter().find(|r| {
            contains_phrase(&msg, &r.category) || contains_phrase(&msg, &r.category.replace('_', " "))
        });

        let text = match specific {
            Some(resource) => format!(
                "For **{}** relevant to a **{}**: {}.",
                humanize_token(&resource.category),
                role.name,
                resource.description
            ),
            None => {
                let foundational = role.resource("foundational");
                let entries = foundational
                    .into_iter()
                    .chain(
                        role.learning_resources
                            .iter()
                            .filter(|r| r.category != "foundational"),
                    )
                    .take(MAX_RESOURCE_ENTRIES)
                    .map(|r| format!("**{}**: {}", humanize_token(&r.category), r.description));
                format!(
                    "### Learning Resources for **{}**:\n\n{}\n\nIs there a specific skill or area within this role you'd like to focus on?",
                    role.name,
                    bullet_list(entries)
                )
            }
        };

        profile.chat_topic = Some(ChatTopic::ResourcesProvided);
        Reply::prompt(
            text,
            vec!["Foundational resources", "Interview tips", "Project ideas"],
        )
    }

    fn interview_prep(&self, profile: &mut SessionProfile) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return ask_for_role(
                profile,
                "To give you tailored interview tips, what role are you preparing for?",
            );
        };

        let text = format!(
            "### General Interview Best Practices:\n\
             - **Research**: Deeply understand the company, its products, and culture. Align your answers with their values.\n\
             - **STAR Method**: For behavioral questions (Situation, Task, Action, Result). Prepare specific examples.\n\
             - **Practice**: Conduct mock interviews. Record yourself to spot areas for improvement.\n\
             - **Questions for Interviewer**: Prepare 2-3 insightful questions about the role, team, or company challenges.\n\
             - **Logistics**: Test your tech for virtual interviews. For in-person, plan your route and arrive early.\n\
             - **Follow-Up**: Send a personalized thank-you email within 24 hours.\n\
             \n### Specific Focus for **{}** Interviews:\n{}\n\
             \nWant to look at learning resources or project ideas to strengthen these areas?",
            role.name,
            bullet_list(role.interview_focus.iter().cloned())
        );

        profile.chat_topic = Some(ChatTopic::InterviewTipsProvided);
        Reply::prompt(
            text,
            vec!["Learning resources", "Project ideas", "Salary range"],
        )
    }

    fn salary_info(&self, profile: &mut SessionProfile) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return ask_for_role(
                profile,
                "To discuss salary, I need to know which role you're interested in.",
            );
        };

        let text = format!(
            "The typical salary range for a **{}** in the US is approximately **{}**. \
             This can vary significantly based on location, experience, company size, and specific skill set. \
             Sites like Glassdoor, Levels.fyi, and LinkedIn Salary can provide more localized data.",
            role.name, role.salary_range
        );

        profile.chat_topic = Some(ChatTopic::SalaryDiscussed);
        Reply::prompt(text, vec!["Interview tips", "Learning resources"])
    }

    fn project_ideas(&self, profile: &mut SessionProfile) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return ask_for_role(
                profile,
                "For project ideas or example accomplishments, which career path are you targeting?",
            );
        };

        let term = project_term(&role.key);
        let text = if role.example_projects.is_empty() {
            format!(
                "I don't have specific {} for {} right now, but generally, look for experiences that allow you to practice the core skills of the role and solve a real (even small) problem or demonstrate key competencies.",
                term, role.name
            )
        } else {
            format!(
                "### Example {} for a **{}**:\n{}\n\nBuilding relevant {} is a great way to learn and showcase your skills!",
                capitalize_first(term),
                role.name,
                bullet_list(role.example_projects.iter().cloned()),
                term
            )
        };

        profile.chat_topic = Some(ChatTopic::ProjectIdeasProvided);
        Reply::prompt(text, vec!["Skill gap analysis", "Interview tips"])
    }

    fn next_steps(&self, profile: &mut SessionProfile) -> Reply {
        let Some(role) = self.desired_role(profile) else {
            return ask_for_role(
                profile,
                "To map out next career steps, which role are you aiming for first?",
            );
        };

        let text = if role.common_next_steps.is_empty() {
            format!(
                "I don't have typical progression paths for {} yet. Deepening your core skills and taking on broader ownership is always a good next move.",
                role.name
            )
        } else {
            format!(
                "### Common Next Steps after **{}**:\n{}\n\nWhich direction sounds most interesting to you?",
                role.name,
                bullet_list(role.common_next_steps.iter().map(|s| humanize_token(s)))
            )
        };

        profile.chat_topic = Some(ChatTopic::NextStepsProvided);
        Reply::prompt(
            text,
            vec!["Skill gap analysis", "Interview tips", "Learning resources"],
        )
    }

    fn help(&self, profile: &mut SessionProfile) -> Reply {
        let name_clause = profile
            .personal_name()
            .map(|n| format!("{}, ", n))
            .unwrap_or_default();
        let options = [
            "Explore career paths (e.g., 'Tell me about Software Engineer')",
            "Get a skill gap analysis (e.g., 'Analyze my skills')",
            "Find learning resources (e.g., 'Resources for Python')",
            "Receive interview tips (e.g., 'Interview prep')",
            "Discuss salary expectations",
            "Get project ideas for a role",
            "See where a role can lead (e.g., 'Next career steps')",
            "Update my skills (e.g., 'I know JavaScript')",
            "Type 'reset' to start our conversation over.",
        ];
        Reply::prompt(
            format!(
                "Hi {}I can help you with:\n{}",
                name_clause,
                bullet_list(options.iter().map(|o| o.to_string()))
            ),
            vec!["Explore career paths", "Skill gap analysis", "Learning resources"],
        )
    }

    fn acknowledge(&self, profile: &mut SessionProfile) -> Reply {
        let mut quick_replies = vec![
            "Skill gap analysis".to_string(),
            "Learning resources".to_string(),
            "Interview tips".to_string(),
            "Help".to_string(),
        ];
        if let Some(role) = self.desired_role(profile) {
            quick_replies.insert(0, format!("More about {}", role.name));
        }
        Reply::prompt("Great! What would you like to explore next?", quick_replies)
    }

    fn unknown(&self, profile: &mut SessionProfile) -> Reply {
        let name_clause = profile
            .personal_name()
            .map(|n| format!(", {}", n))
            .unwrap_or_default();
        Reply::prompt(
            format!(
                "Hmm, I'm not sure how to respond to that{}. You can ask me about career paths, skills, resources, or interview prep. Try 'help' for more options!",
                name_clause
            ),
            vec!["Help", "Explore career paths", "Skill gap analysis"],
        )
    }

    // ============================================================
    // HELPERS
    // ============================================================

    /// The profile's target role, if set and still known
    fn desired_role(&self, profile: &SessionProfile) -> Option<&RoleRecord> {
        let key = profile.desired_role_key.as_deref()?;
        let role = self.kb.role_by_key(key);
        if role.is_none() {
            log::warn!(
                "Session {}: desired role '{}' is not in the knowledge base",
                profile.session_id,
                key
            );
        }
        role
    }

    /// Random role names for quick replies. Selection is intentionally unordered.
    fn sample_role_names(&self) -> Vec<String> {
        let names = self.kb.role_names();
        names
            .choose_multiple(&mut rand::thread_rng(), SUGGESTED_ROLE_COUNT)
            .map(|n| n.to_string())
            .collect()
    }

    fn ask_for_role_with_suggestions(&self, profile: &mut SessionProfile, text: &str) -> Reply {
        profile.stage = Stage::AwaitingDesiredRole;
        Reply::prompt(text, self.sample_role_names())
    }
}

impl From<Reply> for Step {
    fn from(reply: Reply) -> Self {
        Step::Reply(reply)
    }
}

fn ask_for_role(profile: &mut SessionProfile, text: &str) -> Reply {
    profile.stage = Stage::AwaitingDesiredRole;
    Reply::text(text)
}

fn role_overview(role: &RoleRecord) -> Reply {
    let key_skills: Vec<String> = role
        .required_skills
        .iter()
        .take(OVERVIEW_SKILL_COUNT)
        .map(|s| humanize_token(s))
        .collect();
    let text = format!(
        "Excellent choice, **{}** is a dynamic field! Here's a quick overview:\n\
         - **Summary**: {}\n\
         - **Key Skills**: {}...\n\
         - **Salary Range (USD, approx.)**: {}\n\n\
         Would you like to dive deeper into required skills, get a skill gap analysis (if you share your skills), or explore learning resources for this role?",
        role.name,
        role.responsibilities_summary,
        key_skills.join(", "),
        role.salary_range
    );
    Reply::prompt(
        text,
        vec![
            "Analyze my skills for this role",
            "Learning resources",
            "Interview tips",
            "Typical projects/accomplishments",
        ],
    )
}

/// Noun used for a role's example work
fn project_term(role_key: &str) -> &'static str {
    if ["manager", "hr", "teacher", "educator"]
        .iter()
        .any(|k| role_key.contains(k))
    {
        "accomplishments or key responsibilities"
    } else if role_key.contains("designer") {
        "portfolio items"
    } else {
        "projects"
    }
}

fn bullet_list<I>(items: I) -> String
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_skills(profile: &SessionProfile) -> String {
    profile
        .skills
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// "`A`, `B`, or `C`"
fn format_examples(options: &[String]) -> String {
    let quoted: Vec<String> = options.iter().map(|o| format!("`{}`", o)).collect();
    match quoted.as_slice() {
        [] => String::from("any role you like"),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}

fn first_sentence(text: &str) -> &str {
    match text.find(". ") {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
