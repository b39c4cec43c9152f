//! Dialogue transitions.

use crate::assistant::{answer_for, ChatOption, Effect, Message, Mode, OptionAction};
use crate::lifecycle::sort_by_recency;
use crate::models::{Grievance, GrievanceStatus, Identity};
use crate::navigation::{NavigationIntent, View};

pub const GREETING: &str = "Namaste! I am HP Assist. How can I help you today?";

/// Subject characters shown per grievance in the updates summary.
pub const SUBJECT_PREVIEW_CHARS: usize = 20;

/// Most recent grievances listed in the updates summary.
pub const RECENT_LIMIT: usize = 3;

/// What the engine may look at while computing a turn.
#[derive(Debug, Clone, Copy)]
pub struct AssistantContext<'a> {
    pub identity: Option<&'a Identity>,
    /// The identity's merged grievance list; ignored when signed out.
    pub records: &'a [Grievance],
}

/// Outcome of one user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub mode: Mode,
    /// Replace the conversation with `immediate` instead of appending.
    pub reseed: bool,
    /// Appended right away (the user's own message, or a re-seeded menu).
    pub immediate: Vec<Message>,
    /// Bot replies delivered after the typing delay.
    pub deferred: Vec<Message>,
    /// Set when the panel closes and hands control to the host.
    pub effect: Option<Effect>,
}

fn back_option() -> ChatOption {
    ChatOption::new("menu", "Back to main options", OptionAction::BackToMenu)
}

fn navigate_option(key: &str, label: &str, target: View) -> ChatOption {
    ChatOption::new(
        key,
        label,
        OptionAction::Navigate {
            intent: NavigationIntent::to(target),
        },
    )
}

/// The initial menu, also used when returning to it.
pub fn greeting() -> Vec<Message> {
    vec![
        Message::bot(GREETING),
        Message::options(vec![
            ChatOption::new(
                "updates",
                "Get updates on my filed grievances",
                OptionAction::EnterMode {
                    mode: Mode::Updates,
                },
            ),
            ChatOption::new(
                "file",
                "File a new grievance",
                OptionAction::EnterMode { mode: Mode::File },
            ),
            ChatOption::new(
                "qna",
                "Other questions about this portal",
                OptionAction::EnterMode { mode: Mode::Qna },
            ),
        ]),
    ]
}

/// Shorten a subject to `max` characters, marking the cut with "...".
pub fn truncate_subject(subject: &str, max: usize) -> String {
    if subject.chars().count() <= max {
        return subject.to_string();
    }
    let mut short: String = subject.chars().take(max).collect();
    short.push_str("...");
    short
}

fn echo_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Updates => "Get updates on my grievances",
        Mode::File => "File a new grievance",
        Mode::Qna => "Other questions",
        Mode::Menu => "Back to main options",
    }
}

fn updates_signed_out() -> Vec<Message> {
    vec![
        Message::bot(
            "You are not logged in. I can only show limited recent grievance data without login.",
        ),
        Message::bot("Demo Grievance 1: Road repair pending in Shimla – Status: In Progress"),
        Message::bot("Demo Grievance 2: Water Supply Issue in Mandi – Status: Resolved"),
        Message::bot("To view all your grievances and real data, please log in first."),
        Message::options(vec![
            ChatOption::new(
                "login",
                "Login to view all grievances",
                OptionAction::Authenticate,
            ),
            back_option(),
        ]),
    ]
}

fn updates_signed_in(records: &[Grievance]) -> Vec<Message> {
    let total = records.len();
    let in_progress = records
        .iter()
        .filter(|g| {
            matches!(
                g.status,
                GrievanceStatus::InProgress | GrievanceStatus::UnderReview
            )
        })
        .count();
    let resolved = records
        .iter()
        .filter(|g| matches!(g.status, GrievanceStatus::Resolved | GrievanceStatus::Closed))
        .count();

    let mut messages = vec![
        Message::bot(format!("You have {} total grievances filed.", total)),
        Message::bot(format!(
            "{} are In Progress/Review, {} are Resolved.",
            in_progress, resolved
        )),
    ];

    if total > 0 {
        let recent: Vec<String> = sort_by_recency(records.to_vec())
            .iter()
            .take(RECENT_LIMIT)
            .map(|g| {
                format!(
                    "ID: {}, {} ({})",
                    g.id,
                    truncate_subject(&g.subject, SUBJECT_PREVIEW_CHARS),
                    g.status
                )
            })
            .collect();
        messages.push(Message::bot(format!("Recent:\n{}", recent.join("\n"))));
    }

    messages.push(Message::options(vec![
        navigate_option("open-track", "Open My Grievances", View::Track),
        back_option(),
    ]));
    messages
}

fn file_flow(signed_in: bool) -> Vec<Message> {
    if signed_in {
        vec![
            Message::bot("Great, let us file a new grievance."),
            Message::options(vec![
                navigate_option("open-form", "Open Grievance Form", View::FileGrievance),
                back_option(),
            ]),
        ]
    } else {
        vec![
            Message::bot("To file a new grievance, you need to log in first."),
            Message::options(vec![
                ChatOption::new("login", "Login / Register now", OptionAction::Authenticate),
                back_option(),
            ]),
        ]
    }
}

fn qna_invitation() -> Vec<Message> {
    vec![
        Message::bot(
            "You can ask me questions about how to use this portal (e.g., how to file, documents needed, tracking).",
        ),
        Message::bot("Go ahead, type your question below."),
    ]
}

/// Compute the turn for a chosen option.
pub fn on_option(current: Mode, option: &ChatOption, ctx: AssistantContext<'_>) -> Turn {
    match &option.action {
        OptionAction::EnterMode { mode } => {
            let deferred = match (mode, ctx.identity) {
                (Mode::Updates, None) => updates_signed_out(),
                (Mode::Updates, Some(_)) => updates_signed_in(ctx.records),
                (Mode::File, identity) => file_flow(identity.is_some()),
                (Mode::Qna, _) => qna_invitation(),
                (Mode::Menu, _) => Vec::new(),
            };
            Turn {
                mode: *mode,
                reseed: false,
                immediate: vec![Message::user(echo_label(*mode))],
                deferred,
                effect: None,
            }
        }
        OptionAction::BackToMenu => Turn {
            mode: Mode::Menu,
            reseed: true,
            immediate: greeting(),
            deferred: Vec::new(),
            effect: None,
        },
        OptionAction::Authenticate => Turn {
            mode: current,
            reseed: false,
            immediate: Vec::new(),
            deferred: Vec::new(),
            effect: Some(Effect::Authenticate),
        },
        OptionAction::Navigate { intent } => Turn {
            mode: current,
            reseed: false,
            immediate: Vec::new(),
            deferred: Vec::new(),
            effect: Some(Effect::Navigate {
                intent: intent.clone(),
            }),
        },
    }
}

/// Compute the turn for typed text. `None` when free text is not accepted:
/// outside QNA mode, or for blank input.
pub fn on_input(current: Mode, text: &str) -> Option<Turn> {
    if current != Mode::Qna || text.trim().is_empty() {
        return None;
    }

    Some(Turn {
        mode: Mode::Qna,
        reseed: false,
        immediate: vec![Message::user(text)],
        deferred: vec![
            Message::bot(answer_for(text)),
            Message::options(vec![back_option()]),
        ],
        effect: None,
    })
}
