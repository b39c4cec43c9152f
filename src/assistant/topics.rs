//! Keyword table behind the assistant's question answering.

/// A help topic and the words that select it.
#[derive(Debug)]
pub struct HelpTopic {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub answer: &'static str,
}

/// Topics in match priority order.
pub const HELP_TOPICS: [HelpTopic; 4] = [
    HelpTopic {
        name: "filing",
        keywords: &["file", "filing"],
        answer: "To file a grievance: 1. Login to the portal. 2. Click on 'File Grievance' in the dashboard. 3. Fill in the details and submit.",
    },
    HelpTopic {
        name: "tracking",
        keywords: &["track", "status"],
        answer: "To track a grievance: Go to your Dashboard and click 'View All Grievances'. You can see the realtime status there.",
    },
    HelpTopic {
        name: "documents",
        keywords: &["document", "photo", "upload"],
        answer: "You can upload JPG, PNG images or PDF documents. Please ensure files are clear and relevant to your complaint.",
    },
    HelpTopic {
        name: "privacy",
        keywords: &["secure", "data", "privacy"],
        answer: "Your data is completely secure. We only share details with the assigned Nodal Officer for resolving the issue.",
    },
];

pub const FALLBACK_ANSWER: &str =
    "I didn't quite understand that. Please ask about filing, tracking, or documents.";

/// First topic with a keyword contained in `question`, ignoring case.
pub fn match_topic(question: &str) -> Option<&'static HelpTopic> {
    let question = question.to_lowercase();
    HELP_TOPICS
        .iter()
        .find(|topic| topic.keywords.iter().any(|k| question.contains(k)))
}

pub fn answer_for(question: &str) -> &'static str {
    match match_topic(question) {
        Some(topic) => {
            tracing::debug!("Question matched help topic '{}'", topic.name);
            topic.answer
        }
        None => {
            tracing::debug!("No help topic matched; sending fallback");
            FALLBACK_ANSWER
        }
    }
}
