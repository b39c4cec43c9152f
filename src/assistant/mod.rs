//! HP Assist, the portal's guided chat assistant.
//!
//! The dialogue is plain data: messages and options are tagged values and
//! `engine` computes each turn as a pure function of the session mode, the
//! user's action and an explicit context. `session` owns the per-panel state
//! and delivers bot replies after the "typing" delay.

mod engine;
mod session;
mod topics;

pub use engine::*;
pub use session::*;
pub use topics::*;

use serde::{Deserialize, Serialize};

use crate::navigation::NavigationIntent;

/// Branch of the conversation the panel is in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Menu,
    Updates,
    File,
    Qna,
}

/// What choosing an option does.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OptionAction {
    EnterMode { mode: Mode },
    BackToMenu,
    Authenticate,
    Navigate { intent: NavigationIntent },
}

/// A selectable option. `key` is what clients send back.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatOption {
    pub key: String,
    pub label: String,
    pub action: OptionAction,
}

impl ChatOption {
    pub fn new(key: &str, label: &str, action: OptionAction) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            action,
        }
    }

    /// Only the signed-in updates summary reads the record store.
    pub fn reads_records(&self) -> bool {
        matches!(
            self.action,
            OptionAction::EnterMode {
                mode: Mode::Updates
            }
        )
    }
}

/// One entry of the conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Message {
    BotStatement { text: String },
    BotOptionSet { options: Vec<ChatOption> },
    UserStatement { text: String },
}

impl Message {
    pub fn bot(text: impl Into<String>) -> Self {
        Message::BotStatement { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::UserStatement { text: text.into() }
    }

    pub fn options(options: Vec<ChatOption>) -> Self {
        Message::BotOptionSet { options }
    }
}

/// Signal handed to the host after the panel closes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// Open the authentication flow.
    Authenticate,
    Navigate { intent: NavigationIntent },
}
