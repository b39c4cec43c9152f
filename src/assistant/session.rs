//! Assistant panels and delayed bot replies.
//!
//! Each reply batch is tagged with the session incarnation it was computed
//! for. Resetting or closing a panel bumps the incarnation, so a batch that
//! wakes up afterwards finds a mismatch and is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::assistant::{
    greeting, on_input, on_option, AssistantContext, ChatOption, Effect, Message, Mode, Turn,
};
use crate::errors::AppError;

/// Bot replies waiting for the typing delay to elapse.
#[derive(Debug, Clone)]
struct PendingReply {
    seq: u64,
    incarnation: u64,
    messages: Vec<Message>,
}

/// State of one assistant panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSession {
    id: Uuid,
    open: bool,
    mode: Mode,
    incarnation: u64,
    messages: Vec<Message>,
    /// Replies still "typing"
    typing: bool,
    #[serde(skip)]
    pending: VecDeque<PendingReply>,
    #[serde(skip)]
    next_seq: u64,
}

impl AssistantSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            open: true,
            mode: Mode::Menu,
            incarnation: 0,
            messages: greeting(),
            typing: false,
            pending: VecDeque::new(),
            next_seq: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn incarnation(&self) -> u64 {
        self.incarnation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn invalidate(&mut self) {
        self.incarnation += 1;
        self.pending.clear();
        self.typing = false;
    }

    /// Start over: fresh greeting, nothing in flight.
    pub fn reset(&mut self) {
        self.invalidate();
        self.open = true;
        self.mode = Mode::Menu;
        self.messages = greeting();
    }

    pub fn close(&mut self) {
        self.invalidate();
        self.open = false;
    }

    /// Find an option offered anywhere in the visible conversation,
    /// preferring the most recent option set.
    pub fn offered(&self, key: &str) -> Option<&ChatOption> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::BotOptionSet { options } => options.iter().find(|o| o.key == key),
            _ => None,
        })
    }

    /// Deliver every pending batch now, in order.
    fn flush(&mut self) {
        while let Some(batch) = self.pending.pop_front() {
            self.messages.extend(batch.messages);
        }
        self.typing = false;
    }

    /// Apply a turn. Returns the sequence number of the deferred batch, if
    /// one was queued.
    pub fn apply(&mut self, turn: Turn) -> Option<u64> {
        // Earlier replies land before anything the new action produces.
        self.flush();

        if turn.reseed {
            self.invalidate();
            self.messages = turn.immediate;
        } else {
            self.messages.extend(turn.immediate);
        }
        self.mode = turn.mode;

        if turn.effect.is_some() {
            self.close();
            return None;
        }

        if turn.deferred.is_empty() {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push_back(PendingReply {
            seq,
            incarnation: self.incarnation,
            messages: turn.deferred,
        });
        self.typing = true;
        Some(seq)
    }

    /// Deliver pending batches up to and including `seq` if they belong to
    /// the given incarnation. Returns whether anything was appended.
    pub fn commit(&mut self, incarnation: u64, seq: u64) -> bool {
        if !self.open || incarnation != self.incarnation {
            return false;
        }

        let mut delivered = false;
        while self.pending.front().is_some_and(|batch| batch.seq <= seq) {
            if let Some(batch) = self.pending.pop_front() {
                if batch.incarnation == self.incarnation {
                    self.messages.extend(batch.messages);
                    delivered = true;
                }
            }
        }
        self.typing = !self.pending.is_empty();
        delivered
    }
}

fn not_on_offer(key: &str) -> AppError {
    AppError::BadRequest(format!("Option '{}' is not on offer", key))
}

/// Result of selecting an option.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub session: AssistantSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

/// All open assistant panels, keyed by session id.
#[derive(Clone)]
pub struct AssistantHub {
    sessions: Arc<Mutex<HashMap<Uuid, AssistantSession>>>,
    delay: Duration,
}

impl AssistantHub {
    pub fn new(delay: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            delay,
        }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Assistant session {} not found", id))
    }

    /// Open a panel. Reopening an existing session re-initializes it and
    /// discards its history; unknown ids get a brand new session.
    pub async fn open(&self, existing: Option<Uuid>) -> AssistantSession {
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = existing.and_then(|id| sessions.get_mut(&id)) {
            session.reset();
            tracing::debug!(
                "Assistant session {} reset (incarnation {})",
                session.id(),
                session.incarnation()
            );
            return session.clone();
        }

        let session = AssistantSession::new(Uuid::new_v4());
        tracing::debug!("Assistant session {} opened", session.id());
        sessions.insert(session.id(), session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<AssistantSession, AppError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    /// Close and forget a panel. Replies still in flight are dropped.
    pub async fn close(&self, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        let mut session = sessions.remove(&id).ok_or_else(|| Self::not_found(id))?;
        session.close();
        Ok(())
    }

    /// The option `key` as currently offered by the panel.
    pub async fn offered(&self, id: Uuid, key: &str) -> Result<ChatOption, AppError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or_else(|| Self::not_found(id))?;
        session.offered(key).cloned().ok_or_else(|| not_on_offer(key))
    }

    /// Choose an option by key. An option that hands control to the host
    /// closes the panel and forgets it.
    pub async fn select(
        &self,
        id: Uuid,
        key: &str,
        ctx: AssistantContext<'_>,
    ) -> Result<SelectionResult, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| Self::not_found(id))?;

        if !session.is_open() {
            return Err(AppError::BadRequest(format!(
                "Assistant session {} is closed",
                id
            )));
        }
        let option = session
            .offered(key)
            .cloned()
            .ok_or_else(|| not_on_offer(key))?;

        let turn = on_option(session.mode(), &option, ctx);
        let effect = turn.effect.clone();
        if let Some(seq) = session.apply(turn) {
            self.schedule(id, session.incarnation(), seq);
        }
        let session = session.clone();

        if effect.is_some() {
            sessions.remove(&id);
            tracing::debug!("Assistant session {} closed by {:?}", id, effect);
        }

        Ok(SelectionResult { session, effect })
    }

    /// Submit typed text. Outside QNA mode this changes nothing.
    pub async fn input(&self, id: Uuid, text: &str) -> Result<AssistantSession, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| Self::not_found(id))?;

        if !session.is_open() {
            return Ok(session.clone());
        }
        if let Some(turn) = on_input(session.mode(), text) {
            if let Some(seq) = session.apply(turn) {
                self.schedule(id, session.incarnation(), seq);
            }
        }
        Ok(session.clone())
    }

    fn schedule(&self, id: Uuid, incarnation: u64, seq: u64) {
        let sessions = Arc::clone(&self.sessions);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut sessions = sessions.lock().await;
            let delivered = sessions
                .get_mut(&id)
                .map(|s| s.commit(incarnation, seq))
                .unwrap_or(false);
            if !delivered {
                tracing::trace!("Dropped stale assistant reply for session {}", id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::OptionAction;

    fn signed_out() -> AssistantContext<'static> {
        AssistantContext {
            identity: None,
            records: &[],
        }
    }

    fn qna_option() -> ChatOption {
        ChatOption::new(
            "qna",
            "Other questions about this portal",
            OptionAction::EnterMode { mode: Mode::Qna },
        )
    }

    #[test]
    fn test_stale_batch_is_dropped_after_reset() {
        let mut session = AssistantSession::new(Uuid::new_v4());
        let turn = on_option(Mode::Menu, &qna_option(), signed_out());
        let incarnation = session.incarnation();
        let seq = session.apply(turn).unwrap();

        session.reset();
        assert!(!session.commit(incarnation, seq));
        assert_eq!(session.messages(), greeting().as_slice());
        assert_eq!(session.mode(), Mode::Menu);
    }

    #[test]
    fn test_new_action_flushes_pending_replies_first() {
        let mut session = AssistantSession::new(Uuid::new_v4());
        let first = on_option(Mode::Menu, &qna_option(), signed_out());
        let incarnation = session.incarnation();
        let seq = session.apply(first).unwrap();

        let second = on_input(Mode::Qna, "how to track").unwrap();
        session.apply(second);

        let tail: Vec<&Message> = session.messages().iter().skip(2).collect();
        assert_eq!(*tail[0], Message::user("Other questions"));
        assert!(matches!(tail[1], Message::BotStatement { .. }));
        assert!(matches!(tail[2], Message::BotStatement { .. }));
        assert_eq!(*tail[3], Message::user("how to track"));
        assert_eq!(tail.len(), 4);

        // The first batch's timer finds nothing left to deliver
        assert!(!session.commit(incarnation, seq));
    }

    #[test]
    fn test_commit_delivers_after_user_message() {
        let mut session = AssistantSession::new(Uuid::new_v4());
        let turn = on_option(Mode::Menu, &qna_option(), signed_out());
        let seq = session.apply(turn).unwrap();
        assert!(session.typing);

        assert!(session.commit(session.incarnation(), seq));
        assert!(!session.typing);
        let last_three = &session.messages()[session.messages().len() - 3..];
        assert_eq!(last_three[0], Message::user("Other questions"));
    }

    #[tokio::test]
    async fn test_hub_delivers_reply_after_delay() {
        let hub = AssistantHub::new(Duration::from_millis(20));
        let session = hub.open(None).await;

        let result = hub.select(session.id(), "qna", signed_out()).await.unwrap();
        assert_eq!(result.session.messages().len(), 3);
        assert!(result.effect.is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let after = hub.get(session.id()).await.unwrap();
        assert_eq!(after.messages().len(), 5);
        assert_eq!(after.mode(), Mode::Qna);
    }

    #[tokio::test]
    async fn test_hub_reopen_discards_in_flight_reply() {
        let hub = AssistantHub::new(Duration::from_millis(50));
        let session = hub.open(None).await;
        hub.select(session.id(), "updates", signed_out())
            .await
            .unwrap();

        let reopened = hub.open(Some(session.id())).await;
        assert_eq!(reopened.id(), session.id());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let after = hub.get(session.id()).await.unwrap();
        assert_eq!(after.messages(), greeting().as_slice());
    }

    #[tokio::test]
    async fn test_hub_rejects_options_not_on_offer() {
        let hub = AssistantHub::new(Duration::from_millis(10));
        let session = hub.open(None).await;

        let err = hub
            .select(session.id(), "open-track", signed_out())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_hub_input_outside_qna_is_noop() {
        let hub = AssistantHub::new(Duration::from_millis(10));
        let session = hub.open(None).await;

        let after = hub.input(session.id(), "upload").await.unwrap();
        assert_eq!(after.messages(), greeting().as_slice());
    }

    #[tokio::test]
    async fn test_hub_login_option_closes_panel() {
        let hub = AssistantHub::new(Duration::from_millis(10));
        let session = hub.open(None).await;
        hub.select(session.id(), "file", signed_out()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let result = hub.select(session.id(), "login", signed_out()).await.unwrap();
        assert_eq!(result.effect, Some(Effect::Authenticate));
        assert!(!result.session.is_open());

        let err = hub.get(session.id()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_hub_forgets_panels_closed_by_an_effect() {
        let hub = AssistantHub::new(Duration::from_millis(5));
        for _ in 0..20 {
            let session = hub.open(None).await;
            hub.select(session.id(), "file", signed_out()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            let result = hub.select(session.id(), "login", signed_out()).await.unwrap();
            assert_eq!(result.effect, Some(Effect::Authenticate));
        }

        assert!(hub.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_hub_offered_resolves_visible_options() {
        let hub = AssistantHub::new(Duration::from_millis(10));
        let session = hub.open(None).await;

        let option = hub.offered(session.id(), "updates").await.unwrap();
        assert_eq!(
            option.action,
            OptionAction::EnterMode {
                mode: Mode::Updates
            }
        );
        let err = hub.offered(session.id(), "login").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_hub_unknown_session() {
        let hub = AssistantHub::new(Duration::from_millis(10));
        let err = hub.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
