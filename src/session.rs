//! Session and conversation state for Vegapunk
//!
//! This module holds the chat data model: messages with role tagging, the
//! append-only conversation, one-shot notices, and the cookie-scoped session
//! store with TTL-based expiry. Nothing here is persisted; a session lives
//! exactly as long as the browser keeps coming back within the TTL.

use crate::error::{Result, VegapunkError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the person chatting
    User,
    /// Reply produced by the dispatcher
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message
///
/// Messages are immutable once created; construct them through
/// [`ChatMessage::user`] and [`ChatMessage::assistant`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use vegapunk::session::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only sequence of chat messages
///
/// Insertion order is render order. There is deliberately no API to remove
/// or reorder messages during a session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Appends an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Returns the messages in insertion order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages in the conversation
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no message has been exchanged yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Transient problem; the conversation continues
    Warning,
    /// Configuration problem the operator must fix
    Error,
}

/// One-shot user-visible message, drained when the page renders
#[derive(Debug, Clone)]
pub struct Notice {
    /// Severity, controls styling only
    pub level: NoticeLevel,
    /// Text shown to the user
    pub text: String,
}

impl Notice {
    /// Creates a warning notice
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    /// Creates an error notice
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// One browser-scoped chat session
///
/// Holds the conversation, the draft text used to refill the input field,
/// the clear-input flag consumed at render time, pending notices, and the
/// last-seen timestamp used for expiry.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier, also the cookie value
    pub id: Uuid,
    /// The chat history for this session
    pub conversation: Conversation,
    /// Last submitted text, echoed back into the input field
    draft_input: String,
    /// When set, the next render clears the input field
    clear_input: bool,
    /// Notices queued for the next render
    notices: Vec<Notice>,
    /// Last time this session was touched
    pub last_seen: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            conversation: Conversation::new(),
            draft_input: String::new(),
            clear_input: false,
            notices: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    /// Queues a notice for the next render
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Removes and returns all pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Records the submitted text so a failed validation can refill the field
    pub fn keep_draft(&mut self, text: impl Into<String>) {
        self.draft_input = text.into();
    }

    /// Requests that the next render clears the input field
    pub fn request_input_clear(&mut self) {
        self.clear_input = true;
    }

    /// Returns the value to render into the input field, consuming the
    /// clear-input flag if it was set
    pub fn input_value_for_render(&mut self) -> String {
        if self.clear_input {
            self.clear_input = false;
            self.draft_input.clear();
        }
        self.draft_input.clone()
    }

    fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    fn expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_seen > ttl
    }
}

/// In-memory session store keyed by session id
///
/// Sessions are created on first access and destroyed once their last-seen
/// timestamp falls outside the TTL. Expiry is enforced on access rather than
/// by a background task, matching the one-request-at-a-time resource model.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates a store whose sessions expire after `ttl_seconds` of inactivity
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Runs `f` against the session for `id`, creating it if absent
    ///
    /// Expired sessions are pruned before the lookup, so a returning browser
    /// whose session lapsed starts a fresh conversation. The lock is held
    /// only for the duration of `f`; callers must not perform outbound calls
    /// inside it.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned
    pub fn with_session<F, R>(&self, id: Uuid, f: F) -> Result<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| VegapunkError::Session("Failed to acquire session lock".to_string()))?;

        let now = Utc::now();
        let ttl = self.ttl;
        sessions.retain(|_, session| !session.expired(ttl, now));

        let session = sessions.entry(id).or_insert_with(|| {
            tracing::debug!(session_id = %id, "Creating new session");
            Session::new(id)
        });
        session.touch();

        Ok(f(session))
    }

    /// Number of live sessions
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned
    pub fn len(&self) -> Result<usize> {
        self.sessions
            .read()
            .map(|sessions| sessions.len())
            .map_err(|_| {
                VegapunkError::Session("Failed to acquire session lock".to_string()).into()
            })
    }

    /// True when no session is live
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = ChatMessage::user("hi");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hi");

        let assistant = ChatMessage::assistant("hello");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "hello");
    }

    #[test]
    fn test_role_display_and_serde() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");

        let json = serde_json::to_string(&ChatMessage::user("x")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_conversation_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("first");
        conversation.push_assistant("second");
        conversation.push_user("third");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[2].content, "third");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_conversation_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
    }

    #[test]
    fn test_notices_are_drained() {
        let mut session = Session::new(Uuid::new_v4());
        session.push_notice(Notice::warning("slow down"));
        session.push_notice(Notice::error("no key"));

        let notices = session.take_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[1].level, NoticeLevel::Error);

        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn test_input_clear_flag_consumed_once() {
        let mut session = Session::new(Uuid::new_v4());
        session.keep_draft("half-typed question");
        assert_eq!(session.input_value_for_render(), "half-typed question");

        // Still there on the next render, until a clear is requested.
        assert_eq!(session.input_value_for_render(), "half-typed question");

        session.request_input_clear();
        assert_eq!(session.input_value_for_render(), "");
        assert_eq!(session.input_value_for_render(), "");
    }

    #[test]
    fn test_store_creates_and_reuses_sessions() {
        let store = SessionStore::new(60);
        let id = Uuid::new_v4();

        store
            .with_session(id, |session| session.conversation.push_user("hello"))
            .unwrap();

        let len = store
            .with_session(id, |session| session.conversation.len())
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_store_isolates_sessions() {
        let store = SessionStore::new(60);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store
            .with_session(a, |session| session.conversation.push_user("mine"))
            .unwrap();

        let other_len = store
            .with_session(b, |session| session.conversation.len())
            .unwrap();
        assert_eq!(other_len, 0);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_store_prunes_expired_sessions() {
        let store = SessionStore::new(60);
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store
            .with_session(stale, |session| {
                session.conversation.push_user("old news");
                session.last_seen = Utc::now() - Duration::seconds(120);
            })
            .unwrap();
        store
            .with_session(fresh, |session| session.conversation.push_user("new"))
            .unwrap();

        // Touching any session prunes the stale one.
        let stale_len = store
            .with_session(stale, |session| session.conversation.len())
            .unwrap();
        assert_eq!(stale_len, 0, "expired session should restart empty");

        let fresh_len = store
            .with_session(fresh, |session| session.conversation.len())
            .unwrap();
        assert_eq!(fresh_len, 1, "live session keeps its conversation");
    }
}
