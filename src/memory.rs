//! Per-session conversation memory and history summarization.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::document::{Message, Role};

/// How many recent messages survive summarization verbatim.
pub const KEEP_RECENT: usize = 5;

/// Maximum length of the synthetic summary content, in characters.
const SUMMARY_MAX_CHARS: usize = 300;

/// In-process store of chat sessions.
///
/// Sessions are created lazily on first message and never expire on their
/// own — the lifecycle is the process lifetime unless [`reset`](MemoryStore::reset)
/// is called.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a session, creating the session if needed.
    pub async fn add_message(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().push(Message::new(role, content));
    }

    /// All messages of a session, oldest first. Unknown sessions are empty.
    pub async fn messages(&self, session_id: &str) -> Vec<Message> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Whether a session has been created.
    pub async fn session_exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Drop a session and its history.
    pub async fn reset(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}

/// Compress a conversation: the newest [`KEEP_RECENT`] messages survive
/// verbatim, everything older collapses into one leading synthetic
/// `system` summary.
///
/// Lossy by design — older context degrades to a short blurb. That is an
/// accepted tradeoff, not a bug. At or below [`KEEP_RECENT`] messages
/// this is the identity.
pub fn summarize_messages(messages: &[Message]) -> Vec<Message> {
    if messages.len() <= KEEP_RECENT {
        return messages.to_vec();
    }

    let split = messages.len() - KEEP_RECENT;
    let older: Vec<&str> = messages[..split].iter().map(|m| m.content.as_str()).collect();
    let joined = older.join(" ");
    let truncated: String = joined.chars().take(SUMMARY_MAX_CHARS).collect();

    let mut result = Vec::with_capacity(KEEP_RECENT + 1);
    result.push(Message::new(Role::System, format!("Conversation summary: {truncated}...")));
    result.extend_from_slice(&messages[split..]);
    result
}
