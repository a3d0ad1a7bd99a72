// ABOUTME: Per-conversation session directives shared by every chat front end.
// ABOUTME: One mutex guards the whole map; Fresh is read-and-cleared atomically, Resume persists.
use openab_agent::SessionDirective;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Where a conversation takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Telegram,
    Discord,
    Api,
    Cli,
}

impl Platform {
    pub fn tag(self) -> &'static str {
        match self {
            Platform::Telegram => "tg",
            Platform::Discord => "dc",
            Platform::Api => "api",
            Platform::Cli => "cli",
        }
    }
}

/// Who is talking, on which platform, in which chat or channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub platform: Platform,
    pub conversation_id: i64,
    pub user_id: i64,
}

impl ConversationKey {
    pub fn new(platform: Platform, conversation_id: i64, user_id: i64) -> Self {
        Self {
            platform,
            conversation_id,
            user_id,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.platform.tag(),
            self.conversation_id,
            self.user_id
        )
    }
}

/// Result of consuming a conversation's pending directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOverride {
    pub fresh: bool,
    pub resume_id: Option<String>,
}

impl SessionOverride {
    pub fn into_directive(self) -> SessionDirective {
        if self.fresh {
            SessionDirective::Fresh
        } else {
            SessionDirective::resume(self.resume_id.as_deref())
        }
    }
}

/// Thread-safe directive store, one entry per conversation.
///
/// Entries are created lazily and live for the life of the store.
#[derive(Debug, Default)]
pub struct SessionStateStore {
    entries: Mutex<HashMap<ConversationKey, SessionDirective>>,
}

impl SessionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationKey, SessionDirective>> {
        // The map holds plain values, so a panic mid-update cannot leave it inconsistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next call for this conversation starts a new backend session; clears any resume id
    pub fn set_fresh(&self, key: &ConversationKey) {
        self.lock().insert(key.clone(), SessionDirective::Fresh);
        tracing::debug!(key = %key, "Next message will start a fresh session");
    }

    /// Pin the conversation to `session_id`, or back to Continue when `None`/blank.
    /// Always clears a pending Fresh.
    pub fn set_resume(&self, key: &ConversationKey, session_id: Option<&str>) {
        let directive = SessionDirective::resume(session_id);
        tracing::debug!(key = %key, ?directive, "Session resume target updated");
        self.lock().insert(key.clone(), directive);
    }

    /// Read the pending override, clearing Fresh back to Continue in the same critical section
    pub fn consume_override(&self, key: &ConversationKey) -> SessionOverride {
        let mut entries = self.lock();
        let Some(directive) = entries.get_mut(key) else {
            return SessionOverride::default();
        };
        match directive {
            SessionDirective::Fresh => {
                *directive = SessionDirective::Continue;
                SessionOverride {
                    fresh: true,
                    resume_id: None,
                }
            }
            SessionDirective::Resume(id) => SessionOverride {
                fresh: false,
                resume_id: Some(id.clone()),
            },
            SessionDirective::Continue => SessionOverride::default(),
        }
    }

    /// Put back a Fresh taken by `consume_override` for a call that never launched.
    /// Does nothing if the conversation was redirected in the meantime.
    pub fn restore_fresh(&self, key: &ConversationKey) {
        let mut entries = self.lock();
        if let Some(directive) = entries.get_mut(key) {
            if *directive == SessionDirective::Continue {
                *directive = SessionDirective::Fresh;
                tracing::debug!(key = %key, "Pending fresh session restored");
            }
        }
    }

    /// Current directive without consuming it
    pub fn peek(&self, key: &ConversationKey) -> SessionDirective {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
