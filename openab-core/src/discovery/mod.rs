// ABOUTME: Lists resumable sessions from the on-disk stores of backends that keep local history.
// ABOUTME: Best-effort: missing directories, unreadable files and malformed records are skipped.

mod codex;
mod cursor;

use chrono::{DateTime, Utc};
use openab_agent::{BackendKind, Env};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Longest label shown to users before it is cut with "..."
pub const MAX_LABEL_CHARS: usize = 32;

/// One resumable session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Opaque id accepted by the backend's resume flag
    pub id: String,
    pub label: String,
    pub updated_at: DateTime<Utc>,
}

/// Where each backend keeps its sessions. `None` disables that scanner.
#[derive(Debug, Clone, Default)]
pub struct SessionSources {
    /// Codex home, containing `sessions/` and `history.jsonl`
    pub codex_home: Option<PathBuf>,
    /// Cursor chats root, containing `<project>/<session>/store.db`
    pub cursor_chats: Option<PathBuf>,
}

impl SessionSources {
    pub fn from_home(home: &Path) -> Self {
        Self {
            codex_home: Some(home.join(".codex")),
            cursor_chats: Some(home.join(".cursor").join("chats")),
        }
    }

    /// Default locations under the user's home directory
    pub fn detect(env: &Env) -> Self {
        env.home_dir()
            .map(|home| Self::from_home(&home))
            .unwrap_or_default()
    }
}

/// Newest-first sessions for `kind`, at most `max_count` of them
pub fn list_sessions(
    sources: &SessionSources,
    kind: BackendKind,
    max_count: usize,
) -> Vec<SessionEntry> {
    let found = match kind {
        BackendKind::Codex => sources
            .codex_home
            .as_deref()
            .map(codex::scan)
            .unwrap_or_default(),
        BackendKind::Cursor => sources
            .cursor_chats
            .as_deref()
            .map(cursor::scan)
            .unwrap_or_default(),
        BackendKind::Gemini | BackendKind::Claude | BackendKind::OpenClaw => Vec::new(),
    };
    let listed = newest_first(found, max_count);
    tracing::debug!(backend = %kind, count = listed.len(), "Listed sessions");
    listed
}

/// Deduplicate by id keeping the most recent entry, sort descending, truncate
fn newest_first(entries: Vec<SessionEntry>, max_count: usize) -> Vec<SessionEntry> {
    let mut by_id: HashMap<String, SessionEntry> = HashMap::new();
    for entry in entries {
        match by_id.get(&entry.id) {
            Some(existing) if existing.updated_at >= entry.updated_at => {}
            _ => {
                by_id.insert(entry.id.clone(), entry);
            }
        }
    }
    let mut sorted: Vec<SessionEntry> = by_id.into_values().collect();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    sorted.truncate(max_count);
    sorted
}

/// Backend session ids are hyphenated UUIDs
fn is_session_id(id: &str) -> bool {
    id.len() == 36 && id.matches('-').count() == 4
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn truncate_label(label: &str) -> String {
    let label = label.trim();
    if label.chars().count() > MAX_LABEL_CHARS {
        let cut: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        label.to_string()
    }
}

/// Modification time, or the epoch when it cannot be read
fn modified_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
