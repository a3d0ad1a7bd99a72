// ABOUTME: Cursor session scanner over <chats>/<project>/<session-uuid>/store.db.
// ABOUTME: Session names come from the first row of the meta table (plain or hex-encoded JSON).

use super::{is_session_id, modified_at, short_id, truncate_label, SessionEntry};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub(super) fn scan(chats_dir: &Path) -> Vec<SessionEntry> {
    let Ok(projects) = std::fs::read_dir(chats_dir) else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    for project in projects.flatten() {
        let project_dir = project.path();
        if !project_dir.is_dir() {
            continue;
        }
        let Ok(sessions) = std::fs::read_dir(&project_dir) else {
            continue;
        };
        for session in sessions.flatten() {
            let session_dir = session.path();
            let Some(id) = session_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_session_id(id) || !session_dir.is_dir() {
                continue;
            }
            let store = session_dir.join("store.db");
            if !store.is_file() {
                continue;
            }
            let label = session_name(&store).unwrap_or_else(|| short_id(id));
            entries.push(SessionEntry {
                id: id.to_string(),
                label: truncate_label(&label),
                updated_at: modified_at(&store),
            });
        }
    }
    entries
}

/// The `name` stored in the session's meta table, if any
fn session_name(store: &Path) -> Option<String> {
    let conn = Connection::open_with_flags(
        store,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| tracing::debug!(path = %store.display(), error = %e, "Cannot open store.db"))
    .ok()?;
    let value: Value = conn
        .query_row("SELECT value FROM meta LIMIT 1", [], |row| row.get(0))
        .map_err(|e| tracing::debug!(path = %store.display(), error = %e, "No session meta"))
        .ok()?;
    let raw = match value {
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8(bytes).ok()?,
        _ => return None,
    };
    name_from_meta(&raw)
}

fn name_from_meta(raw: &str) -> Option<String> {
    let meta: serde_json::Value = match serde_json::from_str(raw) {
        Ok(meta) => meta,
        Err(_) => serde_json::from_slice(&decode_hex(raw.trim())?).ok()?,
    };
    let name = match meta.get("name")? {
        serde_json::Value::String(name) => name.trim().to_string(),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return None;
    }
    (0..raw.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(raw.get(i..i + 2)?, 16).ok())
        .collect()
}
