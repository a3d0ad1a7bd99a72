// ABOUTME: Codex session scanner over sessions/**/rollout-*-<uuid>.jsonl plus history.jsonl.

use super::{is_session_id, modified_at, short_id, truncate_label, SessionEntry};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

static SESSION_ID_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("session id pattern is valid")
});

#[derive(Deserialize)]
struct RolloutRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    payload: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HistoryRecord {
    session_id: Option<String>,
    ts: Option<f64>,
    text: Option<String>,
}

pub(super) fn scan(codex_home: &Path) -> Vec<SessionEntry> {
    let mut entries = scan_rollouts(&codex_home.join("sessions"));
    entries.extend(scan_history(&codex_home.join("history.jsonl")));
    entries
}

fn session_id_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    SESSION_ID_SUFFIX.find(stem).map(|m| m.as_str().to_string())
}

fn scan_rollouts(sessions_dir: &Path) -> Vec<SessionEntry> {
    if !sessions_dir.is_dir() {
        return Vec::new();
    }
    let pattern = format!(
        "{}/**/*.jsonl",
        glob::Pattern::escape(&sessions_dir.to_string_lossy())
    );
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::debug!(error = %e, "Skipping codex sessions directory");
            return Vec::new();
        }
    };

    paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let id = session_id_from_file_name(&path)?;
            let label = rollout_label(&path).unwrap_or_else(|| short_id(&id));
            Some(SessionEntry {
                label: truncate_label(&label),
                updated_at: modified_at(&path),
                id,
            })
        })
        .collect()
}

/// Well-formed records of a JSONL file, read lazily line by line.
/// Blank and malformed lines are skipped; invalid UTF-8 is replaced.
fn jsonl_records<T: DeserializeOwned>(path: &Path) -> Option<impl Iterator<Item = T>> {
    let file = File::open(path).ok()?;
    Some(BufReader::new(file).split(b'\n').map_while(Result::ok).filter_map(|line| {
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }))
}

/// Start time from a leading session_meta record, as "YYYY-MM-DD HH:MM:SS"
fn rollout_label(path: &Path) -> Option<String> {
    // Only the first well-formed record is considered
    let record: RolloutRecord = jsonl_records(path)?.next()?;
    if record.kind.as_deref() != Some("session_meta") {
        return None;
    }
    let timestamp = record.payload?.get("timestamp")?.as_str()?.to_string();
    let label: String = timestamp.chars().take(19).collect::<String>().replace('T', " ");
    (!label.trim().is_empty()).then_some(label)
}

fn scan_history(history: &Path) -> Vec<SessionEntry> {
    let Some(records) = jsonl_records::<HistoryRecord>(history) else {
        return Vec::new();
    };
    records
        .filter_map(|record| {
            let id = record.session_id.filter(|id| is_session_id(id))?;
            let updated_at = record
                .ts
                .and_then(timestamp_from_secs)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let text = record.text.unwrap_or_default();
            let label = if text.trim().is_empty() {
                short_id(&id)
            } else {
                truncate_label(&text)
            };
            Some(SessionEntry {
                id,
                label,
                updated_at,
            })
        })
        .collect()
}

fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_rollout_name() {
        let path = Path::new(
            "/x/2026/03/01/rollout-2026-03-01T04-32-45-019ca5f4-2170-7961-9d0a-24537ec4c29c.jsonl",
        );
        assert_eq!(
            session_id_from_file_name(path).as_deref(),
            Some("019ca5f4-2170-7961-9d0a-24537ec4c29c")
        );
        assert_eq!(session_id_from_file_name(Path::new("/x/notes.jsonl")), None);
    }

    #[test]
    fn test_fractional_history_timestamp() {
        let ts = timestamp_from_secs(1_700_000_000.5).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
        assert_eq!(timestamp_from_secs(f64::NAN), None);
    }

    #[test]
    fn test_rollout_label_stops_at_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollout.jsonl");
        let mut content = b"\n  \nnot json\n".to_vec();
        content.extend_from_slice(
            br#"{"type":"session_meta","payload":{"timestamp":"2026-03-01T04:32:45.123Z"}}"#,
        );
        content.extend_from_slice(b"\n\xff\xfe");
        content.extend_from_slice(&vec![b'x'; 1 << 20]);
        std::fs::write(&path, content).unwrap();
        assert_eq!(rollout_label(&path).as_deref(), Some("2026-03-01 04:32:45"));

        let other = dir.path().join("other.jsonl");
        std::fs::write(
            &other,
            concat!(
                r#"{"type":"response_item","payload":{}}"#,
                "\n",
                r#"{"type":"session_meta","payload":{"timestamp":"2026-03-01T04:32:45Z"}}"#,
                "\n"
            ),
        )
        .unwrap();
        assert_eq!(rollout_label(&other), None);
    }
}
