// ABOUTME: End-to-end dispatcher tests driving /bin/sh stand-ins for the agent CLIs
// ABOUTME: Stubs log their argv to a file so session flags can be checked per call
#![cfg(unix)]

use openab_core::{
    BackendKind, Config, ConversationKey, DispatchRequest, Dispatcher, Env, Lang, Platform,
    SessionDirective, SessionStateStore,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Records every call's arguments (one line per call) and echoes the last argument
const ECHO_AGENT: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "$(dirname "$0")/calls.log"
for last; do :; done
printf '%s\n' "$last"
"#;

struct Harness {
    dir: TempDir,
    workspace: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("ws");
        std::fs::create_dir(&workspace).unwrap();
        Self { dir, workspace }
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn dispatcher(&self, config: Config) -> Dispatcher {
        let env = Env::from_pairs([("HOME", self.dir.path().to_string_lossy().into_owned())]);
        Dispatcher::new(config, Arc::new(SessionStateStore::new())).with_env(env)
    }

    fn cursor_config(&self, script: &Path) -> Config {
        let mut config = Config::default();
        config.agent.backend = BackendKind::Cursor;
        config.agent.workspace = Some(self.workspace.to_string_lossy().into_owned());
        config.agent.timeout_secs = 5;
        config.backends.cursor.cmd = Some(script.to_string_lossy().into_owned());
        config
    }
}

fn key() -> ConversationKey {
    ConversationKey::new(Platform::Telegram, 100, 200)
}

fn has_flag(call: &str, flag: &str) -> bool {
    call.split(' ').any(|arg| arg == flag)
}

#[tokio::test]
async fn test_echo_then_fresh_drops_continue_flag() {
    let h = Harness::new();
    let agent = h.script("agent", ECHO_AGENT);
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    let reply = dispatcher.dispatch(&DispatchRequest::new("hello", key())).await;
    assert_eq!(reply, "hello");

    dispatcher.mark_fresh(&key());
    let reply = dispatcher.dispatch(&DispatchRequest::new("again", key())).await;
    assert_eq!(reply, "again");

    dispatcher.dispatch(&DispatchRequest::new("third", key())).await;

    let calls = h.calls();
    assert_eq!(calls.len(), 3);
    assert!(has_flag(&calls[0], "--continue"), "first call: {}", calls[0]);
    assert!(!has_flag(&calls[1], "--continue"), "fresh call: {}", calls[1]);
    assert!(has_flag(&calls[2], "--continue"), "after fresh: {}", calls[2]);
    for call in &calls {
        assert!(call.contains(&format!("--workspace {}", h.workspace.display())));
    }
}

#[tokio::test]
async fn test_resume_id_persists_until_cleared() {
    let h = Harness::new();
    let agent = h.script("agent", ECHO_AGENT);
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    dispatcher.set_resume(&key(), Some("chat-42"));
    dispatcher.dispatch(&DispatchRequest::new("one", key())).await;
    dispatcher.dispatch(&DispatchRequest::new("two", key())).await;
    dispatcher.set_resume(&key(), None);
    dispatcher.dispatch(&DispatchRequest::new("three", key())).await;

    let calls = h.calls();
    assert!(calls[0].contains("--resume chat-42"));
    assert!(!has_flag(&calls[0], "--continue"));
    assert!(calls[1].contains("--resume chat-42"));
    assert!(!has_flag(&calls[2], "--resume"));
    assert!(has_flag(&calls[2], "--continue"));
}

#[tokio::test]
async fn test_empty_prompt_short_circuits() {
    let h = Harness::new();
    let agent = h.script("agent", ECHO_AGENT);
    let dispatcher = h.dispatcher(h.cursor_config(&agent));
    dispatcher.mark_fresh(&key());

    let reply = dispatcher.dispatch(&DispatchRequest::new("  \n ", key())).await;
    assert_eq!(reply, Lang::En.empty_prompt());
    assert!(h.calls().is_empty(), "agent should not have been spawned");
    // The pending fresh directive is still there for the next real prompt
    assert_eq!(dispatcher.store().peek(&key()), SessionDirective::Fresh);
}

#[tokio::test]
async fn test_timeout_becomes_reply_text() {
    let h = Harness::new();
    let agent = h.script("agent", "#!/bin/sh\nexec sleep 30\n");
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    let request = DispatchRequest::new("slow", key())
        .timeout(Duration::from_millis(300))
        .lang(Lang::Zh);
    assert_eq!(dispatcher.dispatch(&request).await, Lang::Zh.timed_out());
}

#[tokio::test]
async fn test_silent_agent_gets_no_output_reply() {
    let h = Harness::new();
    let agent = h.script("agent", "#!/bin/sh\nexit 0\n");
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    let reply = dispatcher.dispatch(&DispatchRequest::new("hi", key())).await;
    assert_eq!(reply, Lang::En.no_output());
}

#[tokio::test]
async fn test_nonzero_exit_still_returns_output() {
    let h = Harness::new();
    let agent = h.script("agent", "#!/bin/sh\necho 'partial answer'\nexit 2\n");
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    let reply = dispatcher.dispatch(&DispatchRequest::new("hi", key())).await;
    assert_eq!(reply, "partial answer");
}

#[tokio::test]
async fn test_missing_executable_becomes_error_reply() {
    let h = Harness::new();
    let dispatcher = h.dispatcher(h.cursor_config(Path::new("/nonexistent/openab/agent")));

    let reply = dispatcher.dispatch(&DispatchRequest::new("hi", key())).await;
    assert!(reply.starts_with("Error: "), "got: {reply}");
    assert!(reply.contains("Failed to spawn agent CLI"), "got: {reply}");
}

#[tokio::test]
async fn test_codex_reply_read_from_output_file() {
    let h = Harness::new();
    let agent = h.script(
        "codex",
        r#"#!/bin/sh
echo "progress noise"
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-last-message" ]; then out="$2"; fi
  shift
done
printf 'final answer\n' > "$out"
"#,
    );
    let mut config = h.cursor_config(&agent);
    config.agent.backend = BackendKind::Codex;
    config.backends.codex.cmd = Some(agent.to_string_lossy().into_owned());
    let dispatcher = h.dispatcher(config);

    let reply = dispatcher.dispatch(&DispatchRequest::new("hi", key())).await;
    assert_eq!(reply, "final answer");
}

#[tokio::test]
async fn test_openclaw_media_lines_are_stripped() {
    let h = Harness::new();
    let agent = h.script(
        "openclaw",
        "#!/bin/sh\necho 'MEDIA: /tmp/chart.png'\necho 'Here is the chart.'\n",
    );
    let mut config = h.cursor_config(&agent);
    config.agent.backend = BackendKind::OpenClaw;
    config.backends.openclaw.cmd = Some(agent.to_string_lossy().into_owned());
    let dispatcher = h.dispatcher(config);

    let reply = dispatcher.dispatch(&DispatchRequest::new("chart?", key())).await;
    assert_eq!(reply, "Here is the chart.");
}

#[test]
fn test_prepare_consumes_fresh_once() {
    let h = Harness::new();
    let dispatcher = h.dispatcher(h.cursor_config(Path::new("/opt/cursor/agent")));
    dispatcher.mark_fresh(&key());

    let request = DispatchRequest::new(" hello ", key());
    let (_, fresh) = dispatcher.prepare(&request).unwrap();
    let (_, next) = dispatcher.prepare(&request).unwrap();

    assert!(!fresh.has_arg("--continue"));
    assert!(next.has_arg("--continue"));
    assert_eq!(next.args.last().map(String::as_str), Some(" hello "));
    assert_eq!(next.program, PathBuf::from("/opt/cursor/agent"));
}

#[tokio::test]
async fn test_prompt_whitespace_reaches_agent() {
    let h = Harness::new();
    let agent = h.script("agent", ECHO_AGENT);
    let dispatcher = h.dispatcher(h.cursor_config(&agent));

    let prompt = "    indented line\n```\ncode\n```";
    let (_, invocation) = dispatcher.prepare(&DispatchRequest::new(prompt, key())).unwrap();
    assert_eq!(invocation.args.last().map(String::as_str), Some(prompt));

    let blank = dispatcher.dispatch(&DispatchRequest::new(" \n\t ", key())).await;
    assert_eq!(blank, Lang::En.empty_prompt());
    assert!(h.calls().is_empty());
}

#[test]
fn test_request_workspace_overrides_config() {
    let h = Harness::new();
    let dispatcher = h.dispatcher(h.cursor_config(Path::new("/opt/cursor/agent")));

    let request = DispatchRequest::new("hi", key()).workspace("/srv/other");
    let (_, invocation) = dispatcher.prepare(&request).unwrap();
    assert_eq!(invocation.arg_value("--workspace"), Some("/srv/other"));
    assert_eq!(invocation.cwd, Some(PathBuf::from("/srv/other")));
}
