// ABOUTME: Tests for command-line parsing and command execution
// ABOUTME: Execution tests point OPENAB_CONFIG at temp configs with /bin/sh stub agents

use clap::Parser;
use openab::cli::{execute, Cli, Command};
use openab_core::{BackendKind, Env};

#[test]
fn test_parse_ask() {
    let cli = Cli::try_parse_from([
        "openab", "-v", "ask", "--backend", "claude", "--timeout", "30", "--resume", "abc",
        "what", "is", "this",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Command::Ask {
            backend,
            timeout,
            fresh,
            resume,
            prompt,
            ..
        } => {
            assert_eq!(backend, Some(BackendKind::Claude));
            assert_eq!(timeout, Some(30));
            assert!(!fresh);
            assert_eq!(resume.as_deref(), Some("abc"));
            assert_eq!(prompt, ["what", "is", "this"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!(Cli::try_parse_from(["openab", "ask"]).is_err());
    assert!(Cli::try_parse_from(["openab", "ask", "--backend", "copilot", "hi"]).is_err());
    assert!(Cli::try_parse_from(["openab", "ask", "--fresh", "--resume", "x", "hi"]).is_err());
}

#[test]
fn test_parse_sessions_defaults() {
    let cli = Cli::try_parse_from(["openab", "sessions"]).unwrap();
    match cli.command {
        Command::Sessions { backend, limit } => {
            assert_eq!(backend, None);
            assert_eq!(limit, 15);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[tokio::test]
async fn test_config_path_reports_injected_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("openab.toml");
    std::fs::write(&path, "").unwrap();
    let env = Env::from_pairs([("OPENAB_CONFIG", path.to_string_lossy().into_owned())]);

    let mut out = Vec::new();
    execute(Command::ConfigPath, env, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap().trim(), path.display().to_string());
}

#[tokio::test]
async fn test_sessions_lists_codex_history() {
    let home = tempfile::tempdir().unwrap();
    let codex = home.path().join(".codex");
    std::fs::create_dir_all(&codex).unwrap();
    std::fs::write(
        codex.join("history.jsonl"),
        r#"{"session_id":"019ca5f4-2170-7961-9d0a-24537ec4c29c","ts":1770000000,"text":"hello codex"}"#,
    )
    .unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "[agent]\nbackend = \"codex\"\n").unwrap();
    let env = Env::from_pairs([
        ("HOME", home.path().to_string_lossy().into_owned()),
        ("OPENAB_CONFIG", config.to_string_lossy().into_owned()),
    ]);

    let mut out = Vec::new();
    execute(
        Command::Sessions {
            backend: None,
            limit: 5,
        },
        env,
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "019ca5f4-2170-7961-9d0a-24537ec4c29c\thello codex\n"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_ask_prints_agent_reply() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let agent = dir.path().join("claude");
    std::fs::write(&agent, "#!/bin/sh\nfor last; do :; done\nprintf '%s\\n' \"$last\"\n").unwrap();
    std::fs::set_permissions(&agent, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!("[claude]\ncmd = \"{}\"\n", agent.display()),
    )
    .unwrap();
    let env = Env::from_pairs([
        ("HOME", dir.path().to_string_lossy().into_owned()),
        ("OPENAB_CONFIG", config.to_string_lossy().into_owned()),
    ]);

    let mut out = Vec::new();
    execute(
        Command::Ask {
            backend: Some(BackendKind::Claude),
            workspace: Some(dir.path().to_path_buf()),
            timeout: Some(5),
            fresh: true,
            resume: None,
            prompt: vec!["hello".into(), "there".into()],
        },
        env,
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hello there\n");
}
