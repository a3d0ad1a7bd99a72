// ABOUTME: Command-line front end: argument definitions and command execution
// ABOUTME: Writes replies and listings to the given writer; logs go to stderr

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openab_agent::resolve::detect_available_backends;
use openab_core::{
    paths, BackendKind, Config, ConversationKey, DispatchRequest, Dispatcher, Env, Lang,
    Platform, SessionStateStore,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "openab", version)]
#[command(about = "Send prompts to local agent CLIs with session continuity", long_about = None)]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one prompt to the agent and print the reply
    Ask {
        /// cursor, codex, gemini, claude or openclaw
        #[arg(long)]
        backend: Option<BackendKind>,
        #[arg(long)]
        workspace: Option<PathBuf>,
        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Start a new backend session instead of continuing the last one
        #[arg(long, conflicts_with = "resume")]
        fresh: bool,
        /// Resume a specific backend session id
        #[arg(long)]
        resume: Option<String>,
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// List resumable sessions, newest first
    Sessions {
        #[arg(long)]
        backend: Option<BackendKind>,
        #[arg(long, default_value_t = 15)]
        limit: usize,
    },
    /// Show which agent CLIs are installed
    Detect,
    /// Print the configuration file that would be loaded
    ConfigPath,
}

/// Conversation used for one-shot command-line prompts
fn cli_conversation() -> ConversationKey {
    ConversationKey::new(Platform::Cli, 0, 0)
}

fn load_config(env: &Env, backend: Option<BackendKind>) -> Result<Config> {
    let mut config = Config::load_with_env(env)?;
    if let Some(kind) = backend {
        config.agent.backend = kind;
    }
    Ok(config)
}

/// Run `command`, reading options from `env`
pub async fn execute(command: Command, env: Env, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Ask {
            backend,
            workspace,
            timeout,
            fresh,
            resume,
            prompt,
        } => {
            let config = load_config(&env, backend)?;
            let lang = Lang::from_env(&env);
            let dispatcher =
                Dispatcher::new(config, Arc::new(SessionStateStore::new())).with_env(env);

            let key = cli_conversation();
            if fresh {
                dispatcher.mark_fresh(&key);
            } else if resume.is_some() {
                dispatcher.set_resume(&key, resume.as_deref());
            }

            let mut request = DispatchRequest::new(prompt.join(" "), key).lang(lang);
            if let Some(dir) = workspace {
                request = request.workspace(dir);
            }
            if let Some(secs) = timeout {
                request = request.timeout(Duration::from_secs(secs));
            }
            let reply = dispatcher.dispatch(&request).await;
            writeln!(out, "{reply}").context("Failed to write reply")?;
        }
        Command::Sessions { backend, limit } => {
            let config = load_config(&env, backend)?;
            let dispatcher =
                Dispatcher::new(config, Arc::new(SessionStateStore::new())).with_env(env);
            for entry in dispatcher.list_sessions(limit) {
                writeln!(out, "{}\t{}", entry.id, entry.label)?;
            }
        }
        Command::Detect => {
            let found = detect_available_backends();
            if found.is_empty() {
                writeln!(out, "No agent CLI found on PATH")?;
            }
            for (kind, path) in found {
                writeln!(out, "{kind}\t{}", path.display())?;
            }
        }
        Command::ConfigPath => match Config::find_config_file(&env) {
            Some(path) => writeln!(out, "{}", path.display())?,
            None => writeln!(
                out,
                "No config file found (defaults in use); expected at {}",
                paths::config_file().display()
            )?,
        },
    }
    Ok(())
}
