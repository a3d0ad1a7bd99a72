// ABOUTME: Claude Code CLI backend - print mode with plain text output.
// ABOUTME: Supports --model, --max-turns, repeated --add-dir and --continue / --resume <id>.

use crate::backend::BackendKind;
use crate::backends::command_name;
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext, OutputStrategy};
use crate::resolve::resolve_executable;
use crate::traits::AgentBackend;
use crate::SessionMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MODEL_VAR: &str = "CLAUDE_CLI_MODEL";
pub const MAX_TURNS_VAR: &str = "CLAUDE_CLI_MAX_TURNS";
pub const ADD_DIR_VAR: &str = "CLAUDE_CLI_ADD_DIR";
pub const CONTINUE_VAR: &str = "CLAUDE_CLI_CONTINUE";

/// Either `"a:b"` or `["a", "b"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirList {
    Joined(String),
    List(Vec<String>),
}

impl DirList {
    pub fn dirs(&self) -> Vec<String> {
        match self {
            DirList::Joined(joined) => split_dirs(joined),
            DirList::List(list) => list
                .iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }
}

/// `max_turns = 10` or `max_turns = "10"`; anything else is ignored with a warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxTurns {
    Count(u32),
    Text(String),
    Other(toml::Value),
}

impl MaxTurns {
    pub fn turns(&self) -> Option<u32> {
        match self {
            MaxTurns::Count(turns) => Some(*turns),
            MaxTurns::Text(text) => parse_turns(text, "max_turns"),
            MaxTurns::Other(value) => {
                tracing::warn!(value = %value, "Ignoring non-numeric max_turns");
                None
            }
        }
    }
}

fn parse_turns(raw: &str, source: &str) -> Option<u32> {
    match raw.trim().parse() {
        Ok(turns) => Some(turns),
        Err(_) => {
            tracing::warn!(value = raw, "Ignoring non-numeric {}", source);
            None
        }
    }
}

fn split_dirs(joined: &str) -> Vec<String> {
    joined
        .split(':')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// `[claude]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeConfig {
    pub cmd: Option<String>,
    pub model: Option<String>,
    pub max_turns: Option<MaxTurns>,
    pub add_dir: Option<DirList>,
    /// Continue the most recent session unless told otherwise (default false)
    pub continue_session: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ClaudeBackend {
    config: ClaudeConfig,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Self {
        Self { config }
    }

    fn model<'a>(&'a self, env: &'a Env) -> Option<&'a str> {
        self.config
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| env.get(MODEL_VAR))
    }

    fn max_turns(&self, env: &Env) -> Option<u32> {
        match &self.config.max_turns {
            Some(configured) => configured.turns(),
            None => parse_turns(env.get(MAX_TURNS_VAR)?, MAX_TURNS_VAR),
        }
    }

    fn add_dirs(&self, env: &Env) -> Vec<String> {
        let configured = self
            .config
            .add_dir
            .as_ref()
            .map(DirList::dirs)
            .unwrap_or_default();
        if !configured.is_empty() {
            return configured;
        }
        env.get(ADD_DIR_VAR).map(split_dirs).unwrap_or_default()
    }

    fn continue_by_default(&self, env: &Env) -> bool {
        self.config
            .continue_session
            .or_else(|| env.flag(CONTINUE_VAR))
            .unwrap_or(false)
    }
}

impl AgentBackend for ClaudeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Claude
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        resolve_executable(&command_name(self.config.cmd.as_deref(), env, self.kind()), &[])
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        let env = ctx.env;
        let mut inv = Invocation::new(self.resolve_executable(env)).args([
            "--print",
            "--output-format",
            "text",
        ]);

        if let Some(model) = self.model(env) {
            inv = inv.args(["--model", model]);
        }
        if let Some(turns) = self.max_turns(env) {
            inv = inv.args(["--max-turns".to_string(), turns.to_string()]);
        }
        for dir in self.add_dirs(env) {
            inv = inv.args(["--add-dir".to_string(), dir]);
        }
        match ctx.directive.mode(self.continue_by_default(env)) {
            SessionMode::New => {}
            SessionMode::ContinueLast => inv = inv.arg("--continue"),
            SessionMode::Resume(id) => inv = inv.args(["--resume", id]),
        }
        inv = inv.arg(ctx.prompt);

        Ok(inv
            .cwd(ctx.workspace)
            .output(OutputStrategy::Piped { merge_stderr: false }))
    }
}
