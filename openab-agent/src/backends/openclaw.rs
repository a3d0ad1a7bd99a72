// ABOUTME: OpenClaw backend - `openclaw agent --message "<prompt>"` against a running gateway.
// ABOUTME: Strips MEDIA: attachment lines from the reply; supports --timeout and --thinking.

use crate::backend::BackendKind;
use crate::backends::command_name;
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext, OutputStrategy};
use crate::reply::Reply;
use crate::resolve::resolve_executable;
use crate::traits::AgentBackend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const TIMEOUT_VAR: &str = "OPENCLAW_TIMEOUT";
pub const THINKING_VAR: &str = "OPENCLAW_THINKING";

/// Lines with this prefix reference attachments a text reply cannot carry
const MEDIA_PREFIX: &str = "MEDIA:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingLevel {
    Off,
    Minimal,
    Low,
    Medium,
    High,
    XHigh,
}

impl ThinkingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::XHigh => "xhigh",
        }
    }
}

impl fmt::Display for ThinkingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThinkingLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "minimal" => Ok(Self::Minimal),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "xhigh" => Ok(Self::XHigh),
            other => anyhow::bail!("Unknown thinking level: {}", other),
        }
    }
}

/// `[openclaw]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenClawConfig {
    pub cmd: Option<String>,
    /// Value for `--timeout`; falls back to the call timeout
    pub timeout_secs: Option<u64>,
    /// One of off, minimal, low, medium, high, xhigh
    pub thinking: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OpenClawBackend {
    config: OpenClawConfig,
}

impl OpenClawBackend {
    pub fn new(config: OpenClawConfig) -> Self {
        Self { config }
    }

    fn thinking(&self, env: &Env) -> Option<ThinkingLevel> {
        let raw = self
            .config
            .thinking
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| env.get(THINKING_VAR))?;
        match raw.parse() {
            Ok(level) => Some(level),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping OpenClaw thinking level");
                None
            }
        }
    }

    fn timeout_secs(&self, ctx: &InvocationContext<'_>) -> u64 {
        self.config
            .timeout_secs
            .or_else(|| ctx.env.get(TIMEOUT_VAR).and_then(|v| v.parse().ok()))
            .unwrap_or_else(|| ctx.timeout.as_secs())
    }
}

impl AgentBackend for OpenClawBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenClaw
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        resolve_executable(&command_name(self.config.cmd.as_deref(), env, self.kind()), &[])
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        let mut inv =
            Invocation::new(self.resolve_executable(ctx.env)).args(["agent", "--message", ctx.prompt]);

        let timeout = self.timeout_secs(ctx);
        if timeout > 0 {
            inv = inv.args(["--timeout".to_string(), timeout.to_string()]);
        }
        if let Some(level) = self.thinking(ctx.env) {
            inv = inv.args(["--thinking", level.as_str()]);
        }

        Ok(inv
            .cwd(ctx.workspace)
            .output(OutputStrategy::Piped { merge_stderr: false }))
    }

    fn extract_reply(&self, raw: &str) -> Reply {
        Reply::from_text(&strip_media_lines(raw))
    }
}

pub fn strip_media_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with(MEDIA_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}
