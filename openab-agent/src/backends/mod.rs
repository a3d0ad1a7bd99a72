// ABOUTME: Backend adapters (Cursor, Codex, Gemini, Claude, OpenClaw).
// ABOUTME: Each adapter implements AgentBackend; Backend is the closed sum over all of them.

pub mod claude;
pub mod codex;
pub mod cursor;
pub mod gemini;
pub mod openclaw;

use crate::backend::BackendKind;
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext};
use crate::reply::Reply;
use crate::traits::AgentBackend;
use anyhow::Result;
use std::path::PathBuf;

pub use claude::{ClaudeBackend, ClaudeConfig};
pub use codex::{CodexBackend, CodexConfig};
pub use cursor::{CursorBackend, CursorConfig};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use openclaw::{OpenClawBackend, OpenClawConfig, ThinkingLevel};

/// The active backend together with its typed options.
#[derive(Debug, Clone)]
pub enum Backend {
    Cursor(CursorBackend),
    Codex(CodexBackend),
    Gemini(GeminiBackend),
    Claude(ClaudeBackend),
    OpenClaw(OpenClawBackend),
}

impl Backend {
    fn adapter(&self) -> &dyn AgentBackend {
        match self {
            Backend::Cursor(b) => b,
            Backend::Codex(b) => b,
            Backend::Gemini(b) => b,
            Backend::Claude(b) => b,
            Backend::OpenClaw(b) => b,
        }
    }
}

impl AgentBackend for Backend {
    fn kind(&self) -> BackendKind {
        self.adapter().kind()
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        self.adapter().resolve_executable(env)
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        self.adapter().build_invocation(ctx)
    }

    fn extract_reply(&self, raw: &str) -> Reply {
        self.adapter().extract_reply(raw)
    }
}

/// Configured command, else the backend's env var, else its default name.
pub(crate) fn command_name(configured: Option<&str>, env: &Env, kind: BackendKind) -> String {
    configured
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| env.get(kind.command_env_var()))
        .unwrap_or(kind.default_command())
        .to_string()
}

pub(crate) fn workspace_arg(ctx: &InvocationContext<'_>) -> Option<String> {
    ctx.workspace.map(|ws| ws.to_string_lossy().into_owned())
}
