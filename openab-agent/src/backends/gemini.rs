// ABOUTME: Gemini CLI backend - `gemini -p "<prompt>"`, reply on stdout.
// ABOUTME: No session concept; directives are ignored.

use crate::backend::BackendKind;
use crate::backends::command_name;
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext, OutputStrategy};
use crate::resolve::resolve_executable;
use crate::traits::AgentBackend;
use crate::SessionDirective;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MODEL_VAR: &str = "GEMINI_CLI_MODEL";

/// `[gemini]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub cmd: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GeminiBackend {
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }
}

impl AgentBackend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        resolve_executable(&command_name(self.config.cmd.as_deref(), env, self.kind()), &[])
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        if *ctx.directive != SessionDirective::Continue {
            tracing::debug!(directive = ?ctx.directive, "Gemini has no sessions, ignoring directive");
        }

        let mut inv = Invocation::new(self.resolve_executable(ctx.env));
        let model = self
            .config
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| ctx.env.get(MODEL_VAR));
        if let Some(model) = model {
            inv = inv.args(["-m", model]);
        }
        inv = inv.args(["-p", ctx.prompt]);

        Ok(inv
            .cwd(ctx.workspace)
            .output(OutputStrategy::Piped { merge_stderr: false }))
    }
}
