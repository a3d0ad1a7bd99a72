// ABOUTME: Direct Codex CLI backend - spawns `codex exec` and reads the final message from a file.
// ABOUTME: Supports `resume --last` / `resume <id>`; -C is only valid on the fresh form.

use crate::backend::BackendKind;
use crate::backends::{command_name, workspace_arg};
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext, OutputFile, OutputStrategy};
use crate::resolve::resolve_executable;
use crate::traits::AgentBackend;
use crate::SessionMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SKIP_GIT_CHECK_VAR: &str = "CODEX_SKIP_GIT_CHECK";
pub const CONTINUE_VAR: &str = "CODEX_CONTINUE";

/// `[codex]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodexConfig {
    /// Executable path or name (default `codex`)
    pub cmd: Option<String>,
    /// Pass `--skip-git-repo-check` (default true; workspaces are rarely git repos)
    pub skip_git_check: Option<bool>,
    /// Resume the last session unless told otherwise (default true)
    pub continue_session: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CodexBackend {
    config: CodexConfig,
}

impl CodexBackend {
    pub fn new(config: CodexConfig) -> Self {
        Self { config }
    }

    fn skip_git_check(&self, env: &Env) -> bool {
        self.config
            .skip_git_check
            .or_else(|| env.flag(SKIP_GIT_CHECK_VAR))
            .unwrap_or(true)
    }

    fn continue_by_default(&self, env: &Env) -> bool {
        self.config
            .continue_session
            .or_else(|| env.flag(CONTINUE_VAR))
            .unwrap_or(true)
    }
}

impl AgentBackend for CodexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Codex
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        resolve_executable(&command_name(self.config.cmd.as_deref(), env, self.kind()), &[])
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        let env = ctx.env;
        // Non-interactive codex does not reliably flush the final message to stdout
        let output = OutputFile::create()?;

        let mut inv = Invocation::new(self.resolve_executable(env)).arg("exec");
        if self.skip_git_check(env) {
            inv = inv.arg("--skip-git-repo-check");
        }
        inv = inv.args([
            "--output-last-message".to_string(),
            output.path().to_string_lossy().into_owned(),
        ]);

        // Global flags must precede the `resume` subcommand
        match ctx.directive.mode(self.continue_by_default(env)) {
            SessionMode::New => {
                if let Some(ws) = workspace_arg(ctx) {
                    inv = inv.args(["-C".to_string(), ws]);
                }
            }
            SessionMode::ContinueLast => inv = inv.args(["resume", "--last"]),
            SessionMode::Resume(id) => inv = inv.args(["resume", id]),
        }
        inv = inv.arg(ctx.prompt);

        Ok(inv.cwd(ctx.workspace).output(OutputStrategy::File(output)))
    }
}
