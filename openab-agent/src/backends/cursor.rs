// ABOUTME: Cursor Agent CLI backend - spawns `agent agent --print --output-format text`.
// ABOUTME: Supports --continue / --resume <id>, merges stderr into the reply stream.

use crate::backend::BackendKind;
use crate::backends::{command_name, workspace_arg};
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext, OutputStrategy};
use crate::resolve::{conventional_bin_dirs, resolve_executable};
use crate::traits::AgentBackend;
use crate::SessionMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONTINUE_VAR: &str = "CURSOR_AGENT_CONTINUE";
pub const ALLOW_CODE_EXECUTION_VAR: &str = "CURSOR_AGENT_ALLOW_CODE_EXECUTION";

/// `[cursor]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Executable path or name (default `agent`)
    pub cmd: Option<String>,
    /// Pass `--force` so the agent may run commands (default true)
    pub allow_code_execution: Option<bool>,
    /// Continue the last session unless told otherwise (default true)
    pub continue_session: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CursorBackend {
    config: CursorConfig,
}

impl CursorBackend {
    pub fn new(config: CursorConfig) -> Self {
        Self { config }
    }

    fn allow_code_execution(&self, env: &Env) -> bool {
        self.config
            .allow_code_execution
            .or_else(|| env.flag(ALLOW_CODE_EXECUTION_VAR))
            .unwrap_or(true)
    }

    fn continue_by_default(&self, env: &Env) -> bool {
        self.config
            .continue_session
            .or_else(|| env.flag(CONTINUE_VAR))
            .unwrap_or(true)
    }
}

impl AgentBackend for CursorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cursor
    }

    fn resolve_executable(&self, env: &Env) -> PathBuf {
        let cmd = command_name(self.config.cmd.as_deref(), env, self.kind());
        resolve_executable(&cmd, &conventional_bin_dirs(env))
    }

    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation> {
        let env = ctx.env;
        let program = self.resolve_executable(env);

        let mut inv = Invocation::new(&program).args([
            "agent",
            "--print",
            "--output-format",
            "text",
            "--trust",
        ]);
        if self.allow_code_execution(env) {
            inv = inv.arg("--force");
        }
        match ctx.directive.mode(self.continue_by_default(env)) {
            SessionMode::New => {}
            SessionMode::ContinueLast => inv = inv.arg("--continue"),
            SessionMode::Resume(id) => inv = inv.args(["--resume", id]),
        }
        if let Some(ws) = workspace_arg(ctx) {
            inv = inv.args(["--workspace".to_string(), ws]);
        }
        inv = inv.args(["--", ctx.prompt]);

        // Node buffers stdout heavily when it is not a TTY
        if !env.contains("PYTHONUNBUFFERED") {
            inv = inv.env("PYTHONUNBUFFERED", "1");
        }
        // Unresolved bare name: give the child the same extra bin dirs we searched
        if !program.is_absolute() {
            let extra = conventional_bin_dirs(env)
                .iter()
                .map(|d| d.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(":");
            let path = match env.get("PATH") {
                Some(existing) => format!("{existing}:{extra}"),
                None => extra,
            };
            inv = inv.env("PATH", path);
        }

        Ok(inv
            .cwd(ctx.workspace)
            .output(OutputStrategy::Piped { merge_stderr: true }))
    }
}
