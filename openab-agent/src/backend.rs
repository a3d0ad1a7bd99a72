// ABOUTME: Static descriptors for the supported agent CLIs.
// ABOUTME: One closed enum instead of string-keyed backend lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The agent CLIs openab knows how to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Cursor Agent CLI
    #[default]
    Cursor,
    /// OpenAI Codex CLI
    Codex,
    /// Google Gemini CLI
    Gemini,
    /// Claude Code CLI
    Claude,
    /// OpenClaw gateway CLI
    OpenClaw,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Cursor,
        BackendKind::Codex,
        BackendKind::Gemini,
        BackendKind::Claude,
        BackendKind::OpenClaw,
    ];

    /// Order in which `detect` reports installed CLIs
    pub const DETECTION_ORDER: [BackendKind; 5] = [
        BackendKind::Cursor,
        BackendKind::OpenClaw,
        BackendKind::Claude,
        BackendKind::Gemini,
        BackendKind::Codex,
    ];

    /// Identifier used in config files and on the command line
    pub fn id(self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::OpenClaw => "openclaw",
        }
    }

    /// Executable name looked up on PATH when nothing is configured
    pub fn default_command(self) -> &'static str {
        match self {
            Self::Cursor => "agent",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::OpenClaw => "openclaw",
        }
    }

    /// Environment variable naming the executable
    pub fn command_env_var(self) -> &'static str {
        match self {
            Self::Cursor => "CURSOR_AGENT_CMD",
            Self::Codex => "CODEX_CMD",
            Self::Gemini => "GEMINI_CLI_CMD",
            Self::Claude => "CLAUDE_CLI_CMD",
            Self::OpenClaw => "OPENCLAW_CMD",
        }
    }

    /// Whether the CLI keeps resumable sessions of its own
    pub fn supports_sessions(self) -> bool {
        matches!(self, Self::Cursor | Self::Codex | Self::Claude)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown backend: {}", s.trim()))
    }
}
