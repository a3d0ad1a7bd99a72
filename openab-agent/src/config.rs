// ABOUTME: Per-backend configuration sections ([cursor], [codex], [gemini], [claude], [openclaw]).
// ABOUTME: Selecting a BackendKind yields the strongly-typed Backend variant carrying its options.

use crate::backend::BackendKind;
use crate::backends::{
    Backend, ClaudeBackend, ClaudeConfig, CodexBackend, CodexConfig, CursorBackend, CursorConfig,
    GeminiBackend, GeminiConfig, OpenClawBackend, OpenClawConfig,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// All backend sections; any may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub cursor: CursorConfig,
    pub codex: CodexConfig,
    pub gemini: GeminiConfig,
    pub claude: ClaudeConfig,
    pub openclaw: OpenClawConfig,
}

impl BackendsConfig {
    /// Parse backend sections from a TOML document (other tables are ignored)
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse backend config TOML")
    }

    /// Build the adapter for `kind` from its section
    pub fn select(&self, kind: BackendKind) -> Backend {
        match kind {
            BackendKind::Cursor => Backend::Cursor(CursorBackend::new(self.cursor.clone())),
            BackendKind::Codex => Backend::Codex(CodexBackend::new(self.codex.clone())),
            BackendKind::Gemini => Backend::Gemini(GeminiBackend::new(self.gemini.clone())),
            BackendKind::Claude => Backend::Claude(ClaudeBackend::new(self.claude.clone())),
            BackendKind::OpenClaw => Backend::OpenClaw(OpenClawBackend::new(self.openclaw.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::claude::{DirList, MaxTurns};
    use crate::traits::AgentBackend;

    #[test]
    fn test_parse_backend_sections() {
        let toml = r#"
[agent]
backend = "claude"

[cursor]
cmd = "/usr/local/bin/agent"
continue_session = false

[claude]
model = "sonnet"
max_turns = 8
add_dir = ["/srv/docs"]

[openclaw]
thinking = "high"
timeout_secs = 90
"#;
        let config = BackendsConfig::parse(toml).unwrap();
        assert_eq!(config.cursor.cmd.as_deref(), Some("/usr/local/bin/agent"));
        assert_eq!(config.cursor.continue_session, Some(false));
        assert_eq!(config.claude.max_turns, Some(MaxTurns::Count(8)));
        assert_eq!(
            config.claude.add_dir,
            Some(DirList::List(vec!["/srv/docs".to_string()]))
        );
        assert_eq!(config.openclaw.timeout_secs, Some(90));
        assert_eq!(config.codex, CodexConfig::default());
    }

    #[test]
    fn test_select_matches_kind() {
        let config = BackendsConfig::default();
        for kind in BackendKind::ALL {
            assert_eq!(config.select(kind).kind(), kind);
        }
    }
}
