// ABOUTME: Core AgentBackend trait that all backend adapters implement.
// ABOUTME: Defines executable resolution, invocation building and reply extraction.

use crate::backend::BackendKind;
use crate::env::Env;
use crate::invocation::{Invocation, InvocationContext};
use crate::reply::Reply;
use anyhow::Result;
use std::path::PathBuf;

/// Core trait that all agent backends implement.
///
/// Option resolution follows the same precedence everywhere: the per-call
/// session directive, then the backend's config section, then its
/// environment variables.
pub trait AgentBackend {
    fn kind(&self) -> BackendKind;

    /// Path (or bare command name when nothing was found) of the CLI to spawn
    fn resolve_executable(&self, env: &Env) -> PathBuf;

    /// Build the command line for a single prompt
    fn build_invocation(&self, ctx: &InvocationContext<'_>) -> Result<Invocation>;

    /// Turn captured process output into reply text
    fn extract_reply(&self, raw: &str) -> Reply {
        Reply::from_text(raw)
    }
}
