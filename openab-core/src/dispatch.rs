// ABOUTME: Backend dispatcher: folds the conversation's session override into one agent call.
// ABOUTME: Every outcome, including timeouts and launch failures, becomes reply text.
use crate::config::Config;
use crate::discovery::{self, SessionEntry, SessionSources};
use crate::replies::Lang;
use crate::session::{ConversationKey, SessionStateStore};
use anyhow::Result;
use openab_agent::{
    run, AgentBackend, Backend, Env, Invocation, InvocationContext, Reply, RunOutcome,
    SessionDirective,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One inbound prompt from a front end.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub prompt: String,
    /// Overrides the configured workspace
    pub workspace: Option<PathBuf>,
    /// Overrides the configured timeout
    pub timeout: Option<Duration>,
    pub key: ConversationKey,
    pub lang: Lang,
}

impl DispatchRequest {
    pub fn new(prompt: impl Into<String>, key: ConversationKey) -> Self {
        Self {
            prompt: prompt.into(),
            workspace: None,
            timeout: None,
            key,
            lang: Lang::default(),
        }
    }

    pub fn workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }
}

/// Routes prompts to the configured backend and owns the per-conversation session state.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Dispatcher {
    config: Config,
    store: Arc<SessionStateStore>,
    env: Env,
}

impl Dispatcher {
    pub fn new(config: Config, store: Arc<SessionStateStore>) -> Self {
        Self {
            config,
            store,
            env: Env::from_process(),
        }
    }

    /// Replace the environment snapshot used for backend option fallbacks
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStateStore> {
        &self.store
    }

    /// Next prompt in this conversation starts a brand-new backend session
    pub fn mark_fresh(&self, key: &ConversationKey) {
        self.store.set_fresh(key);
    }

    /// Pin this conversation to a backend session id, or unpin with `None`
    pub fn set_resume(&self, key: &ConversationKey, session_id: Option<&str>) {
        self.store.set_resume(key, session_id);
    }

    /// Resumable sessions of the active backend, newest first
    pub fn list_sessions(&self, max_count: usize) -> Vec<SessionEntry> {
        discovery::list_sessions(
            &SessionSources::detect(&self.env),
            self.config.backend(),
            max_count,
        )
    }

    fn timeout_for(&self, request: &DispatchRequest) -> Duration {
        request.timeout.unwrap_or_else(|| self.config.timeout())
    }

    /// Select the backend, consume the session override and build the invocation
    ///
    /// A pending Fresh directive is consumed here even if the caller never runs the invocation,
    /// but is put back when the invocation cannot be built.
    pub fn prepare(&self, request: &DispatchRequest) -> Result<(Backend, Invocation)> {
        let backend = self.config.backends.select(self.config.backend());
        let directive = self.store.consume_override(&request.key).into_directive();
        let workspace = request
            .workspace
            .clone()
            .or_else(|| self.config.resolve_workspace(&self.env));

        tracing::debug!(
            key = %request.key,
            backend = %backend.kind(),
            ?directive,
            "Session override consumed"
        );

        let ctx = InvocationContext {
            prompt: &request.prompt,
            workspace: workspace.as_deref(),
            timeout: self.timeout_for(request),
            directive: &directive,
            env: &self.env,
        };
        match backend.build_invocation(&ctx) {
            Ok(invocation) => Ok((backend, invocation)),
            Err(e) => {
                if directive == SessionDirective::Fresh {
                    self.store.restore_fresh(&request.key);
                }
                Err(e)
            }
        }
    }

    /// Run one prompt and always come back with reply text
    pub async fn dispatch(&self, request: &DispatchRequest) -> String {
        let lang = request.lang;
        if request.prompt.trim().is_empty() {
            return lang.empty_prompt().to_string();
        }

        let (backend, invocation) = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(key = %request.key, error = %e, "Failed to build agent invocation");
                return lang.agent_error(&format!("{e:#}"));
            }
        };

        let timeout = self.timeout_for(request);
        tracing::info!(
            key = %request.key,
            backend = %backend.kind(),
            prompt_len = request.prompt.len(),
            timeout_secs = timeout.as_secs(),
            "Dispatching prompt"
        );

        match run(invocation, timeout).await {
            Ok(RunOutcome::Completed { output, exit_code }) => {
                if exit_code != Some(0) {
                    tracing::warn!(
                        key = %request.key,
                        backend = %backend.kind(),
                        ?exit_code,
                        "Agent exited unsuccessfully, returning captured output"
                    );
                }
                match backend.extract_reply(&output) {
                    Reply::Text(text) => text,
                    Reply::NoOutput => lang.no_output().to_string(),
                }
            }
            Ok(RunOutcome::TimedOut) => {
                tracing::warn!(key = %request.key, backend = %backend.kind(), "Agent timed out");
                lang.timed_out().to_string()
            }
            Err(e) => {
                tracing::error!(key = %request.key, backend = %backend.kind(), error = %e, "Agent run failed");
                lang.agent_error(&format!("{e:#}"))
            }
        }
    }
}
