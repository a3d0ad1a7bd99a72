// ABOUTME: Session continuity and backend dispatch for openab
// ABOUTME: Per-conversation session state, session discovery, configuration and the dispatcher

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod paths;
pub mod replies;
pub mod session;

pub use config::Config;
pub use discovery::{list_sessions, SessionEntry, SessionSources};
pub use dispatch::{DispatchRequest, Dispatcher};
pub use replies::Lang;
pub use session::{ConversationKey, Platform, SessionOverride, SessionStateStore};

// Re-export the agent types front ends need
pub use openab_agent::{BackendKind, Env, SessionDirective};
