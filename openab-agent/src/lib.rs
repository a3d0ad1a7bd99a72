// ABOUTME: Agent CLI backend abstraction for openab.
// ABOUTME: Builds per-backend invocations and runs them as bounded, always-reaped subprocesses.

pub mod backend;
pub mod backends;
pub mod config;
pub mod directive;
pub mod env;
pub mod invocation;
pub mod process;
pub mod reply;
pub mod resolve;
pub mod traits;

pub use backend::BackendKind;
pub use backends::Backend;
pub use config::BackendsConfig;
pub use directive::{SessionDirective, SessionMode};
pub use env::Env;
pub use invocation::{Invocation, InvocationContext, OutputFile, OutputStrategy};
pub use process::{run, RunOutcome};
pub use reply::Reply;
pub use traits::AgentBackend;
