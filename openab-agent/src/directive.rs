// ABOUTME: Session directive carried into a single backend invocation.
// ABOUTME: Continue, Fresh and Resume are one enum so only one can ever be active.

use serde::{Deserialize, Serialize};

/// How the next invocation should treat the backend's own session storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionDirective {
    /// Let the backend decide (usually "continue the last session")
    #[default]
    Continue,
    /// Start with no prior context; consumed after one use
    Fresh,
    /// Pin to an explicit backend session id
    Resume(String),
}

/// Concrete session behaviour after applying the backend's continue-by-default setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode<'a> {
    New,
    ContinueLast,
    Resume(&'a str),
}

impl SessionDirective {
    /// `Resume(id)` for a non-blank id, `Continue` otherwise
    pub fn resume(id: Option<&str>) -> Self {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::Resume(id.to_string()),
            None => Self::Continue,
        }
    }

    /// Per-call directive wins; `continue_by_default` only decides the `Continue` case.
    pub fn mode(&self, continue_by_default: bool) -> SessionMode<'_> {
        match self {
            Self::Fresh => SessionMode::New,
            Self::Resume(id) => SessionMode::Resume(id),
            Self::Continue if continue_by_default => SessionMode::ContinueLast,
            Self::Continue => SessionMode::New,
        }
    }
}
