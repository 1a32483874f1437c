//! Page-close interception

use serde::{Deserialize, Serialize};

/// Message attached to a blocked close; hosts may show their own text instead
pub const UNSAVED_CHANGES_MESSAGE: &str =
    "You have unsaved changes. Are you sure you want to leave?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnloadDecision {
    Allow,
    Block { message: String },
}

impl UnloadDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, UnloadDecision::Block { .. })
    }
}

/// Decides whether closing the page needs confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct UnloadGuard {
    static_mode: bool,
}

impl UnloadGuard {
    /// `static_mode` marks a read-only rendering that never blocks
    pub fn new(static_mode: bool) -> Self {
        Self { static_mode }
    }

    pub fn on_before_unload(&self, needs_save: bool) -> UnloadDecision {
        if self.static_mode || !needs_save {
            return UnloadDecision::Allow;
        }
        UnloadDecision::Block {
            message: UNSAVED_CHANGES_MESSAGE.to_string(),
        }
    }
}
