//! `Evidence` and its call-stack frames (§3, §4.1).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One frame of a resolved backtrace, leaf-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file: PathBuf,
    pub line: u32,
    pub command: Option<String>,
}

/// An ordered call stack whose leaf is the user's actual call site
/// (§4.1's "first user-code frame").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub call_stack: Vec<Frame>,
}

impl Evidence {
    pub fn leaf(&self) -> Option<&Frame> {
        self.call_stack.first()
    }

    /// Invariant 1: non-empty, every frame's line is a positive integer.
    /// Repo-root containment is checked by the caller, which has the
    /// `Repository.root_path` in scope.
    pub fn is_well_formed(&self) -> bool {
        !self.call_stack.is_empty() && self.call_stack.iter().all(|f| f.line >= 1)
    }
}
