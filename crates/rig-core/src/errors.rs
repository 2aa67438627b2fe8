//! Structured error taxonomy for RIG extraction.
//!
//! Every variant carries exactly the fields needed to name the offending
//! entity or input without a second free-text message doing the real work.
//! `rig-cli` is the only place these get serialized for the `--json` error
//! path (via the derived `Serialize` impl) or wrapped in `anyhow::Context`.

use serde::Serialize;
use std::fmt;

use crate::model::ids::NodeKind;

/// A reference to an entity that may not have been assigned an id yet
/// (e.g. while still being classified, before `freeze()`).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: NodeKind,
    pub name: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.name)
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "data")]
pub enum RigError {
    // -- input errors --
    #[error("no build-api reply set found under {reply_dir}")]
    NoReplyFound { reply_dir: String },

    #[error("reply set at {index_path} references missing file {missing_path}")]
    StaleReply {
        index_path: String,
        missing_path: String,
    },

    #[error("schema mismatch: expected {object} major version {expected}, found {found}")]
    SchemaMismatch {
        object: String,
        expected: u32,
        found: u32,
    },

    #[error("test listing command failed with exit code {exit_code}: {stderr}")]
    TestListingFailed { exit_code: i32, stderr: String },

    #[error("test listing output could not be parsed as JSON: {message}")]
    TestListingUnparseable { message: String },

    #[error("limit exceeded: {what} ({actual} > {limit})")]
    LimitExceeded {
        what: String,
        actual: u64,
        limit: u64,
    },

    // -- structural errors --
    #[error("no frame within repository root found while walking backtrace")]
    NoUserFrame,

    #[error("malformed backtrace graph: {reason}")]
    MalformedBacktrace { reason: String },

    #[error("target {target} depends on unknown target id {dependency_id}")]
    DanglingDependency { target: String, dependency_id: String },

    #[error("cyclic dependency: {}", path.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" -> "))]
    CyclicDependency { path: Vec<EntityRef> },

    #[error("ambiguous test link for test {test}")]
    AmbiguousTestLink { test: String },

    // -- invariant errors --
    #[error("entity {entity} is missing required evidence")]
    EvidenceMissing { entity: EntityRef },

    #[error("duplicate entity {entity}")]
    DuplicateEntity { entity: EntityRef },

    #[error("back-reference mismatch between {a} and {b}")]
    BackReferenceMismatch { a: EntityRef, b: EntityRef },

    // -- persistence errors --
    #[error("persistence transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("database schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    // -- config --
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type RigResult<T> = Result<T, RigError>;
