//! The build-system plugin contract (§4.9), specified here but never
//! implemented by this crate.
//!
//! This trait only describes *what shape* a plugin hands back, never *how*
//! it is obtained — the same split this codebase's plugin crate already
//! draws between a fetch trait and the host implementation of actual
//! network/filesystem I/O. `rig-core` depends on nothing that does real
//! I/O; `rig-cmake` is the (only) concrete implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::backtrace::{BacktraceNode, BacktraceSource};
use crate::errors::RigResult;

/// A `{nodes[], files[], commands[]}` backtrace graph, concretely, since
/// every plugin's raw targets/tests own one (§4.9). Both the codemodel and
/// the test-listing backtrace graphs are this same shape.
#[derive(Debug, Clone, Default)]
pub struct BacktraceGraph {
    pub nodes: Vec<RawBacktraceNode>,
    pub files: Vec<PathBuf>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RawBacktraceNode {
    pub file: usize,
    pub line: u32,
    pub command: Option<usize>,
    pub parent: Option<usize>,
}

impl BacktraceSource for BacktraceGraph {
    fn node(&self, index: usize) -> RigResult<BacktraceNode> {
        self.nodes
            .get(index)
            .map(|n| BacktraceNode {
                file_index: n.file,
                line: n.line,
                command_index: n.command,
                parent: n.parent,
            })
            .ok_or_else(|| crate::errors::RigError::MalformedBacktrace {
                reason: format!("backtrace node index {index} out of range"),
            })
    }

    fn file(&self, index: usize) -> RigResult<&std::path::Path> {
        self.files
            .get(index)
            .map(|p| p.as_path())
            .ok_or_else(|| crate::errors::RigError::MalformedBacktrace {
                reason: format!("backtrace file index {index} out of range"),
            })
    }

    fn command(&self, index: usize) -> RigResult<&str> {
        self.commands
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| crate::errors::RigError::MalformedBacktrace {
                reason: format!("backtrace command index {index} out of range"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTargetType {
    Executable,
    SharedLibrary,
    StaticLibrary,
    ModuleLibrary,
    ObjectLibrary,
    Utility,
    InterfaceLibrary,
    Imported,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct RawArtifact {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CompileGroup {
    pub language: Option<String>,
    pub compiler_id: Option<String>,
    /// Indices into the owning `RawTarget::sources`.
    pub source_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Libraries,
    Linker,
    Other,
}

#[derive(Debug, Clone)]
pub struct LinkFragment {
    pub role: LinkRole,
    pub fragment: String,
}

#[derive(Debug, Clone)]
pub struct RawTarget {
    pub id: String,
    pub name: String,
    pub target_type: RawTargetType,
    pub artifacts: Vec<RawArtifact>,
    pub byproducts: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub compile_groups: Vec<CompileGroup>,
    pub link_fragments: Vec<LinkFragment>,
    /// Target ids this target depends on (intra-project edges, §4.5).
    pub dependencies: Vec<String>,
    pub has_command: bool,
    pub command: Vec<String>,
    /// Index into `backtrace_graph` for the target-defining call site.
    pub backtrace: Option<usize>,
    pub backtrace_graph: BacktraceGraph,
}

#[derive(Debug, Clone)]
pub struct RawTest {
    pub name: String,
    pub command: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub labels: Vec<String>,
    pub backtrace: Option<usize>,
    pub backtrace_graph: BacktraceGraph,
}

#[derive(Debug, Clone, Default)]
pub struct ToolchainInfo {
    pub compiler_id: Option<String>,
    pub compiler_path: Option<PathBuf>,
}

/// What `discover()` hands back: the repo/build roots a plugin resolved
/// itself against, for diagnostics and for re-rooting backtrace evidence.
/// Carries no behavior of its own; the plugin instance does the real work.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub repo_root: PathBuf,
    pub build_dir: PathBuf,
}

/// A build-system plugin, discovered once per extraction run.
///
/// `discover` is a separate, non-object-safe entry point rather than a
/// trait method: it is the one place a concrete plugin does I/O to find
/// itself (locating a reply set, invoking a version check), so it is
/// expressed per-implementor (`RigCmakePlugin::discover`) rather than on
/// this trait. Everything below `discover` only reads what was already
/// found and is required to be pure with respect to the filesystem state
/// captured at discovery time.
pub trait BuildSystemPlugin {
    /// The context this plugin instance was discovered against.
    fn context(&self) -> &PluginContext;

    /// Enumerate raw targets. Must be finite and restartable; paths
    /// returned from any method on the discovered plugin are absolute.
    fn targets(&self) -> RigResult<Vec<RawTarget>>;

    fn tests(&self) -> RigResult<Vec<RawTest>>;

    fn toolchains(&self) -> RigResult<BTreeMap<String, ToolchainInfo>>;

    fn cache(&self) -> RigResult<BTreeMap<String, String>>;

    fn cmake_files(&self) -> RigResult<Vec<PathBuf>>;
}
