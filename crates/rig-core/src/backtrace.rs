//! Evidence & Backtrace Walker (§4.1).
//!
//! The codemodel's backtrace graph and the CTest backtrace graph are
//! structurally identical (§9, "Any evidence source" abstraction): both are
//! `{nodes[], files[], commands[]}` with parent-linked nodes. This module
//! walks either via the single `BacktraceSource` trait below; `rig-cmake`
//! supplies two small adapters rather than two copies of the walk.

use std::path::{Path, PathBuf};

use crate::errors::{RigError, RigResult};
use crate::model::evidence::{Evidence, Frame};

/// A node in a backtrace graph: an index into `files[]`, an optional
/// command name, and an optional parent node index.
#[derive(Debug, Clone, Copy)]
pub struct BacktraceNode {
    pub file_index: usize,
    pub line: u32,
    pub command_index: Option<usize>,
    pub parent: Option<usize>,
}

/// Capability a plugin's backtrace graph must provide to be walkable.
/// Deliberately narrow: indices in, resolved strings out, no knowledge of
/// JSON shape or file layout leaks into the walker.
pub trait BacktraceSource {
    fn node(&self, index: usize) -> RigResult<BacktraceNode>;
    fn file(&self, index: usize) -> RigResult<&Path>;
    fn command(&self, index: usize) -> RigResult<&str>;
}

const MAX_DEPTH: usize = 50;

/// Walk from `leaf_index` up the parent chain, stopping at the first node
/// within `repo_root` (the *user frame*) and collecting subsequent in-repo
/// ancestors as context (§4.1 "Algorithm").
pub fn walk_to_evidence<S: BacktraceSource>(
    source: &S,
    leaf_index: usize,
    repo_root: &Path,
) -> RigResult<Evidence> {
    let mut frames = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut current = Some(leaf_index);
    let mut found_user_frame = false;

    for _depth in 0..MAX_DEPTH {
        let idx = match current {
            Some(idx) => idx,
            None => break,
        };

        if !visited.insert(idx) {
            return Err(RigError::MalformedBacktrace {
                reason: format!("cycle detected at backtrace node {idx}"),
            });
        }

        let node = source.node(idx)?;
        let file = source.file(node.file_index)?;
        let resolved = normalize_against_root(file, repo_root);
        let command = match node.command_index {
            Some(ci) => Some(source.command(ci)?.to_string()),
            None => None,
        };

        let in_repo = resolved.starts_with(repo_root);

        if in_repo && node.line >= 1 {
            frames.push(Frame {
                file: resolved,
                line: node.line,
                command: command.clone(),
            });
            if command.is_some() {
                found_user_frame = true;
            }
        }

        current = node.parent;
    }

    if current.is_some() {
        return Err(RigError::MalformedBacktrace {
            reason: format!("backtrace exceeds max depth {MAX_DEPTH}"),
        });
    }

    if !found_user_frame || frames.is_empty() {
        return Err(RigError::NoUserFrame);
    }

    Ok(Evidence { call_stack: frames })
}

fn normalize_against_root(file: &Path, repo_root: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        repo_root.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixtureSource {
        nodes: Vec<BacktraceNode>,
        files: Vec<PathBuf>,
        commands: Vec<String>,
    }

    impl BacktraceSource for FixtureSource {
        fn node(&self, index: usize) -> RigResult<BacktraceNode> {
            self.nodes
                .get(index)
                .copied()
                .ok_or_else(|| RigError::MalformedBacktrace {
                    reason: format!("node index {index} out of range"),
                })
        }
        fn file(&self, index: usize) -> RigResult<&Path> {
            self.files
                .get(index)
                .map(|p| p.as_path())
                .ok_or_else(|| RigError::MalformedBacktrace {
                    reason: format!("file index {index} out of range"),
                })
        }
        fn command(&self, index: usize) -> RigResult<&str> {
            self.commands
                .get(index)
                .map(|s| s.as_str())
                .ok_or_else(|| RigError::MalformedBacktrace {
                    reason: format!("command index {index} out of range"),
                })
        }
    }

    #[test]
    fn skips_out_of_repo_helper_frame() {
        // Scenario B: CMakeLists.txt:36 calls add_jar, which internally
        // calls add_custom_target in UseJava.cmake:974. The leaf node is
        // the helper frame; walking to its parent finds the user frame.
        let source = FixtureSource {
            nodes: vec![
                BacktraceNode {
                    file_index: 0,
                    line: 974,
                    command_index: Some(0),
                    parent: Some(1),
                },
                BacktraceNode {
                    file_index: 1,
                    line: 36,
                    command_index: Some(1),
                    parent: None,
                },
            ],
            files: vec![
                PathBuf::from("/usr/share/cmake/Modules/UseJava.cmake"),
                PathBuf::from("CMakeLists.txt"),
            ],
            commands: vec!["add_custom_target".to_string(), "add_jar".to_string()],
        };

        let ev = walk_to_evidence(&source, 0, Path::new("/repo")).unwrap();
        let leaf = ev.leaf().unwrap();
        assert_eq!(leaf.file, PathBuf::from("/repo/CMakeLists.txt"));
        assert_eq!(leaf.line, 36);
    }

    #[test]
    fn no_user_frame_fails() {
        let source = FixtureSource {
            nodes: vec![BacktraceNode {
                file_index: 0,
                line: 1,
                command_index: Some(0),
                parent: None,
            }],
            files: vec![PathBuf::from("/usr/share/cmake/Modules/Foo.cmake")],
            commands: vec!["foo".to_string()],
        };

        let err = walk_to_evidence(&source, 0, Path::new("/repo")).unwrap_err();
        assert!(matches!(err, RigError::NoUserFrame));
    }

    #[test]
    fn cycle_detected() {
        let source = FixtureSource {
            nodes: vec![
                BacktraceNode {
                    file_index: 0,
                    line: 1,
                    command_index: Some(0),
                    parent: Some(1),
                },
                BacktraceNode {
                    file_index: 0,
                    line: 2,
                    command_index: Some(0),
                    parent: Some(0),
                },
            ],
            files: vec![PathBuf::from("CMakeLists.txt")],
            commands: vec!["x".to_string()],
        };

        let err = walk_to_evidence(&source, 0, Path::new("/repo")).unwrap_err();
        assert!(matches!(err, RigError::MalformedBacktrace { .. }));
    }
}
