//! Test↔Target Linker (§4.6).
//!
//! Pure matching logic: given one test's normalized command and the set of
//! already-built components, decide which component (if any) the test
//! exercises, and what test framework it's written against.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::model::ids::{Id, TestFramework};

/// The subset of `Component` fields the linker needs to know about, kept
/// narrow so this module doesn't depend on the full entity builder state.
pub struct LinkCandidate<'a> {
    pub id: Id,
    pub output_path: Option<&'a Path>,
    pub output_filename: Option<&'a str>,
    pub sources: &'a BTreeSet<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(Id),
    Ambiguous,
    Unlinked,
}

/// Resolve `command[0]` against `build_dir`, handling multi-config
/// generator subdirectories (`Debug/`, `Release/`, etc) by trying the
/// literal path first and falling back to a basename match (§4.6 step 1).
pub fn normalize_test_command(command0: &str, build_dir: &Path) -> PathBuf {
    let raw = Path::new(command0);
    if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        build_dir.join(raw)
    }
}

/// Link one test's normalized command path to a component (§4.6 steps 2–3).
pub fn link_test_to_component(
    normalized_command: &Path,
    test_source_files: &BTreeSet<PathBuf>,
    candidates: &[LinkCandidate<'_>],
) -> LinkOutcome {
    let by_path: Vec<&LinkCandidate> = candidates
        .iter()
        .filter(|c| c.output_path == Some(normalized_command))
        .collect();

    if by_path.len() == 1 {
        return LinkOutcome::Linked(by_path[0].id);
    }

    let basename = normalized_command.file_name().and_then(|n| n.to_str());
    let matches: Vec<&LinkCandidate> = if !by_path.is_empty() {
        by_path
    } else if let Some(basename) = basename {
        candidates
            .iter()
            .filter(|c| c.output_filename == Some(basename))
            .collect()
    } else {
        Vec::new()
    };

    match matches.len() {
        0 => LinkOutcome::Unlinked,
        1 => LinkOutcome::Linked(matches[0].id),
        _ => {
            let by_sources: Vec<&&LinkCandidate> = matches
                .iter()
                .filter(|c| !c.sources.is_disjoint(test_source_files))
                .collect();
            match by_sources.len() {
                1 => LinkOutcome::Linked(by_sources[0].id),
                _ => LinkOutcome::Ambiguous,
            }
        }
    }
}

/// If a test's command is an external interpreter invocation (`python
/// script.py`, `node script.js`, `java -jar foo.jar`), return the script or
/// jar argument so the caller can attempt to link against the component
/// that owns it (§4.6, interpreter carve-out).
pub fn interpreter_script_argument(command: &[String]) -> Option<&str> {
    let exe = command.first()?.rsplit(['/', '\\']).next()?;
    let interpreter = matches!(
        exe,
        "python" | "python3" | "node" | "nodejs" | "java" | "java.exe"
    );
    if !interpreter {
        return None;
    }

    if exe.starts_with("java") {
        let jar_flag = command.iter().position(|a| a == "-jar")?;
        return command.get(jar_flag + 1).map(|s| s.as_str());
    }

    command.get(1).map(|s| s.as_str())
}

/// Framework detection order: labels, then command regex-ish substring
/// matching, then linked-library hints (§4.6 step 4). `linked_libs` is the
/// set of external/intra-project library names the candidate component
/// links against, when a component match exists.
pub fn detect_framework(
    labels: &[String],
    command: &[String],
    linked_libs: &BTreeSet<String>,
) -> TestFramework {
    for label in labels {
        if let Some(f) = framework_from_token(label) {
            return f;
        }
    }

    let joined = command.join(" ").to_ascii_lowercase();
    for (needle, framework) in COMMAND_HINTS {
        if joined.contains(needle) {
            return *framework;
        }
    }

    for lib in linked_libs {
        if let Some(f) = framework_from_token(lib) {
            return f;
        }
    }

    TestFramework::Unknown
}

const COMMAND_HINTS: &[(&str, TestFramework)] = &[
    ("gtest", TestFramework::GTest),
    ("catch2", TestFramework::Catch2),
    ("catch_discover", TestFramework::Catch2),
    ("boost.test", TestFramework::BoostTest),
    ("pytest", TestFramework::Pytest),
    ("jest", TestFramework::Jest),
    ("cargo-test", TestFramework::CargoTest),
    ("junit", TestFramework::JUnit),
];

fn framework_from_token(token: &str) -> Option<TestFramework> {
    let lower = token.to_ascii_lowercase();
    Some(if lower.contains("gtest") || lower.contains("googletest") {
        TestFramework::GTest
    } else if lower.contains("catch2") || lower.contains("catch") {
        TestFramework::Catch2
    } else if lower.contains("boost_test") || lower.contains("boost.test") {
        TestFramework::BoostTest
    } else if lower.contains("pytest") {
        TestFramework::Pytest
    } else if lower.contains("jest") {
        TestFramework::Jest
    } else if lower.contains("junit") {
        TestFramework::JUnit
    } else {
        return None;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate<'a>(
        id: u32,
        output_path: Option<&'a Path>,
        output_filename: Option<&'a str>,
        sources: &'a BTreeSet<PathBuf>,
    ) -> LinkCandidate<'a> {
        LinkCandidate {
            id: Id(id),
            output_path,
            output_filename,
            sources,
        }
    }

    #[test]
    fn exact_path_match_links_uniquely() {
        let sources = BTreeSet::new();
        let path = PathBuf::from("/repo/build/bin/app_tests");
        let candidates = vec![candidate(1, Some(&path), Some("app_tests"), &sources)];
        let outcome = link_test_to_component(&path, &BTreeSet::new(), &candidates);
        assert_eq!(outcome, LinkOutcome::Linked(Id(1)));
    }

    #[test]
    fn ambiguous_basename_disambiguated_by_sources() {
        let shared_test_src: BTreeSet<PathBuf> = [PathBuf::from("/repo/a/test_main.cpp")].into();
        let a_sources: BTreeSet<PathBuf> = [PathBuf::from("/repo/a/test_main.cpp")].into();
        let b_sources: BTreeSet<PathBuf> = [PathBuf::from("/repo/b/test_main.cpp")].into();
        let path_a = PathBuf::from("/repo/build/a/tests");
        let path_b = PathBuf::from("/repo/build/b/tests");
        let candidates = vec![
            candidate(1, Some(&path_a), Some("tests"), &a_sources),
            candidate(2, Some(&path_b), Some("tests"), &b_sources),
        ];
        let query = PathBuf::from("/repo/build/Debug/tests");
        let outcome = link_test_to_component(&query, &shared_test_src, &candidates);
        assert_eq!(outcome, LinkOutcome::Linked(Id(1)));
    }

    #[test]
    fn java_jar_argument_extracted() {
        let cmd = vec![
            "java".to_string(),
            "-jar".to_string(),
            "app-tests.jar".to_string(),
        ];
        assert_eq!(interpreter_script_argument(&cmd), Some("app-tests.jar"));
    }

    #[test]
    fn gtest_label_detected() {
        let framework = detect_framework(&["gtest".to_string()], &[], &BTreeSet::new());
        assert_eq!(framework, TestFramework::GTest);
    }
}
