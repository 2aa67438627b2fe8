//! Test-List Reader (§4.3): runs `ctest --show-only=json-v1` in `build_dir`
//! and parses its stdout into `RawTest`s.
//!
//! Subprocess-invocation-with-captured-output, the same idiom this
//! codebase's environment-check command uses for probing an external tool —
//! extended here to actually capture and parse the tool's output rather than
//! just checking it exists on `PATH`.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use rig_core::errors::{RigError, RigResult};
use rig_core::plugin::{BacktraceGraph, RawBacktraceNode, RawTest};
use serde::Deserialize;

const CTEST_JSON_MAJOR: u64 = 1;

#[derive(Debug, Deserialize)]
struct CTestListing {
    version: CTestVersion,
    #[serde(rename = "backtraceGraph", default)]
    backtrace_graph: Option<CTestBacktraceGraph>,
    #[serde(default)]
    tests: Vec<CTestTest>,
}

#[derive(Debug, Deserialize)]
struct CTestVersion {
    major: u64,
    #[allow(dead_code)]
    minor: u64,
}

#[derive(Debug, Deserialize)]
struct CTestBacktraceGraph {
    nodes: Vec<CTestBacktraceNode>,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    commands: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CTestBacktraceNode {
    file: usize,
    line: Option<u32>,
    command: Option<usize>,
    parent: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CTestTest {
    name: String,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default)]
    properties: Vec<CTestProperty>,
    backtrace: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CTestProperty {
    name: String,
    value: serde_json::Value,
}

/// Run `ctest --show-only=json-v1` in `build_dir` and parse its stdout.
///
/// An empty `tests` array is a valid, successful result (§4.3 "a project with
/// no registered tests is not an error"); only a nonzero exit code or
/// unparseable stdout is.
pub fn list_tests(build_dir: &Path) -> RigResult<Vec<RawTest>> {
    let output = Command::new("ctest")
        .arg("--show-only=json-v1")
        .current_dir(build_dir)
        .output()
        .map_err(|e| RigError::TestListingFailed {
            exit_code: -1,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RigError::TestListingFailed {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let listing: CTestListing =
        serde_json::from_slice(&output.stdout).map_err(|e| RigError::TestListingUnparseable {
            message: e.to_string(),
        })?;

    if listing.version.major != CTEST_JSON_MAJOR {
        return Err(RigError::SchemaMismatch {
            object: "ctest-json".to_string(),
            expected: CTEST_JSON_MAJOR as u32,
            found: listing.version.major as u32,
        });
    }

    let backtrace_graph = listing
        .backtrace_graph
        .map(|g| BacktraceGraph {
            nodes: g
                .nodes
                .into_iter()
                .map(|n| RawBacktraceNode {
                    file: n.file,
                    line: n.line.unwrap_or(0),
                    command: n.command,
                    parent: n.parent,
                })
                .collect(),
            files: g.files.into_iter().map(std::path::PathBuf::from).collect(),
            commands: g.commands,
        })
        .unwrap_or_default();

    Ok(listing
        .tests
        .into_iter()
        .map(|t| convert_test(t, backtrace_graph.clone()))
        .collect())
}

fn convert_test(raw: CTestTest, backtrace_graph: BacktraceGraph) -> RawTest {
    let mut properties = BTreeMap::new();
    let mut labels = Vec::new();

    for prop in raw.properties {
        let rendered = render_property_value(&prop.value);
        if prop.name == "LABELS" {
            labels = rendered.split(';').filter(|s| !s.is_empty()).map(String::from).collect();
        }
        properties.insert(prop.name, rendered);
    }

    RawTest {
        name: raw.name,
        command: raw.command,
        properties,
        labels,
        backtrace: raw.backtrace,
        backtrace_graph,
    }
}

fn render_property_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(render_property_value)
            .collect::<Vec<_>>()
            .join(";"),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_label_array_as_semicolon_joined() {
        let value = serde_json::json!(["slow", "network"]);
        assert_eq!(render_property_value(&value), "slow;network");
    }

    #[test]
    fn parses_minimal_listing() {
        let json = serde_json::json!({
            "version": {"major": 1, "minor": 0},
            "backtraceGraph": {"nodes": [], "files": [], "commands": []},
            "tests": [{
                "name": "unit_core",
                "command": ["unit_core"],
                "properties": [{"name": "LABELS", "value": ["fast"]}],
                "backtrace": null,
            }]
        });
        let listing: CTestListing = serde_json::from_value(json).unwrap();
        assert_eq!(listing.tests.len(), 1);
        let converted = convert_test(listing.tests.into_iter().next().unwrap(), BacktraceGraph::default());
        assert_eq!(converted.labels, vec!["fast".to_string()]);
    }
}
