//! Build-API Reader (§4.2): locates the newest CMake File API v1 reply set
//! under `<build_dir>/.cmake/api/v1/reply/` and loads the codemodel,
//! per-target, toolchains, cache, and cmakeFiles objects it references.
//!
//! Strict-parse-then-version-check, the same shape this codebase's wire
//! format reader uses: read the index, confirm the major version of each
//! referenced object before trusting its shape, surface a `SchemaMismatch`
//! rather than guessing at an incompatible layout.

use std::fs;
use std::path::{Path, PathBuf};

use rig_core::errors::{RigError, RigResult};
use rig_core::plugin::{
    BacktraceGraph, CompileGroup, LinkFragment, LinkRole, RawArtifact, RawBacktraceNode, RawTarget,
    RawTargetType, ToolchainInfo,
};
use serde::Deserialize;
use std::collections::BTreeMap;

const CODEMODEL_MAJOR: u64 = 2;
const TOOLCHAINS_MAJOR: u64 = 1;

#[derive(Debug, Deserialize)]
struct IndexFile {
    reply: BTreeMap<String, ReplyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyEntry {
    Object {
        kind: String,
        version: VersionInfo,
        #[serde(rename = "jsonFile")]
        json_file: String,
    },
    /// A client-stateful-query wrapper; not used by this reader, but
    /// present in some reply sets and must not fail strict parsing.
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct VersionInfo {
    major: u64,
    #[allow(dead_code)]
    minor: u64,
}

#[derive(Debug, Deserialize)]
struct CodemodelFile {
    version: VersionInfo,
    configurations: Vec<CodemodelConfiguration>,
}

#[derive(Debug, Deserialize)]
struct CodemodelConfiguration {
    targets: Vec<CodemodelTargetRef>,
}

#[derive(Debug, Deserialize)]
struct CodemodelTargetRef {
    #[allow(dead_code)]
    name: String,
    id: String,
    #[serde(rename = "jsonFile")]
    json_file: String,
}

#[derive(Debug, Deserialize)]
struct TargetFile {
    id: String,
    name: String,
    #[serde(rename = "type")]
    target_type: String,
    artifacts: Option<Vec<TargetArtifact>>,
    #[serde(default)]
    sources: Vec<TargetSource>,
    #[serde(rename = "compileGroups", default)]
    compile_groups: Vec<TargetCompileGroup>,
    link: Option<TargetLink>,
    #[serde(default)]
    dependencies: Vec<TargetDependency>,
    backtrace: Option<usize>,
    #[serde(rename = "backtraceGraph")]
    backtrace_graph: Option<RawBacktraceGraphFile>,
    #[serde(rename = "launchers", default)]
    _launchers: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TargetArtifact {
    path: String,
}

#[derive(Debug, Deserialize)]
struct TargetSource {
    path: String,
}

#[derive(Debug, Deserialize)]
struct TargetCompileGroup {
    language: Option<String>,
    #[serde(rename = "sourceIndexes", default)]
    source_indexes: Vec<usize>,
    #[serde(rename = "compileCommandFragments")]
    compile_command_fragments: Option<Vec<CompileCommandFragment>>,
}

#[derive(Debug, Deserialize)]
struct CompileCommandFragment {
    #[allow(dead_code)]
    fragment: String,
}

#[derive(Debug, Deserialize)]
struct TargetLink {
    #[serde(rename = "commandFragments", default)]
    command_fragments: Vec<LinkCommandFragment>,
}

#[derive(Debug, Deserialize)]
struct LinkCommandFragment {
    fragment: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct TargetDependency {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawBacktraceGraphFile {
    nodes: Vec<BacktraceNodeFile>,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    commands: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BacktraceNodeFile {
    file: usize,
    line: Option<u32>,
    command: Option<usize>,
    parent: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ToolchainsFile {
    version: VersionInfo,
    toolchains: Vec<ToolchainEntry>,
}

#[derive(Debug, Deserialize)]
struct ToolchainEntry {
    language: String,
    compiler: ToolchainCompiler,
}

#[derive(Debug, Deserialize)]
struct ToolchainCompiler {
    id: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Deserialize)]
struct CacheEntry {
    name: String,
    value: String,
}

/// Everything the Build-API Reader hands back (§4.2 contract).
pub struct BuildApiReply {
    pub targets: Vec<RawTarget>,
    pub toolchains: BTreeMap<String, ToolchainInfo>,
    pub cache: BTreeMap<String, String>,
    pub cmake_files: Vec<PathBuf>,
}

/// Read the newest reply set under `build_dir`.
pub fn read_reply(build_dir: &Path) -> RigResult<BuildApiReply> {
    let reply_dir = build_dir.join(".cmake").join("api").join("v1").join("reply");
    let index_path = newest_index_file(&reply_dir)?;

    let index: IndexFile = parse_json_file(&index_path)?;

    let mut targets = Vec::new();
    let mut toolchains = BTreeMap::new();
    let mut cache = BTreeMap::new();
    let mut cmake_files = Vec::new();

    for entry in index.reply.values() {
        let ReplyEntry::Object { kind, version, json_file } = entry else {
            continue;
        };

        let object_path = reply_dir.join(json_file);
        if !object_path.exists() {
            return Err(RigError::StaleReply {
                index_path: index_path.display().to_string(),
                missing_path: object_path.display().to_string(),
            });
        }

        match kind.as_str() {
            "codemodel" => {
                if version.major != CODEMODEL_MAJOR {
                    return Err(RigError::SchemaMismatch {
                        object: "codemodel".to_string(),
                        expected: CODEMODEL_MAJOR as u32,
                        found: version.major as u32,
                    });
                }
                targets = read_codemodel(&object_path, &reply_dir)?;
            }
            "toolchains" => {
                if version.major != TOOLCHAINS_MAJOR {
                    return Err(RigError::SchemaMismatch {
                        object: "toolchains".to_string(),
                        expected: TOOLCHAINS_MAJOR as u32,
                        found: version.major as u32,
                    });
                }
                toolchains = read_toolchains(&object_path)?;
            }
            "cache" => {
                cache = read_cache(&object_path)?;
            }
            "cmakeFiles" => {
                cmake_files = read_cmake_files(&object_path)?;
            }
            _ => {}
        }
    }

    Ok(BuildApiReply {
        targets,
        toolchains,
        cache,
        cmake_files,
    })
}

fn newest_index_file(reply_dir: &Path) -> RigResult<PathBuf> {
    let entries = fs::read_dir(reply_dir).map_err(|_| RigError::NoReplyFound {
        reply_dir: reply_dir.display().to_string(),
    })?;

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !name.starts_with("index-") || !name.ends_with(".json") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| RigError::NoReplyFound {
            reply_dir: reply_dir.display().to_string(),
        })
}

fn read_codemodel(path: &Path, reply_dir: &Path) -> RigResult<Vec<RawTarget>> {
    let codemodel: CodemodelFile = parse_json_file(path)?;
    // Multiple configurations (multi-config generators) enumerate the same
    // targets; the first configuration is authoritative for extraction.
    let config = match codemodel.configurations.into_iter().next() {
        Some(c) => c,
        None => return Ok(Vec::new()),
    };

    let mut targets = Vec::with_capacity(config.targets.len());
    for target_ref in config.targets {
        let target_path = reply_dir.join(&target_ref.json_file);
        targets.push(read_target(&target_path)?);
    }
    Ok(targets)
}

fn read_target(path: &Path) -> RigResult<RawTarget> {
    let file: TargetFile = parse_json_file(path)?;

    let target_type = parse_target_type(&file.target_type);
    let artifacts = file
        .artifacts
        .unwrap_or_default()
        .into_iter()
        .map(|a| RawArtifact { path: PathBuf::from(a.path) })
        .collect();
    let sources: Vec<PathBuf> = file.sources.iter().map(|s| PathBuf::from(&s.path)).collect();

    let compile_groups = file
        .compile_groups
        .into_iter()
        .map(|g| CompileGroup {
            language: g.language,
            compiler_id: None,
            source_indices: g.source_indexes,
        })
        .collect();

    let link_fragments = file
        .link
        .map(|l| {
            l.command_fragments
                .into_iter()
                .map(|f| LinkFragment {
                    role: parse_link_role(&f.role),
                    fragment: f.fragment,
                })
                .collect()
        })
        .unwrap_or_default();

    let dependencies = file.dependencies.into_iter().map(|d| d.id).collect();

    let backtrace_graph = file
        .backtrace_graph
        .map(convert_backtrace_graph)
        .unwrap_or_default();

    Ok(RawTarget {
        id: file.id,
        name: file.name,
        target_type,
        artifacts,
        byproducts: Vec::new(),
        sources,
        compile_groups,
        link_fragments,
        dependencies,
        has_command: false,
        command: Vec::new(),
        backtrace: file.backtrace,
        backtrace_graph,
    })
}

fn convert_backtrace_graph(file: RawBacktraceGraphFile) -> BacktraceGraph {
    BacktraceGraph {
        nodes: file
            .nodes
            .into_iter()
            .map(|n| RawBacktraceNode {
                file: n.file,
                line: n.line.unwrap_or(0),
                command: n.command,
                parent: n.parent,
            })
            .collect(),
        files: file.files.into_iter().map(PathBuf::from).collect(),
        commands: file.commands,
    }
}

fn parse_target_type(raw: &str) -> RawTargetType {
    match raw {
        "EXECUTABLE" => RawTargetType::Executable,
        "SHARED_LIBRARY" => RawTargetType::SharedLibrary,
        "STATIC_LIBRARY" => RawTargetType::StaticLibrary,
        "MODULE_LIBRARY" => RawTargetType::ModuleLibrary,
        "OBJECT_LIBRARY" => RawTargetType::ObjectLibrary,
        "UTILITY" => RawTargetType::Utility,
        "INTERFACE_LIBRARY" => RawTargetType::InterfaceLibrary,
        _ => RawTargetType::Unknown,
    }
}

fn parse_link_role(raw: &str) -> LinkRole {
    match raw {
        "libraries" => LinkRole::Libraries,
        "flags" | "libraryPath" | "frameworkPath" => LinkRole::Linker,
        _ => LinkRole::Other,
    }
}

fn read_toolchains(path: &Path) -> RigResult<BTreeMap<String, ToolchainInfo>> {
    let file: ToolchainsFile = parse_json_file(path)?;
    if file.version.major != TOOLCHAINS_MAJOR {
        return Err(RigError::SchemaMismatch {
            object: "toolchains".to_string(),
            expected: TOOLCHAINS_MAJOR as u32,
            found: file.version.major as u32,
        });
    }
    Ok(file
        .toolchains
        .into_iter()
        .map(|t| {
            (
                t.language,
                ToolchainInfo {
                    compiler_id: t.compiler.id,
                    compiler_path: t.compiler.path.map(PathBuf::from),
                },
            )
        })
        .collect())
}

fn read_cache(path: &Path) -> RigResult<BTreeMap<String, String>> {
    let file: CacheFile = parse_json_file(path)?;
    Ok(file.entries.into_iter().map(|e| (e.name, e.value)).collect())
}

fn read_cmake_files(path: &Path) -> RigResult<Vec<PathBuf>> {
    #[derive(Deserialize)]
    struct CmakeFilesFile {
        inputs: Vec<CmakeFileInput>,
    }
    #[derive(Deserialize)]
    struct CmakeFileInput {
        path: String,
    }

    let file: CmakeFilesFile = parse_json_file(path)?;
    Ok(file.inputs.into_iter().map(|i| PathBuf::from(i.path)).collect())
}

fn parse_json_file<T: for<'de> Deserialize<'de>>(path: &Path) -> RigResult<T> {
    let bytes = fs::read(path).map_err(|e| RigError::StaleReply {
        index_path: path.display().to_string(),
        missing_path: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| RigError::TestListingUnparseable {
        message: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_executable_target_type() {
        assert_eq!(parse_target_type("EXECUTABLE"), RawTargetType::Executable);
        assert_eq!(parse_target_type("bogus"), RawTargetType::Unknown);
    }

    #[test]
    fn parses_library_link_role() {
        assert_eq!(parse_link_role("libraries"), LinkRole::Libraries);
        assert_eq!(parse_link_role("flags"), LinkRole::Linker);
        assert_eq!(parse_link_role("frameworkPath"), LinkRole::Linker);
    }
}
