//! Classifier (§4.4): a pure, deterministic mapping from a `RawTarget` to
//! a `NodeKind` and, for components, a `ComponentKind`/`Language`/`Runtime`.
//!
//! Every decision procedure here is "ordered rules, first match wins,"
//! the same shape this codebase's plugin capability evaluator
//! (`evaluate_spec`) uses for its `wants`-against-`host` checks.

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::ids::{ComponentKind, Language, NodeKind, Runtime};
use crate::plugin::{RawTarget, RawTargetType};

#[derive(Debug, Clone)]
pub struct ClassifiedTarget {
    pub node_kind: NodeKind,
    pub component_kind: Option<ComponentKind>,
    pub language: Option<Language>,
    pub languages: Vec<Language>,
    pub runtime: Option<Runtime>,
    /// Non-fatal observations made while classifying (e.g. "target type
    /// and artifact extension disagree"), surfaced as pipeline diagnostics.
    pub warnings: Vec<String>,
}

/// Node-kind decision procedure (§4.4, "Node kind", rules 1–8).
pub fn classify_node_kind(target: &RawTarget) -> NodeKind {
    use RawTargetType::*;

    match target.target_type {
        Executable | SharedLibrary | StaticLibrary | ModuleLibrary | ObjectLibrary => {
            NodeKind::Component
        }
        Utility => {
            let has_artifact = !target.artifacts.is_empty() || !target.byproducts.is_empty();
            if has_artifact {
                NodeKind::Component
            } else if target.has_command {
                NodeKind::Runner
            } else if !target.dependencies.is_empty() {
                NodeKind::Aggregator
            } else {
                NodeKind::Utility
            }
        }
        InterfaceLibrary => NodeKind::Interface,
        Imported => NodeKind::ExternalComponent,
        Unknown => NodeKind::Utility,
    }
}

/// Component-kind decision (§4.4, "Component kind").
fn classify_component_kind(target: &RawTarget, warnings: &mut Vec<String>) -> ComponentKind {
    let from_type = match target.target_type {
        RawTargetType::Executable => Some(ComponentKind::Executable),
        RawTargetType::SharedLibrary => Some(ComponentKind::SharedLibrary),
        RawTargetType::StaticLibrary => Some(ComponentKind::StaticLibrary),
        RawTargetType::ModuleLibrary => Some(ComponentKind::ModuleLibrary),
        RawTargetType::ObjectLibrary => Some(ComponentKind::ObjectLibrary),
        _ => None,
    };

    let from_artifact = target
        .artifacts
        .first()
        .and_then(|a| classify_by_extension(&a.path));

    match (from_type, from_artifact) {
        (Some(t), Some(a)) if t != a => {
            warnings.push(format!(
                "target type ({t:?}) and artifact extension ({a:?}) disagree; using target type"
            ));
            t
        }
        (Some(t), _) => t,
        (None, Some(a)) => a,
        (None, None) => ComponentKind::Unknown,
    }
}

fn classify_by_extension(path: &Path) -> Option<ComponentKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "exe" | "out" | "app" => ComponentKind::Executable,
        "dll" | "so" | "dylib" => ComponentKind::SharedLibrary,
        "a" | "lib" => ComponentKind::StaticLibrary,
        "jar" | "war" | "ear" => ComponentKind::Vm,
        "py" | "js" | "mjs" | "ts" => ComponentKind::Interpreted,
        _ => return None,
    })
}

/// Language decision (§4.4, "Language"): compile-group language, then
/// source-extension majority (lexicographic tie-break), then toolchain,
/// then Unknown. Returns `(primary, all_observed)`.
pub fn classify_language(
    target: &RawTarget,
    toolchains: &BTreeMap<String, crate::plugin::ToolchainInfo>,
) -> (Language, Vec<Language>) {
    let mut from_groups: Vec<Language> = target
        .compile_groups
        .iter()
        .filter_map(|g| g.language.as_deref())
        .filter_map(language_from_name)
        .collect();

    if !from_groups.is_empty() {
        from_groups.sort_by_key(language_sort_key);
        from_groups.dedup();
        return (from_groups[0], from_groups);
    }

    let mut counts: BTreeMap<Language, usize> = BTreeMap::new();
    let mut sources: Vec<&std::path::PathBuf> = target.sources.iter().collect();
    sources.sort();
    for src in &sources {
        if let Some(lang) = language_from_extension(src) {
            *counts.entry(lang).or_insert(0) += 1;
        }
    }

    if !counts.is_empty() {
        let mut ranked: Vec<(Language, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| language_sort_key(&a.0).cmp(&language_sort_key(&b.0))));
        let all: Vec<Language> = ranked.iter().map(|(l, _)| *l).collect();
        return (ranked[0].0, all);
    }

    if let Some(info) = toolchains.values().next() {
        if let Some(lang) = info.compiler_id.as_deref().and_then(language_from_compiler_id) {
            return (lang, vec![lang]);
        }
    }

    (Language::Unknown, vec![Language::Unknown])
}

fn language_sort_key(l: &Language) -> u8 {
    // Stable, arbitrary-but-fixed ordering used only to break exact ties
    // deterministically; not semantically meaningful.
    *l as u8 as u8
}

fn language_from_name(name: &str) -> Option<Language> {
    Some(match name {
        "C" => Language::C,
        "CXX" => Language::Cpp,
        "CSharp" => Language::CSharp,
        "Java" => Language::Java,
        _ => return None,
    })
}

fn language_from_extension(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "c" => Language::C,
        "cpp" | "cc" | "cxx" | "hpp" | "h" => Language::Cpp,
        "cs" => Language::CSharp,
        "java" => Language::Java,
        "go" => Language::Go,
        "py" => Language::Python,
        "rs" => Language::Rust,
        "js" | "mjs" => Language::JavaScript,
        "ts" => Language::TypeScript,
        "f90" | "f" | "for" => Language::Fortran,
        "swift" => Language::Swift,
        "m" => Language::ObjC,
        "mm" => Language::ObjCpp,
        _ => return None,
    })
}

fn language_from_compiler_id(compiler_id: &str) -> Option<Language> {
    let lower = compiler_id.to_ascii_lowercase();
    if lower.contains("msvc") || lower.contains("gnu") || lower.contains("clang") {
        Some(Language::Cpp)
    } else {
        None
    }
}

/// Runtime decision (§4.4, "Runtime").
pub fn classify_runtime(
    language: Language,
    compiler_id: Option<&str>,
    component_kind: ComponentKind,
) -> Runtime {
    match (language, component_kind) {
        (Language::Java, _) | (_, ComponentKind::Vm) => Runtime::Jvm,
        (Language::CSharp, _) => Runtime::DotNet,
        (Language::Go, _) => Runtime::Go,
        (Language::Python, _) => Runtime::Python,
        (Language::JavaScript, _) | (Language::TypeScript, _) => Runtime::NodeJs,
        (Language::C, _) | (Language::Cpp, _) => {
            let lower = compiler_id.unwrap_or_default().to_ascii_lowercase();
            if lower.contains("msvc") {
                if language == Language::Cpp {
                    Runtime::NativeMsvcCpp
                } else {
                    Runtime::NativeMsvcC
                }
            } else if lower.contains("gnu") || lower.contains("clang") {
                Runtime::NativeClangLike
            } else {
                Runtime::Unknown
            }
        }
        _ => Runtime::Unknown,
    }
}

/// Full classification of one target.
pub fn classify(
    target: &RawTarget,
    toolchains: &BTreeMap<String, crate::plugin::ToolchainInfo>,
) -> ClassifiedTarget {
    let node_kind = classify_node_kind(target);
    let mut warnings = Vec::new();

    if node_kind != NodeKind::Component {
        return ClassifiedTarget {
            node_kind,
            component_kind: None,
            language: None,
            languages: Vec::new(),
            runtime: None,
            warnings,
        };
    }

    let component_kind = classify_component_kind(target, &mut warnings);
    let (language, languages) = classify_language(target, toolchains);
    let compiler_id = target
        .compile_groups
        .first()
        .and_then(|g| g.compiler_id.as_deref())
        .or_else(|| toolchains.values().next().and_then(|t| t.compiler_id.as_deref()));
    let runtime = classify_runtime(language, compiler_id, component_kind);

    ClassifiedTarget {
        node_kind,
        component_kind: Some(component_kind),
        language: Some(language),
        languages,
        runtime: Some(runtime),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{BacktraceGraph, RawArtifact};
    use std::path::PathBuf;

    fn base_target(target_type: RawTargetType) -> RawTarget {
        RawTarget {
            id: "t0".into(),
            name: "hello_world".into(),
            target_type,
            artifacts: Vec::new(),
            byproducts: Vec::new(),
            sources: Vec::new(),
            compile_groups: Vec::new(),
            link_fragments: Vec::new(),
            dependencies: Vec::new(),
            has_command: false,
            command: Vec::new(),
            backtrace: None,
            backtrace_graph: BacktraceGraph::default(),
        }
    }

    #[test]
    fn executable_target_type_classifies_as_component() {
        let t = base_target(RawTargetType::Executable);
        assert_eq!(classify_node_kind(&t), NodeKind::Component);
    }

    #[test]
    fn utility_with_command_is_runner() {
        let mut t = base_target(RawTargetType::Utility);
        t.has_command = true;
        assert_eq!(classify_node_kind(&t), NodeKind::Runner);
    }

    #[test]
    fn utility_with_deps_only_is_aggregator() {
        let mut t = base_target(RawTargetType::Utility);
        t.dependencies.push("other".into());
        assert_eq!(classify_node_kind(&t), NodeKind::Aggregator);
    }

    #[test]
    fn utility_with_nothing_is_utility() {
        let t = base_target(RawTargetType::Utility);
        assert_eq!(classify_node_kind(&t), NodeKind::Utility);
    }

    #[test]
    fn jar_artifact_classifies_as_vm() {
        let mut t = base_target(RawTargetType::Utility);
        t.artifacts.push(RawArtifact {
            path: PathBuf::from("java_hello_lib.jar"),
        });
        let c = classify(&t, &BTreeMap::new());
        assert_eq!(c.node_kind, NodeKind::Component);
        assert_eq!(c.component_kind, Some(ComponentKind::Vm));
    }

    #[test]
    fn language_majority_breaks_ties_lexicographically() {
        let mut t = base_target(RawTargetType::Executable);
        t.sources = vec![PathBuf::from("a.cpp"), PathBuf::from("b.c")];
        let (primary, _all) = classify_language(&t, &BTreeMap::new());
        // one C file, one C++ file: counts tie at 1 each; C sorts first.
        assert_eq!(primary, Language::C);
    }
}
