//! The classify/resolve/link/model-build stages (§4.4–§4.8), wired
//! together as `Stage` implementations over the raw data a plugin reads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::backtrace;
use crate::classify;
use crate::config::RigConfig;
use crate::errors::{RigError, RigResult};
use crate::link;
use crate::model::entities::{
    Aggregator, BuildSystem, Component, ExternalPackage, Repository, Runner, Test, Utility,
};
use crate::model::evidence::Evidence;
use crate::model::ids::{ComponentKind, DepTarget, Id, Language, NodeKind, Runtime};
use crate::model::{RigModel, RigModelBuilder};
use crate::plugin::{LinkFragment, RawTarget, RawTest};
use crate::resolve;

use super::{PipelineContext, PipelineData, Stage};

/// One target after classification: everything downstream stages need,
/// detached from the plugin's raw JSON-shaped types.
#[derive(Debug, Clone)]
pub struct ClassifiedRawTarget {
    pub raw_id: String,
    pub name: String,
    pub node_kind: NodeKind,
    pub component_kind: Option<ComponentKind>,
    pub language: Option<Language>,
    pub languages: Vec<Language>,
    pub runtime: Option<Runtime>,
    pub output_filename: Option<String>,
    pub output_path: Option<PathBuf>,
    pub sources: BTreeSet<PathBuf>,
    pub link_fragments: Vec<LinkFragment>,
    pub dependencies: Vec<String>,
    pub evidence: Evidence,
}

/// Classifier stage: `Raw` → `Classified`. Needs the repository root to walk
/// each target's backtrace to its user frame.
pub struct ClassifyStage {
    pub repo_root: PathBuf,
}

impl Stage for ClassifyStage {
    fn id(&self) -> &str {
        "classify.targets"
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> RigResult<PipelineData> {
        let (targets, tests, toolchains, cache) = match input {
            PipelineData::Raw {
                targets,
                tests,
                toolchains,
                cache,
                ..
            } => (targets, tests, toolchains, cache),
            other => {
                return Err(RigError::InvalidConfig {
                    message: format!("classify stage expected Raw input, got {other:?}"),
                })
            }
        };

        let mut classified = Vec::with_capacity(targets.len());
        for target in targets {
            let decision = classify::classify(&target, &toolchains);
            for warning in &decision.warnings {
                ctx.push_warning("classify.target", format!("{}: {warning}", target.name));
            }

            let evidence = match target.backtrace {
                Some(idx) => backtrace::walk_to_evidence(&target.backtrace_graph, idx, &self.repo_root)?,
                None => Evidence { call_stack: Vec::new() },
            };

            classified.push(ClassifiedRawTarget {
                raw_id: target.id.clone(),
                name: target.name.clone(),
                node_kind: decision.node_kind,
                component_kind: decision.component_kind,
                language: decision.language,
                languages: decision.languages,
                runtime: decision.runtime,
                output_filename: target.artifacts.first().and_then(|a| {
                    a.path.file_name().and_then(|n| n.to_str()).map(str::to_string)
                }),
                output_path: target.artifacts.first().map(|a| a.path.clone()),
                sources: target.sources.iter().cloned().collect(),
                link_fragments: target.link_fragments.clone(),
                dependencies: target.dependencies.clone(),
                evidence,
            });
        }

        Ok(PipelineData::Classified {
            targets: classified,
            tests,
            cache,
        })
    }
}

/// Resolve + link + model-build stage: `Classified` → `Model`.
pub struct ModelBuildStage {
    pub repository: Repository,
    pub build_system: BuildSystem,
    pub config: RigConfig,
}

impl Stage for ModelBuildStage {
    fn id(&self) -> &str {
        "model.build"
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> RigResult<PipelineData> {
        let (targets, tests, cache) = match input {
            PipelineData::Classified { targets, tests, cache } => (targets, tests, cache),
            other => {
                return Err(RigError::InvalidConfig {
                    message: format!("model-build stage expected Classified input, got {other:?}"),
                })
            }
        };

        if targets.len() as u64 > self.config.limits.max_targets {
            return Err(RigError::LimitExceeded {
                what: "targets".to_string(),
                actual: targets.len() as u64,
                limit: self.config.limits.max_targets,
            });
        }
        if tests.len() as u64 > self.config.limits.max_tests {
            return Err(RigError::LimitExceeded {
                what: "tests".to_string(),
                actual: tests.len() as u64,
                limit: self.config.limits.max_tests,
            });
        }

        ctx.push_info(
            "model.build.counts",
            format!("{} targets, {} tests", targets.len(), tests.len()),
        );

        let model = build_model(
            targets,
            tests,
            cache,
            self.repository.clone(),
            self.build_system.clone(),
        )?;
        Ok(PipelineData::Model(model))
    }
}

fn sorted_by_name<'a, I: Iterator<Item = &'a ClassifiedRawTarget>>(
    iter: I,
) -> Vec<&'a ClassifiedRawTarget> {
    let mut v: Vec<&ClassifiedRawTarget> = iter.collect();
    v.sort_by(|a, b| a.name.cmp(&b.name));
    v
}

/// Kahn's algorithm over the component subgraph, lexicographic tie-break by
/// name on the ready set (§4.4/§5). Leftover nodes from an actual cycle are
/// appended in name order; `RigModelBuilder::freeze` reports the precise
/// cycle, since it already owns the `CyclicDependency{path}` machinery.
fn topo_sort_components<'a>(components: &[&'a ClassifiedRawTarget]) -> Vec<&'a ClassifiedRawTarget> {
    let ids: BTreeSet<&str> = components.iter().map(|c| c.raw_id.as_str()).collect();
    let by_id: BTreeMap<&str, &ClassifiedRawTarget> =
        components.iter().map(|c| (c.raw_id.as_str(), *c)).collect();

    let mut in_degree: BTreeMap<&str, u32> = components.iter().map(|c| (c.raw_id.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for c in components {
        for dep in &c.dependencies {
            if ids.contains(dep.as_str()) {
                dependents.entry(dep.as_str()).or_default().push(c.raw_id.as_str());
                *in_degree.get_mut(c.raw_id.as_str()).unwrap() += 1;
            }
        }
    }

    let mut ready: BTreeSet<(&str, &str)> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| (by_id[id].name.as_str(), *id))
        .collect();
    let mut remaining = in_degree.clone();
    let mut order = Vec::new();
    let mut placed: BTreeSet<&str> = BTreeSet::new();

    while let Some(&(name, id)) = ready.iter().next() {
        ready.remove(&(name, id));
        order.push(by_id[id]);
        placed.insert(id);
        if let Some(deps) = dependents.get(id) {
            for &dependent in deps {
                let d = remaining.get_mut(dependent).unwrap();
                *d -= 1;
                if *d == 0 {
                    ready.insert((by_id[dependent].name.as_str(), dependent));
                }
            }
        }
    }

    if order.len() != components.len() {
        let mut leftover = sorted_by_name(
            components
                .iter()
                .filter(|c| !placed.contains(c.raw_id.as_str()))
                .copied(),
        );
        order.append(&mut leftover);
    }

    order
}

fn build_model(
    targets: Vec<ClassifiedRawTarget>,
    raw_tests: Vec<RawTest>,
    cache: BTreeMap<String, String>,
    repository: Repository,
    build_system: BuildSystem,
) -> RigResult<RigModel> {
    let known_raw_ids: BTreeSet<&str> = targets.iter().map(|t| t.raw_id.as_str()).collect();

    // External packages (§4.5).
    let hints = resolve::external_hints_from_cache(&cache);
    let known_stems: BTreeSet<String> = targets
        .iter()
        .filter_map(|t| t.output_filename.clone())
        .collect();

    let mut ext_table = resolve::ExternalPackageTable::new();
    let mut component_ext_keys: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for t in &targets {
        if t.node_kind != NodeKind::Component {
            continue;
        }
        let mut keys = Vec::new();
        for frag in &t.link_fragments {
            if let Some(key) = resolve::detect_external_package(frag, &known_stems, &hints) {
                keys.push(ext_table.intern(key));
            }
        }
        component_ext_keys.insert(t.raw_id.as_str(), keys);
    }
    let canonical_externals = ext_table.into_canonical_order();

    let mut next_id = 0u32;
    let mut provisional_to_id: BTreeMap<usize, Id> = BTreeMap::new();
    let mut external_entities = Vec::with_capacity(canonical_externals.len());
    for (provisional, key) in &canonical_externals {
        let id = Id(next_id);
        next_id += 1;
        provisional_to_id.insert(*provisional, id);
        external_entities.push(ExternalPackage {
            id,
            package_manager: key.manager,
            name: key.name.clone(),
            version: key.version.clone(),
        });
    }

    // Ordering plan for the remaining four kinds (§5).
    let component_targets: Vec<&ClassifiedRawTarget> =
        targets.iter().filter(|t| t.node_kind == NodeKind::Component).collect();
    let component_order = topo_sort_components(&component_targets);
    let aggregator_order = sorted_by_name(targets.iter().filter(|t| t.node_kind == NodeKind::Aggregator));
    let runner_order = sorted_by_name(targets.iter().filter(|t| t.node_kind == NodeKind::Runner));
    let utility_order = sorted_by_name(targets.iter().filter(|t| t.node_kind == NodeKind::Utility));

    let mut dep_target_of: BTreeMap<&str, DepTarget> = BTreeMap::new();
    for t in &component_order {
        dep_target_of.insert(t.raw_id.as_str(), DepTarget::Component(Id(next_id)));
        next_id += 1;
    }
    for t in &aggregator_order {
        dep_target_of.insert(t.raw_id.as_str(), DepTarget::Aggregator(Id(next_id)));
        next_id += 1;
    }
    for t in &runner_order {
        dep_target_of.insert(t.raw_id.as_str(), DepTarget::Runner(Id(next_id)));
        next_id += 1;
    }
    for t in &utility_order {
        dep_target_of.insert(t.raw_id.as_str(), DepTarget::Utility(Id(next_id)));
        next_id += 1;
    }

    let resolve_edges = |t: &ClassifiedRawTarget| -> RigResult<BTreeSet<DepTarget>> {
        let mut edges = BTreeSet::new();
        for dep in &t.dependencies {
            if !known_raw_ids.contains(dep.as_str()) {
                return Err(RigError::DanglingDependency {
                    target: t.name.clone(),
                    dependency_id: dep.clone(),
                });
            }
            if let Some(dt) = dep_target_of.get(dep.as_str()) {
                edges.insert(*dt);
            }
        }
        Ok(edges)
    };

    let mut components = Vec::with_capacity(component_order.len());
    for t in &component_order {
        let id = dep_target_of[t.raw_id.as_str()].id();
        let externals: BTreeSet<Id> = component_ext_keys
            .get(t.raw_id.as_str())
            .into_iter()
            .flatten()
            .map(|provisional| provisional_to_id[provisional])
            .collect();
        components.push(Component {
            id,
            name: t.name.clone(),
            kind: t.component_kind.unwrap_or(ComponentKind::Unknown),
            language: t.language.unwrap_or(Language::Unknown),
            languages: t.languages.iter().copied().collect(),
            runtime: t.runtime.unwrap_or(Runtime::Unknown),
            output_filename: t.output_filename.clone(),
            output_path: t.output_path.clone(),
            sources: t.sources.clone(),
            externals,
            depends_on: resolve_edges(t)?,
            locations: Vec::new(),
            test_link: None,
            evidence: t.evidence.clone(),
        });
    }

    let mut aggregators = Vec::with_capacity(aggregator_order.len());
    for t in &aggregator_order {
        let id = dep_target_of[t.raw_id.as_str()].id();
        aggregators.push(Aggregator {
            id,
            name: t.name.clone(),
            depends_on: resolve_edges(t)?,
            evidence: t.evidence.clone(),
        });
    }

    let mut runners = Vec::with_capacity(runner_order.len());
    for t in &runner_order {
        let id = dep_target_of[t.raw_id.as_str()].id();
        runners.push(Runner {
            id,
            name: t.name.clone(),
            command: Vec::new(),
            depends_on: resolve_edges(t)?,
            evidence: t.evidence.clone(),
        });
    }

    let mut utilities = Vec::with_capacity(utility_order.len());
    for t in &utility_order {
        let id = dep_target_of[t.raw_id.as_str()].id();
        utilities.push(Utility {
            id,
            name: t.name.clone(),
            evidence: t.evidence.clone(),
        });
    }

    // Test↔target linking (§4.6).
    let candidates: Vec<link::LinkCandidate> = components
        .iter()
        .map(|c| link::LinkCandidate {
            id: c.id,
            output_path: c.output_path.as_deref(),
            output_filename: c.output_filename.as_deref(),
            sources: &c.sources,
        })
        .collect();

    let mut tests_sorted: Vec<&RawTest> = raw_tests.iter().collect();
    tests_sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut tests = Vec::with_capacity(tests_sorted.len());
    let mut test_link_updates: BTreeMap<Id, Id> = BTreeMap::new();
    for rt in &tests_sorted {
        let id = Id(next_id);
        next_id += 1;

        let command0 = rt.command.first().map(|s| s.as_str()).unwrap_or("");
        let normalized = link::normalize_test_command(command0, &repository.build_dir);
        let mut linked = match link::link_test_to_component(&normalized, &BTreeSet::new(), &candidates) {
            link::LinkOutcome::Linked(cid) => Some(cid),
            _ => None,
        };

        if linked.is_none() {
            if let Some(script) = link::interpreter_script_argument(&rt.command) {
                let script_name = Path::new(script).file_name().and_then(|n| n.to_str());
                linked = candidates
                    .iter()
                    .find(|c| c.output_filename == script_name)
                    .map(|c| c.id);
            }
        }

        let linked_libs: BTreeSet<String> = linked
            .and_then(|cid| components.iter().find(|c| c.id == cid))
            .map(|c| {
                c.externals
                    .iter()
                    .filter_map(|eid| external_entities.iter().find(|e| e.id == *eid))
                    .map(|e| e.name.clone())
                    .collect()
            })
            .unwrap_or_default();
        let framework = link::detect_framework(&rt.labels, &rt.command, &linked_libs);

        let evidence = match rt.backtrace {
            Some(idx) => backtrace::walk_to_evidence(&rt.backtrace_graph, idx, &repository.root_path)?,
            None => Evidence { call_stack: Vec::new() },
        };

        if let Some(cid) = linked {
            test_link_updates.insert(cid, id);
        }

        tests.push(Test {
            id,
            name: rt.name.clone(),
            framework,
            test_type: None,
            command: rt.command.clone(),
            properties: rt.properties.clone(),
            linked_component: linked,
            source_files: BTreeSet::new(),
            evidence,
        });
    }

    for c in &mut components {
        if let Some(test_id) = test_link_updates.get(&c.id) {
            c.test_link = Some(*test_id);
        }
    }

    let mut builder = RigModelBuilder::new();
    builder.set_repository(repository)?;
    builder.set_build_system(build_system)?;
    for pkg in external_entities {
        builder.push_external_package(pkg)?;
    }
    for c in components {
        builder.push_component(c)?;
    }
    for a in aggregators {
        builder.push_aggregator(a)?;
    }
    for r in runners {
        builder.push_runner(r)?;
    }
    for u in utilities {
        builder.push_utility(u)?;
    }
    for t in tests {
        builder.push_test(t)?;
    }

    builder.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{BacktraceGraph, RawArtifact, RawBacktraceNode, RawTargetType};

    fn target(id: &str, name: &str, kind: RawTargetType, deps: &[&str]) -> RawTarget {
        RawTarget {
            id: id.to_string(),
            name: name.to_string(),
            target_type: kind,
            artifacts: vec![RawArtifact {
                path: PathBuf::from(format!("/repo/build/bin/{name}")),
            }],
            byproducts: Vec::new(),
            sources: vec![PathBuf::from("src/main.cpp")],
            compile_groups: Vec::new(),
            link_fragments: Vec::new(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            has_command: false,
            command: Vec::new(),
            backtrace: Some(0),
            backtrace_graph: BacktraceGraph {
                nodes: vec![RawBacktraceNode {
                    file: 0,
                    line: 5,
                    command: Some(0),
                    parent: None,
                }],
                files: vec![PathBuf::from("/repo/CMakeLists.txt")],
                commands: vec!["add_executable".to_string()],
            },
        }
    }

    #[test]
    fn classify_stage_walks_evidence_for_every_target() {
        let stage = ClassifyStage {
            repo_root: PathBuf::from("/repo"),
        };
        let input = PipelineData::Raw {
            targets: vec![target("t0", "app", RawTargetType::Executable, &[])],
            tests: Vec::new(),
            toolchains: BTreeMap::new(),
            cache: BTreeMap::new(),
            cmake_files: Vec::new(),
        };
        let mut ctx = PipelineContext::default();
        let out = stage.run(&mut ctx, input).unwrap();
        match out {
            PipelineData::Classified { targets, .. } => {
                assert_eq!(targets.len(), 1);
                assert_eq!(targets[0].node_kind, NodeKind::Component);
                assert!(!targets[0].evidence.call_stack.is_empty());
            }
            _ => panic!("unexpected output"),
        }
    }

    #[test]
    fn full_pipeline_links_dependency_edge() {
        let raw = vec![
            target("t0", "app", RawTargetType::Executable, &["t1"]),
            target("t1", "core", RawTargetType::StaticLibrary, &[]),
        ];
        let classify_stage = ClassifyStage {
            repo_root: PathBuf::from("/repo"),
        };
        let input = PipelineData::Raw {
            targets: raw,
            tests: Vec::new(),
            toolchains: BTreeMap::new(),
            cache: BTreeMap::new(),
            cmake_files: Vec::new(),
        };
        let mut ctx = PipelineContext::default();
        let classified = classify_stage.run(&mut ctx, input).unwrap();

        let model_stage = ModelBuildStage {
            repository: Repository {
                name: "demo".into(),
                root_path: PathBuf::from("/repo"),
                build_dir: PathBuf::from("/repo/build"),
                output_dir: PathBuf::from("/repo/build/bin"),
                configure_cmd: None,
                build_cmd: None,
                install_cmd: None,
                test_cmd: None,
            },
            build_system: BuildSystem {
                name: "CMake".into(),
                version: Some("3.29".into()),
                generator: Some("Ninja".into()),
                build_type: None,
            },
            config: RigConfig::default(),
        };
        let model = match model_stage.run(&mut ctx, classified).unwrap() {
            PipelineData::Model(m) => m,
            _ => panic!("unexpected output"),
        };

        assert_eq!(model.components.len(), 2);
        let app = model.components.iter().find(|c| c.name == "app").unwrap();
        let core = model.components.iter().find(|c| c.name == "core").unwrap();
        assert!(app.depends_on.contains(&DepTarget::Component(core.id)));
    }
}
