//! `RigModelBuilder`: the single-writer construction path for a `RigModel`
//! (§3.1 "Lifecycle", §4.7 "RIG Model & Invariants").
//!
//! Entities must be pushed in the deterministic pre-order from §5
//! ("Ordering guarantees"): repository/build system, external packages
//! (canonical sort), components (topological order, lexicographic
//! tie-break), aggregators, runners, utilities, tests (name order). The
//! builder enforces this by advancing through `Phase` and rejecting a push
//! that belongs to an earlier phase — callers (the resolve/link/model-build
//! pipeline stage) are responsible for presorting each batch before pushing
//! it; the builder's job is to assign the next id and to refuse
//! out-of-order phases, not to do the sorting itself.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::entities::{
    Aggregator, BuildSystem, Component, ComponentLocation, ExternalPackage, Repository, Runner,
    Test, Utility,
};
use super::ids::{Id, NodeKind};
use crate::errors::{EntityRef, RigError, RigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    RepositoryAndBuildSystem,
    ExternalPackages,
    Components,
    Aggregators,
    Runners,
    Utilities,
    Tests,
    Locations,
}

pub struct RigModelBuilder {
    phase: Phase,
    next_id: u32,

    repository: Option<Repository>,
    build_system: Option<BuildSystem>,
    external_packages: Vec<ExternalPackage>,
    components: Vec<Component>,
    aggregators: Vec<Aggregator>,
    runners: Vec<Runner>,
    utilities: Vec<Utility>,
    tests: Vec<Test>,
    locations: Vec<ComponentLocation>,
}

impl Default for RigModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RigModelBuilder {
    pub fn new() -> Self {
        Self {
            phase: Phase::RepositoryAndBuildSystem,
            next_id: 0,
            repository: None,
            build_system: None,
            external_packages: Vec::new(),
            components: Vec::new(),
            aggregators: Vec::new(),
            runners: Vec::new(),
            utilities: Vec::new(),
            tests: Vec::new(),
            locations: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> Id {
        let id = Id(self.next_id);
        self.next_id += 1;
        id
    }

    fn require_phase(&mut self, phase: Phase) -> RigResult<()> {
        if self.phase > phase {
            return Err(RigError::InvalidConfig {
                message: format!(
                    "entities pushed out of deterministic order: already past phase for {phase:?}"
                ),
            });
        }
        self.phase = phase;
        Ok(())
    }

    pub fn set_repository(&mut self, repository: Repository) -> RigResult<()> {
        self.require_phase(Phase::RepositoryAndBuildSystem)?;
        self.repository = Some(repository);
        Ok(())
    }

    pub fn set_build_system(&mut self, build_system: BuildSystem) -> RigResult<()> {
        self.require_phase(Phase::RepositoryAndBuildSystem)?;
        self.build_system = Some(build_system);
        Ok(())
    }

    /// Caller must present external packages already in canonical sort
    /// order (§4.5).
    pub fn push_external_package(
        &mut self,
        mut pkg: ExternalPackage,
    ) -> RigResult<Id> {
        self.require_phase(Phase::ExternalPackages)?;
        let id = self.alloc_id();
        pkg.id = id;
        self.external_packages.push(pkg);
        Ok(id)
    }

    /// Caller must present components already in topological order with
    /// lexicographic tie-break on name (§4.4/§5).
    pub fn push_component(&mut self, mut c: Component) -> RigResult<Id> {
        self.require_phase(Phase::Components)?;
        let id = self.alloc_id();
        c.id = id;
        self.components.push(c);
        Ok(id)
    }

    pub fn push_aggregator(&mut self, mut a: Aggregator) -> RigResult<Id> {
        self.require_phase(Phase::Aggregators)?;
        let id = self.alloc_id();
        a.id = id;
        self.aggregators.push(a);
        Ok(id)
    }

    pub fn push_runner(&mut self, mut r: Runner) -> RigResult<Id> {
        self.require_phase(Phase::Runners)?;
        let id = self.alloc_id();
        r.id = id;
        self.runners.push(r);
        Ok(id)
    }

    pub fn push_utility(&mut self, mut u: Utility) -> RigResult<Id> {
        self.require_phase(Phase::Utilities)?;
        let id = self.alloc_id();
        u.id = id;
        self.utilities.push(u);
        Ok(id)
    }

    pub fn push_test(&mut self, mut t: Test) -> RigResult<Id> {
        self.require_phase(Phase::Tests)?;
        let id = self.alloc_id();
        t.id = id;
        self.tests.push(t);
        Ok(id)
    }

    pub fn push_location(&mut self, mut l: ComponentLocation) -> RigResult<Id> {
        self.require_phase(Phase::Locations)?;
        let id = self.alloc_id();
        l.id = id;
        self.locations.push(l);
        Ok(id)
    }

    /// Run every invariant from §4.7 and, if all pass, return an immutable
    /// `RigModel`. No partial graph is ever returned (§4.7, §7).
    pub fn freeze(mut self) -> RigResult<RigModel> {
        let repository = self.repository.take().ok_or_else(|| RigError::InvalidConfig {
            message: "repository is required".to_string(),
        })?;
        let build_system = self.build_system.take().ok_or_else(|| RigError::InvalidConfig {
            message: "build_system is required".to_string(),
        })?;

        check_name_uniqueness(&self.components, &self.aggregators, &self.runners, &self.utilities, &self.tests)?;
        check_evidence_completeness(&repository, &self.components, &self.aggregators, &self.runners, &self.utilities, &self.tests, &self.locations)?;
        check_external_package_refs(&self.components, &self.external_packages)?;
        check_acyclicity(&self.components)?;
        check_test_link_back_references(&self.components, &self.tests)?;

        Ok(RigModel {
            repository,
            build_system,
            external_packages: self.external_packages,
            components: self.components,
            aggregators: self.aggregators,
            runners: self.runners,
            utilities: self.utilities,
            tests: self.tests,
            locations: self.locations,
        })
    }
}

/// The frozen, read-only RIG. There is no public mutating API; the only way
/// to produce one is `RigModelBuilder::freeze`.
#[derive(Debug, Clone)]
pub struct RigModel {
    pub repository: Repository,
    pub build_system: BuildSystem,
    pub external_packages: Vec<ExternalPackage>,
    pub components: Vec<Component>,
    pub aggregators: Vec<Aggregator>,
    pub runners: Vec<Runner>,
    pub utilities: Vec<Utility>,
    pub tests: Vec<Test>,
    pub locations: Vec<ComponentLocation>,
}

impl RigModel {
    pub fn component(&self, id: Id) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn test(&self, id: Id) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }
}

fn check_name_uniqueness(
    components: &[Component],
    aggregators: &[Aggregator],
    runners: &[Runner],
    utilities: &[Utility],
    tests: &[Test],
) -> RigResult<()> {
    let mut seen: HashMap<(NodeKind, &str), ()> = HashMap::new();
    macro_rules! check_kind {
        ($items:expr, $kind:expr) => {
            for item in $items {
                if seen.insert(($kind, item.name.as_str()), ()).is_some() {
                    return Err(RigError::DuplicateEntity {
                        entity: EntityRef {
                            kind: $kind,
                            name: item.name.clone(),
                        },
                    });
                }
            }
        };
    }
    check_kind!(components, NodeKind::Component);
    check_kind!(aggregators, NodeKind::Aggregator);
    check_kind!(runners, NodeKind::Runner);
    check_kind!(utilities, NodeKind::Utility);
    check_kind!(tests, NodeKind::Test);
    Ok(())
}

fn check_evidence_completeness(
    repository: &Repository,
    components: &[Component],
    aggregators: &[Aggregator],
    runners: &[Runner],
    utilities: &[Utility],
    tests: &[Test],
    locations: &[ComponentLocation],
) -> RigResult<()> {
    let root = &repository.root_path;

    let check = |name: &str, kind: NodeKind, ev: &super::evidence::Evidence| -> RigResult<()> {
        if !ev.is_well_formed() {
            return Err(RigError::EvidenceMissing {
                entity: EntityRef {
                    kind,
                    name: name.to_string(),
                },
            });
        }
        for frame in &ev.call_stack {
            if !frame.file.starts_with(root) {
                return Err(RigError::EvidenceMissing {
                    entity: EntityRef {
                        kind,
                        name: name.to_string(),
                    },
                });
            }
        }
        Ok(())
    };

    for c in components {
        check(&c.name, NodeKind::Component, &c.evidence)?;
    }
    for a in aggregators {
        check(&a.name, NodeKind::Aggregator, &a.evidence)?;
    }
    for r in runners {
        check(&r.name, NodeKind::Runner, &r.evidence)?;
    }
    for u in utilities {
        // Invariant 1 exempts "Utility-with-no-signals": a bare utility
        // target with no command/dependencies/artifact may legitimately
        // have no meaningful evidence beyond its own declaration line.
        if !u.evidence.call_stack.is_empty() {
            check(&u.name, NodeKind::Utility, &u.evidence)?;
        }
    }
    for t in tests {
        check(&t.name, NodeKind::Test, &t.evidence)?;
    }
    for l in locations {
        if !l.evidence.is_well_formed() {
            return Err(RigError::EvidenceMissing {
                entity: EntityRef {
                    kind: NodeKind::Component,
                    name: format!("location:{}", l.path.display()),
                },
            });
        }
    }
    Ok(())
}

fn check_external_package_refs(components: &[Component], externals: &[ExternalPackage]) -> RigResult<()> {
    let known: HashSet<Id> = externals.iter().map(|e| e.id).collect();
    for c in components {
        for ext_id in &c.externals {
            if !known.contains(ext_id) {
                return Err(RigError::DanglingDependency {
                    target: c.name.clone(),
                    dependency_id: ext_id.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_acyclicity(components: &[Component]) -> RigResult<()> {
    use super::ids::DepTarget;

    let component_ids: HashSet<Id> = components.iter().map(|c| c.id).collect();
    let by_id: HashMap<Id, &Component> = components.iter().map(|c| (c.id, c)).collect();

    let mut in_degree: BTreeMap<Id, u32> = components.iter().map(|c| (c.id, 0)).collect();
    let mut edges: BTreeMap<Id, Vec<Id>> = BTreeMap::new();

    for c in components {
        for dep in &c.depends_on {
            if let DepTarget::Component(dep_id) = dep {
                if !component_ids.contains(dep_id) {
                    continue;
                }
                edges.entry(c.id).or_default().push(*dep_id);
                *in_degree.entry(*dep_id).or_insert(0) += 1;
            }
        }
    }

    // Kahn's algorithm on the "depends_on" relation: an edge c -> dep means
    // dep must be emitted before c, so we peel nodes with in-degree zero
    // from the "depended upon by nobody remaining" side. To keep this
    // deterministic we process the queue in ascending Id order.
    let mut queue: BTreeSet<Id> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut visited = 0usize;
    let mut remaining_in_degree = in_degree.clone();

    // Build reverse edges: dep -> dependents, so removing `dep` decrements
    // its dependents' in-degree.
    let mut dependents: BTreeMap<Id, Vec<Id>> = BTreeMap::new();
    for (c_id, deps) in &edges {
        for dep in deps {
            dependents.entry(*dep).or_default().push(*c_id);
        }
    }

    while let Some(&id) = queue.iter().next() {
        queue.remove(&id);
        visited += 1;
        if let Some(deps) = dependents.get(&id) {
            for &dependent in deps {
                if let Some(deg) = remaining_in_degree.get_mut(&dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.insert(dependent);
                    }
                }
            }
        }
    }

    if visited != components.len() {
        // Find a concrete cycle for the error message via DFS from any
        // unresolved node.
        let stuck: Vec<Id> = remaining_in_degree
            .iter()
            .filter(|(_, deg)| **deg > 0)
            .map(|(id, _)| *id)
            .collect();
        let path = find_cycle(&stuck, &edges, &by_id);
        return Err(RigError::CyclicDependency { path });
    }

    Ok(())
}

fn find_cycle(
    stuck: &[Id],
    edges: &BTreeMap<Id, Vec<Id>>,
    by_id: &HashMap<Id, &Component>,
) -> Vec<EntityRef> {
    let start = match stuck.first() {
        Some(id) => *id,
        None => return Vec::new(),
    };

    let mut path = vec![start];
    let mut visited = HashSet::new();
    visited.insert(start);
    let mut current = start;

    loop {
        let next = edges
            .get(&current)
            .and_then(|deps| deps.iter().find(|d| stuck.contains(d)))
            .copied();
        match next {
            Some(n) if !visited.contains(&n) => {
                path.push(n);
                visited.insert(n);
                current = n;
            }
            Some(n) => {
                path.push(n);
                break;
            }
            None => break,
        }
    }

    path.into_iter()
        .map(|id| EntityRef {
            kind: NodeKind::Component,
            name: by_id
                .get(&id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string()),
        })
        .collect()
}

fn check_test_link_back_references(components: &[Component], tests: &[Test]) -> RigResult<()> {
    let tests_by_id: HashMap<Id, &Test> = tests.iter().map(|t| (t.id, t)).collect();
    let components_by_id: HashMap<Id, &Component> = components.iter().map(|c| (c.id, c)).collect();

    for c in components {
        if let Some(test_id) = c.test_link {
            match tests_by_id.get(&test_id) {
                Some(t) if t.linked_component == Some(c.id) => {}
                _ => {
                    return Err(RigError::BackReferenceMismatch {
                        a: EntityRef {
                            kind: NodeKind::Component,
                            name: c.name.clone(),
                        },
                        b: EntityRef {
                            kind: NodeKind::Test,
                            name: tests_by_id
                                .get(&test_id)
                                .map(|t| t.name.clone())
                                .unwrap_or_else(|| test_id.to_string()),
                        },
                    });
                }
            }
        }
    }

    for t in tests {
        if let Some(comp_id) = t.linked_component {
            match components_by_id.get(&comp_id) {
                Some(c) if c.test_link == Some(t.id) => {}
                _ => {
                    return Err(RigError::BackReferenceMismatch {
                        a: EntityRef {
                            kind: NodeKind::Test,
                            name: t.name.clone(),
                        },
                        b: EntityRef {
                            kind: NodeKind::Component,
                            name: components_by_id
                                .get(&comp_id)
                                .map(|c| c.name.clone())
                                .unwrap_or_else(|| comp_id.to_string()),
                        },
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entities::*;
    use crate::model::evidence::{Evidence, Frame};
    use crate::model::ids::*;
    use std::path::PathBuf;

    fn repo() -> Repository {
        Repository {
            name: "demo".into(),
            root_path: PathBuf::from("/repo"),
            build_dir: PathBuf::from("/repo/build"),
            output_dir: PathBuf::from("/repo/build/bin"),
            configure_cmd: None,
            build_cmd: None,
            install_cmd: None,
            test_cmd: None,
        }
    }

    fn build_system() -> BuildSystem {
        BuildSystem {
            name: "CMake".into(),
            version: Some("3.29".into()),
            generator: Some("Ninja".into()),
            build_type: Some("Release".into()),
        }
    }

    fn ev() -> Evidence {
        Evidence {
            call_stack: vec![Frame {
                file: PathBuf::from("/repo/CMakeLists.txt"),
                line: 5,
                command: Some("add_executable".into()),
            }],
        }
    }

    fn component(name: &str) -> Component {
        Component {
            id: Id(0),
            name: name.into(),
            kind: ComponentKind::Executable,
            language: Language::Cpp,
            languages: BTreeSet::from([Language::Cpp]),
            runtime: Runtime::NativeClangLike,
            output_filename: Some(name.into()),
            output_path: Some(PathBuf::from(format!("/repo/build/bin/{name}"))),
            sources: BTreeSet::from([PathBuf::from("src/main.cpp")]),
            externals: BTreeSet::new(),
            depends_on: BTreeSet::new(),
            locations: Vec::new(),
            test_link: None,
            evidence: ev(),
        }
    }

    #[test]
    fn minimal_graph_freezes_successfully() {
        let mut b = RigModelBuilder::new();
        b.set_repository(repo()).unwrap();
        b.set_build_system(build_system()).unwrap();
        b.push_component(component("hello_world")).unwrap();

        let model = b.freeze().unwrap();
        assert_eq!(model.components.len(), 1);
        assert_eq!(model.components[0].id, Id(0));
    }

    #[test]
    fn duplicate_component_name_rejected() {
        let mut b = RigModelBuilder::new();
        b.set_repository(repo()).unwrap();
        b.set_build_system(build_system()).unwrap();
        b.push_component(component("a")).unwrap();
        b.push_component(component("a")).unwrap();

        assert!(matches!(b.freeze(), Err(RigError::DuplicateEntity { .. })));
    }

    #[test]
    fn cyclic_dependency_rejected() {
        let mut b = RigModelBuilder::new();
        b.set_repository(repo()).unwrap();
        b.set_build_system(build_system()).unwrap();

        let mut a = component("a");
        let mut c = component("b");
        // ids assigned on push; set up the cycle after we know them.
        let id_a = Id(0);
        let id_b = Id(1);
        a.depends_on.insert(DepTarget::Component(id_b));
        c.depends_on.insert(DepTarget::Component(id_a));

        b.push_component(a).unwrap();
        b.push_component(c).unwrap();

        assert!(matches!(b.freeze(), Err(RigError::CyclicDependency { .. })));
    }

    #[test]
    fn evidence_outside_repo_root_rejected() {
        let mut b = RigModelBuilder::new();
        b.set_repository(repo()).unwrap();
        b.set_build_system(build_system()).unwrap();

        let mut comp = component("hello_world");
        comp.evidence = Evidence {
            call_stack: vec![Frame {
                file: PathBuf::from("/usr/share/cmake/Modules/UseJava.cmake"),
                line: 974,
                command: Some("add_custom_target".into()),
            }],
        };
        b.push_component(comp).unwrap();

        assert!(matches!(b.freeze(), Err(RigError::EvidenceMissing { .. })));
    }
}
