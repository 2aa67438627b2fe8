//! The RIG entity types (§3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::evidence::Evidence;
use super::ids::{ComponentKind, DepTarget, Id, Language, LocationAction, PackageManager, Runtime, TestFramework};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub root_path: PathBuf,
    pub build_dir: PathBuf,
    pub output_dir: PathBuf,
    pub configure_cmd: Option<String>,
    pub build_cmd: Option<String>,
    pub install_cmd: Option<String>,
    pub test_cmd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSystem {
    pub name: String,
    pub version: Option<String>,
    pub generator: Option<String>,
    pub build_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: Id,
    pub name: String,
    pub kind: ComponentKind,
    pub language: Language,
    /// Full set of languages observed across compile groups; `language` is
    /// the primary (most source files), per §4.4 "Language".
    pub languages: BTreeSet<Language>,
    pub runtime: Runtime,
    pub output_filename: Option<String>,
    pub output_path: Option<PathBuf>,
    pub sources: BTreeSet<PathBuf>,
    pub externals: BTreeSet<Id>,
    pub depends_on: BTreeSet<DepTarget>,
    pub locations: Vec<ComponentLocation>,
    pub test_link: Option<Id>,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregator {
    pub id: Id,
    pub name: String,
    pub depends_on: BTreeSet<DepTarget>,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: Id,
    pub name: String,
    pub command: Vec<String>,
    pub depends_on: BTreeSet<DepTarget>,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utility {
    pub id: Id,
    pub name: String,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: Id,
    pub name: String,
    pub framework: TestFramework,
    pub test_type: Option<String>,
    pub command: Vec<String>,
    pub properties: std::collections::BTreeMap<String, String>,
    pub linked_component: Option<Id>,
    pub source_files: BTreeSet<PathBuf>,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalPackage {
    pub id: Id,
    pub package_manager: PackageManager,
    pub name: String,
    pub version: Option<String>,
}

impl ExternalPackage {
    /// Canonical dedup key (§4.5 "Deduplication").
    pub fn dedup_key(&self) -> (PackageManager, &str, Option<&str>) {
        (self.package_manager, self.name.as_str(), self.version.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentLocation {
    pub id: Id,
    pub component: Id,
    pub path: PathBuf,
    pub action: LocationAction,
    /// Self-referential: the location this one was copied/moved/installed
    /// from, when known. `None` for a location produced directly by the
    /// build (§9 open-question decision: the primary runtime artifact's
    /// own `ComponentLocation{action: Build}` has no source location).
    pub source_location: Option<Id>,
    pub evidence: Evidence,
}
