//! Dependency & External-Package Resolver (§4.5).
//!
//! Two independent jobs live here: turning `RawTarget.dependencies[]` (raw
//! target ids) into typed `DepTarget` edges, and recognizing link-command
//! fragments that point outside the project as `ExternalPackage`s. Both are
//! pure functions over already-read data; nothing here touches a filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::errors::{RigError, RigResult};
use crate::model::ids::{DepTarget, Id, PackageManager};
use crate::plugin::{LinkFragment, LinkRole};

/// Resolve one target's `dependencies[]` (raw ids from the plugin) against
/// the already-assigned `DepTarget` for every other raw id in this build.
/// Unknown raw ids abort the whole extraction (§4.5: "Missing target ids
/// abort with DanglingDependency").
pub fn resolve_intra_project_edges(
    target_name: &str,
    dependencies: &[String],
    dep_target_of: &BTreeMap<String, DepTarget>,
) -> RigResult<BTreeSet<DepTarget>> {
    let mut edges = BTreeSet::new();
    for raw_dep_id in dependencies {
        match dep_target_of.get(raw_dep_id) {
            Some(dep) => {
                edges.insert(*dep);
            }
            None => {
                return Err(RigError::DanglingDependency {
                    target: target_name.to_string(),
                    dependency_id: raw_dep_id.clone(),
                })
            }
        }
    }
    Ok(edges)
}

/// Cache-derived hints used to disambiguate bare-name link fragments
/// (§4.5, "Cache entries ... inspected once to set the default manager
/// hint when ambiguous").
#[derive(Debug, Clone)]
pub struct ExternalHints {
    pub vcpkg_root: Option<PathBuf>,
    pub conan_active: bool,
    pub default_manager: PackageManager,
}

pub fn external_hints_from_cache(cache: &BTreeMap<String, String>) -> ExternalHints {
    let vcpkg_root = cache
        .get("VCPKG_ROOT")
        .or_else(|| cache.get("VCPKG_INSTALLED_DIR"))
        .map(PathBuf::from);

    let conan_active = cache
        .get("CMAKE_TOOLCHAIN_FILE")
        .map(|v| v.contains("conan_toolchain.cmake"))
        .unwrap_or(false);

    let default_manager = if conan_active {
        PackageManager::Conan
    } else if vcpkg_root.is_some() {
        PackageManager::Vcpkg
    } else {
        PackageManager::System
    };

    ExternalHints {
        vcpkg_root,
        conan_active,
        default_manager,
    }
}

/// A resolved external reference, pre-dedup and pre-id (§4.5
/// "Deduplication" happens afterward via `ExternalPackageTable`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExternalKey {
    pub manager: PackageManager,
    pub name: String,
    pub version: Option<String>,
}

/// Inspect one link-command fragment (role `libraries` or `linker`) and
/// classify it as an external package reference, or `None` if it resolves
/// to something else (an intra-project artifact, a bare flag, etc).
pub fn detect_external_package(
    fragment: &LinkFragment,
    known_output_stems: &BTreeSet<String>,
    hints: &ExternalHints,
) -> Option<ExternalKey> {
    if !matches!(fragment.role, LinkRole::Libraries | LinkRole::Linker) {
        return None;
    }

    let text = fragment.fragment.trim();
    if text.is_empty() {
        return None;
    }
    if text.starts_with('-') && !text.starts_with("-l") {
        // Plain linker flags (-Wl,..., -pthread, etc) carry no package identity.
        return None;
    }

    if let Some(root) = &hints.vcpkg_root {
        if let Some(name) = path_under(text, root) {
            return Some(ExternalKey {
                manager: PackageManager::Vcpkg,
                name,
                version: None,
            });
        }
    }

    if hints.conan_active && text.contains("/conan") {
        if let Some(name) = stem_of(text) {
            return Some(ExternalKey {
                manager: PackageManager::Conan,
                name,
                version: None,
            });
        }
    }

    let bare_name = if let Some(rest) = text.strip_prefix("-l") {
        Some(rest.to_string())
    } else if text.ends_with(".lib") || text.ends_with(".a") || text.ends_with(".so") || text.ends_with(".dylib") {
        stem_of(text)
    } else {
        None
    };

    let bare_name = bare_name?;
    if known_output_stems.contains(&bare_name) {
        return None;
    }

    Some(ExternalKey {
        manager: hints.default_manager,
        name: bare_name,
        version: None,
    })
}

fn path_under(text: &str, root: &Path) -> Option<String> {
    let path = Path::new(text);
    if path.starts_with(root) {
        stem_of(text)
    } else {
        None
    }
}

fn stem_of(text: &str) -> Option<String> {
    Path::new(text)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim_start_matches("lib").to_string())
}

/// Canonical-sort-and-dedup table for external packages (§4.5
/// "Deduplication by (manager, name, version)"; §5 "canonical sort" for id
/// assignment order). `intern` is stable across calls: the same key always
/// returns the same table index regardless of insertion order.
#[derive(Debug, Default)]
pub struct ExternalPackageTable {
    seen: BTreeMap<ExternalKey, usize>,
}

impl ExternalPackageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, key: ExternalKey) -> usize {
        let next = self.seen.len();
        *self.seen.entry(key).or_insert(next)
    }

    /// Canonical `(manager, name, version)` order, ready to hand to
    /// `RigModelBuilder::push_external_package` in id-assignment order.
    /// Returns each key paired with the index `intern` returned for it, so
    /// callers can remap their provisional indices to final `Id`s.
    pub fn into_canonical_order(self) -> Vec<(usize, ExternalKey)> {
        let mut entries: Vec<(usize, ExternalKey)> =
            self.seen.into_iter().map(|(k, i)| (i, k)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }
}

/// Map a provisional table index to the `Id` the builder assigned it,
/// built once `into_canonical_order` has been pushed through the builder.
pub fn remap_external_ids(order: &[(usize, ExternalKey)], assigned: &[Id]) -> BTreeMap<usize, Id> {
    order
        .iter()
        .zip(assigned.iter())
        .map(|((provisional, _), id)| (*provisional, *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_dash_l_flag_is_system_package() {
        let hints = ExternalHints {
            vcpkg_root: None,
            conan_active: false,
            default_manager: PackageManager::System,
        };
        let fragment = LinkFragment {
            role: LinkRole::Libraries,
            fragment: "-lpthread".to_string(),
        };
        let key = detect_external_package(&fragment, &BTreeSet::new(), &hints).unwrap();
        assert_eq!(key.manager, PackageManager::System);
        assert_eq!(key.name, "pthread");
    }

    #[test]
    fn intra_project_artifact_is_not_external() {
        let hints = ExternalHints {
            vcpkg_root: None,
            conan_active: false,
            default_manager: PackageManager::System,
        };
        let mut stems = BTreeSet::new();
        stems.insert("mylib".to_string());
        let fragment = LinkFragment {
            role: LinkRole::Libraries,
            fragment: "libmylib.a".to_string(),
        };
        assert!(detect_external_package(&fragment, &stems, &hints).is_none());
    }

    #[test]
    fn vcpkg_path_fragment_detected() {
        let hints = ExternalHints {
            vcpkg_root: Some(PathBuf::from("/opt/vcpkg/installed")),
            conan_active: false,
            default_manager: PackageManager::Vcpkg,
        };
        let fragment = LinkFragment {
            role: LinkRole::Libraries,
            fragment: "/opt/vcpkg/installed/x64-linux/lib/libfmt.a".to_string(),
        };
        let key = detect_external_package(&fragment, &BTreeSet::new(), &hints).unwrap();
        assert_eq!(key.manager, PackageManager::Vcpkg);
        assert_eq!(key.name, "fmt");
    }

    #[test]
    fn table_dedups_by_full_key() {
        let mut table = ExternalPackageTable::new();
        let a = table.intern(ExternalKey {
            manager: PackageManager::System,
            name: "pthread".to_string(),
            version: None,
        });
        let b = table.intern(ExternalKey {
            manager: PackageManager::System,
            name: "pthread".to_string(),
            version: None,
        });
        assert_eq!(a, b);
    }
}
