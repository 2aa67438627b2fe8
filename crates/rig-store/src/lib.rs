//! rig-store
//!
//! `rusqlite`-backed persistence of a frozen `RigModel` into the relational
//! schema (§6): a single write transaction per RIG, schema creation and
//! version-gating on open, surrogate integer ids reused directly from the
//! model's own deterministic id assignment.

pub mod config;
pub mod read;
pub mod schema;
pub mod write;

pub use config::{StoreConfig, StoreLocation};
pub use read::{ComponentDetail, Summary};
pub use write::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use rig_core::model::ids::{ComponentKind, DepTarget, Language, PackageManager, Runtime};
    use rig_core::model::{
        Component, Evidence, ExternalPackage, Frame, Id, Repository, RigModelBuilder,
    };
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn evidence() -> Evidence {
        Evidence {
            call_stack: vec![Frame {
                file: PathBuf::from("/repo/CMakeLists.txt"),
                line: 12,
                command: Some("add_executable".to_string()),
            }],
        }
    }

    #[test]
    fn writes_a_minimal_model_without_error() {
        let mut builder = RigModelBuilder::new();
        builder
            .set_repository(Repository {
                name: "demo".to_string(),
                root_path: PathBuf::from("/repo"),
                build_dir: PathBuf::from("/repo/build"),
                output_dir: PathBuf::from("/repo/build/bin"),
                configure_cmd: None,
                build_cmd: None,
                install_cmd: None,
                test_cmd: None,
            })
            .unwrap();
        builder
            .set_build_system(rig_core::model::BuildSystem {
                name: "CMake".to_string(),
                version: Some("3.28.0".to_string()),
                generator: Some("Ninja".to_string()),
                build_type: Some("Release".to_string()),
            })
            .unwrap();
        let pkg_id = builder
            .push_external_package(ExternalPackage {
                id: Id(0),
                package_manager: PackageManager::Vcpkg,
                name: "fmt".to_string(),
                version: Some("10.1.1".to_string()),
            })
            .unwrap();
        let mut externals = BTreeSet::new();
        externals.insert(pkg_id);
        builder
            .push_component(Component {
                id: Id(0),
                name: "app".to_string(),
                kind: ComponentKind::Executable,
                language: Language::Cpp,
                languages: BTreeSet::from([Language::Cpp]),
                runtime: Runtime::NativeClangLike,
                output_filename: Some("app".to_string()),
                output_path: Some(PathBuf::from("/repo/build/bin/app")),
                sources: BTreeSet::from([PathBuf::from("/repo/src/main.cpp")]),
                externals,
                depends_on: BTreeSet::<DepTarget>::new(),
                locations: Vec::new(),
                test_link: None,
                evidence: evidence(),
            })
            .unwrap();
        let model = builder.freeze().unwrap();

        let mut store = Store::open(&StoreConfig::in_memory()).unwrap();
        store.write(&model).unwrap();
    }

    #[test]
    fn reopening_a_mismatched_schema_version_fails() {
        let config = StoreConfig::in_memory();
        let store = Store::open(&config).unwrap();
        drop(store);
        // Each in-memory database is independent per connection, so this
        // mainly documents intent; a persistent-file round trip is the
        // meaningful regression test for the version gate and is exercised
        // in the CLI's integration tests against a real file path.
    }
}
