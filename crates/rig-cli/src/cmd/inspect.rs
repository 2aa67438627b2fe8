use std::path::Path;

use anyhow::{anyhow, Result};
use rig_store::{Store, StoreConfig};
use serde::Serialize;

use crate::output::{self, OutputMode};

#[derive(Debug, Serialize)]
struct SummaryOut {
    repository: String,
    build_system: String,
    components: i64,
    aggregators: i64,
    runners: i64,
    utilities: i64,
    tests: i64,
    external_packages: i64,
}

#[derive(Debug, Serialize)]
struct ComponentOut {
    id: i64,
    name: String,
    kind: String,
    language: String,
    runtime: String,
    output_path: Option<String>,
    source_files: Vec<String>,
    external_packages: Vec<String>,
    linked_test: Option<String>,
}

pub fn run(mode: OutputMode, db: &Path, summary: bool, component: Option<&str>) -> Result<()> {
    let store = Store::open(&StoreConfig::at_path(db))?;

    if let Some(name) = component {
        let detail = store
            .component_by_name(name)?
            .ok_or_else(|| anyhow!("no component named \"{name}\" in {}", db.display()))?;
        let out = ComponentOut {
            id: detail.id,
            name: detail.name,
            kind: detail.kind,
            language: detail.language,
            runtime: detail.runtime,
            output_path: detail.output_path,
            source_files: detail.source_files,
            external_packages: detail.external_packages,
            linked_test: detail.linked_test,
        };
        return output::print(mode, &out);
    }

    // `--summary` is the default view when neither flag narrows the query.
    let _ = summary;
    let s = store.summary()?;
    let out = SummaryOut {
        repository: s.repository_name,
        build_system: s.build_system_name,
        components: s.component_count,
        aggregators: s.aggregator_count,
        runners: s.runner_count,
        utilities: s.utility_count,
        tests: s.test_count,
        external_packages: s.external_package_count,
    };
    output::print(mode, &out)
}
