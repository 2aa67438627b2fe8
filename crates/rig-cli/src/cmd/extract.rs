use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rig_cmake::RigCmakePlugin;
use rig_core::config::RigConfig;
use rig_core::model::{BuildSystem, Repository};
use rig_core::pipeline::extract::{ClassifyStage, ModelBuildStage};
use rig_core::pipeline::{Pipeline, PipelineContext, PipelineData};
use rig_core::plugin::BuildSystemPlugin;
use rig_store::{Store, StoreConfig};
use serde::Serialize;

use crate::output::{self, OutputMode};

#[derive(Debug, Serialize)]
pub struct ExtractOut {
    pub components: usize,
    pub aggregators: usize,
    pub runners: usize,
    pub utilities: usize,
    pub tests: usize,
    pub external_packages: usize,
    pub warnings: usize,
    pub db: String,
}

pub fn run(mode: OutputMode, repo: &Path, build: &Path, db: &Path, plugin: &str) -> Result<()> {
    if plugin != "cmake" {
        return Err(anyhow!("unknown plugin \"{plugin}\" (only \"cmake\" is available today)"));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.enable_steady_tick(Duration::from_millis(80));

    pb.set_message("discovering build tree");
    let cmake = RigCmakePlugin::discover(repo, build)?;

    pb.set_message("reading targets and tests");
    let targets = cmake.targets()?;
    let tests = cmake.tests()?;
    let toolchains = cmake.toolchains()?;
    let cache = cmake.cache()?;
    let cmake_files = cmake.cmake_files()?;

    let context = cmake.context().clone();
    let repository = build_repository(&context, &cache);
    let build_system = build_build_system(&cache);

    pb.set_message("classifying, resolving, linking");
    let mut pipeline = Pipeline::new();
    pipeline.push_stage(ClassifyStage { repo_root: context.repo_root.clone() });
    pipeline.push_stage(ModelBuildStage {
        repository,
        build_system,
        config: RigConfig::default(),
    });

    let report = pipeline.run(
        PipelineContext::default(),
        PipelineData::Raw { targets, tests, toolchains, cache, cmake_files },
    )?;
    let warnings = report.warnings();
    let model = report.require_model()?;

    pb.set_message("persisting");
    let mut store = Store::open(&StoreConfig::at_path(db))?;
    store.write(&model)?;

    pb.finish_and_clear();

    let out = ExtractOut {
        components: model.components.len(),
        aggregators: model.aggregators.len(),
        runners: model.runners.len(),
        utilities: model.utilities.len(),
        tests: model.tests.len(),
        external_packages: model.external_packages.len(),
        warnings,
        db: db.display().to_string(),
    };
    output::print(mode, &out)?;
    Ok(())
}

fn build_repository(
    context: &rig_core::plugin::PluginContext,
    cache: &BTreeMap<String, String>,
) -> Repository {
    let name = context
        .repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string());

    Repository {
        name,
        root_path: context.repo_root.clone(),
        build_dir: context.build_dir.clone(),
        output_dir: cache
            .get("CMAKE_RUNTIME_OUTPUT_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|| context.build_dir.clone()),
        configure_cmd: None,
        build_cmd: None,
        install_cmd: None,
        test_cmd: Some("ctest".to_string()),
    }
}

fn build_build_system(cache: &BTreeMap<String, String>) -> BuildSystem {
    BuildSystem {
        name: "CMake".to_string(),
        version: cache.get("CMAKE_VERSION").cloned(),
        generator: cache.get("CMAKE_GENERATOR").cloned(),
        build_type: cache.get("CMAKE_BUILD_TYPE").cloned(),
    }
}
