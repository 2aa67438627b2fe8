//! The concrete `BuildSystemPlugin` for CMake: wires the Build-API reader
//! and the Test-List reader together behind the one `discover` entry point.
//!
//! Grounded on this codebase's builtin-plugin registration shape: a plugin
//! struct built once at discovery time, its later trait methods only
//! replaying data already read rather than touching the filesystem again.

use std::path::{Path, PathBuf};

use rig_core::errors::RigResult;
use rig_core::plugin::{BuildSystemPlugin, PluginContext, RawTarget, RawTest, ToolchainInfo};
use std::collections::BTreeMap;

use crate::ctest;
use crate::fileapi;

/// A discovered CMake build tree: one Build-API reply set plus one CTest
/// listing, read once and held for the lifetime of the extraction run.
pub struct RigCmakePlugin {
    context: PluginContext,
    targets: Vec<RawTarget>,
    tests: Vec<RawTest>,
    toolchains: BTreeMap<String, ToolchainInfo>,
    cache: BTreeMap<String, String>,
    cmake_files: Vec<PathBuf>,
}

impl RigCmakePlugin {
    /// Read the Build-API reply and run `ctest` once, up front. Everything
    /// this plugin later hands back is a view over what was read here.
    pub fn discover(repo_root: &Path, build_dir: &Path) -> RigResult<Self> {
        let repo_root = absolute(repo_root);
        let build_dir = absolute(build_dir);

        let reply = fileapi::read_reply(&build_dir)?;
        let tests = ctest::list_tests(&build_dir)?;

        Ok(Self {
            context: PluginContext { repo_root, build_dir },
            targets: reply.targets,
            tests,
            toolchains: reply.toolchains,
            cache: reply.cache,
            cmake_files: reply.cmake_files,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl BuildSystemPlugin for RigCmakePlugin {
    fn context(&self) -> &PluginContext {
        &self.context
    }

    fn targets(&self) -> RigResult<Vec<RawTarget>> {
        Ok(self.targets.clone())
    }

    fn tests(&self) -> RigResult<Vec<RawTest>> {
        Ok(self.tests.clone())
    }

    fn toolchains(&self) -> RigResult<BTreeMap<String, ToolchainInfo>> {
        Ok(self.toolchains.clone())
    }

    fn cache(&self) -> RigResult<BTreeMap<String, String>> {
        Ok(self.cache.clone())
    }

    fn cmake_files(&self) -> RigResult<Vec<PathBuf>> {
        Ok(self.cmake_files.clone())
    }
}
