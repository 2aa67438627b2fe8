//! rig-core
//!
//! The deterministic, I/O-free half of the Repository Intelligence Graph
//! extractor: the entity model, the evidence/backtrace walker, the
//! classifier, the dependency/external-package resolver, the test↔target
//! linker, and the pipeline that chains them together.
//!
//! This crate never touches the filesystem, a subprocess, or the network.
//! A build-system plugin (`rig-cmake` is the reference one) reads the
//! outside world and hands this crate plain Rust values through the
//! `BuildSystemPlugin` contract in [`plugin`].

pub mod backtrace;
pub mod classify;
pub mod config;
pub mod determinism;
pub mod errors;
pub mod link;
pub mod model;
pub mod pipeline;
pub mod plugin;
pub mod resolve;

pub use crate::errors::{RigError, RigResult};

/// Convenience re-exports for crates that consume the full extraction path.
pub mod prelude {
    pub use crate::config::RigConfig;
    pub use crate::errors::{EntityRef, RigError, RigResult};
    pub use crate::model::{
        Aggregator, BuildSystem, Component, ComponentLocation, ExternalPackage, Repository,
        RigModel, RigModelBuilder, Runner, Test, Utility,
    };
    pub use crate::pipeline::extract::{ClassifiedRawTarget, ClassifyStage, ModelBuildStage};
    pub use crate::pipeline::{Pipeline, PipelineContext, PipelineData, PipelineReport, Stage};
    pub use crate::plugin::{BuildSystemPlugin, PluginContext, RawTarget, RawTest, ToolchainInfo};
}
