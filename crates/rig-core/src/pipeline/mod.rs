//! The extraction pipeline: Reader → Walker → Classifier → Resolver →
//! Linker → Model build, run as a fixed chain of `Stage`s through a
//! `Pipeline`/`PipelineContext`, the same shape this codebase already uses
//! for its compile/verify flows.
//!
//! Each stage receives and returns a typed `PipelineData` payload and
//! appends `PipelineDiagnostic{level, code, message}` entries to a shared
//! context rather than printing directly, so the CLI and tests can both
//! consume the same structured run report.
//!
//! Stages in this crate never do I/O and never read system time; the raw
//! data they classify, resolve, and link is handed to them already read by
//! `rig-cmake`.

use std::collections::BTreeMap;

use crate::errors::{RigError, RigResult};
use crate::model::RigModel;
use crate::plugin::{RawTest, ToolchainInfo};

use self::extract::ClassifiedRawTarget;

pub mod extract;

/// A stable identifier for a pipeline stage, dot-delimited by namespace
/// (`classify.targets`, `resolve.externals`, `link.tests`, `model.build`).
pub type StageId = String;

#[derive(Debug, Clone)]
pub struct PipelineDiagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Pipeline context shared by all stages: parameters plus the collected
/// diagnostic trail. Carries no clock: extraction has no deterministic-time
/// inputs to inject (unlike the rest of this codebase's compile pipeline).
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub params: BTreeMap<String, String>,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineContext {
    pub fn push_info(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Info, code, message);
    }

    pub fn push_warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Warning, code, message);
    }

    pub fn push_error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(DiagnosticLevel::Error, code, message);
    }

    fn push(&mut self, level: DiagnosticLevel, code: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(PipelineDiagnostic {
            level,
            code: code.into(),
            message: message.into(),
            data: BTreeMap::new(),
        });
    }

    pub fn set_param(&mut self, k: impl Into<String>, v: impl Into<String>) {
        self.params.insert(k.into(), v.into());
    }

    pub fn get_param(&self, k: &str) -> Option<&str> {
        self.params.get(k).map(|s| s.as_str())
    }
}

/// The payload threaded between pipeline stages. Unlike the generic
/// `Json`/`Ir`/`SchemaV1` carrier this shape replaces, every variant here
/// names an exact extraction-pipeline checkpoint.
#[derive(Debug, Clone)]
pub enum PipelineData {
    /// Raw targets/tests/toolchains/cache read from the plugin, untouched.
    Raw {
        targets: Vec<crate::plugin::RawTarget>,
        tests: Vec<RawTest>,
        toolchains: BTreeMap<String, ToolchainInfo>,
        cache: BTreeMap<String, String>,
        cmake_files: Vec<std::path::PathBuf>,
    },
    /// Targets with evidence walked and node/component kind assigned,
    /// carried alongside the raw tests and cache entries later stages need.
    Classified {
        targets: Vec<ClassifiedRawTarget>,
        tests: Vec<RawTest>,
        cache: BTreeMap<String, String>,
    },
    /// A fully built and validated RIG, ready for persistence.
    Model(RigModel),
}

pub trait Stage {
    fn id(&self) -> &str;
    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> RigResult<PipelineData>;
}

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage + Send + Sync>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push_stage<S: Stage + Send + Sync + 'static>(&mut self, s: S) -> &mut Self {
        self.stages.push(Box::new(s));
        self
    }

    pub fn stages(&self) -> usize {
        self.stages.len()
    }

    pub fn run(&self, mut ctx: PipelineContext, input: PipelineData) -> RigResult<PipelineReport> {
        let mut data = input;

        for st in &self.stages {
            ctx.push_info("pipeline.stage.start", format!("starting stage {}", st.id()));
            data = st.run(&mut ctx, data)?;
            ctx.push_info("pipeline.stage.end", format!("completed stage {}", st.id()));
        }

        Ok(PipelineReport {
            output: data,
            diagnostics: ctx.diagnostics,
        })
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub output: PipelineData,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error))
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.level, DiagnosticLevel::Warning))
            .count()
    }

    pub fn require_model(self) -> RigResult<RigModel> {
        match self.output {
            PipelineData::Model(m) => Ok(m),
            _ => Err(RigError::InvalidConfig {
                message: "pipeline did not reach the model-build stage".to_string(),
            }),
        }
    }
}
