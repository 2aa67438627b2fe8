//! The RIG entity model.
//!
//! Unlike the versioned `SchemaV1`/`ManifestV1` wire formats this module's
//! shape is descended from, a RIG has exactly one on-disk representation
//! today (§6's relational schema). There is no `AnySchema`-style dispatch
//! enum here; `v1` is reserved as a module name for the day a second
//! persisted schema version exists, so that migration follows the same
//! version-isolation convention without a rename.

pub mod builder;
pub mod entities;
pub mod evidence;
pub mod ids;

pub use builder::{RigModel, RigModelBuilder};
pub use entities::{
    Aggregator, BuildSystem, Component, ComponentLocation, ExternalPackage, Repository, Runner,
    Test, Utility,
};
pub use evidence::{Evidence, Frame};
pub use ids::{
    ComponentKind, DepTarget, Id, Language, LocationAction, NodeKind, PackageManager, Runtime,
    TestFramework,
};
