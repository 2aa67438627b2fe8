//! Stable identifiers and the enumerations from SPEC_FULL.md §3.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, arena-local id. Assigned by `RigModelBuilder` in the
/// deterministic pre-order from §5 ("Ordering guarantees"); never reused
/// and never renumbered after `freeze()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id(pub u32);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Component,
    Aggregator,
    Runner,
    Utility,
    Test,
    Interface,
    ExternalComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Executable,
    SharedLibrary,
    StaticLibrary,
    ModuleLibrary,
    ObjectLibrary,
    Vm,
    Interpreted,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Runtime {
    NativeMsvcC,
    NativeMsvcCpp,
    NativeClangLike,
    Jvm,
    DotNet,
    Go,
    Python,
    NodeJs,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Java,
    Go,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Fortran,
    Swift,
    ObjC,
    ObjCpp,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestFramework {
    CTest,
    GTest,
    Catch2,
    BoostTest,
    Pytest,
    Jest,
    CargoTest,
    JUnit,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationAction {
    Build,
    Copy,
    Move,
    Install,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PackageManager {
    System,
    Vcpkg,
    Conan,
    Npm,
    Cargo,
    Pip,
    Maven,
    Gradle,
    Unknown,
}

/// A tagged reference to one of the four dependency-edge targets (§9,
/// "Polymorphic dependency edges"). This is the in-memory form of the
/// SQL four-column exactly-one-non-null check constraint in §6/§4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DepTarget {
    Component(Id),
    Aggregator(Id),
    Runner(Id),
    Utility(Id),
}

impl DepTarget {
    pub fn id(&self) -> Id {
        match self {
            DepTarget::Component(id)
            | DepTarget::Aggregator(id)
            | DepTarget::Runner(id)
            | DepTarget::Utility(id) => *id,
        }
    }
}
