//! rig-cmake
//!
//! The reference `BuildSystemPlugin` implementation: reads a CMake File API
//! v1 reply set and a CTest JSON test listing from an already-configured
//! build tree and hands them to `rig-core` as plain `RawTarget`/`RawTest`
//! values. Does no extraction logic of its own — classification, linking,
//! and model assembly all live in `rig-core`.

pub mod ctest;
pub mod fileapi;
pub mod plugin_impl;

pub use plugin_impl::RigCmakePlugin;
