//! Shared types for the preview sandbox orchestrator.
//!
//! Every other `pv-*` crate depends on this one for the flat file map,
//! the lenient package-manifest view, configuration, the shared error
//! type, and structured trace events.

pub mod config;
pub mod error;
pub mod files;
pub mod manifest;
pub mod trace;

pub use error::{Error, Result};
pub use files::FileMap;
pub use manifest::PackageManifest;
