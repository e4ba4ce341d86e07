//! Rewrites a scanned project so it can boot in the sandbox.
//!
//! [`patch`] takes the file map and the scanner's findings and returns a
//! new file map plus the list of steps that changed something. Every step
//! is best-effort and independent: a step with nothing to do is recorded
//! in the notes and skipped. The input map is never mutated.

mod manifest;
mod patch;
mod templates;

pub use manifest::start_command_for;
pub use patch::{patch, PatchResult, PatchStep, Patcher};
