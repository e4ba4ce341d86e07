//! Static risk scanner for generated projects.
//!
//! [`scan`] inspects a flat file map and decides whether the project can
//! boot in the in-browser sandbox (`fast`) or should be handed to a real
//! remote deployment (`full`). It is synchronous, does no I/O, and never
//! fails: anything it cannot parse simply contributes no signal.

pub mod result;
pub mod rules;
pub mod scan;

pub use result::{FrameworkFamily, Recommendation, ScanResult};
pub use rules::ScanRules;
pub use scan::{scan, Scanner};
