//! Boot lifecycle for the preview sandbox.
//!
//! The [`BootController`] drives one preview surface through
//! `idle → booting → mounting → (installing) → starting → ready`, with
//! `error` reachable from any non-terminal phase. The sandbox host is an
//! explicit [`HostSlot`] owned by the caller and passed in, so the
//! controller runs against a fake host in tests.
//!
//! Cancellation is a shared token checked at every suspension point.
//! Once it fires, the [`BootState`] refuses further phase transitions and
//! log appends, including those from output callbacks already in flight.

pub mod cancel;
pub mod controller;
pub mod error;
pub mod format;
pub mod host;
pub mod local;
pub mod log;
pub mod phase;
pub mod state;

pub use cancel::{SurfaceRegistry, SurfaceToken};
pub use controller::{manifest_fingerprint, BootController, BootOutcome, FallbackHook, HostSlot};
pub use error::{BootError, BootFailure, FailureKind, HostError};
pub use host::{HostProvider, LineSink, SandboxHost, SandboxProcess, ServerReady};
pub use local::{detect_ready, LocalHost, LocalHostProvider};
pub use log::TerminalLog;
pub use phase::BootPhase;
pub use state::{BootSnapshot, BootState};
