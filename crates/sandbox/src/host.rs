//! Sandbox host boundary.
//!
//! The controller only talks to these traits. [`crate::LocalHostProvider`]
//! runs projects as local processes; tests use scripted in-memory hosts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use pv_mount::MountTree;

use crate::HostError;

/// Receives process output one line at a time, without the trailing newline.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The dev server's ready announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerReady {
    pub port: u16,
    pub url: String,
}

/// A process running inside the sandbox.
#[async_trait]
pub trait SandboxProcess: Send {
    /// Wait for exit. `None` when the process was killed by a signal.
    /// All output has been delivered to the sink when this returns.
    async fn wait(&mut self) -> Result<Option<i32>, HostError>;

    async fn kill(&mut self) -> Result<(), HostError>;
}

#[async_trait]
pub trait SandboxHost: Send + Sync {
    /// Write `tree` into the sandbox root, replacing the previous tree.
    /// Installed dependencies survive a remount.
    async fn mount(&self, tree: &MountTree) -> Result<(), HostError>;

    /// Run a shell command in the sandbox root, streaming output to `on_line`.
    async fn spawn(
        &self,
        command: &str,
        on_line: LineSink,
    ) -> Result<Box<dyn SandboxProcess>, HostError>;

    /// Resolves once the most recently spawned process reports its port.
    async fn server_ready(&self) -> Result<ServerReady, HostError>;

    /// Release everything the host holds.
    async fn teardown(&self) -> Result<(), HostError>;
}

/// Creates sandbox hosts. Acquisition is the most expensive step of a boot.
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Fails with [`HostError::Unsupported`] when the platform cannot run
    /// a sandbox at all.
    async fn acquire(&self) -> Result<Arc<dyn SandboxHost>, HostError>;
}
