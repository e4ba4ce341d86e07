//! Boot lifecycle driver.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use pv_domain::config::BootConfig;
use pv_domain::files::{self, FileMap};
use pv_domain::manifest::MANIFEST_PATH;
use pv_domain::trace::TraceEvent;
use pv_mount::to_mount_tree;

use crate::{
    BootError, BootFailure, BootPhase, BootState, HostError, HostProvider, LineSink,
    SandboxHost, SandboxProcess, ServerReady,
};

/// Called when the host cannot run a sandbox, so the caller can show a
/// static preview instead.
pub type FallbackHook = Arc<dyn Fn(&BootFailure) + Send + Sync>;

/// SHA-256 hex of the dependency manifest text. A project without a
/// manifest hashes the empty string.
pub fn manifest_fingerprint(files: &FileMap) -> String {
    let text = files::lookup(files, MANIFEST_PATH).map_or("", |(_, text)| text.as_str());
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[derive(Default)]
struct SlotInner {
    host: Option<Arc<dyn SandboxHost>>,
    installed: Option<String>,
    server: Option<Box<dyn SandboxProcess>>,
}

/// Session-scoped sandbox resource, owned by the presentation layer.
///
/// Holds the acquired host, the running dev server and the fingerprint of
/// the last successful install, so a retry skips acquisition and an
/// unchanged manifest skips install.
pub struct HostSlot {
    provider: Arc<dyn HostProvider>,
    inner: Mutex<SlotInner>,
}

impl HostSlot {
    pub fn new(provider: Arc<dyn HostProvider>) -> Self {
        Self {
            provider,
            inner: Mutex::new(SlotInner::default()),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.inner.lock().host.is_some()
    }

    pub fn installed_fingerprint(&self) -> Option<String> {
        self.inner.lock().installed.clone()
    }

    pub fn current_host(&self) -> Option<Arc<dyn SandboxHost>> {
        self.inner.lock().host.clone()
    }

    /// The held host, or a freshly acquired one.
    pub async fn acquire(&self) -> Result<Arc<dyn SandboxHost>, HostError> {
        if let Some(host) = self.current_host() {
            tracing::debug!("reusing sandbox host");
            return Ok(host);
        }
        let host = self.provider.acquire().await?;
        self.inner.lock().host = Some(host.clone());
        Ok(host)
    }

    fn needs_install(&self, fingerprint: &str) -> bool {
        self.inner.lock().installed.as_deref() != Some(fingerprint)
    }

    fn mark_installed(&self, fingerprint: String) {
        self.inner.lock().installed = Some(fingerprint);
    }

    fn keep_server(&self, process: Box<dyn SandboxProcess>) {
        self.inner.lock().server = Some(process);
    }

    /// Kill the dev server, keeping the host.
    pub async fn stop_server(&self) {
        let server = self.inner.lock().server.take();
        if let Some(mut server) = server {
            if let Err(e) = server.kill().await {
                tracing::warn!(error = %e, "failed to stop dev server");
            }
        }
    }

    /// Kill the dev server and tear the host down. Safe to call repeatedly.
    pub async fn release(&self) {
        self.stop_server().await;
        let host = {
            let mut inner = self.inner.lock();
            inner.installed = None;
            inner.host.take()
        };
        if let Some(host) = host {
            if let Err(e) = host.teardown().await {
                tracing::warn!(error = %e, "sandbox teardown failed");
            }
        }
    }
}

/// How a boot attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    Ready(ServerReady),
    Failed(BootFailure),
    Cancelled,
}

/// Drives one preview surface through the boot lifecycle.
pub struct BootController {
    slot: Arc<HostSlot>,
    config: BootConfig,
    state: Arc<BootState>,
    cancel: CancellationToken,
    fallback: Option<FallbackHook>,
}

impl BootController {
    pub fn new(slot: Arc<HostSlot>, config: BootConfig, cancel: CancellationToken) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let state = Arc::new(BootState::new(session_id, config.log_capacity, cancel.clone()));
        Self {
            slot,
            config,
            state,
            cancel,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, hook: FallbackHook) -> Self {
        self.fallback = Some(hook);
        self
    }

    pub fn state(&self) -> &Arc<BootState> {
        &self.state
    }

    pub fn slot(&self) -> &Arc<HostSlot> {
        &self.slot
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Boot `files` from `idle`. Errors only when the lifecycle is not idle;
    /// every failure during the boot itself ends in the `error` phase and
    /// is returned as [`BootOutcome::Failed`].
    pub async fn boot(&self, files: &FileMap) -> Result<BootOutcome, BootError> {
        let phase = self.state.phase();
        if phase != BootPhase::Idle {
            return Err(BootError::NotIdle(phase));
        }

        let err = match AssertUnwindSafe(self.run(files)).catch_unwind().await {
            Ok(Ok(ready)) => return Ok(BootOutcome::Ready(ready)),
            Ok(Err(e)) => e,
            Err(panic) => BootError::Panicked(panic_message(panic.as_ref())),
        };

        if matches!(err, BootError::Cancelled) || self.cancel.is_cancelled() {
            self.on_cancelled().await;
            return Ok(BootOutcome::Cancelled);
        }

        let failure = err.to_failure();
        tracing::warn!(
            session_id = %self.state.session_id(),
            kind = ?failure.kind,
            error = %err,
            "boot failed"
        );
        self.state.fail(failure.clone());
        self.slot.stop_server().await;

        if let BootError::Unsupported(reason) = &err {
            TraceEvent::FallbackTriggered {
                session_id: self.state.session_id().to_owned(),
                reason: reason.clone(),
            }
            .emit();
            if let Some(hook) = &self.fallback {
                hook(&failure);
            }
        }
        Ok(BootOutcome::Failed(failure))
    }

    /// Clear phase and logs, then boot again on the same host. A failure
    /// marked not retryable stays in `error`.
    pub async fn retry(&self, files: &FileMap) -> Result<BootOutcome, BootError> {
        if self.cancel.is_cancelled() {
            return Ok(BootOutcome::Cancelled);
        }
        let phase = self.state.phase();
        if phase != BootPhase::Idle && !phase.is_terminal() {
            return Err(BootError::NotIdle(phase));
        }
        if let Some(failure) = self.state.failure().filter(|f| !f.retryable) {
            return Err(BootError::NotRetryable(failure.message));
        }
        self.slot.stop_server().await;
        self.state.reset();
        tracing::info!(session_id = %self.state.session_id(), "retrying boot");
        self.boot(files).await
    }

    /// Write new file content into the running sandbox without rebooting.
    /// The dev server's own reload picks the change up.
    pub async fn remount(&self, files: &FileMap) -> Result<(), BootError> {
        let phase = self.state.phase();
        if !phase.accepts_remount() {
            return Err(BootError::RemountRejected(phase));
        }
        let Some(host) = self.slot.current_host() else {
            return Err(BootError::RemountRejected(phase));
        };
        let tree = to_mount_tree(files)?;
        self.suspend(host.mount(&tree)).await??;

        self.state
            .append(&format!("remounted {} files", tree.leaf_count()));
        if self.slot.needs_install(&manifest_fingerprint(files)) {
            self.state
                .append("package.json changed; retry to reinstall dependencies");
        }
        TraceEvent::Remounted {
            session_id: self.state.session_id().to_owned(),
            files: tree.leaf_count(),
        }
        .emit();
        Ok(())
    }

    /// Cancel the lifecycle and release the host, even mid-phase.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.on_cancelled().await;
    }

    async fn on_cancelled(&self) {
        tracing::info!(
            session_id = %self.state.session_id(),
            phase = %self.state.phase(),
            "boot cancelled"
        );
        TraceEvent::BootCancelled {
            session_id: self.state.session_id().to_owned(),
            phase: self.state.phase().to_string(),
        }
        .emit();
        self.slot.release().await;
    }

    async fn run(&self, files: &FileMap) -> Result<ServerReady, BootError> {
        self.state.transition(BootPhase::Booting)?;
        let host = self.suspend(self.slot.acquire()).await??;

        self.state.transition(BootPhase::Mounting)?;
        let tree = to_mount_tree(files)?;
        self.suspend(host.mount(&tree)).await??;
        self.state
            .append(&format!("mounted {} files", tree.leaf_count()));

        let fingerprint = manifest_fingerprint(files);
        if self.slot.needs_install(&fingerprint) {
            self.state.transition(BootPhase::Installing)?;
            self.install(host.as_ref()).await?;
            self.slot.mark_installed(fingerprint);
        } else {
            self.state
                .append("dependencies unchanged; skipping install");
            TraceEvent::InstallSkipped {
                session_id: self.state.session_id().to_owned(),
                fingerprint,
            }
            .emit();
        }

        self.state.transition(BootPhase::Starting)?;
        let ready = self.start(host.as_ref()).await?;
        self.state.set_ready(&ready)?;
        tracing::info!(
            session_id = %self.state.session_id(),
            url = %ready.url,
            "preview ready"
        );
        Ok(ready)
    }

    async fn install(&self, host: &dyn SandboxHost) -> Result<(), BootError> {
        let mut process = self
            .suspend(host.spawn(&self.config.install_command, self.sink()))
            .await??;
        let waited = self.suspend(process.wait()).await;
        let code = match waited {
            Ok(code) => code?,
            Err(cancelled) => {
                let _ = process.kill().await;
                return Err(cancelled);
            }
        };
        if code != Some(0) {
            return Err(BootError::Install { exit_code: code });
        }
        Ok(())
    }

    async fn start(&self, host: &dyn SandboxHost) -> Result<ServerReady, BootError> {
        let mut process = self
            .suspend(host.spawn(&self.config.start_command, self.sink()))
            .await??;

        let started = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Started::Cancelled,
            ready = host.server_ready() => Started::Ready(ready),
            code = process.wait() => Started::Exited(code),
        };

        match started {
            Started::Ready(Ok(ready)) if !self.cancel.is_cancelled() => {
                self.slot.keep_server(process);
                Ok(ready)
            }
            Started::Ready(Ok(_)) | Started::Cancelled => {
                let _ = process.kill().await;
                Err(BootError::Cancelled)
            }
            Started::Ready(Err(e)) => {
                let _ = process.kill().await;
                Err(e.into())
            }
            Started::Exited(code) => {
                let code = code?;
                let message = match code {
                    Some(c) => format!("dev server exited with code {c} before becoming ready"),
                    None => "dev server was killed before becoming ready".to_owned(),
                };
                Err(BootError::Start {
                    message,
                    context: self.state.log_tail(self.config.error_context_lines),
                })
            }
        }
    }

    /// Await `fut` unless cancellation fires first. A result arriving after
    /// cancellation is discarded.
    async fn suspend<T>(&self, fut: impl Future<Output = T>) -> Result<T, BootError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BootError::Cancelled),
            out = fut => {
                if self.cancel.is_cancelled() {
                    Err(BootError::Cancelled)
                } else {
                    Ok(out)
                }
            }
        }
    }

    fn sink(&self) -> LineSink {
        let state = self.state.clone();
        Arc::new(move |line: &str| {
            state.append(line);
        })
    }
}

enum Started {
    Ready(Result<ServerReady, HostError>),
    Exited(Result<Option<i32>, HostError>),
    Cancelled,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_tracks_manifest_only() {
        let mut files = FileMap::new();
        files.insert("package.json".into(), r#"{"dependencies":{"next":"14"}}"#.into());
        files.insert("app/page.tsx".into(), "a".into());
        let first = manifest_fingerprint(&files);

        files.insert("app/page.tsx".into(), "b".into());
        assert_eq!(manifest_fingerprint(&files), first);

        files.insert("package.json".into(), r#"{"dependencies":{"next":"15"}}"#.into());
        assert_ne!(manifest_fingerprint(&files), first);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn missing_manifest_hashes_empty() {
        assert_eq!(
            manifest_fingerprint(&FileMap::new()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
