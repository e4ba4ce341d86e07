//! Sandbox host backed by local processes in a working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use pv_mount::MountTree;

use crate::format;
use crate::host::{HostProvider, LineSink, SandboxHost, SandboxProcess, ServerReady};
use crate::HostError;

/// Installed dependencies are kept across remounts.
const PRESERVED_DIRS: &[&str] = &["node_modules"];

#[allow(clippy::expect_used)]
static READY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::\]|\[::1\]):(\d{2,5})")
        .expect("valid ready-url regex")
});

/// Extract the ready signal from one line of dev-server output.
pub fn detect_ready(line: &str) -> Option<ServerReady> {
    let plain = format::strip_ansi(line);
    let caps = READY_URL_RE.captures(&plain)?;
    let port: u16 = caps.get(1)?.as_str().parse().ok()?;
    Some(ServerReady {
        port,
        url: format!("http://localhost:{port}"),
    })
}

/// True when `binary` resolves to a file in one of the `PATH` entries.
fn on_path(binary: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file())
    })
}

pub struct LocalHostProvider {
    workdir: PathBuf,
    required_runtime: String,
}

impl LocalHostProvider {
    pub fn new(workdir: impl Into<PathBuf>, required_runtime: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            required_runtime: required_runtime.into(),
        }
    }
}

#[async_trait]
impl HostProvider for LocalHostProvider {
    async fn acquire(&self) -> Result<Arc<dyn SandboxHost>, HostError> {
        if !self.required_runtime.is_empty() && !on_path(&self.required_runtime) {
            return Err(HostError::Unsupported(format!(
                "`{}` not found on PATH",
                self.required_runtime
            )));
        }
        tokio::fs::create_dir_all(&self.workdir).await?;
        tracing::info!(workdir = %self.workdir.display(), "local sandbox host acquired");
        Ok(Arc::new(LocalHost::new(self.workdir.clone())))
    }
}

type ReadySender = Arc<watch::Sender<Option<ServerReady>>>;

fn ready_channel() -> ReadySender {
    let (tx, _) = watch::channel(None);
    Arc::new(tx)
}

pub struct LocalHost {
    root: PathBuf,
    /// Ready channel of the most recent spawn. Each process publishes only
    /// to its own channel, so output from an older process is never taken
    /// as the newer one's ready signal.
    ready: Mutex<ReadySender>,
}

impl LocalHost {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ready: Mutex::new(ready_channel()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Remove everything under `root` except the preserved directories.
fn clear_root(root: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        if PRESERVED_DIRS.iter().any(|keep| name == *keep) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[async_trait]
impl SandboxHost for LocalHost {
    async fn mount(&self, tree: &MountTree) -> Result<(), HostError> {
        let root = self.root.clone();
        let tree = tree.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            clear_root(&root)?;
            tree.materialize(&root)
        })
        .await
        .map_err(|e| HostError::Other(format!("mount task failed: {e}")))?
        .map_err(|e| HostError::Mount(e.to_string()))?;
        tracing::debug!(root = %self.root.display(), "tree mounted");
        Ok(())
    }

    async fn spawn(
        &self,
        command: &str,
        on_line: LineSink,
    ) -> Result<Box<dyn SandboxProcess>, HostError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd.current_dir(&self.root);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| HostError::Spawn {
            command: command.to_owned(),
            source,
        })?;
        tracing::debug!(command, pid = ?child.id(), "sandbox process spawned");

        let ready = ready_channel();
        *self.ready.lock() = ready.clone();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(pump(stdout, on_line.clone(), ready.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(pump(stderr, on_line, ready));
        }
        Ok(Box::new(LocalProcess { child, readers }))
    }

    async fn server_ready(&self) -> Result<ServerReady, HostError> {
        let mut rx = self.ready.lock().subscribe();
        let ready = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| HostError::Other("ready channel closed".into()))?
            .clone();
        ready.ok_or_else(|| HostError::Other("ready signal missing".into()))
    }

    async fn teardown(&self) -> Result<(), HostError> {
        *self.ready.lock() = ready_channel();
        tracing::info!(root = %self.root.display(), "local sandbox host released");
        Ok(())
    }
}

/// Forward each output line to `sink`, publishing the first ready URL.
fn pump<R>(stream: R, sink: LineSink, ready: ReadySender) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if ready.borrow().is_none() {
                if let Some(signal) = detect_ready(&line) {
                    ready.send_replace(Some(signal));
                }
            }
            sink(line.as_str());
        }
    })
}

struct LocalProcess {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

#[async_trait]
impl SandboxProcess for LocalProcess {
    async fn wait(&mut self) -> Result<Option<i32>, HostError> {
        let status = self.child.wait().await?;
        for reader in self.readers.drain(..) {
            let _ = reader.await;
        }
        Ok(status.code())
    }

    async fn kill(&mut self) -> Result<(), HostError> {
        self.child.kill().await?;
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        Ok(())
    }
}
