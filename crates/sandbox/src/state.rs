//! Lifecycle state shared between the controller and the presentation layer.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use pv_domain::trace::TraceEvent;

use crate::format;
use crate::{BootError, BootFailure, BootPhase, ServerReady, TerminalLog};

/// Point-in-time view for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BootSnapshot {
    pub session_id: String,
    pub phase: BootPhase,
    pub lines: Vec<String>,
    pub url: Option<String>,
    pub failure: Option<BootFailure>,
    /// Phases entered since the last reset, in order.
    pub history: Vec<BootPhase>,
    pub started_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
}

struct Inner {
    phase: BootPhase,
    log: TerminalLog,
    url: Option<String>,
    failure: Option<BootFailure>,
    history: Vec<BootPhase>,
    started_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
}

/// Phase, log and result of one preview surface.
///
/// Every mutation checks the cancellation token under the lock, so once
/// the token fires no transition or append lands, whichever task calls.
pub struct BootState {
    session_id: String,
    cancel: CancellationToken,
    inner: Mutex<Inner>,
    phase_tx: watch::Sender<BootPhase>,
    line_tx: broadcast::Sender<String>,
}

/// Buffered lines per line subscriber before it starts lagging.
const LINE_CHANNEL_CAPACITY: usize = 1024;

impl BootState {
    pub fn new(session_id: impl Into<String>, log_capacity: usize, cancel: CancellationToken) -> Self {
        let (phase_tx, _) = watch::channel(BootPhase::Idle);
        let (line_tx, _) = broadcast::channel(LINE_CHANNEL_CAPACITY);
        Self {
            session_id: session_id.into(),
            cancel,
            inner: Mutex::new(Inner {
                phase: BootPhase::Idle,
                log: TerminalLog::new(log_capacity),
                url: None,
                failure: None,
                history: Vec::new(),
                started_at: None,
                ready_at: None,
            }),
            phase_tx,
            line_tx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn phase(&self) -> BootPhase {
        self.inner.lock().phase
    }

    /// Phase updates for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<BootPhase> {
        self.phase_tx.subscribe()
    }

    /// Every line appended to the terminal log from now on.
    pub fn subscribe_lines(&self) -> broadcast::Receiver<String> {
        self.line_tx.subscribe()
    }

    fn push_line(&self, inner: &mut Inner, line: String) {
        inner.log.push(line.clone());
        let _ = self.line_tx.send(line);
    }

    pub fn transition(&self, next: BootPhase) -> Result<(), BootError> {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() {
            return Err(BootError::Cancelled);
        }
        let from = inner.phase;
        if !from.can_transition(next) {
            return Err(BootError::InvalidTransition { from, to: next });
        }
        self.enter(&mut inner, next);
        Ok(())
    }

    /// Move to `ready` and record the preview URL.
    pub fn set_ready(&self, ready: &ServerReady) -> Result<(), BootError> {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() {
            return Err(BootError::Cancelled);
        }
        let from = inner.phase;
        if !from.can_transition(BootPhase::Ready) {
            return Err(BootError::InvalidTransition {
                from,
                to: BootPhase::Ready,
            });
        }
        inner.url = Some(ready.url.clone());
        inner.ready_at = Some(Utc::now());
        self.push_line(&mut inner, format!("preview ready at {}", ready.url));
        self.enter(&mut inner, BootPhase::Ready);
        Ok(())
    }

    /// Move to `error` with `failure`. Returns false when cancelled or when
    /// the current phase cannot fail.
    pub fn fail(&self, failure: BootFailure) -> bool {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() || !inner.phase.can_transition(BootPhase::Error) {
            return false;
        }
        self.push_line(&mut inner, format!("error: {}", failure.message));
        inner.failure = Some(failure);
        self.enter(&mut inner, BootPhase::Error);
        true
    }

    /// Append one output line. Returns false once cancelled.
    pub fn append(&self, line: &str) -> bool {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() {
            return false;
        }
        self.push_line(&mut inner, line.to_owned());
        true
    }

    /// Back to `idle` with logs, URL, failure and history cleared.
    pub fn reset(&self) -> bool {
        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() {
            return false;
        }
        inner.phase = BootPhase::Idle;
        inner.log.clear();
        inner.url = None;
        inner.failure = None;
        inner.history.clear();
        inner.started_at = None;
        inner.ready_at = None;
        self.phase_tx.send_replace(BootPhase::Idle);
        true
    }

    pub fn url(&self) -> Option<String> {
        self.inner.lock().url.clone()
    }

    pub fn failure(&self) -> Option<BootFailure> {
        self.inner.lock().failure.clone()
    }

    pub fn history(&self) -> Vec<BootPhase> {
        self.inner.lock().history.clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().log.to_vec()
    }

    /// The last `n` log lines with escapes stripped, joined by newlines.
    pub fn log_tail(&self, n: usize) -> String {
        let tail = self.inner.lock().log.tail(n);
        tail.lines()
            .map(format::strip_ansi)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn snapshot(&self) -> BootSnapshot {
        let inner = self.inner.lock();
        BootSnapshot {
            session_id: self.session_id.clone(),
            phase: inner.phase,
            lines: inner.log.to_vec(),
            url: inner.url.clone(),
            failure: inner.failure.clone(),
            history: inner.history.clone(),
            started_at: inner.started_at,
            ready_at: inner.ready_at,
        }
    }

    fn enter(&self, inner: &mut Inner, next: BootPhase) {
        let from = inner.phase;
        inner.phase = next;
        inner.history.push(next);
        if next == BootPhase::Booting {
            inner.started_at = Some(Utc::now());
        }
        if !next.is_terminal() {
            self.push_line(inner, format::phase_banner(next));
        }
        self.phase_tx.send_replace(next);

        tracing::debug!(session_id = %self.session_id, %from, to = %next, "boot phase changed");
        TraceEvent::PhaseChanged {
            session_id: self.session_id.clone(),
            from: from.to_string(),
            to: next.to_string(),
        }
        .emit();
    }
}
