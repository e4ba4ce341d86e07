use serde::Serialize;

use crate::BootPhase;

/// Failures reported by a sandbox host implementation.
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// The platform lacks the isolation primitive or runtime the sandbox needs.
    #[error("sandbox unsupported: {0}")]
    Unsupported(String),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mount failed: {0}")]
    Mount(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a boot attempt ended in `error`.
#[derive(thiserror::Error, Debug)]
pub enum BootError {
    #[error("sandbox unsupported: {0}")]
    Unsupported(String),

    #[error("install failed with exit code {}", exit_label(.exit_code))]
    Install { exit_code: Option<i32> },

    #[error("dev server failed: {message}")]
    Start { message: String, context: String },

    #[error(transparent)]
    Mount(#[from] pv_mount::MountError),

    #[error(transparent)]
    Host(HostError),

    #[error("boot panicked: {0}")]
    Panicked(String),

    #[error("boot cancelled")]
    Cancelled,

    #[error("invalid phase transition `{from}` → `{to}`")]
    InvalidTransition { from: BootPhase, to: BootPhase },

    #[error("cannot boot from phase `{0}`")]
    NotIdle(BootPhase),

    #[error("cannot remount in phase `{0}`")]
    RemountRejected(BootPhase),

    /// The last failure cannot be fixed on this surface.
    #[error("boot failure is not retryable: {0}")]
    NotRetryable(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "unknown (killed by signal)".to_owned(),
    }
}

impl From<HostError> for BootError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unsupported(reason) => Self::Unsupported(reason),
            other => Self::Host(other),
        }
    }
}

/// Failure categories surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unsupported,
    Install,
    Start,
    Generic,
}

/// What the presentation layer shows in the `error` phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Recent log lines, for start failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Whether the surface should offer a retry.
    pub retryable: bool,
}

impl BootError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unsupported(_) => FailureKind::Unsupported,
            Self::Install { .. } => FailureKind::Install,
            Self::Start { .. } => FailureKind::Start,
            _ => FailureKind::Generic,
        }
    }

    /// An unsupported host cannot be fixed by retrying in place.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    pub fn to_failure(&self) -> BootFailure {
        BootFailure {
            kind: self.kind(),
            message: self.to_string(),
            context: match self {
                Self::Start { context, .. } if !context.is_empty() => Some(context.clone()),
                _ => None,
            },
            retryable: self.is_retryable(),
        }
    }
}
