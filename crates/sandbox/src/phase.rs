use serde::Serialize;

/// Boot lifecycle phase. Transitions are checked by [`BootPhase::can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BootPhase {
    Idle,
    Booting,
    Mounting,
    Installing,
    Starting,
    Ready,
    Error,
}

impl BootPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Booting => "booting",
            Self::Mounting => "mounting",
            Self::Installing => "installing",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// `ready` and `error` end a boot attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Phases in which new file content may be remounted in place.
    pub fn accepts_remount(self) -> bool {
        matches!(self, Self::Starting | Self::Ready)
    }

    /// Forward edges of the state machine. `installing` may be skipped;
    /// `error` is reachable from every non-terminal phase except `idle`.
    /// Returning to `idle` goes through [`crate::BootState::reset`].
    pub fn can_transition(self, next: Self) -> bool {
        use BootPhase::*;
        match (self, next) {
            (Idle, Booting)
            | (Booting, Mounting)
            | (Mounting, Installing)
            | (Mounting, Starting)
            | (Installing, Starting)
            | (Starting, Ready) => true,
            (from, Error) => !from.is_terminal() && from != Idle,
            _ => false,
        }
    }
}

impl std::fmt::Display for BootPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
