use serde::Serialize;

/// Structured trace events emitted across the `pv-*` crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ScanCompleted {
        files: usize,
        score: u32,
        recommended: String,
        native_dependencies: usize,
        orm_detected: bool,
    },
    PatchApplied {
        applied: Vec<String>,
        notes: usize,
        files_before: usize,
        files_after: usize,
    },
    PhaseChanged {
        session_id: String,
        from: String,
        to: String,
    },
    InstallSkipped {
        session_id: String,
        fingerprint: String,
    },
    Remounted {
        session_id: String,
        files: usize,
    },
    BootCancelled {
        session_id: String,
        phase: String,
    },
    FallbackTriggered {
        session_id: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pv_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let ev = TraceEvent::InstallSkipped {
            session_id: "s1".into(),
            fingerprint: "abc".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "InstallSkipped");
        assert_eq!(json["fingerprint"], "abc");
    }
}
