/// The unclassified outcome of a single echo probe.
///
/// Carries the text the probing mechanism produced, nothing interpreted yet.
/// `RawOutcome::default()` (no reply line, empty diagnostic) is what a probe
/// that could not be run at all looks like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutcome {
    /// The line that would carry the round trip time, e.g.
    /// `64 bytes from 8.8.8.8: icmp_seq=0 ttl=117 time=23.4 ms`.
    pub reply: Option<String>,

    /// The diagnostic line reported by the mechanism, if any.
    pub diagnostic: String,
}

impl RawOutcome {
    pub fn reply(line: impl Into<String>) -> Self {
        Self {
            reply: Some(line.into()),
            diagnostic: String::new(),
        }
    }

    pub fn diagnostic(line: impl Into<String>) -> Self {
        Self {
            reply: None,
            diagnostic: line.into(),
        }
    }
}

/// What a probe amounted to. Exactly one of these holds per observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Reply { latency_ms: f64 },
    Timeout,
    Unreachable,
}

/// A classified observation, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub target: String,
    pub outcome: Outcome,
}

impl ProbeResult {
    pub fn new(target: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            target: target.into(),
            outcome,
        }
    }

    /// Latency in milliseconds, `0` unless the target replied.
    pub fn latency(&self) -> f64 {
        match self.outcome {
            Outcome::Reply { latency_ms } => latency_ms,
            Outcome::Timeout | Outcome::Unreachable => 0.0,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.outcome, Outcome::Timeout)
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self.outcome, Outcome::Unreachable)
    }
}
