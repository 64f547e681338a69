use serde::Deserialize;

use super::prelude::*;

/// Turns the raw text of a probe into an [`Outcome`].
///
/// Implementations must be pure: same input, same outcome, no I/O.
pub trait OutcomeClassifier: Send + Sync {
    fn classify(&self, raw: &RawOutcome) -> Outcome;
}

/// Substring based classifier for the output of the system `ping` binary.
///
/// Rules are applied in order, first match wins:
/// 1. a timeout marker in the diagnostic
/// 2. an unreachable marker in the diagnostic
/// 3. a latency marker followed by a number in the reply line
/// 4. anything else is recorded as a timeout
///
/// Markers in the diagnostic match regardless of case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordClassifier {
    #[serde(default = "default_timeout_markers")]
    pub timeout_markers: Vec<String>,

    #[serde(default = "default_unreachable_markers")]
    pub unreachable_markers: Vec<String>,

    #[serde(default = "default_latency_markers")]
    pub latency_markers: Vec<String>,
}

fn default_timeout_markers() -> Vec<String> {
    vec!["Request timeout".to_string(), "timed out".to_string()]
}

fn default_unreachable_markers() -> Vec<String> {
    vec![
        "No route to host".to_string(),
        "Destination Host Unreachable".to_string(),
        "Destination Net Unreachable".to_string(),
        "Network is unreachable".to_string(),
    ]
}

fn default_latency_markers() -> Vec<String> {
    vec!["time=".to_string(), "time<".to_string()]
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            timeout_markers: default_timeout_markers(),
            unreachable_markers: default_unreachable_markers(),
            latency_markers: default_latency_markers(),
        }
    }
}

impl KeywordClassifier {
    /// Parses the number following the first latency marker in `line`,
    /// dropping the unit. `time=23.4 ms` and `time=23ms` both give a value.
    pub fn parse_latency(&self, line: &str) -> Option<f64> {
        self.latency_markers.iter().find_map(|marker| {
            let (_, rest) = line.split_once(marker.as_str())?;
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            rest[..end].parse::<f64>().ok().filter(|v| v.is_finite())
        })
    }
}

/// Case-insensitive; Windows spells "Destination host unreachable." in lower case.
fn contains_any(text: &str, markers: &[String]) -> bool {
    let text = text.to_lowercase();
    markers
        .iter()
        .any(|m| text.contains(m.to_lowercase().as_str()))
}

impl OutcomeClassifier for KeywordClassifier {
    fn classify(&self, raw: &RawOutcome) -> Outcome {
        if contains_any(&raw.diagnostic, &self.timeout_markers) {
            return Outcome::Timeout;
        }
        if contains_any(&raw.diagnostic, &self.unreachable_markers) {
            return Outcome::Unreachable;
        }

        // A parsed `0` is still a reply, only unparsable output falls through.
        match raw.reply.as_deref().and_then(|line| self.parse_latency(line)) {
            Some(latency_ms) => Outcome::Reply { latency_ms },
            None => Outcome::Timeout,
        }
    }
}
