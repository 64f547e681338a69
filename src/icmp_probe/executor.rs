use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::prelude::*;

/// Issues one echo probe against a target.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Runs exactly one probe attempt and reports what it produced.
    /// Never retries; a probe that could not be run yields `RawOutcome::default()`.
    async fn execute(&self, target: &str) -> RawOutcome;
}

/// Probes by running the system `ping` binary with a single echo request.
#[derive(Debug, Clone)]
pub struct PingCommand {
    program: String,
    deadline: Duration,
    latency_markers: Vec<String>,
}

impl PingCommand {
    pub fn new(deadline: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            deadline,
            latency_markers: KeywordClassifier::default().latency_markers,
        }
    }

    /// Use another binary than `ping`, e.g. an absolute path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Markers that tell a reply line apart from a diagnostic printed on stdout.
    pub fn with_latency_markers(mut self, latency_markers: Vec<String>) -> Self {
        self.latency_markers = latency_markers;
        self
    }

    fn count_flag() -> &'static str {
        if cfg!(windows) { "-n" } else { "-c" }
    }
}

#[async_trait::async_trait]
impl Prober for PingCommand {
    async fn execute(&self, target: &str) -> RawOutcome {
        let mut command = Command::new(&self.program);
        command
            .arg(Self::count_flag())
            .arg("1")
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.deadline, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                log::warn!("Could not run {} for {target}: {e}", self.program);
                return RawOutcome::default();
            }
            Err(_) => {
                log::warn!(
                    "{} for {target} did not finish within {:?}",
                    self.program,
                    self.deadline
                );
                return RawOutcome::default();
            }
        };

        let (Ok(stdout), Ok(stderr)) = (
            std::str::from_utf8(&output.stdout),
            std::str::from_utf8(&output.stderr),
        ) else {
            log::warn!("{} for {target} produced non UTF-8 output", self.program);
            return RawOutcome::default();
        };

        parse_ping_output(stdout, stderr, &self.latency_markers)
    }
}

/// Picks the reply and diagnostic lines out of the output of `ping -c 1`.
///
/// The reply line is the first non-empty line after the banner. The
/// diagnostic is the first non-empty stderr line; some platforms report
/// timeouts and unreachable hosts on stdout, so without stderr output a reply
/// line carrying none of `latency_markers` doubles as the diagnostic.
pub fn parse_ping_output(stdout: &str, stderr: &str, latency_markers: &[String]) -> RawOutcome {
    let reply = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .nth(1)
        .map(str::to_string);

    let diagnostic = stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .or_else(|| {
            reply
                .as_deref()
                .filter(|line| !latency_markers.iter().any(|m| line.contains(m.as_str())))
                .map(str::to_string)
        })
        .unwrap_or_default();

    RawOutcome { reply, diagnostic }
}
