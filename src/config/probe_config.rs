use std::path::PathBuf;

use serde::Deserialize;

use crate::icmp_probe::classifier::KeywordClassifier;

/// The monitor configuration as read from `config.yml`.
/// Every key is optional; the defaults probe the original pair of hosts every 15 seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Location of the SQLite file the results are appended to.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// The wait between two dispatches, in seconds.
    /// With N targets a single host is probed every N * interval seconds.
    #[serde(default = "default_pacing_interval")]
    pub pacing_interval_seconds: u64,

    /// Hosts to probe, round-robin, in this order.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    #[serde(default)]
    pub probe: ProbeConfig,

    /// Output markers used to classify a probe.
    #[serde(default)]
    pub classifier: KeywordClassifier,
}

/// Settings for the `ping` invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound on a single `ping` run before it is killed and recorded as a timeout.
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u64,

    /// The binary to run.
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: default_deadline(),
            program: default_program(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            pacing_interval_seconds: default_pacing_interval(),
            targets: default_targets(),
            probe: ProbeConfig::default(),
            classifier: KeywordClassifier::default(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("./sqlite.db")
}

fn default_pacing_interval() -> u64 {
    15
}

fn default_targets() -> Vec<String> {
    vec!["10.13.37.1".to_string(), "8.8.8.8".to_string()]
}

fn default_deadline() -> u64 {
    10
}

fn default_program() -> String {
    "ping".to_string()
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").expect("Invalid YAML");
        assert_eq!(config.database, PathBuf::from("./sqlite.db"));
        assert_eq!(config.pacing_interval_seconds, 15);
        assert_eq!(config.targets, vec!["10.13.37.1", "8.8.8.8"]);
        assert_eq!(config.probe.deadline_seconds, 10);
        assert_eq!(config.probe.program, "ping");
        assert_eq!(config.classifier, KeywordClassifier::default());
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
                    database: /var/lib/pingbox/pings.db
                    pacing_interval_seconds: 5
                    targets:
                        - 1.1.1.1
                        - gateway.local
                        - 8.8.4.4
                    probe:
                        deadline_seconds: 3
                    classifier:
                        unreachable_markers: ["Zielhost nicht erreichbar"]
                                    "#;

        let config: Config = serde_yaml::from_str(yaml).expect("Invalid YAML");
        assert_eq!(config.database, PathBuf::from("/var/lib/pingbox/pings.db"));
        assert_eq!(config.pacing_interval_seconds, 5);
        assert_eq!(config.targets, vec!["1.1.1.1", "gateway.local", "8.8.4.4"]);
        assert_eq!(config.probe.deadline_seconds, 3);
        assert_eq!(config.probe.program, "ping");
        assert_eq!(
            config.classifier.unreachable_markers,
            vec!["Zielhost nicht erreichbar"]
        );
        // unspecified marker lists keep their defaults
        assert_eq!(
            config.classifier.timeout_markers,
            KeywordClassifier::default().timeout_markers
        );
    }
}
