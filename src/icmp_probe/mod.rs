pub mod classifier;
pub mod executor;
pub mod result;

pub mod prelude {
    pub use super::classifier::{KeywordClassifier, OutcomeClassifier};
    pub use super::executor::{PingCommand, Prober};
    pub use super::result::{Outcome, ProbeResult, RawOutcome};
}
