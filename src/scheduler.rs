use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};

use crate::icmp_probe::prelude::*;
use crate::store::{ResultStore, StoreError};
use crate::{report, to_fixed_width};

#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store task failed")]
    Join(#[from] JoinError),
}

/// What a unit left behind in the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recorded {
    pub id: i64,
    pub outcome: Outcome,
}

/// Probes one target and appends the classified result to the store.
///
/// Cheap to clone; every dispatched unit gets its own copy and opens its own
/// connection.
#[derive(Clone)]
pub struct Recorder {
    database: Arc<PathBuf>,
    prober: Arc<dyn Prober>,
    classifier: Arc<dyn OutcomeClassifier>,
    target_width: usize,
}

impl Recorder {
    pub fn new(
        database: impl Into<PathBuf>,
        prober: Arc<dyn Prober>,
        classifier: Arc<dyn OutcomeClassifier>,
    ) -> Self {
        Self {
            database: Arc::new(database.into()),
            prober,
            classifier,
            target_width: 10,
        }
    }

    /// Width the target is padded to in log lines.
    pub fn with_target_width(mut self, target_width: usize) -> Self {
        self.target_width = target_width;
        self
    }

    /// Open, probe, classify, append, close.
    ///
    /// The connection is released on every path, including when this future is
    /// dropped halfway. A store that cannot be opened means the target is not
    /// probed at all this round.
    pub async fn probe_and_record(&self, target: &str) -> Result<Recorded, UnitError> {
        let database = self.database.clone();
        let store = tokio::task::spawn_blocking(move || ResultStore::open(database.as_path()))
            .await??;

        let raw = self.prober.execute(target).await;
        let outcome = self.classifier.classify(&raw);
        let result = ProbeResult::new(target, outcome);

        let id = tokio::task::spawn_blocking(move || {
            let appended = store.append(&result);
            if let Err(e) = store.close() {
                log::warn!("{}", report(&e));
            }
            appended
        })
        .await??;

        Ok(Recorded { id, outcome })
    }

    async fn dispatch(self, target: String) {
        let prefix = to_fixed_width(&target, self.target_width);
        log::debug!("[{prefix}] Probing");

        match self.probe_and_record(&target).await {
            Ok(Recorded {
                id,
                outcome: Outcome::Reply { latency_ms },
            }) => log::info!("[{prefix}] ✅ latency {latency_ms:.2}ms (id {id})"),
            Ok(Recorded {
                id,
                outcome: Outcome::Timeout,
            }) => log::info!("[{prefix}] ❌ timeout (id {id})"),
            Ok(Recorded {
                id,
                outcome: Outcome::Unreachable,
            }) => log::info!("[{prefix}] ❌ no route to host (id {id})"),
            Err(e) => log::error!("[{prefix}] Probe result lost: {}", report(&e)),
        }
    }
}

/// Round-robin dispatcher.
///
/// Every tick of the pacing interval starts one unit for the next target and
/// moves on; the ticker never waits for a unit to finish. Units run
/// concurrently with each other and their failures stay inside the unit.
pub struct Scheduler {
    targets: Arc<[String]>,
    pacing_interval: Duration,
    recorder: Recorder,
}

impl Scheduler {
    pub fn new(
        targets: impl Into<Arc<[String]>>,
        pacing_interval: Duration,
        recorder: Recorder,
    ) -> Self {
        Self {
            targets: targets.into(),
            pacing_interval,
            recorder,
        }
    }

    /// Dispatches until `shutdown` resolves, then waits for the units still in flight.
    /// Returns the number of units dispatched.
    pub async fn run_until<F>(self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.pacing_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut units = JoinSet::new();
        let mut targets = self.targets.iter().cycle();
        let mut dispatched = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let Some(target) = targets.next() else {
                log::warn!("No targets to probe");
                shutdown.as_mut().await;
                break;
            };

            units.spawn(self.recorder.clone().dispatch(target.clone()));
            dispatched += 1;

            while let Some(finished) = units.try_join_next() {
                log_unit_panic(finished);
            }
        }

        if !units.is_empty() {
            log::info!("Waiting for {} probes in flight", units.len());
        }
        while let Some(finished) = units.join_next().await {
            log_unit_panic(finished);
        }

        dispatched
    }
}

fn log_unit_panic(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        log::error!("Probe unit failed: {e}");
    }
}
