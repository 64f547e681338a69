use chrono::NaiveDateTime;
use rusqlite::Row;

use crate::icmp_probe::result::Outcome;

/// A stored observation as it reads back from the `ping` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PingRecord {
    pub id: i64,
    /// Insertion time in UTC, assigned by the store.
    pub timestamp: NaiveDateTime,
    pub target: String,
    pub latency: f64,
    pub timeout: bool,
    pub unreachable: bool,
}

impl PingRecord {
    pub(super) const COLUMNS: &'static str = "id, date, latency, dest_ip, timeout, had_no_route";

    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            latency: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
            target: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            timeout: row.get::<_, Option<bool>>(4)?.unwrap_or_default(),
            unreachable: row.get::<_, Option<bool>>(5)?.unwrap_or_default(),
        })
    }

    /// Folds the stored columns back into a single outcome.
    pub fn outcome(&self) -> Outcome {
        if self.timeout {
            Outcome::Timeout
        } else if self.unreachable {
            Outcome::Unreachable
        } else {
            Outcome::Reply {
                latency_ms: self.latency,
            }
        }
    }
}
