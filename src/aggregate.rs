//! Per-wing aggregation of glide-angle statistics.
//!
//! Flights are first grouped by wing id, then each group is reduced into a
//! [`WingMoments`] and finalized into [`WingStats`].

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::StatsError;
use crate::flight::{FlightRecord, Flights};
use crate::progress::Progress;
use crate::stats::{WingMoments, WingStats};

/// Output table: wing id to its statistics.
pub type WingStatsTable = BTreeMap<i64, WingStats>;

/// What to do with a wing whose statistics are undefined
/// (zero total weight, negative variance or non-finite values).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DegeneratePolicy {
    /// Abort the whole aggregation with the [`StatsError`].
    #[default]
    Fail,
    /// Keep the wing with NaN spread; the mean survives unless the weight is zero.
    Nan,
    /// Leave the wing out of the table.
    Skip,
}

impl FromStr for DegeneratePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(DegeneratePolicy::Fail),
            "nan" => Ok(DegeneratePolicy::Nan),
            "skip" => Ok(DegeneratePolicy::Skip),
            other => Err(format!("unknown policy '{other}' (expected fail, nan or skip)")),
        }
    }
}

/// Flights of each wing, in input order.
#[derive(Debug, Default)]
pub struct WingGroups<'a> {
    pub groups: BTreeMap<i64, Vec<(&'a str, &'a FlightRecord)>>,
    /// Number of valid flights across all groups.
    pub total: usize,
}

/// Groups the valid flights by wing id. Null and incomplete entries are ignored.
pub fn group_by_wing(flights: &Flights) -> WingGroups<'_> {
    let mut out = WingGroups::default();

    for (id, flight) in flights.iter() {
        let Some(flight) = flight else {
            continue;
        };
        out.groups.entry(flight.wing).or_default().push((id, flight));
        out.total += 1;
    }

    out
}

/// Computes [`WingStats`] for every wing present among the valid flights.
///
/// # Errors
///
/// With [`DegeneratePolicy::Fail`], returns the first [`StatsError`] hit;
/// the other policies never fail.
pub fn aggregate_wings(
    flights: &Flights,
    policy: DegeneratePolicy,
    progress: &mut dyn Progress,
) -> Result<WingStatsTable, StatsError> {
    let grouped = group_by_wing(flights);
    info!(
        flights = grouped.total,
        wings = grouped.groups.len(),
        "Calculating average and standard deviation"
    );

    let mut table = WingStatsTable::new();
    let mut done = 0usize;

    for (&wing, group) in &grouped.groups {
        let mut moments = WingMoments::new();
        for (_, flight) in group {
            moments.push(&flight.glide_angles, flight.sampling);
            progress.on_flight(done, grouped.total);
            done += 1;
        }

        match moments.finish(wing) {
            Ok(stats) => {
                table.insert(wing, stats);
            }
            Err(e) => match policy {
                DegeneratePolicy::Fail => return Err(e),
                DegeneratePolicy::Nan => {
                    warn!(wing, error = %e, "Degenerate wing, storing NaN statistics");
                    table.insert(wing, moments.nan_stats());
                }
                DegeneratePolicy::Skip => {
                    warn!(wing, error = %e, "Degenerate wing, skipping");
                }
            },
        }
    }

    Ok(table)
}
