//! Output encoding and persistence for wing statistics.
//!
//! The stats file is a protobuf `WingStatsFile`, optionally gzip-compressed.
//! A CSV summary and a JSON log dump are available for humans.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use prost::Message;
use serde::Serialize;
use tracing::{Level, debug, info};

use crate::aggregate::WingStatsTable;
use crate::pb;
use crate::stats::WingStats;

pub const SCHEMA_VERSION: u32 = 1;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

impl From<&WingStats> for pb::WingStats {
    fn from(s: &WingStats) -> Self {
        pb::WingStats {
            mean: s.mean,
            dev_hist: s.dev_hist,
            confidence: s.confidence,
            nb_flights: s.nb_flights,
            nb_samples: s.nb_samples,
            weight: s.weight,
        }
    }
}

impl From<pb::WingStats> for WingStats {
    fn from(s: pb::WingStats) -> Self {
        WingStats {
            mean: s.mean,
            dev_hist: s.dev_hist,
            confidence: s.confidence,
            nb_flights: s.nb_flights,
            nb_samples: s.nb_samples,
            weight: s.weight,
        }
    }
}

/// Encodes a table as a protobuf `WingStatsFile`.
///
/// Wings are encoded in ascending id order, so equal tables give equal bytes.
pub fn encode_table(table: &WingStatsTable) -> Vec<u8> {
    let file = pb::WingStatsFile {
        schema_version: SCHEMA_VERSION,
        wings: table.iter().map(|(&id, s)| (id, s.into())).collect(),
    };
    file.encode_to_vec()
}

/// Decodes a protobuf `WingStatsFile`.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid `WingStatsFile` or carry an
/// unsupported schema version.
pub fn decode_table(bytes: &[u8]) -> Result<WingStatsTable> {
    let file = pb::WingStatsFile::decode(bytes).context("invalid wing stats encoding")?;
    if file.schema_version != SCHEMA_VERSION {
        bail!(
            "unsupported wing stats schema version {} (expected {})",
            file.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(file.wings.into_iter().map(|(id, s)| (id, s.into())).collect())
}

/// Writes the stats file at `path`, replacing any existing file.
pub fn write_stats_file(path: &Path, table: &WingStatsTable, gzip: bool) -> Result<()> {
    let encoded = encode_table(table);
    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        encoder.finish()?
    } else {
        encoded
    };

    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(&body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()?;

    info!(
        path = %path.display(),
        wings = table.len(),
        bytes = body.len(),
        gzip,
        "Wing stats written"
    );
    Ok(())
}

/// Reads a stats file written by [`write_stats_file`], compressed or not.
pub fn read_stats_file(path: &Path) -> Result<WingStatsTable> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let bytes = if raw.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .with_context(|| format!("failed to decompress {}", path.display()))?;
        decoded
    } else {
        raw
    };

    decode_table(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

#[derive(Serialize)]
struct SummaryRow {
    wing: i64,
    mean: f64,
    dev_hist: f64,
    confidence: f64,
    nb_flights: u64,
    nb_samples: u64,
    weight: f64,
}

/// Writes one CSV row per wing, with headers, replacing any existing file.
pub fn write_summary_csv(path: &Path, table: &WingStatsTable) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing CSV summary");

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for (&wing, stats) in table {
        writer.serialize(SummaryRow {
            wing,
            mean: stats.mean,
            dev_hist: stats.dev_hist,
            confidence: stats.confidence,
            nb_flights: stats.nb_flights,
            nb_samples: stats.nb_samples,
            weight: stats.weight,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Logs the table as pretty-printed JSON. Serializes only when debug logging is on.
pub fn print_json(table: &WingStatsTable) -> Result<()> {
    if tracing::enabled!(Level::DEBUG) {
        debug!("{}", serde_json::to_string_pretty(table)?);
    }
    Ok(())
}
