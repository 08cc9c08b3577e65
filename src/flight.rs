//! Input model: the `flights_analysed.json` document.
//!
//! The document is a JSON object keyed by flight id. Each value is either
//! `null` or a record carrying at least `wing`, `glide_angles` and `sampling`.
//! Records without all three are kept in [`Flights`] as `None` so that the
//! grouping step can filter them out.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FlightError;

/// Raw `wing` value as found in the document: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WingField {
    Int(i64),
    Float(f64),
    Text(String),
}

impl WingField {
    /// Integer wing id. Floats are truncated toward zero, strings may carry
    /// surrounding whitespace.
    pub fn to_id(&self) -> Option<i64> {
        match self {
            WingField::Int(i) => Some(*i),
            WingField::Float(f) => {
                let t = f.trunc();
                if t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64 {
                    Some(t as i64)
                } else {
                    None
                }
            }
            WingField::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFlight {
    wing: Option<WingField>,
    glide_angles: Option<Vec<f64>>,
    sampling: Option<f64>,
}

/// A well-formed flight: wing id, glide-angle samples and sampling weight.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub wing: i64,
    pub glide_angles: Vec<f64>,
    pub sampling: f64,
}

impl FlightRecord {
    /// Interprets one document value.
    ///
    /// Returns `Ok(None)` for `null` and for records missing any required
    /// field; those are skipped without being reported.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::InvalidFlight`] if the value is not an object,
    /// if a required field has the wrong JSON type, or if `wing` does not
    /// convert to an integer.
    pub fn from_value(id: &str, value: &Value) -> Result<Option<Self>, FlightError> {
        if value.is_null() {
            return Ok(None);
        }
        if !value.is_object() {
            return Err(FlightError::invalid(id, "record is not an object"));
        }

        let raw =
            RawFlight::deserialize(value).map_err(|e| FlightError::invalid(id, e.to_string()))?;

        let (Some(wing), Some(glide_angles), Some(sampling)) =
            (raw.wing, raw.glide_angles, raw.sampling)
        else {
            return Ok(None);
        };

        let wing = wing
            .to_id()
            .ok_or_else(|| FlightError::invalid(id, format!("wing {wing:?} is not an integer")))?;

        Ok(Some(FlightRecord {
            wing,
            glide_angles,
            sampling,
        }))
    }
}

/// All entries of the input document, in document order.
#[derive(Debug, Default, Clone)]
pub struct Flights {
    entries: Vec<(String, Option<FlightRecord>)>,
}

impl Flights {
    /// Iterates over `(flight id, record)` pairs; `None` marks a skipped entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FlightRecord>)> {
        self.entries.iter().map(|(id, f)| (id.as_str(), f.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that will be ignored (null or incomplete).
    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|(_, f)| f.is_none()).count()
    }
}

impl FromIterator<(String, Option<FlightRecord>)> for Flights {
    fn from_iter<T: IntoIterator<Item = (String, Option<FlightRecord>)>>(iter: T) -> Self {
        Flights {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parses a flight document held in memory.
pub fn parse_flights(json: &str) -> Result<Flights> {
    let doc: Value = serde_json::from_str(json).context("flight document is not valid JSON")?;
    let Value::Object(map) = doc else {
        return Err(FlightError::NotAnObject.into());
    };

    let flights = map
        .iter()
        .map(|(id, v)| Ok((id.clone(), FlightRecord::from_value(id, v)?)))
        .collect::<Result<Flights, FlightError>>()?;

    debug!(
        entries = flights.len(),
        skipped = flights.skipped(),
        "Flight document parsed"
    );
    Ok(flights)
}

/// Reads and parses the flight document at `path`.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_flights(path: &Path) -> Result<Flights> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_flights(&content).with_context(|| format!("failed to parse {}", path.display()))
}
