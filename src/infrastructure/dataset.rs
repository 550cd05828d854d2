use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::domain::energy::ObservationRecord;

/// Hourly observations replayed cyclically by a session.
///
/// Records and timestamps are parallel vectors; index access wraps, so a
/// session can run longer than the dataset without special casing.
#[derive(Debug, Clone)]
pub struct HourlyDataset {
    timestamps: Vec<DateTime<Utc>>,
    records: Vec<ObservationRecord>,
}

impl HourlyDataset {
    pub fn from_records(rows: Vec<(DateTime<Utc>, ObservationRecord)>) -> Self {
        let (timestamps, records) = rows.into_iter().unzip();
        Self {
            timestamps,
            records,
        }
    }

    /// Load the processed hourly CSV: a leading timestamp column followed
    /// by `P_wind`, `P_solar` and `house_consumption` (extra columns are
    /// ignored). Malformed rows fail the whole load; a dataset with bad
    /// rows silently dropped would skew the replay.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;

        let headers = reader
            .headers()
            .context("dataset has no header row")?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("dataset missing column '{name}'"))
        };
        let wind_col = column("P_wind")?;
        let solar_col = column("P_solar")?;
        let consumption_col = column("house_consumption")?;

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let row = result.with_context(|| format!("failed to read dataset row {line}"))?;
            let timestamp = parse_timestamp(row.get(0).unwrap_or_default())
                .with_context(|| format!("bad timestamp in dataset row {line}"))?;
            let field = |idx: usize, name: &str| -> Result<f64> {
                row.get(idx)
                    .ok_or_else(|| anyhow!("row {line} has no '{name}' field"))?
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("row {line}: '{name}' is not a number"))
            };
            let record = ObservationRecord::checked(
                field(wind_col, "P_wind")?,
                field(solar_col, "P_solar")?,
                field(consumption_col, "house_consumption")?,
            )
            .map_err(|e| anyhow!("row {line}: {e}"))?;
            rows.push((timestamp, record));
        }

        info!(rows = rows.len(), path = %path.display(), "loaded hourly dataset");
        Ok(Self::from_records(rows))
    }

    /// Deterministic stand-in dataset with a plausible day/night shape,
    /// for demos and tests that need no CSV on disk.
    pub fn synthetic(hours: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        // 2024-01-01T00:00:00Z
        let start = Utc
            .timestamp_opt(1_704_067_200, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let mut rows = Vec::with_capacity(hours);
        for hour in 0..hours {
            let hour_of_day = (hour % 24) as f64;
            let solar = if (6.0..=18.0).contains(&hour_of_day) {
                (std::f64::consts::PI * (hour_of_day - 6.0) / 12.0).sin() * 2.5
                    + rng.random::<f64>() * 0.1
            } else {
                0.0
            };
            let wind = 1.2 + (hour as f64 / 9.0).sin() * 0.8 + rng.random::<f64>() * 0.3;
            let peak_hours = (7.0..=9.0).contains(&hour_of_day)
                || (18.0..=22.0).contains(&hour_of_day);
            let consumption =
                1.5 + if peak_hours { 1.3 } else { 0.0 } + rng.random::<f64>() * 0.4;

            rows.push((
                start + chrono::Duration::hours(hour as i64),
                ObservationRecord::new(wind.max(0.0), solar.max(0.0), consumption),
            ));
        }
        Self::from_records(rows)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cyclic access; `index` may run past the end forever. The dataset
    /// must be non-empty.
    pub fn record(&self, index: usize) -> ObservationRecord {
        debug_assert!(!self.records.is_empty());
        self.records[index % self.records.len()]
    }

    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        debug_assert!(!self.timestamps.is_empty());
        self.timestamps[index % self.timestamps.len()]
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("unrecognized timestamp '{raw}'"))?;
    Ok(naive.and_utc())
}
