use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::grid::ParameterSet;
use crate::stats::Estimate;
use crate::SweepError;

pub const CSV_HEADER: [&str; 6] = [
    "distance_m",
    "obss_pd_threshold_dbm",
    "obss_pd_enabled",
    "samples",
    "mean_throughput_mbps",
    "ci_half_width_mbps",
];

/// One aggregated row of the sweep. `estimate` is `None` when every trial of
/// the grid point failed; a zero there would be indistinguishable from a
/// genuinely dead link, so absence stays explicit all the way to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub params: ParameterSet,
    pub samples: usize,
    pub estimate: Option<Estimate>,
}

/// Ordered, append-only collection of aggregated rows in sweep-generation
/// order.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<AggregateRow>,
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

fn fmt_option_f64(value: Option<f64>) -> String {
    value.map(fmt_f64).unwrap_or_default()
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: AggregateRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Writes the table as CSV. Absent mean/half-width cells are written as
    /// empty fields, never as a sentinel number.
    pub fn write_csv(&self, path: &Path) -> Result<(), SweepError> {
        let mut writer = TableWriter::create(path)?;
        for row in &self.rows {
            writer.append(row)?;
        }
        Ok(())
    }

    /// Reads a table previously written by `write_csv`, preserving row
    /// order. Row ordinals are reassigned from position, which matches how
    /// the sweep generator numbered them in the first place.
    pub fn read_csv(path: &Path) -> Result<Self, SweepError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut table = ResultTable::new();

        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let row = idx + 1;

            let distance = parse_f64(record.get(0), row, "distance_m")?;
            let threshold = parse_optional_f64(record.get(1), row, "obss_pd_threshold_dbm")?;
            let enabled = parse_bool(record.get(2), row, "obss_pd_enabled")?;
            let samples = parse_usize(record.get(3), row, "samples")?;
            let mean = parse_optional_f64(record.get(4), row, "mean_throughput_mbps")?;
            let half_width = parse_optional_f64(record.get(5), row, "ci_half_width_mbps")?;

            let estimate = match (mean, half_width) {
                (Some(mean), Some(half_width)) => Some(Estimate { mean, half_width }),
                (None, None) => None,
                _ => {
                    return Err(SweepError::InvalidRow {
                        row,
                        reason: "mean and half-width must be both present or both absent"
                            .to_string(),
                    })
                }
            };

            table.push(AggregateRow {
                params: ParameterSet {
                    distance,
                    obss_pd_threshold: threshold,
                    obss_pd_enabled: enabled,
                    ordinal: idx,
                },
                samples,
                estimate,
            });
        }

        Ok(table)
    }
}

/// Streaming CSV writer that flushes after every row, so a sweep
/// interrupted between grid points leaves every completed row intact on
/// disk.
pub struct TableWriter {
    writer: Writer<File>,
}

impl TableWriter {
    pub fn create(path: &Path) -> Result<Self, SweepError> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn append(&mut self, row: &AggregateRow) -> Result<(), SweepError> {
        self.writer.write_record([
            fmt_f64(row.params.distance),
            fmt_option_f64(row.params.obss_pd_threshold),
            row.params.obss_pd_enabled.to_string(),
            row.samples.to_string(),
            fmt_option_f64(row.estimate.map(|e| e.mean)),
            fmt_option_f64(row.estimate.map(|e| e.half_width)),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

fn missing(row: usize, column: &str) -> SweepError {
    SweepError::InvalidRow {
        row,
        reason: format!("missing column {column}"),
    }
}

fn parse_f64(field: Option<&str>, row: usize, column: &str) -> Result<f64, SweepError> {
    let field = field.ok_or_else(|| missing(row, column))?;
    field.parse::<f64>().map_err(|_| SweepError::InvalidRow {
        row,
        reason: format!("column {column} is not a number: {field:?}"),
    })
}

fn parse_optional_f64(
    field: Option<&str>,
    row: usize,
    column: &str,
) -> Result<Option<f64>, SweepError> {
    match field {
        None => Err(missing(row, column)),
        Some("") => Ok(None),
        Some(value) => parse_f64(Some(value), row, column).map(Some),
    }
}

fn parse_bool(field: Option<&str>, row: usize, column: &str) -> Result<bool, SweepError> {
    let field = field.ok_or_else(|| missing(row, column))?;
    field.parse::<bool>().map_err(|_| SweepError::InvalidRow {
        row,
        reason: format!("column {column} is not a bool: {field:?}"),
    })
}

fn parse_usize(field: Option<&str>, row: usize, column: &str) -> Result<usize, SweepError> {
    let field = field.ok_or_else(|| missing(row, column))?;
    field.parse::<usize>().map_err(|_| SweepError::InvalidRow {
        row,
        reason: format!("column {column} is not a count: {field:?}"),
    })
}
