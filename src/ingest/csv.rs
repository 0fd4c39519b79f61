//! CSV telemetry parser.
//!
//! Maps header names onto the seven telemetry columns, defaults any absent
//! column to zero, and rejects the upload as a whole on the first malformed
//! row or unrecognised column.

use std::collections::HashSet;

use super::{IngestError, IngestRow};
use crate::types::{TelemetryRecord, FEATURE_COLUMNS, NUM_FEATURES};

/// Header names accepted for the optional device ID column.
const ID_COLUMNS: [&str; 2] = ["gpu_id", "id"];

/// Where each CSV position lands in a [`TelemetryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnTarget {
    Feature(usize),
    GpuId,
}

/// Column layout resolved from the header row.
#[derive(Debug)]
struct ColumnMap {
    targets: Vec<ColumnTarget>,
    missing: Vec<&'static str>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Result<Self, IngestError> {
        let columns = csv_split(header);
        let mut targets = Vec::with_capacity(columns.len());
        let mut seen = HashSet::new();

        for raw in &columns {
            let name = normalize_header(raw);
            if name.is_empty() {
                return Err(IngestError::UnknownColumn(raw.clone()));
            }
            if !seen.insert(name.clone()) {
                return Err(IngestError::DuplicateColumn(raw.trim().to_string()));
            }

            let target = if ID_COLUMNS.contains(&name.as_str()) {
                ColumnTarget::GpuId
            } else if let Some(idx) = FEATURE_COLUMNS.iter().position(|c| *c == name) {
                ColumnTarget::Feature(idx)
            } else {
                return Err(IngestError::UnknownColumn(raw.trim().to_string()));
            };
            targets.push(target);
        }

        let present: HashSet<usize> = targets
            .iter()
            .filter_map(|t| match t {
                ColumnTarget::Feature(i) => Some(*i),
                ColumnTarget::GpuId => None,
            })
            .collect();
        if present.is_empty() {
            return Err(IngestError::NoTelemetryColumns);
        }

        let missing = (0..NUM_FEATURES)
            .filter(|i| !present.contains(i))
            .map(|i| FEATURE_COLUMNS[i])
            .collect();

        Ok(Self { targets, missing })
    }
}

/// Lowercase, trim, strip a UTF-8 BOM and surrounding quotes.
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .trim_matches('"')
        .trim()
        .to_ascii_lowercase()
}

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse a numeric cell. Empty cells are zero.
fn parse_cell(value: &str, line: usize, column: &str) -> Result<f64, IngestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IngestError::InvalidNumber {
            line,
            column: column.to_string(),
            value: trimmed.to_string(),
        }),
    }
}

/// Parse a CSV telemetry upload into validated rows.
///
/// Line numbers in errors are 1-based and count the header.
pub fn parse_telemetry_csv(text: &str) -> Result<Vec<IngestRow>, IngestError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(IngestError::Empty)?;
    let columns = ColumnMap::from_header(header)?;
    if !columns.missing.is_empty() {
        tracing::warn!(
            missing = ?columns.missing,
            "Upload is missing telemetry columns, defaulting them to zero"
        );
    }

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields = csv_split(line);
        if fields.len() != columns.targets.len() {
            return Err(IngestError::RowWidth {
                line: line_no,
                expected: columns.targets.len(),
                actual: fields.len(),
            });
        }

        let mut telemetry = TelemetryRecord::default();
        let mut gpu_id = None;
        for (field, target) in fields.iter().zip(columns.targets.iter()) {
            match target {
                ColumnTarget::Feature(idx) => {
                    let v = parse_cell(field, line_no, FEATURE_COLUMNS[*idx])?;
                    telemetry.set_feature(*idx, v);
                }
                ColumnTarget::GpuId => {
                    let id = field.trim();
                    if !id.is_empty() {
                        gpu_id = Some(id.to_string());
                    }
                }
            }
        }
        rows.push(IngestRow { gpu_id, telemetry });
    }

    if rows.is_empty() {
        return Err(IngestError::NoRows);
    }
    Ok(rows)
}
