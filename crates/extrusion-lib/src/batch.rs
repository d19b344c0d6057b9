//! Batch evaluation with per-row failure isolation.
//!
//! Rows are independent: a failing row yields an error outcome at its index
//! and the remaining rows are still evaluated. Outcomes keep input order.

use std::collections::HashMap;
use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{info, warn};

use crate::blend::RawBlend;
use crate::catalog::MaterialCatalog;
use crate::engine::SimulationEngine;
use crate::error::{Error, Result};
use crate::params::{
    ProcessParameters, CHAMBER_PRESSURE_RANGE, DIE_DIAMETER_RANGE, FAT_RANGE, FEED_RATE_RANGE,
    MOISTURE_RANGE, RPM_RANGE, SCREW_DIAMETER_RANGE, SCREW_LENGTH_RANGE, TEMPERATURE_RANGE,
};
use crate::result::{SimulationResult, RESULT_FIELDS};

/// Columns every batch file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    TEMPERATURE_RANGE.field,
    RPM_RANGE.field,
    MOISTURE_RANGE.field,
    FAT_RANGE.field,
];

/// One unvalidated batch request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub blend: RawBlend,
    pub parameters: ProcessParameters,
}

/// Result of one batch row, tagged with its 0-based input position.
#[derive(Debug)]
pub struct BatchOutcome {
    pub row_index: usize,
    pub outcome: Result<SimulationResult>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Applies a [`SimulationEngine`] to a sequence of rows.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner<'a> {
    engine: &'a SimulationEngine,
}

impl<'a> BatchRunner<'a> {
    pub fn new(engine: &'a SimulationEngine) -> Self {
        Self { engine }
    }

    /// Run every row through the named model, collecting per-row outcomes.
    pub fn run_batch(&self, rows: &[BatchRow], model_version: &str) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| BatchOutcome {
                row_index,
                outcome: self.engine.run(
                    row.blend.iter().map(|(name, ratio)| (name.as_str(), *ratio)),
                    &row.parameters,
                    model_version,
                ),
            })
            .collect();
        log_summary(&outcomes);
        outcomes
    }

    /// Read rows from delimited text and run them.
    ///
    /// Only an unreadable header aborts the batch; rows that fail to parse
    /// become error outcomes.
    pub fn run_batch_csv<R: Read>(
        &self,
        reader: R,
        model_version: &str,
    ) -> Result<Vec<BatchOutcome>> {
        let rows = read_batch_rows(reader, self.engine.catalog())?;
        let outcomes: Vec<BatchOutcome> = rows
            .into_iter()
            .enumerate()
            .map(|(row_index, row)| BatchOutcome {
                row_index,
                outcome: row.and_then(|row| {
                    self.engine.run(
                        row.blend.iter().map(|(name, ratio)| (name.as_str(), *ratio)),
                        &row.parameters,
                        model_version,
                    )
                }),
            })
            .collect();
        log_summary(&outcomes);
        Ok(outcomes)
    }
}

fn log_summary(outcomes: &[BatchOutcome]) {
    let mut failed = 0usize;
    for outcome in outcomes {
        if let Err(err) = &outcome.outcome {
            failed += 1;
            warn!(row = outcome.row_index, error = %err, "batch row failed");
        }
    }
    info!(rows = outcomes.len(), failed, "batch complete");
}

/// Where each recognised column sits in the header.
#[derive(Debug, Default)]
struct ColumnLayout {
    parameters: HashMap<&'static str, usize>,
    materials: Vec<(String, usize)>,
    missing: Option<&'static str>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord, catalog: &MaterialCatalog) -> Self {
        let parameter_names = [
            TEMPERATURE_RANGE.field,
            RPM_RANGE.field,
            MOISTURE_RANGE.field,
            FAT_RANGE.field,
            SCREW_DIAMETER_RANGE.field,
            SCREW_LENGTH_RANGE.field,
            FEED_RATE_RANGE.field,
            DIE_DIAMETER_RANGE.field,
            CHAMBER_PRESSURE_RANGE.field,
        ];

        let mut layout = Self::default();
        for (position, header) in headers.iter().enumerate() {
            if let Some(name) = parameter_names.iter().find(|name| **name == header) {
                layout.parameters.insert(*name, position);
            } else if catalog.materials().iter().any(|m| m.name == header) {
                layout.materials.push((header.to_string(), position));
            }
        }

        layout.missing = REQUIRED_COLUMNS
            .iter()
            .copied()
            .find(|column| !layout.parameters.contains_key(column));
        layout
    }

    fn parse_row(&self, record: &StringRecord) -> Result<BatchRow> {
        if let Some(column) = self.missing {
            return Err(Error::MissingColumn {
                column: column.to_string(),
            });
        }

        let defaults = ProcessParameters::default();
        let number = |column: &'static str, fallback: f64| -> Result<f64> {
            Ok(self.optional(record, column)?.unwrap_or(fallback))
        };

        let parameters = ProcessParameters {
            temperature_c: self.required(record, TEMPERATURE_RANGE.field)?,
            rpm: self.required(record, RPM_RANGE.field)?,
            moisture_pct: self.required(record, MOISTURE_RANGE.field)?,
            fat_pct: self.required(record, FAT_RANGE.field)?,
            screw_diameter_mm: number(SCREW_DIAMETER_RANGE.field, defaults.screw_diameter_mm)?,
            screw_length_mm: number(SCREW_LENGTH_RANGE.field, defaults.screw_length_mm)?,
            feed_rate_kg_h: number(FEED_RATE_RANGE.field, defaults.feed_rate_kg_h)?,
            die_diameter_mm: number(DIE_DIAMETER_RANGE.field, defaults.die_diameter_mm)?,
            chamber_pressure_bar: self.optional(record, CHAMBER_PRESSURE_RANGE.field)?,
        };

        let mut blend = RawBlend::new();
        for (name, position) in &self.materials {
            let cell = record.get(*position).unwrap_or("");
            let ratio = if cell.is_empty() {
                0.0
            } else {
                parse_cell(name, cell)?
            };
            *blend.entry(name.clone()).or_insert(0.0) += ratio;
        }

        Ok(BatchRow { blend, parameters })
    }

    fn required(&self, record: &StringRecord, column: &'static str) -> Result<f64> {
        self.optional(record, column)?
            .ok_or_else(|| Error::MissingColumn {
                column: column.to_string(),
            })
    }

    fn optional(&self, record: &StringRecord, column: &'static str) -> Result<Option<f64>> {
        match self
            .parameters
            .get(column)
            .and_then(|&position| record.get(position))
        {
            None | Some("") => Ok(None),
            Some(cell) => parse_cell(column, cell).map(Some),
        }
    }
}

fn parse_cell(column: &str, cell: &str) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| Error::InvalidCell {
        column: column.to_string(),
        value: cell.to_string(),
    })
}

/// Parse batch rows from delimited text.
///
/// Columns are material names (matched against the catalog) plus the
/// process-parameter names; `temperature_C`, `rpm`, `moisture_pct` and
/// `fat_pct` are required, the geometry columns fall back to the defaults and
/// `chamber_pressure_bar` is an optional override. Unknown columns are ignored
/// and empty material cells count as zero. A missing required column or an
/// unparseable cell is a row-level error.
pub fn read_batch_rows<R: Read>(
    reader: R,
    catalog: &MaterialCatalog,
) -> Result<Vec<Result<BatchRow>>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let layout = ColumnLayout::from_headers(&headers, catalog);

    Ok(csv_reader
        .records()
        .map(|record| layout.parse_row(&record?))
        .collect())
}

/// Write one line per outcome: status, error text and every result field.
pub fn write_batch_csv<W: Write>(writer: W, outcomes: &[BatchOutcome]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);

    let mut header = vec!["row_index", "status", "error", "model_version"];
    header.extend(RESULT_FIELDS);
    header.extend(["flavor_profile", "appearance", "color"]);
    csv_writer.write_record(&header)?;

    for outcome in outcomes {
        let mut record = vec![outcome.row_index.to_string()];
        match &outcome.outcome {
            Ok(result) => {
                record.extend(["ok".to_string(), String::new(), result.model_version.clone()]);
                record.extend(
                    RESULT_FIELDS
                        .iter()
                        .map(|field| result.field(field).map(|v| v.to_string()).unwrap_or_default()),
                );
                record.push(result.flavor_summary());
                record.push(result.appearance.map(|a| a.to_string()).unwrap_or_default());
                record.push(result.color.map(|c| c.to_string()).unwrap_or_default());
            }
            Err(err) => {
                record.extend(["error".to_string(), err.to_string()]);
                record.resize(header.len(), String::new());
            }
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::presets;
    use std::io::Cursor;

    fn engine() -> SimulationEngine {
        SimulationEngine::with_builtin().expect("builtin engine")
    }

    fn row(blend: &[(&str, f64)]) -> BatchRow {
        BatchRow {
            blend: blend.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
            parameters: ProcessParameters::default(),
        }
    }

    #[test]
    fn failing_row_does_not_abort_batch() {
        let engine = engine();
        let rows = vec![
            row(&[("corn", 100.0)]),
            row(&[("quinoa", 100.0)]),
            row(&[("wheat", 50.0), ("rye", 50.0)]),
        ];

        let outcomes = BatchRunner::new(&engine).run_batch(&rows, presets::BASIC);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1].outcome,
            Err(Error::UnknownMaterial { .. })
        ));
        assert!(outcomes[2].is_ok());
        let indices: Vec<usize> = outcomes.iter().map(|o| o.row_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn reads_materials_parameters_and_ignores_unknown_columns() {
        let csv = "corn,wheat,operator,temperature_C,rpm,moisture_pct,fat_pct,feed_rate_kg_h\n\
                   60,40,ana,150,320,14,4,\n\
                   100,,bo,130,280,16,6,45\n";
        let rows = read_batch_rows(Cursor::new(csv), MaterialCatalog::builtin().expect("catalog"))
            .expect("header parses");

        let first = rows[0].as_ref().expect("first row parses");
        assert_eq!(first.blend.get("wheat"), Some(&40.0));
        assert_eq!(first.parameters.temperature_c, 150.0);
        assert_eq!(first.parameters.feed_rate_kg_h, 30.0);

        let second = rows[1].as_ref().expect("second row parses");
        assert_eq!(second.blend.get("wheat"), Some(&0.0));
        assert_eq!(second.parameters.feed_rate_kg_h, 45.0);
    }

    #[test]
    fn material_columns_must_match_catalog_names_exactly() {
        let csv = "Corn,wheat,temperature_C,rpm,moisture_pct,fat_pct\n\
                   60,40,140,300,15,5\n";
        let outcomes = BatchRunner::new(&engine())
            .run_batch_csv(Cursor::new(csv), presets::BASIC)
            .expect("header parses");
        assert!(matches!(
            outcomes[0].outcome,
            Err(Error::BlendNotNormalized { total }) if total == 40.0
        ));
    }

    #[test]
    fn missing_required_column_fails_every_row() {
        let csv = "corn,temperature_C,rpm,moisture_pct\n100,140,300,15\n";
        let outcomes = BatchRunner::new(&engine())
            .run_batch_csv(Cursor::new(csv), presets::BASIC)
            .expect("header parses");
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0].outcome {
            Err(Error::MissingColumn { column }) => assert_eq!(column, "fat_pct"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unparseable_cell_is_a_row_error() {
        let csv = "corn,temperature_C,rpm,moisture_pct,fat_pct\n\
                   100,hot,300,15,5\n\
                   100,140,300,15,5\n";
        let outcomes = BatchRunner::new(&engine())
            .run_batch_csv(Cursor::new(csv), presets::BASIC)
            .expect("header parses");
        assert!(matches!(
            &outcomes[0].outcome,
            Err(Error::InvalidCell { column, value }) if column == "temperature_C" && value == "hot"
        ));
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn writes_one_line_per_outcome() {
        let engine = engine();
        let rows = vec![row(&[("corn", 100.0)]), row(&[("corn", 90.0)])];
        let outcomes = BatchRunner::new(&engine).run_batch(&rows, presets::BASIC);

        let mut buffer = Vec::new();
        write_batch_csv(&mut buffer, &outcomes).expect("write csv");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("row_index,status,error,model_version,expansion_index"));
        assert!(lines[1].starts_with("0,ok,,basic,2.1,"));
        assert!(lines[2].starts_with("1,error,\"blend ratios must sum to 100%, got 90%\""));
    }
}
