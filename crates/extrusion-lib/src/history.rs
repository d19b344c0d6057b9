//! Append-only run history and comparison of the two most recent runs.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::round_to;
use crate::params::{
    ParameterRange, DIE_DIAMETER_RANGE, FAT_RANGE, FEED_RATE_RANGE, MOISTURE_RANGE, RPM_RANGE,
    SCREW_DIAMETER_RANGE, SCREW_LENGTH_RANGE, TEMPERATURE_RANGE,
};
use crate::result::{SimulationRun, RESULT_FIELDS};

/// Decimal places kept on history differences.
const DELTA_DECIMALS: u32 = 3;

/// Process parameters exported per run; the pressure override gets its own column.
const PROCESS_RANGES: [ParameterRange; 8] = [
    TEMPERATURE_RANGE,
    RPM_RANGE,
    MOISTURE_RANGE,
    FAT_RANGE,
    SCREW_DIAMETER_RANGE,
    SCREW_LENGTH_RANGE,
    FEED_RATE_RANGE,
    DIE_DIAMETER_RANGE,
];

/// Sign of a field change between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Unchanged,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Direction::Increase => "+",
            Direction::Decrease => "-",
            Direction::Unchanged => "=",
        };
        f.write_str(symbol)
    }
}

/// Change of one numeric result field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDelta {
    pub field: &'static str,
    pub previous: f64,
    pub current: f64,
    /// `current - previous`, rounded to 3 decimals.
    pub difference: f64,
}

impl FieldDelta {
    pub fn direction(&self) -> Direction {
        if self.difference > 0.0 {
            Direction::Increase
        } else if self.difference < 0.0 {
            Direction::Decrease
        } else {
            Direction::Unchanged
        }
    }
}

/// Field-wise comparison of the last two runs.
///
/// Only fields populated in both runs are compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryDelta {
    pub fields: Vec<FieldDelta>,
}

impl HistoryDelta {
    pub fn get(&self, field: &str) -> Option<&FieldDelta> {
        self.fields.iter().find(|delta| delta.field == field)
    }

    /// Difference for a field, if both runs populated it.
    pub fn difference(&self, field: &str) -> Option<f64> {
        self.get(field).map(|delta| delta.difference)
    }
}

/// Ordered record of completed runs, held by the caller.
///
/// Entries are never removed; bounding the length is up to the owner.
#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    entries: Vec<SimulationRun>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, run: SimulationRun) {
        debug!(
            entry = self.entries.len(),
            version = %run.result.model_version,
            "appending run to history"
        );
        self.entries.push(run);
    }

    /// Compare the two most recently appended runs.
    pub fn delta(&self) -> Result<HistoryDelta> {
        let [.., previous, current] = self.entries.as_slice() else {
            return Err(Error::InsufficientHistory {
                entries: self.entries.len(),
            });
        };

        let fields = RESULT_FIELDS
            .iter()
            .filter_map(|field| {
                let before = previous.result.field(field)?;
                let after = current.result.field(field)?;
                Some(FieldDelta {
                    field: *field,
                    previous: before,
                    current: after,
                    difference: round_to(after - before, DELTA_DECIMALS),
                })
            })
            .collect();

        Ok(HistoryDelta { fields })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SimulationRun] {
        &self.entries
    }

    pub fn last(&self) -> Option<&SimulationRun> {
        self.entries.last()
    }

    /// Export every run as one CSV line: inputs, blend and result fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().from_writer(writer);

        let mut header = vec!["run", "model_version"];
        header.extend(PROCESS_RANGES.iter().map(|range| range.field));
        header.push("pressure_override_bar");
        header.push("blend");
        header.extend(RESULT_FIELDS);
        header.extend(["flavor_profile", "appearance", "color"]);
        csv_writer.write_record(&header)?;

        for (run_number, run) in self.entries.iter().enumerate() {
            let params = run.parameters;
            let result = &run.result;

            let mut record = vec![(run_number + 1).to_string(), result.model_version.clone()];
            record.extend(
                params
                    .fields()
                    .into_iter()
                    .take(PROCESS_RANGES.len())
                    .map(|(_, value)| value.to_string()),
            );
            record.push(
                params
                    .chamber_pressure_bar
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            );
            record.push(
                run.blend
                    .ratios()
                    .iter()
                    .map(|(name, ratio)| format!("{name}={ratio}"))
                    .collect::<Vec<_>>()
                    .join(";"),
            );
            record.extend(
                RESULT_FIELDS
                    .iter()
                    .map(|field| result.field(field).map(|v| v.to_string()).unwrap_or_default()),
            );
            record.push(result.flavor_summary());
            record.push(result.appearance.map(|a| a.to_string()).unwrap_or_default());
            record.push(result.color.map(|c| c.to_string()).unwrap_or_default());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// [`HistoryTracker`] shared between concurrent callers.
///
/// Appending and reading the last two entries happen under one lock so a
/// caller always compares its own run against its predecessor.
#[derive(Debug, Default)]
pub struct SharedHistory {
    inner: Mutex<HistoryTracker>,
}

impl SharedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run and compare it with the previous one in a single step.
    pub fn append_and_delta(&self, run: SimulationRun) -> Result<HistoryDelta> {
        let mut tracker = self.lock();
        tracker.append(run);
        tracker.delta()
    }

    pub fn append(&self, run: SimulationRun) {
        self.lock().append(run);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current history.
    pub fn snapshot(&self) -> HistoryTracker {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryTracker> {
        // append is a single push, so a poisoned tracker is still consistent
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
