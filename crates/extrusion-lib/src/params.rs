//! Machine operating parameters and their accepted ranges.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive range accepted for one operating parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    /// Field name as used in batch files and result records.
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
    /// Display unit for form controls.
    pub unit: &'static str,
}

impl ParameterRange {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }

    fn check(&self, value: f64) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(Error::InvalidRange {
                field: self.field.to_string(),
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const TEMPERATURE_RANGE: ParameterRange = ParameterRange {
    field: "temperature_C",
    min: 60.0,
    max: 180.0,
    unit: "°C",
};
pub const RPM_RANGE: ParameterRange = ParameterRange {
    field: "rpm",
    min: 100.0,
    max: 600.0,
    unit: "rpm",
};
pub const MOISTURE_RANGE: ParameterRange = ParameterRange {
    field: "moisture_pct",
    min: 10.0,
    max: 25.0,
    unit: "%",
};
pub const FAT_RANGE: ParameterRange = ParameterRange {
    field: "fat_pct",
    min: 0.0,
    max: 15.0,
    unit: "%",
};
pub const SCREW_DIAMETER_RANGE: ParameterRange = ParameterRange {
    field: "screw_diameter_mm",
    min: 20.0,
    max: 60.0,
    unit: "mm",
};
pub const SCREW_LENGTH_RANGE: ParameterRange = ParameterRange {
    field: "screw_length_mm",
    min: 400.0,
    max: 1600.0,
    unit: "mm",
};
pub const FEED_RATE_RANGE: ParameterRange = ParameterRange {
    field: "feed_rate_kg_h",
    min: 5.0,
    max: 200.0,
    unit: "kg/h",
};
pub const DIE_DIAMETER_RANGE: ParameterRange = ParameterRange {
    field: "die_diameter_mm",
    min: 1.0,
    max: 20.0,
    unit: "mm",
};
/// Range for a caller-supplied chamber pressure override.
pub const CHAMBER_PRESSURE_RANGE: ParameterRange = ParameterRange {
    field: "chamber_pressure_bar",
    min: 20.0,
    max: 200.0,
    unit: "bar",
};

/// Every operating parameter range, in validation order.
pub const PARAMETER_RANGES: [ParameterRange; 9] = [
    TEMPERATURE_RANGE,
    RPM_RANGE,
    MOISTURE_RANGE,
    FAT_RANGE,
    SCREW_DIAMETER_RANGE,
    SCREW_LENGTH_RANGE,
    FEED_RATE_RANGE,
    DIE_DIAMETER_RANGE,
    CHAMBER_PRESSURE_RANGE,
];

/// Operating conditions for one extrusion run.
///
/// Values are plain numbers; [`ProcessParameters::validate`] enforces the
/// inclusive ranges before any model sees them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    #[serde(rename = "temperature_C")]
    pub temperature_c: f64,
    pub rpm: f64,
    pub moisture_pct: f64,
    pub fat_pct: f64,
    pub screw_diameter_mm: f64,
    pub screw_length_mm: f64,
    pub feed_rate_kg_h: f64,
    pub die_diameter_mm: f64,
    /// Measured chamber pressure. When absent the model derives it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber_pressure_bar: Option<f64>,
}

impl Default for ProcessParameters {
    fn default() -> Self {
        Self {
            temperature_c: 140.0,
            rpm: 300.0,
            moisture_pct: 15.0,
            fat_pct: 5.0,
            screw_diameter_mm: 30.0,
            screw_length_mm: 1000.0,
            feed_rate_kg_h: 30.0,
            die_diameter_mm: 5.0,
            chamber_pressure_bar: None,
        }
    }
}

impl ProcessParameters {
    /// Check every field against its inclusive range, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        TEMPERATURE_RANGE.check(self.temperature_c)?;
        RPM_RANGE.check(self.rpm)?;
        MOISTURE_RANGE.check(self.moisture_pct)?;
        FAT_RANGE.check(self.fat_pct)?;
        SCREW_DIAMETER_RANGE.check(self.screw_diameter_mm)?;
        SCREW_LENGTH_RANGE.check(self.screw_length_mm)?;
        FEED_RATE_RANGE.check(self.feed_rate_kg_h)?;
        DIE_DIAMETER_RANGE.check(self.die_diameter_mm)?;
        if let Some(pressure) = self.chamber_pressure_bar {
            CHAMBER_PRESSURE_RANGE.check(pressure)?;
        }
        Ok(())
    }

    /// Flat `(field, value)` record for tabular export.
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        let mut fields = vec![
            (TEMPERATURE_RANGE.field, self.temperature_c),
            (RPM_RANGE.field, self.rpm),
            (MOISTURE_RANGE.field, self.moisture_pct),
            (FAT_RANGE.field, self.fat_pct),
            (SCREW_DIAMETER_RANGE.field, self.screw_diameter_mm),
            (SCREW_LENGTH_RANGE.field, self.screw_length_mm),
            (FEED_RATE_RANGE.field, self.feed_rate_kg_h),
            (DIE_DIAMETER_RANGE.field, self.die_diameter_mm),
        ];
        if let Some(pressure) = self.chamber_pressure_bar {
            fields.push((CHAMBER_PRESSURE_RANGE.field, pressure));
        }
        fields
    }
}
