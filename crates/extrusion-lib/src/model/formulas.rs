//! Swappable empirical sub-formulas.
//!
//! Each quantity a model predicts is computed by one of a small set of
//! formula shapes. A model version picks a shape and its coefficients per
//! quantity, so versions that disagree on direction or magnitude live side by
//! side as data instead of separate code paths.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::ProcessParameters;

/// Weighted material properties the blend-driven formulas consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendProperties {
    /// `Σ w · expansion_coeff`
    pub expansion: f64,
    /// `Σ w · crisp_coeff`
    pub crisp: f64,
}

/// Linear process correction applied on top of a blend-weighted base value.
///
/// `base + temperature·(T − T_ref) + rpm·(rpm − rpm_ref) + moisture·m + fat·f
///  + feed_rate·(feed − feed_ref)`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearCorrection {
    pub temperature_ref: f64,
    pub temperature: f64,
    pub rpm_ref: f64,
    pub rpm: f64,
    pub moisture: f64,
    pub fat: f64,
    pub feed_rate_ref: f64,
    pub feed_rate: f64,
}

impl LinearCorrection {
    /// A correction that leaves the base value untouched.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn apply(&self, base: f64, params: &ProcessParameters) -> f64 {
        base + self.temperature * (params.temperature_c - self.temperature_ref)
            + self.rpm * (params.rpm - self.rpm_ref)
            + self.moisture * params.moisture_pct
            + self.fat * params.fat_pct
            + self.feed_rate * (params.feed_rate_kg_h - self.feed_rate_ref)
    }

    fn validate(&self, name: &str) -> Result<()> {
        let values = [
            self.temperature_ref,
            self.temperature,
            self.rpm_ref,
            self.rpm,
            self.moisture,
            self.fat,
            self.feed_rate_ref,
            self.feed_rate,
        ];
        require_finite(name, &values)
    }
}

/// Water activity sub-formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaterActivityFormula {
    /// `intercept + moisture·(m − moisture_ref) + temperature·T + fat·f`
    Linear {
        intercept: f64,
        moisture: f64,
        #[serde(default)]
        moisture_ref: f64,
        #[serde(default)]
        temperature: f64,
        #[serde(default)]
        fat: f64,
    },
    /// `m / divisor`
    MoistureRatio { divisor: f64 },
}

impl WaterActivityFormula {
    pub fn evaluate(&self, params: &ProcessParameters) -> f64 {
        match *self {
            WaterActivityFormula::Linear {
                intercept,
                moisture,
                moisture_ref,
                temperature,
                fat,
            } => {
                intercept + moisture * (params.moisture_pct - moisture_ref)
                    + temperature * params.temperature_c
                    + fat * params.fat_pct
            }
            WaterActivityFormula::MoistureRatio { divisor } => params.moisture_pct / divisor,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            WaterActivityFormula::Linear {
                intercept,
                moisture,
                moisture_ref,
                temperature,
                fat,
            } => require_finite(
                "water_activity",
                &[intercept, moisture, moisture_ref, temperature, fat],
            ),
            WaterActivityFormula::MoistureRatio { divisor } => {
                require_positive("water_activity.divisor", divisor)
            }
        }
    }
}

/// Stickiness sub-formula: process-driven or material-driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StickinessFormula {
    /// `intercept + fat·f + moisture·m + rpm·rpm`
    Process {
        intercept: f64,
        fat: f64,
        moisture: f64,
        rpm: f64,
    },
    /// `Σ w · (crisp_max − crisp_coeff)`, i.e. the inverse of crispness.
    InverseCrisp { crisp_max: f64 },
}

impl StickinessFormula {
    pub fn evaluate(&self, blend: &BlendProperties, params: &ProcessParameters) -> f64 {
        match *self {
            StickinessFormula::Process {
                intercept,
                fat,
                moisture,
                rpm,
            } => {
                intercept + fat * params.fat_pct + moisture * params.moisture_pct + rpm * params.rpm
            }
            // Σ w (c_max − c) == c_max − Σ w c because the weights sum to one.
            StickinessFormula::InverseCrisp { crisp_max } => crisp_max - blend.crisp,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            StickinessFormula::Process {
                intercept,
                fat,
                moisture,
                rpm,
            } => require_finite("stickiness", &[intercept, fat, moisture, rpm]),
            StickinessFormula::InverseCrisp { crisp_max } => {
                require_positive("stickiness.crisp_max", crisp_max)
            }
        }
    }
}

/// Bulk density sub-formula (g/cm³), inversely related to expansion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DensityFormula {
    /// `intercept + expansion·E + moisture·m + fat·f + feed_rate·feed + die_diameter·die`
    Linear {
        intercept: f64,
        #[serde(default)]
        expansion: f64,
        #[serde(default)]
        moisture: f64,
        #[serde(default)]
        fat: f64,
        #[serde(default)]
        feed_rate: f64,
        #[serde(default)]
        die_diameter: f64,
    },
    /// `numerator / (E + offset)`
    Inverse { numerator: f64, offset: f64 },
}

impl DensityFormula {
    pub fn evaluate(&self, expansion: f64, params: &ProcessParameters) -> f64 {
        match *self {
            DensityFormula::Linear {
                intercept,
                expansion: k_expansion,
                moisture,
                fat,
                feed_rate,
                die_diameter,
            } => {
                intercept
                    + k_expansion * expansion
                    + moisture * params.moisture_pct
                    + fat * params.fat_pct
                    + feed_rate * params.feed_rate_kg_h
                    + die_diameter * params.die_diameter_mm
            }
            DensityFormula::Inverse { numerator, offset } => {
                let denominator = expansion + offset;
                if denominator > 0.0 {
                    numerator / denominator
                } else {
                    0.0
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            DensityFormula::Linear {
                intercept,
                expansion,
                moisture,
                fat,
                feed_rate,
                die_diameter,
            } => require_finite(
                "bulk_density",
                &[intercept, expansion, moisture, fat, feed_rate, die_diameter],
            ),
            DensityFormula::Inverse { numerator, offset } => {
                require_positive("bulk_density.numerator", numerator)?;
                require_finite("bulk_density.offset", &[offset])
            }
        }
    }
}

/// Chamber pressure sub-formula (bar).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PressureFormula {
    /// `T·rpm·feed / (D·L·scale)`
    FeedGeometry { scale: f64 },
    /// `coefficient·rpm·m / D`
    Shear { coefficient: f64 },
    /// `T·rpm·(1 − m/100) / scale`
    Thermal { scale: f64 },
    /// `intercept + rpm·rpm + feed_rate·feed + die_diameter·die`
    Linear {
        intercept: f64,
        rpm: f64,
        feed_rate: f64,
        die_diameter: f64,
    },
    /// Pressure is an operator input; `fallback_bar` applies when none is given.
    Supplied { fallback_bar: f64 },
}

impl PressureFormula {
    pub fn evaluate(&self, params: &ProcessParameters) -> f64 {
        match *self {
            PressureFormula::FeedGeometry { scale } => {
                (params.temperature_c * params.rpm * params.feed_rate_kg_h)
                    / (params.screw_diameter_mm * params.screw_length_mm * scale)
            }
            PressureFormula::Shear { coefficient } => {
                coefficient * params.rpm * params.moisture_pct / params.screw_diameter_mm
            }
            PressureFormula::Thermal { scale } => {
                (params.temperature_c * params.rpm * (1.0 - params.moisture_pct / 100.0)) / scale
            }
            PressureFormula::Linear {
                intercept,
                rpm,
                feed_rate,
                die_diameter,
            } => {
                intercept
                    + rpm * params.rpm
                    + feed_rate * params.feed_rate_kg_h
                    + die_diameter * params.die_diameter_mm
            }
            PressureFormula::Supplied { fallback_bar } => fallback_bar,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            PressureFormula::FeedGeometry { scale } | PressureFormula::Thermal { scale } => {
                require_positive("chamber_pressure.scale", scale)
            }
            PressureFormula::Shear { coefficient } => {
                require_finite("chamber_pressure.coefficient", &[coefficient])
            }
            PressureFormula::Linear {
                intercept,
                rpm,
                feed_rate,
                die_diameter,
            } => require_finite(
                "chamber_pressure",
                &[intercept, rpm, feed_rate, die_diameter],
            ),
            PressureFormula::Supplied { fallback_bar } => {
                require_positive("chamber_pressure.fallback_bar", fallback_bar)
            }
        }
    }
}

/// Specific mechanical energy sub-formula (kWh/kg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnergyFormula {
    /// Sum of per-input linear terms around reference points.
    Linear(EnergyTerms),
    /// `T·rpm·(1 + fat_factor·f + moisture_factor·m) / scale`
    ShearHeat {
        scale: f64,
        fat_factor: f64,
        moisture_factor: f64,
    },
    /// `T·rpm·(1 + fat_factor·f) / (base_divisor + feed_factor·feed)`
    FeedDiluted {
        base_divisor: f64,
        feed_factor: f64,
        fat_factor: f64,
    },
    /// `T·rpm·feed·(1 − m/100) / scale`
    Throughput { scale: f64 },
}

/// Coefficients of [`EnergyFormula::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyTerms {
    pub intercept: f64,
    pub temperature_ref: f64,
    pub temperature: f64,
    pub rpm_ref: f64,
    pub rpm: f64,
    pub moisture: f64,
    pub fat: f64,
    pub feed_rate: f64,
    /// Per millimetre of screw length.
    pub screw_length: f64,
    /// Per millimetre of screw diameter.
    pub screw_diameter: f64,
    /// Per bar of chamber pressure.
    pub chamber_pressure: f64,
}

impl EnergyFormula {
    pub fn evaluate(&self, params: &ProcessParameters, chamber_pressure_bar: f64) -> f64 {
        match *self {
            EnergyFormula::Linear(terms) => {
                terms.intercept
                    + terms.temperature * (params.temperature_c - terms.temperature_ref)
                    + terms.rpm * (params.rpm - terms.rpm_ref)
                    + terms.screw_length * params.screw_length_mm
                    + terms.moisture * params.moisture_pct
                    + terms.fat * params.fat_pct
                    + terms.screw_diameter * params.screw_diameter_mm
                    + terms.feed_rate * params.feed_rate_kg_h
                    + terms.chamber_pressure * chamber_pressure_bar
            }
            EnergyFormula::ShearHeat {
                scale,
                fat_factor,
                moisture_factor,
            } => {
                (params.rpm
                    * params.temperature_c
                    * (1.0 + params.fat_pct * fat_factor + params.moisture_pct * moisture_factor))
                    / scale
            }
            EnergyFormula::FeedDiluted {
                base_divisor,
                feed_factor,
                fat_factor,
            } => {
                (params.temperature_c * params.rpm * (1.0 + params.fat_pct * fat_factor))
                    / (base_divisor + params.feed_rate_kg_h * feed_factor)
            }
            EnergyFormula::Throughput { scale } => {
                (params.temperature_c
                    * params.rpm
                    * params.feed_rate_kg_h
                    * (1.0 - params.moisture_pct / 100.0))
                    / scale
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            EnergyFormula::Linear(terms) => require_finite(
                "specific_energy",
                &[
                    terms.intercept,
                    terms.temperature_ref,
                    terms.temperature,
                    terms.rpm_ref,
                    terms.rpm,
                    terms.moisture,
                    terms.fat,
                    terms.feed_rate,
                    terms.screw_length,
                    terms.screw_diameter,
                    terms.chamber_pressure,
                ],
            ),
            EnergyFormula::ShearHeat {
                scale,
                fat_factor,
                moisture_factor,
            } => {
                require_positive("specific_energy.scale", scale)?;
                require_finite("specific_energy", &[fat_factor, moisture_factor])
            }
            EnergyFormula::FeedDiluted {
                base_divisor,
                feed_factor,
                fat_factor,
            } => {
                require_positive("specific_energy.base_divisor", base_divisor)?;
                if !feed_factor.is_finite() || feed_factor < 0.0 {
                    return Err(Error::ModelConfig {
                        message: "specific_energy.feed_factor must be finite and non-negative"
                            .to_string(),
                    });
                }
                require_finite("specific_energy", &[fat_factor])
            }
            EnergyFormula::Throughput { scale } => {
                require_positive("specific_energy.scale", scale)
            }
        }
    }
}

/// Thresholds for the qualitative appearance and colour labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    /// Expansion strictly above this reads as "expanded".
    pub expanded_above: f64,
    /// Barrel temperature at or above this reads as "golden".
    pub golden_from_c: f64,
}

/// Decimal places used when reporting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rounding {
    pub indices: u32,
    pub pressure: u32,
    pub energy: u32,
    pub flavor: u32,
}

impl Default for Rounding {
    fn default() -> Self {
        Self {
            indices: 2,
            pressure: 2,
            energy: 3,
            flavor: 2,
        }
    }
}

/// Largest precision [`round_to`] handles; finer requests return the value as is.
const MAX_ROUND_DECIMALS: u32 = 15;

/// Round the exact binary value of `value` to `decimals` places, ties to even.
///
/// Scaling by `10^decimals` in floating point first would move values such as
/// `0.6149999…` onto a tie, so the comparison is done on the integer
/// mantissa instead. `round_to(0.125, 2)` is `0.12`, `round_to(0.615, 2)` is
/// `0.61`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() || value == 0.0 || decimals > MAX_ROUND_DECIMALS {
        return value;
    }

    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let exponent_bits = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    // value == ±mantissa · 2^exponent
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };
    if exponent >= 0 {
        return value;
    }

    let scaled = u128::from(mantissa) * 10u128.pow(decimals);
    let shift = exponent.unsigned_abs();
    let quotient = if shift >= 128 {
        0
    } else {
        let quotient = scaled >> shift;
        let remainder = scaled - (quotient << shift);
        let half = 1u128 << (shift - 1);
        if remainder > half || (remainder == half && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        }
    };

    let rounded = quotient as f64 / 10f64.powi(decimals as i32);
    if negative {
        -rounded
    } else {
        rounded
    }
}

pub(crate) fn validate_corrections(
    expansion: &LinearCorrection,
    crisp: &LinearCorrection,
) -> Result<()> {
    expansion.validate("expansion_correction")?;
    crisp.validate("crispness_correction")
}

pub(crate) fn validate_formulas(
    water_activity: &WaterActivityFormula,
    stickiness: &StickinessFormula,
    bulk_density: Option<&DensityFormula>,
    chamber_pressure: Option<&PressureFormula>,
    specific_energy: Option<&EnergyFormula>,
) -> Result<()> {
    water_activity.validate()?;
    stickiness.validate()?;
    if let Some(formula) = bulk_density {
        formula.validate()?;
    }
    if let Some(formula) = chamber_pressure {
        formula.validate()?;
    }
    if let Some(formula) = specific_energy {
        formula.validate()?;
    }
    Ok(())
}

fn require_finite(name: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::ModelConfig {
            message: format!("{name} coefficients must be finite"),
        })
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::ModelConfig {
            message: format!("{name} must be a finite positive number, got {value}"),
        })
    }
}
