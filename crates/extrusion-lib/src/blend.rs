//! Validated material blends.
//!
//! A blend is built fresh for every simulation request from a raw
//! `name -> percent` mapping and is immutable afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Material, MaterialCatalog};
use crate::error::{Error, Result};

/// Unvalidated `material name -> ratio in percent` mapping as entered by a caller.
pub type RawBlend = BTreeMap<String, f64>;

/// Required total of all non-zero blend ratios.
pub const BLEND_TOTAL_PCT: f64 = 100.0;

/// Tolerance for floating representation noise when summing ratios.
pub const BLEND_TOTAL_TOLERANCE: f64 = 1e-9;

/// One material share within a blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendComponent {
    pub material: Material,
    /// Share of the blend in percent.
    pub ratio: f64,
}

/// A validated weighted mixture of catalog materials whose ratios sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blend {
    components: Vec<BlendComponent>,
    total: f64,
}

impl Blend {
    /// Validate a raw ratio mapping against the catalog.
    ///
    /// Rules are applied in order: every name must exist in the catalog, every
    /// ratio must be finite and non-negative, zero ratios are dropped, and the
    /// remaining ratios must add up to exactly 100. Entries naming the same
    /// material (case-insensitively) are merged.
    pub fn validate<I, K>(raw: I, catalog: &MaterialCatalog) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let entries: Vec<(K, f64)> = raw.into_iter().collect();

        let mut resolved = Vec::with_capacity(entries.len());
        for (name, ratio) in &entries {
            let position = catalog.lookup_position(name.as_ref())?;
            resolved.push((position, *ratio, name.as_ref()));
        }

        for (_, ratio, name) in &resolved {
            if !ratio.is_finite() || *ratio < 0.0 {
                return Err(Error::InvalidRange {
                    field: format!("ratio[{}]", name.trim()),
                    value: *ratio,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }

        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (position, ratio, _) in resolved {
            if ratio > 0.0 {
                *merged.entry(position).or_insert(0.0) += ratio;
            }
        }

        let components: Vec<BlendComponent> = merged
            .into_iter()
            .map(|(position, ratio)| BlendComponent {
                material: catalog.materials()[position].clone(),
                ratio,
            })
            .collect();

        let total: f64 = components.iter().map(|c| c.ratio).sum();
        if components.is_empty() || (total - BLEND_TOTAL_PCT).abs() > BLEND_TOTAL_TOLERANCE {
            return Err(Error::BlendNotNormalized { total });
        }

        Ok(Self { components, total })
    }

    /// Components in catalog order.
    pub fn components(&self) -> &[BlendComponent] {
        &self.components
    }

    /// Sum of all component ratios (100 for every validated blend).
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Ratio in percent of the named material, if it is part of the blend.
    pub fn ratio(&self, name: &str) -> Option<f64> {
        let name = name.trim();
        self.components
            .iter()
            .find(|c| c.material.name.eq_ignore_ascii_case(name))
            .map(|c| c.ratio)
    }

    /// Each material paired with `ratio / total`.
    ///
    /// The division uses the observed total so the weights sum to 1.0 even if
    /// the ratios carry representation noise.
    pub fn weights(&self) -> Vec<(&Material, f64)> {
        self.components
            .iter()
            .map(|c| (&c.material, c.ratio / self.total))
            .collect()
    }

    /// `(material name, ratio)` pairs for tabular export.
    pub fn ratios(&self) -> Vec<(&str, f64)> {
        self.components
            .iter()
            .map(|c| (c.material.name.as_str(), c.ratio))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static MaterialCatalog {
        MaterialCatalog::builtin().expect("builtin catalog")
    }

    #[test]
    fn accepts_exact_hundred() {
        let blend = Blend::validate([("corn", 60.0), ("wheat", 40.0)], catalog())
            .expect("60/40 is valid");
        assert_eq!(blend.components().len(), 2);
        assert_eq!(blend.ratio("Corn"), Some(60.0));
        assert_eq!(blend.total(), 100.0);
    }

    #[test]
    fn reports_observed_total() {
        let err = Blend::validate([("corn", 60.0), ("wheat", 30.0)], catalog())
            .expect_err("90 is not normalized");
        match err {
            Error::BlendNotNormalized { total } => assert_eq!(total, 90.0),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unknown_material_wins_over_other_failures() {
        let err = Blend::validate([("corn", -5.0), ("cron", 10.0)], catalog())
            .expect_err("unknown name");
        match err {
            Error::UnknownMaterial { name, suggestions } => {
                assert_eq!(name, "cron");
                assert!(suggestions.contains(&"corn".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn negative_ratio_is_out_of_range() {
        let err = Blend::validate([("corn", 110.0), ("wheat", -10.0)], catalog())
            .expect_err("negative ratio");
        assert!(matches!(err, Error::InvalidRange { value, .. } if value == -10.0));
    }

    #[test]
    fn zero_ratios_are_dropped() {
        let blend = Blend::validate([("corn", 100.0), ("rye", 0.0)], catalog())
            .expect("zero entries ignored");
        assert_eq!(blend.components().len(), 1);
        assert_eq!(blend.ratio("rye"), None);
    }

    #[test]
    fn all_zero_blend_is_not_normalized() {
        let err = Blend::validate([("corn", 0.0)], catalog()).expect_err("empty blend");
        assert!(matches!(err, Error::BlendNotNormalized { total } if total == 0.0));
    }

    #[test]
    fn components_follow_catalog_order_and_merge_duplicates() {
        let blend = Blend::validate(
            [("whole_wheat", 20.0), ("Corn", 30.0), ("corn", 50.0)],
            catalog(),
        )
        .expect("merged blend");
        let names: Vec<&str> = blend.ratios().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["corn", "whole_wheat"]);
        assert_eq!(blend.ratio("corn"), Some(80.0));
    }

    #[test]
    fn weights_sum_to_one() {
        let blend = Blend::validate(
            [("corn", 33.3), ("wheat", 33.3), ("rye", 33.4)],
            catalog(),
        )
        .expect("thirds");
        let sum: f64 = blend.weights().iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
