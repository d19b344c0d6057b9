//! Material catalog loading and lookup.
//!
//! A catalog is a CSV table of raw materials and the intrinsic coefficients the
//! formula models weight by blend share. The catalog is configuration: the
//! built-in table is embedded at compile time, and alternative tables can be
//! loaded from disk or any reader.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

const BUILTIN_MATERIALS_CSV: &str = include_str!("../data/materials.csv");

static BUILTIN_CATALOG: Lazy<std::result::Result<MaterialCatalog, String>> = Lazy::new(|| {
    MaterialCatalog::from_reader(BUILTIN_MATERIALS_CSV.as_bytes()).map_err(|err| err.to_string())
});

/// Minimum similarity for a catalog name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A raw material and its intrinsic coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub expansion_coeff: f64,
    pub crisp_coeff: f64,
    pub flavor_label: String,
}

impl Material {
    /// Validate material attributes for correctness.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::CatalogValidation {
                message: "material name must not be empty".to_string(),
            });
        }
        if self.flavor_label.trim().is_empty() {
            return Err(Error::CatalogValidation {
                message: format!("flavor_label for material '{}' must not be empty", self.name),
            });
        }

        let fields = [
            (self.expansion_coeff, "expansion_coeff"),
            (self.crisp_coeff, "crisp_coeff"),
        ];

        for (value, field) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::CatalogValidation {
                    message: format!(
                        "{field} for material '{}' must be a finite positive number",
                        self.name
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Ordered collection of material definitions.
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
    index: HashMap<String, usize>,
    source: Option<PathBuf>,
}

impl MaterialCatalog {
    /// The catalog embedded in the library, parsed once per process.
    pub fn builtin() -> Result<&'static MaterialCatalog> {
        BUILTIN_CATALOG
            .as_ref()
            .map_err(|message| Error::CatalogValidation {
                message: message.clone(),
            })
    }

    /// Build a catalog from already constructed materials, keeping their order.
    pub fn from_materials(materials: Vec<Material>) -> Result<Self> {
        let mut catalog = Self::default();
        for material in materials {
            catalog.insert(material)?;
        }
        Ok(catalog)
    }

    /// Load a material catalog from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        info!(
            materials = catalog.len(),
            path = %path.display(),
            "loaded material catalog"
        );
        Ok(catalog)
    }

    /// Load a material catalog from a reader (e.g., file or in-memory buffer).
    ///
    /// Header matching is case-insensitive and accepts the short synonyms
    /// `expansion`, `crisp` and `flavor`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| Error::CatalogValidation {
                message: format!("failed to read material catalog headers: {err}"),
            })?
            .clone();

        let normalized_headers: Vec<String> = headers.iter().map(normalize_header).collect();

        let synonyms: &[(&str, &[&str])] = &[
            ("name", &["name", "material", "material_name"]),
            (
                "expansion_coeff",
                &["expansion_coeff", "expansion", "expansion_coefficient"],
            ),
            ("crisp_coeff", &["crisp_coeff", "crisp", "crisp_coefficient"]),
            ("flavor_label", &["flavor_label", "flavor", "flavour"]),
        ];

        let mut index_map: BTreeMap<&str, usize> = BTreeMap::new();
        for (canon, alts) in synonyms {
            let found = alts.iter().find_map(|alt| {
                normalized_headers
                    .iter()
                    .position(|header| header == &normalize_header(alt))
            });
            if let Some(position) = found {
                index_map.insert(*canon, position);
            }
        }

        let missing: Vec<&str> = synonyms
            .iter()
            .map(|(canon, _)| *canon)
            .filter(|canon| !index_map.contains_key(canon))
            .collect();

        if !missing.is_empty() {
            return Err(Error::CatalogValidation {
                message: format!(
                    "material catalog missing required columns: {}. Available: {}",
                    missing.join(", "),
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            });
        }

        let mut catalog = Self::default();

        // header is line 1
        for (offset, result) in csv_reader.records().enumerate() {
            let row = offset + 2;
            let record = result.map_err(|err| Error::CatalogValidation {
                message: err.to_string(),
            })?;

            let get = |field: &str| -> String {
                index_map
                    .get(field)
                    .and_then(|&i| record.get(i))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            };

            let name = get("name");
            let parse = |field: &str| -> Result<f64> {
                get(field)
                    .parse::<f64>()
                    .map_err(|err| Error::CatalogValidation {
                        message: format!(
                            "invalid {field} for material '{name}' at row {row}: {err}"
                        ),
                    })
            };

            let material = Material {
                expansion_coeff: parse("expansion_coeff")?,
                crisp_coeff: parse("crisp_coeff")?,
                flavor_label: get("flavor_label"),
                name,
            };
            catalog.insert(material)?;
        }

        if catalog.is_empty() {
            return Err(Error::CatalogValidation {
                message: "material catalog contains no materials".to_string(),
            });
        }

        Ok(catalog)
    }

    fn insert(&mut self, mut material: Material) -> Result<()> {
        material.name = material.name.trim().to_string();
        material.flavor_label = material.flavor_label.trim().to_string();
        material.validate()?;

        let key = normalize_name(&material.name);
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateMaterial { name: key });
        }
        self.index.insert(key, self.materials.len());
        self.materials.push(material);
        Ok(())
    }

    /// Look up a material by name (case-insensitive), failing with suggestions.
    pub fn lookup(&self, name: &str) -> Result<&Material> {
        self.lookup_position(name).map(|i| &self.materials[i])
    }

    /// Catalog position of a material, failing with suggestions when absent.
    pub fn lookup_position(&self, name: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| Error::UnknownMaterial {
            name: name.trim().to_string(),
            suggestions: self.fuzzy_matches(name, 3),
        })
    }

    /// Get a material by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.position(name).map(|i| &self.materials[i])
    }

    /// Position of a material within the catalog order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_name(name)).copied()
    }

    /// Material names in catalog order.
    pub fn all_names(&self) -> Vec<String> {
        self.materials.iter().map(|m| m.name.clone()).collect()
    }

    /// All materials in catalog order.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Catalog names most similar to `name`, best match first.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = normalize_name(name);
        let mut scored: Vec<(f64, &str)> = self
            .materials
            .iter()
            .map(|m| {
                (
                    strsim::jaro_winkler(&needle, &normalize_name(&m.name)),
                    m.name.as_str(),
                )
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Get the source path if the catalog was loaded from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Normalize a material name for case-insensitive lookup.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_header(header: &str) -> String {
    header
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
