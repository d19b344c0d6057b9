use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the extrusion simulation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Every variant is recoverable by the caller and carries enough context
/// (offending value, accepted range, observed total) to re-prompt for input.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a material name is not present in the catalog.
    #[error("unknown material: {name}{}", format_suggestions(.suggestions))]
    UnknownMaterial {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a numeric input falls outside its accepted inclusive range.
    #[error("{field} = {value} is outside the accepted range [{min}, {max}]")]
    InvalidRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Raised when the non-zero blend ratios do not add up to exactly 100 percent.
    #[error("blend ratios must sum to 100%, got {total}%")]
    BlendNotNormalized { total: f64 },

    /// Raised when a comparison needs more runs than the history holds.
    #[error("history comparison needs at least two runs, found {entries}")]
    InsufficientHistory { entries: usize },

    /// Raised when a model version tag is not registered.
    #[error("unknown model version: {version} (available: {})", .available.join(", "))]
    UnknownModel {
        version: String,
        available: Vec<String>,
    },

    /// Raised when material catalog data fails validation.
    #[error("invalid material catalog: {message}")]
    CatalogValidation { message: String },

    /// Raised when duplicate material names are encountered during catalog load.
    #[error("duplicate material name encountered: {name}")]
    DuplicateMaterial { name: String },

    /// Raised when a model configuration is rejected.
    #[error("invalid model configuration: {message}")]
    ModelConfig { message: String },

    /// Raised when a batch row lacks a required column.
    #[error("missing required column: {column}")]
    MissingColumn { column: String },

    /// Raised when a batch cell cannot be parsed as a number.
    #[error("invalid value '{value}' in column {column}")]
    InvalidCell { column: String, value: String },

    /// Raised when a catalog or model file cannot be found.
    #[error("file not found at {path}")]
    FileNotFound { path: PathBuf },

    /// Wrapper for CSV reader/writer errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_material_lists_suggestions() {
        let err = Error::UnknownMaterial {
            name: "cron".to_string(),
            suggestions: vec!["corn".to_string()],
        };
        assert_eq!(err.to_string(), "unknown material: cron. Did you mean 'corn'?");

        let err = Error::UnknownMaterial {
            name: "weat".to_string(),
            suggestions: vec!["wheat".to_string(), "whole_wheat".to_string()],
        };
        assert!(err
            .to_string()
            .ends_with("Did you mean one of: 'wheat', 'whole_wheat'?"));
    }

    #[test]
    fn blend_total_is_reported() {
        let err = Error::BlendNotNormalized { total: 90.0 };
        assert_eq!(err.to_string(), "blend ratios must sum to 100%, got 90%");
    }
}
