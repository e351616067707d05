use serde::Deserialize;

use crate::error::DedupError;

// ---------------------------------------------------------------------------
// Detection config
// ---------------------------------------------------------------------------

/// Detection parameters, supplied by an external collaborator. Identity
/// columns name the composite key (name, date-of-birth, academic year)
/// against the dataset's effective header.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupeConfig {
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_dob_column")]
    pub dob_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default)]
    pub fuzzy_match: bool,
    #[serde(default = "default_threshold")]
    pub fuzzy_threshold: u8,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub similarity: SimilarityBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBackend {
    EditDistance,
    PrefixOverlap,
}

impl Default for SimilarityBackend {
    fn default() -> Self {
        Self::EditDistance
    }
}

fn default_name_column() -> String {
    "StudentName".to_string()
}

fn default_dob_column() -> String {
    "DateOfBirth".to_string()
}

fn default_year_column() -> String {
    "AcademicYear".to_string()
}

fn default_threshold() -> u8 {
    90
}

fn default_chunk_size() -> usize {
    10_000
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            name_column: default_name_column(),
            dob_column: default_dob_column(),
            year_column: default_year_column(),
            fuzzy_match: false,
            fuzzy_threshold: default_threshold(),
            chunk_size: default_chunk_size(),
            similarity: SimilarityBackend::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl DedupeConfig {
    pub fn from_toml(input: &str) -> Result<Self, DedupError> {
        let config: DedupeConfig =
            toml::from_str(input).map_err(|e| DedupError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        if !(50..=100).contains(&self.fuzzy_threshold) {
            return Err(DedupError::ConfigValidation(format!(
                "fuzzy_threshold must be in 50..=100, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.chunk_size == 0 {
            return Err(DedupError::ConfigValidation("chunk_size must be > 0".into()));
        }
        for (label, column) in [
            ("name_column", &self.name_column),
            ("dob_column", &self.dob_column),
            ("year_column", &self.year_column),
        ] {
            if column.trim().is_empty() {
                return Err(DedupError::ConfigValidation(format!("{label} must not be empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DedupeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.fuzzy_threshold, 90);
        assert!(!config.fuzzy_match);
    }

    #[test]
    fn from_toml_with_defaults() {
        let config = DedupeConfig::from_toml(
            r#"
fuzzy_match = true
fuzzy_threshold = 85
"#,
        )
        .unwrap();
        assert!(config.fuzzy_match);
        assert_eq!(config.fuzzy_threshold, 85);
        assert_eq!(config.name_column, "StudentName");
        assert_eq!(config.similarity, SimilarityBackend::EditDistance);
    }

    #[test]
    fn threshold_bounds_enforced() {
        let low = DedupeConfig { fuzzy_threshold: 49, ..Default::default() };
        assert!(matches!(low.validate(), Err(DedupError::ConfigValidation(_))));
        let edge = DedupeConfig { fuzzy_threshold: 50, ..Default::default() };
        assert!(edge.validate().is_ok());
        let top = DedupeConfig { fuzzy_threshold: 100, ..Default::default() };
        assert!(top.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let config = DedupeConfig { chunk_size: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
