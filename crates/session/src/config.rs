use rosterkit_dedup::DedupeConfig;
use serde::Deserialize;

use crate::error::SessionError;

/// Session configuration, supplied by the external caller. The detection
/// parameters (identity columns, fuzzy flag and threshold, chunk size) are
/// the engine's; `auto_classify` additionally runs the field classifier over
/// the ingested header so arbitrary source columns resolve to the canonical
/// identity names.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_auto_classify")]
    pub auto_classify: bool,
    #[serde(flatten)]
    pub dedupe: DedupeConfig,
}

fn default_auto_classify() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_classify: true,
            dedupe: DedupeConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml(input: &str) -> Result<Self, SessionError> {
        let config: SessionConfig =
            toml::from_str(input).map_err(|e| SessionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        self.dedupe
            .validate()
            .map_err(|e| SessionError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(config.auto_classify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flattened_toml() {
        let config = SessionConfig::from_toml(
            r#"
auto_classify = false
fuzzy_match = true
fuzzy_threshold = 88
chunk_size = 2000
"#,
        )
        .unwrap();
        assert!(!config.auto_classify);
        assert!(config.dedupe.fuzzy_match);
        assert_eq!(config.dedupe.fuzzy_threshold, 88);
        assert_eq!(config.dedupe.chunk_size, 2000);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let err = SessionConfig::from_toml("fuzzy_threshold = 40\n").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
