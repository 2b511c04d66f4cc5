//! Analyzer configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DepsError, DepsResult};
use crate::tier::{MAX_TIER, MID_TIER};

/// Tunables for tier classification.
///
/// Identifier sanitization has no knobs here: its output has to match the
/// code emitter byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Tier for types missing from the table.
    pub default_tier: u32,
    /// Extra or replacement entries for the tier table, keyed by type.
    pub tier_overrides: BTreeMap<String, u32>,
    /// Types that never belong to a deployment group, on top of the
    /// built-in identity kinds.
    pub groupless_types: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_tier: MID_TIER,
            tier_overrides: BTreeMap::new(),
            groupless_types: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a YAML (or JSON) file.
    pub fn from_file(path: &Path) -> DepsResult<Self> {
        debug!("Loading analyzer config from {:?}", path);
        let content = fs::read_to_string(path)?;
        let config: AnalyzerConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_file(&self, path: &Path) -> DepsResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check that every tier is within range.
    pub fn validate(&self) -> DepsResult<()> {
        if self.default_tier > MAX_TIER {
            return Err(DepsError::InvalidConfiguration(format!(
                "default_tier {} exceeds maximum tier {}",
                self.default_tier, MAX_TIER
            )));
        }
        for (ty, tier) in &self.tier_overrides {
            if *tier > MAX_TIER {
                return Err(DepsError::InvalidConfiguration(format!(
                    "tier {} for '{}' exceeds maximum tier {}",
                    tier, ty, MAX_TIER
                )));
            }
            if ty.trim().is_empty() {
                return Err(DepsError::InvalidConfiguration(
                    "tier override with empty type".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: AnalyzerConfig =
            serde_yaml::from_str("tier_overrides:\n  Contoso.Widgets/gadgets: 2\n").unwrap();

        assert_eq!(config.default_tier, MID_TIER);
        assert_eq!(config.tier_overrides.get("Contoso.Widgets/gadgets"), Some(&2));
        assert!(config.groupless_types.is_empty());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graphiac.yaml");

        let mut config = AnalyzerConfig::default();
        config.groupless_types.push("Contoso.Directory/people".to_string());
        config.to_file(&path).unwrap();

        let loaded = AnalyzerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_out_of_range_tier_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graphiac.yaml");
        fs::write(&path, "default_tier: 42\n").unwrap();

        let err = AnalyzerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, DepsError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_out_of_range_override_is_rejected() {
        let mut config = AnalyzerConfig::default();
        config.tier_overrides.insert("A/b".to_string(), MAX_TIER + 1);
        assert!(config.validate().is_err());
    }
}
