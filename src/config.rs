//! Typed options for the mesh builder and periodic connector.
//!
//! All option structs deserialize with `deny_unknown_fields`, so a misspelled
//! key in a configuration file is an error instead of a silently ignored
//! setting. Missing keys take the documented defaults.

use serde::{Deserialize, Serialize};

use crate::mesh_error::{MeshGenError, Result};

/// Options for [`MeshBuilder`](crate::algs::meshgen::MeshBuilder).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Collect exterior faces not claimed by any patch into a region of this name.
    pub untagged_patch: Option<String>,
    /// Validate mesh invariants after building (always on in debug builds).
    pub check_invariants: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            untagged_patch: None,
            check_invariants: true,
        }
    }
}

/// Options for [`PeriodicConnector`](crate::algs::periodic_link::PeriodicConnector).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeriodicOptions {
    /// Match tolerance as a fraction of the shortest boundary edge of the two patches.
    pub relative_tolerance: f64,
    /// Absolute tolerance used when both patches only have degenerate edges.
    pub absolute_tolerance: f64,
}

impl Default for PeriodicOptions {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-6,
            absolute_tolerance: 1e-12,
        }
    }
}

/// Options for the whole generation pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshGenConfig {
    pub build: BuildOptions,
    pub periodic: PeriodicOptions,
}

impl MeshGenConfig {
    /// Reject tolerances that cannot produce a meaningful match.
    pub fn validate(&self) -> Result<()> {
        self.periodic.validate()?;
        if let Some(name) = &self.build.untagged_patch {
            if name.is_empty() {
                return Err(MeshGenError::InvalidConfig(
                    "build.untagged_patch must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Parse a configuration from JSON-compatible serde input and validate it.
    pub fn from_value<'de, D>(deserializer: D) -> Result<Self>
    where
        D: serde::Deserializer<'de>,
    {
        let cfg = Self::deserialize(deserializer)
            .map_err(|e| MeshGenError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl PeriodicOptions {
    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.relative_tolerance) || self.relative_tolerance >= 1.0 {
            return Err(MeshGenError::InvalidConfig(format!(
                "periodic.relative_tolerance must lie in (0, 1), got {}",
                self.relative_tolerance
            )));
        }
        if !ok(self.absolute_tolerance) {
            return Err(MeshGenError::InvalidConfig(format!(
                "periodic.absolute_tolerance must be finite and > 0, got {}",
                self.absolute_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg: MeshGenConfig = serde_json::from_str(r#"{"periodic": {}}"#).unwrap();
        assert_eq!(cfg, MeshGenConfig::default());
        assert!(cfg.build.check_invariants);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MeshGenConfig::from_value(&mut serde_json::Deserializer::from_str(
            r#"{"build": {"check_invariant": false}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, MeshGenError::InvalidConfig(msg) if msg.contains("check_invariant")));
    }

    #[test]
    fn tolerance_bounds_are_checked() {
        let mut cfg = MeshGenConfig::default();
        cfg.periodic.relative_tolerance = 1.5;
        assert!(cfg.validate().is_err());
        cfg.periodic.relative_tolerance = 0.1;
        cfg.periodic.absolute_tolerance = 0.0;
        assert!(cfg.validate().is_err());
    }
}
