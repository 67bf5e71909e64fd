//! Runtime tuning for the world core
//!
//! The caps bound per-frame work on any segment graph, including cyclic or
//! malformed ones. They default to the values the shipped levels were built
//! against and can be overridden from a RON file.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::math::PLANE_DIST_TOLERANCE;
use crate::world::LevelError;

fn default_tolerance() -> f32 { PLANE_DIST_TOLERANCE }
fn default_max_visible() -> usize { 500 }
fn default_trace_depth() -> usize { 20 }
fn default_mover_iterations() -> usize { 4 }

/// Caps and tolerance shared by the locator, mover and visibility pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Distance band treated as "on the plane" (world units)
    #[serde(default = "default_tolerance")]
    pub plane_tolerance: f32,
    /// Upper bound on segments in one frame's visible set
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
    /// Deepest recursion the point tracer may reach before giving up
    #[serde(default = "default_trace_depth")]
    pub trace_depth: usize,
    /// Resolution passes per movement step
    #[serde(default = "default_mover_iterations")]
    pub mover_iterations: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            plane_tolerance: default_tolerance(),
            max_visible: default_max_visible(),
            trace_depth: default_trace_depth(),
            mover_iterations: default_mover_iterations(),
        }
    }
}

impl CoreConfig {
    /// Reject values that would make every query fail or never terminate
    pub fn validate(&self) -> Result<(), LevelError> {
        if !self.plane_tolerance.is_finite() || self.plane_tolerance < 0.0 {
            return Err(LevelError::Validation(format!(
                "config: invalid plane_tolerance {}", self.plane_tolerance
            )));
        }
        if self.max_visible == 0 {
            return Err(LevelError::Validation("config: max_visible must be at least 1".into()));
        }
        if self.mover_iterations == 0 {
            return Err(LevelError::Validation("config: mover_iterations must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse a config from RON text; missing fields take their defaults
pub fn load_config_from_str(s: &str) -> Result<CoreConfig, LevelError> {
    let config: CoreConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CoreConfig, LevelError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.max_visible, 500);
        assert_eq!(config.trace_depth, 20);
        assert_eq!(config.mover_iterations, 4);
        assert!((config.plane_tolerance - 0.003_814_697).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = load_config_from_str("(trace_depth: 8)").unwrap();
        assert_eq!(config.trace_depth, 8);
        assert_eq!(config.max_visible, 500);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        assert!(matches!(
            load_config_from_str("(mover_iterations: 0)"),
            Err(LevelError::Validation(_))
        ));
    }
}
