//! Scoring presets
//!
//! The audit scripts this tool replaces never agreed on penalty weights, so
//! the weighting is selectable. `standard` is the default used by most runs.

use crate::audit::scoring::{GradeThresholds, ScoringWeights};

/// Available scoring presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Critical×20, High×10, Medium×3, Low×1
    Standard,
    /// Critical×25, otherwise standard
    Swiss,
}

impl Preset {
    /// Get preset from name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "standard" | "default" => Some(Self::Standard),
            "swiss" | "suisse" | "swissmade" => Some(Self::Swiss),
            _ => None,
        }
    }

    /// Get the name of the preset
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Swiss => "swiss",
        }
    }

    pub fn weights(&self) -> ScoringWeights {
        match self {
            Self::Standard => ScoringWeights::default(),
            Self::Swiss => ScoringWeights {
                critical: 25,
                ..ScoringWeights::default()
            },
        }
    }

    pub fn thresholds(&self) -> GradeThresholds {
        GradeThresholds::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_name() {
        assert_eq!(Preset::from_name("standard"), Some(Preset::Standard));
        assert_eq!(Preset::from_name("DEFAULT"), Some(Preset::Standard));
        assert_eq!(Preset::from_name("swiss"), Some(Preset::Swiss));
        assert!(Preset::from_name("invalid").is_none());
    }

    #[test]
    fn test_preset_weights() {
        assert_eq!(Preset::Standard.weights().critical, 20);
        assert_eq!(Preset::Swiss.weights().critical, 25);
        assert_eq!(Preset::Swiss.weights().high, 10);
    }

    #[test]
    fn test_preset_name_round_trip() {
        for preset in [Preset::Standard, Preset::Swiss] {
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
        }
    }
}
