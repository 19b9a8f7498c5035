//! Configuration constants shared across the picker
//!
//! These values control the appearance and behavior of the magnifier and of
//! the session. `PickerSettings` lets a host override them from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::SettingsError;

/// Diameter of the circular magnifier (in display pixels)
pub const MAGNIFIER_DIAMETER: u32 = 150;

/// Size of one magnified source pixel (in display pixels)
/// patch size N = MAGNIFIER_DIAMETER / ZOOM_FACTOR, floored
/// Example: 150 / 10 = 15 source pixels across
pub const ZOOM_FACTOR: u32 = 10;

/// Thickness of the colored border around the magnifier (in pixels)
/// This border displays the current color being picked
pub const BORDER_WIDTH: f32 = 4.0;

/// Height of the hex label + swatch rendered below the magnifier
pub const LABEL_HEIGHT: f64 = 40.0;

/// Gap between the pointer and the floating widget
/// Keeps the pointer itself visible
pub const POINTER_GAP: f64 = 10.0;

/// Delay before the first capture, lets late page content finish painting
pub const SETTLE_DELAY_MS: u64 = 150;

/// Opacity of the widget while a recapture is in flight
pub const DIMMED_OPACITY: f32 = 0.4;

/// Number of viewport pixels moved by an arrow key
pub const NUDGE_PIXELS: f64 = 1.0;

/// Number of viewport pixels moved by Shift + arrow key
pub const SHIFT_NUDGE_PIXELS: f64 = 10.0;

/// Result popover size, used to keep it on screen near the click point
pub const POPOVER_WIDTH: f64 = 220.0;
pub const POPOVER_HEIGHT: f64 = 132.0;

/// Couleur substituée hors de la capture (noir opaque)
/// Color substituted outside the capture (opaque black)
pub const DEFAULT_SAMPLE_COLOR: Rgba = Rgba::new(0, 0, 0, 255);

/// Comportement d'un échantillon hors de la capture
/// Behavior of a sample that falls outside the capture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Renvoie `DEFAULT_SAMPLE_COLOR`
    /// Returns `DEFAULT_SAMPLE_COLOR`
    #[default]
    DefaultColor,
    /// Ramène l'adresse sur le pixel valide le plus proche
    /// Clamps the address to the nearest valid pixel
    Clamp,
}

/// Réglages du picker, surchargeables depuis un fichier JSON
/// Picker settings, overridable from a JSON file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    pub diameter: u32,
    pub zoom: u32,
    pub border_width: f32,
    pub label_height: f64,
    pub gap: f64,
    pub settle_delay_ms: u64,
    pub dimmed_opacity: f32,
    pub out_of_range: OutOfRangePolicy,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            diameter: MAGNIFIER_DIAMETER,
            zoom: ZOOM_FACTOR,
            border_width: BORDER_WIDTH,
            label_height: LABEL_HEIGHT,
            gap: POINTER_GAP,
            settle_delay_ms: SETTLE_DELAY_MS,
            dimmed_opacity: DIMMED_OPACITY,
            out_of_range: OutOfRangePolicy::default(),
        }
    }
}

impl PickerSettings {
    /// Charge les réglages depuis un fichier JSON (champs absents = défauts)
    /// Loads settings from a JSON file (missing fields = defaults)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Vérifie la cohérence des valeurs
    /// Checks the values are consistent
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.diameter == 0 {
            return Err(SettingsError::Invalid {
                field: "diameter",
                reason: "must be greater than zero".into(),
            });
        }
        if self.zoom == 0 || self.zoom > self.diameter {
            return Err(SettingsError::Invalid {
                field: "zoom",
                reason: format!("must be between 1 and the diameter ({})", self.diameter),
            });
        }
        if !(0.0..=1.0).contains(&self.dimmed_opacity) {
            return Err(SettingsError::Invalid {
                field: "dimmed_opacity",
                reason: "must be within 0.0..=1.0".into(),
            });
        }
        Ok(())
    }

    /// Number of source pixels shown across the magnifier (0 when zoom is 0)
    pub fn patch_size(&self) -> u32 {
        self.diameter.checked_div(self.zoom).unwrap_or(0)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_size() {
        let settings = PickerSettings::default();
        assert_eq!(settings.patch_size(), 15);
        assert_eq!(settings.settle_delay(), Duration::from_millis(150));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = PickerSettings::from_json(r#"{ "zoom": 15, "out_of_range": "clamp" }"#).unwrap();
        assert_eq!(settings.zoom, 15);
        assert_eq!(settings.patch_size(), 10);
        assert_eq!(settings.out_of_range, OutOfRangePolicy::Clamp);
        assert_eq!(settings.diameter, MAGNIFIER_DIAMETER);
    }

    #[test]
    fn test_rejects_zoom_larger_than_diameter() {
        let err = PickerSettings::from_json(r#"{ "diameter": 20, "zoom": 40 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "zoom", .. }));
    }

    #[test]
    fn test_rejects_bad_opacity() {
        let err = PickerSettings::from_json(r#"{ "dimmed_opacity": 1.5 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "dimmed_opacity", .. }));
    }

    #[test]
    fn test_zero_zoom_patch_size() {
        let settings = PickerSettings {
            zoom: 0,
            ..Default::default()
        };
        assert_eq!(settings.patch_size(), 0);
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "zoom", .. })
        ));
    }
}
