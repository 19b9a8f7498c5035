// =============================================================================
// color.rs - Types de couleur et formatage
// color.rs - Color types and formatting
// =============================================================================

use bigcolor::BigColor;
use serde::{Deserialize, Serialize};

// =============================================================================
// STRUCTURES DE COULEUR
// COLOR STRUCTURES
// =============================================================================

/// Couleur RGBA 8 bits lue dans une capture
/// 8-bit RGBA color read from a capture
///
/// L'alpha ne sert qu'à la composition, jamais au code hexadécimal.
/// Alpha is only used for compositing, never in the hex code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Code "#RRGGBB" (alpha ignoré)
    /// "#RRGGBB" code (alpha ignored)
    pub fn hex(&self) -> String {
        format_hex_color(self.r, self.g, self.b)
    }
}

/// Couleur validée par l'utilisateur, construite une seule fois par session
/// Color committed by the user, built exactly once per session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickedColor {
    pub hex: String,
    pub viewport_x: f64,
    pub viewport_y: f64,
    /// Couleur source complète (pour RGB/HSL) / Full source color (for RGB/HSL)
    #[serde(skip)]
    pub rgba: Option<Rgba>,
}

impl PickedColor {
    pub fn new(color: Rgba, viewport_x: f64, viewport_y: f64) -> Self {
        Self {
            hex: color.hex(),
            viewport_x,
            viewport_y,
            rgba: Some(color),
        }
    }
}

// =============================================================================
// FONCTIONS DE FORMATAGE
// FORMATTING FUNCTIONS
// =============================================================================

/// Formate une couleur RGB en chaîne hexadécimale
/// Formats an RGB color as a hex string
///
/// # Returns
/// Chaîne au format "#RRGGBB" / String in "#RRGGBB" format
#[inline]
pub fn format_hex_color(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

#[inline]
pub fn format_rgb_color(r: u8, g: u8, b: u8) -> String {
    format!("rgb({}, {}, {})", r, g, b)
}

/// Formate une couleur en HSL (teinte en degrés, saturation et luminosité en %)
/// Formats a color as HSL (hue in degrees, saturation and lightness in %)
pub fn format_hsl_color(r: u8, g: u8, b: u8) -> String {
    let (h, s, l) = rgb_to_hsl(r, g, b);
    format!("hsl({}, {}%, {}%)", h.round() as u32 % 360, s.round() as u32, l.round() as u32)
}

/// Conversion RGB -> HSL, h dans [0, 360), s et l dans [0, 100]
/// RGB -> HSL conversion, h in [0, 360), s and l in [0, 100]
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;

    // Gris: pas de teinte ni de saturation / Gray: no hue, no saturation
    if d == 0.0 {
        return (0.0, 0.0, l * 100.0);
    }

    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s * 100.0, l * 100.0)
}

/// Détermine si le texte doit être noir ou blanc selon la couleur de fond
/// Determines if text should be black or white based on background color
///
/// # Returns
/// `true` si le texte doit être noir, `false` si blanc
/// `true` if text should be black, `false` if white
#[inline]
pub fn should_use_dark_text(color: Rgba) -> bool {
    !BigColor::from_rgb(color.r, color.g, color.b, 1.0).is_dark()
}

// =============================================================================
// TESTS
// =============================================================================
