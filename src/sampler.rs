// =============================================================================
// sampler.rs - Lecture d'une couleur dans la capture
// sampler.rs - Reading a color from the capture
// =============================================================================

use crate::bitmap::CapturedBitmap;
use crate::color::Rgba;
use crate::config::{OutOfRangePolicy, DEFAULT_SAMPLE_COLOR};
use crate::mapper::{to_bitmap_space, BitmapPoint};

/// Récupère la couleur RGBA à une adresse bitmap
/// Gets the RGBA color at a bitmap address
///
/// Hors limites: noir opaque par défaut, ou pixel le plus proche avec `Clamp`.
/// Jamais d'erreur.
/// Out of range: opaque black by default, or the nearest pixel with `Clamp`.
/// Never an error.
pub fn sample_color(bitmap: &CapturedBitmap, point: BitmapPoint, policy: OutOfRangePolicy) -> Rgba {
    let point = match policy {
        _ if point.in_range(bitmap) => point,
        OutOfRangePolicy::Clamp => point.clamped(bitmap),
        OutOfRangePolicy::DefaultColor => return DEFAULT_SAMPLE_COLOR,
    };
    bitmap.pixel(point.x, point.y).unwrap_or(DEFAULT_SAMPLE_COLOR)
}

/// Raccourci: convertit la position viewport puis échantillonne
/// Shortcut: maps the viewport position then samples
pub fn sample_at_viewport(
    bitmap: &CapturedBitmap,
    viewport_x: f64,
    viewport_y: f64,
    policy: OutOfRangePolicy,
) -> Rgba {
    sample_color(bitmap, to_bitmap_space(viewport_x, viewport_y, bitmap), policy)
}
