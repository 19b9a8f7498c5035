// =============================================================================
// mapper.rs - Conversion viewport -> bitmap
// mapper.rs - Viewport to bitmap conversion
// =============================================================================
//
// Seul endroit où les coordonnées sont converties; l'échantillonnage et le
// rendu passent tous deux par `to_bitmap_space`.
// The only place coordinates are converted; sampling and rendering both go
// through `to_bitmap_space`.

use crate::bitmap::CapturedBitmap;

/// Adresse d'un pixel dans la capture (peut être hors limites)
/// Pixel address in the capture (may be out of range)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapPoint {
    pub x: i64,
    pub y: i64,
}

impl BitmapPoint {
    /// Vrai si l'adresse est dans `[0, width) x [0, height)`
    /// True when the address lies in `[0, width) x [0, height)`
    pub fn in_range(&self, bitmap: &CapturedBitmap) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < bitmap.width() as i64 && self.y < bitmap.height() as i64
    }

    /// Ramène l'adresse sur le pixel valide le plus proche
    /// Clamps the address to the nearest valid pixel
    pub fn clamped(&self, bitmap: &CapturedBitmap) -> Self {
        Self {
            x: self.x.clamp(0, bitmap.width() as i64 - 1),
            y: self.y.clamp(0, bitmap.height() as i64 - 1),
        }
    }
}

/// `floor(x * scale_x)`, `floor(y * scale_y)`
#[inline]
pub fn to_bitmap_space(viewport_x: f64, viewport_y: f64, bitmap: &CapturedBitmap) -> BitmapPoint {
    BitmapPoint {
        x: (viewport_x * bitmap.scale_x()).floor() as i64,
        y: (viewport_y * bitmap.scale_y()).floor() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Viewport;

    fn blank(width: u32, height: u32, viewport: Viewport) -> CapturedBitmap {
        CapturedBitmap::from_rgba(width, height, vec![0; (width * height * 4) as usize], viewport).unwrap()
    }

    #[test]
    fn test_uniform_scale() {
        let bitmap = blank(1000, 600, Viewport::new(500.0, 300.0));
        assert_eq!(to_bitmap_space(100.0, 50.0, &bitmap), BitmapPoint { x: 200, y: 100 });
    }

    #[test]
    fn test_non_uniform_scale() {
        let bitmap = blank(300, 120, Viewport::new(200.0, 40.0));
        assert_eq!(to_bitmap_space(40.0, 10.0, &bitmap), BitmapPoint { x: 60, y: 30 });
    }

    #[test]
    fn test_floors_fractions_and_negatives() {
        let bitmap = blank(300, 120, Viewport::new(200.0, 40.0));
        // 1.5 * 1.5 = 2.25 -> 2, 0.2 * 3.0 = 0.6 -> 0
        assert_eq!(to_bitmap_space(1.5, 0.2, &bitmap), BitmapPoint { x: 2, y: 0 });
        // -0.5 * 1.5 = -0.75 -> -1
        assert_eq!(to_bitmap_space(-0.5, 0.0, &bitmap).x, -1);
    }

    #[test]
    fn test_range_and_clamp() {
        let bitmap = blank(10, 10, Viewport::new(10.0, 10.0));
        assert!(BitmapPoint { x: 9, y: 0 }.in_range(&bitmap));
        assert!(!BitmapPoint { x: 10, y: 0 }.in_range(&bitmap));
        assert!(!BitmapPoint { x: 0, y: -1 }.in_range(&bitmap));
        assert_eq!(BitmapPoint { x: 12, y: -3 }.clamped(&bitmap), BitmapPoint { x: 9, y: 0 });
    }
}
