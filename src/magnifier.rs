//! =============================================================================
//! MAGNIFIER.RS - Rendu de la loupe circulaire
//! MAGNIFIER.RS - Circular magnifier rendering
//! =============================================================================
//!
//! Dessine une grille N x N de pixels source agrandis autour du pointeur sur
//! une surface tiny-skia circulaire.
//! Draws an N x N grid of magnified source pixels around the pointer onto a
//! circular tiny-skia surface.
//!
//! # Étapes / Steps
//! 1. Fond neutre / Neutral background
//! 2. Damier (visible sous les pixels semi-transparents) / Checkerboard
//! 3. Pixels source composités / Composited source pixels
//! 4. Lignes de grille / Grid lines
//! 5. Pixel central: pastille, libellé, bordure, réticule
//!    Center pixel: swatch, label, border, reticle

use tiny_skia::{Color, FillRule, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::bitmap::CapturedBitmap;
use crate::color::{should_use_dark_text, Rgba};
use crate::config::{OutOfRangePolicy, PickerSettings};
use crate::mapper::to_bitmap_space;
use crate::sampler::{sample_at_viewport, sample_color};

// =============================================================================
// COULEURS DU RENDU
// RENDER COLORS
// =============================================================================

const BASE_COLOR: Rgba = Rgba::opaque(128, 128, 128);
const CHECKER_DARK: Rgba = Rgba::opaque(204, 204, 204);
const CHECKER_LIGHT: Rgba = Rgba::opaque(255, 255, 255);
/// Lignes fines et peu opaques / Thin, low-opacity lines
const GRID_LINE: Rgba = Rgba::new(0, 0, 0, 26);
const RETICLE_DARK: Rgba = Rgba::opaque(0x30, 0x30, 0x30);
const RETICLE_LIGHT: Rgba = Rgba::opaque(0xF0, 0xF0, 0xF0);

#[inline]
fn skia(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid(color: Rgba, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia(color));
    paint.anti_alias = anti_alias;
    paint
}

// =============================================================================
// ÉTAT DE LA LOUPE
// MAGNIFIER STATE
// =============================================================================

/// Paramètres dérivés du rendu (non persistés)
/// Derived render parameters (not persisted)
#[derive(Clone, Debug, PartialEq)]
pub struct MagnifierState {
    /// Taille d'un pixel source à l'écran / On-screen size of one source pixel
    pub zoom: u32,
    /// N: pixels source sur un diamètre / N: source pixels across
    pub patch_size: u32,
    pub diameter: u32,
    /// Dernière couleur du pixel central / Last center pixel color
    pub current: Option<Rgba>,
}

/// Libellé et pastille affichés sous la loupe
/// Label and swatch displayed below the magnifier
#[derive(Clone, Debug, PartialEq)]
pub struct MagnifierLabel {
    pub hex: String,
    pub swatch: Rgba,
    /// Texte sombre sur fond clair / Dark text on light swatch
    pub dark_text: bool,
}

/// Rend la loupe dans sa propre surface
/// Renders the magnifier into its own surface
pub struct MagnifierRenderer {
    surface: Pixmap,
    /// Masque circulaire réutilisé à chaque rendu / Circular mask reused every tick
    clip: Mask,
    state: MagnifierState,
    label: Option<MagnifierLabel>,
    border_width: f32,
    policy: OutOfRangePolicy,
}

impl MagnifierRenderer {
    /// `None` si le diamètre ne permet pas de créer une surface
    /// `None` when the diameter cannot back a surface
    pub fn new(settings: &PickerSettings) -> Option<Self> {
        let diameter = settings.diameter;
        let surface = Pixmap::new(diameter, diameter)?;
        let mut clip = Mask::new(diameter, diameter)?;
        let radius = diameter as f32 / 2.0;
        let circle = PathBuilder::from_circle(radius, radius, radius)?;
        clip.fill_path(&circle, FillRule::Winding, true, Transform::identity());

        Some(Self {
            surface,
            clip,
            state: MagnifierState {
                zoom: settings.zoom,
                patch_size: settings.patch_size(),
                diameter,
                current: None,
            },
            label: None,
            border_width: settings.border_width,
            policy: settings.out_of_range,
        })
    }

    pub fn state(&self) -> &MagnifierState {
        &self.state
    }

    pub fn label(&self) -> Option<&MagnifierLabel> {
        self.label.as_ref()
    }

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    /// Dernière couleur échantillonnée au centre / Last sampled center color
    pub fn current_color(&self) -> Option<Rgba> {
        self.state.current
    }

    /// Coin haut-gauche de la grille, centrée dans le cercle
    /// Grid top-left corner, centered in the circle
    fn grid_origin(&self) -> f32 {
        let grid = (self.state.patch_size * self.state.zoom) as f32;
        ((self.state.diameter as f32 - grid) / 2.0).floor()
    }

    /// Redessine la loupe pour une position du pointeur et renvoie la couleur centrale
    /// Redraws the magnifier for a pointer position and returns the center color
    pub fn render(&mut self, bitmap: &CapturedBitmap, pointer_x: f64, pointer_y: f64) -> Rgba {
        let n = self.state.patch_size as i64;
        let half = n / 2;
        let zoom = self.state.zoom as f32;
        let origin = self.grid_origin();
        let grid_size = n as f32 * zoom;

        // ÉTAPE 1: fond neutre / STEP 1: neutral background
        self.surface.fill(Color::TRANSPARENT);
        self.fill(0.0, 0.0, self.state.diameter as f32, self.state.diameter as f32, BASE_COLOR);

        for j in 0..n {
            for i in 0..n {
                let x = origin + i as f32 * zoom;
                let y = origin + j as f32 * zoom;

                // ÉTAPE 2: damier / STEP 2: checkerboard
                let checker = if (i + j) % 2 == 0 { CHECKER_DARK } else { CHECKER_LIGHT };
                self.fill(x, y, zoom, zoom, checker);

                // ÉTAPE 3: pixel source, alpha composité par-dessus le damier
                // STEP 3: source pixel, alpha-composited over the checker
                let src = to_bitmap_space(
                    pointer_x + (i - half) as f64,
                    pointer_y + (j - half) as f64,
                    bitmap,
                );
                let color = sample_color(bitmap, src, self.policy);
                if color.a > 0 {
                    self.fill(x, y, zoom, zoom, color);
                }
            }
        }

        // ÉTAPE 4: lignes de grille / STEP 4: grid lines
        for k in 0..=n {
            let offset = origin + k as f32 * zoom;
            self.fill(offset, origin, 1.0, grid_size, GRID_LINE);
            self.fill(origin, offset, grid_size, 1.0, GRID_LINE);
        }

        // ÉTAPE 5: pixel central, appel indépendant aux coordonnées exactes
        // STEP 5: center pixel, independent call at the exact coordinates
        let current = sample_at_viewport(bitmap, pointer_x, pointer_y, self.policy);
        let dark_text = should_use_dark_text(current);

        let reticle = if dark_text { RETICLE_DARK } else { RETICLE_LIGHT };
        let center = origin + half as f32 * zoom;
        self.stroke_rect(center, center, zoom, zoom, reticle, 1.5);
        self.stroke_border(current);

        self.state.current = Some(current);
        self.label = Some(MagnifierLabel {
            hex: current.hex(),
            swatch: current,
            dark_text,
        });
        current
    }

    /// Remplit un rectangle, découpé par le cercle, sans anti-aliasing
    /// Fills a rectangle, clipped by the circle, without anti-aliasing
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        self.surface.fill_rect(rect, &solid(color, false), Transform::identity(), Some(&self.clip));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba, width: f32) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke { width, ..Stroke::default() };
        self.surface
            .stroke_path(&path, &solid(color, true), &stroke, Transform::identity(), Some(&self.clip));
    }

    /// Bordure extérieure de la couleur courante
    /// Outer border in the current color
    fn stroke_border(&mut self, color: Rgba) {
        if self.border_width <= 0.0 {
            return;
        }
        let radius = self.state.diameter as f32 / 2.0;
        let Some(ring) = PathBuilder::from_circle(radius, radius, radius - self.border_width / 2.0) else {
            return;
        };
        let stroke = Stroke {
            width: self.border_width,
            ..Stroke::default()
        };
        let opaque = Rgba::opaque(color.r, color.g, color.b);
        self.surface
            .stroke_path(&ring, &solid(opaque, true), &stroke, Transform::identity(), Some(&self.clip));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Viewport;

    fn uniform(color: Rgba, size: u32) -> CapturedBitmap {
        let pixels = [color.r, color.g, color.b, color.a].repeat((size * size) as usize);
        CapturedBitmap::from_rgba(size, size, pixels, Viewport::new(size as f64, size as f64)).unwrap()
    }

    fn pixel(renderer: &MagnifierRenderer, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = renderer.surface().pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn close(a: u8, b: u8) -> bool {
        (a as i16 - b as i16).abs() <= 2
    }

    #[test]
    fn test_state_dimensions() {
        let renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        assert_eq!(renderer.state().patch_size, 15);
        assert_eq!(renderer.state().diameter, 150);
        assert_eq!(renderer.current_color(), None);
    }

    #[test]
    fn test_opaque_cells_and_label() {
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        let color = renderer.render(&uniform(Rgba::opaque(10, 20, 30), 64), 32.0, 32.0);
        assert_eq!(color.hex(), "#0A141E");

        // Cellule (6, 7), loin des lignes / Cell (6, 7), away from grid lines
        assert_eq!(pixel(&renderer, 65, 75), (10, 20, 30, 255));

        let label = renderer.label().unwrap();
        assert_eq!(label.hex, "#0A141E");
        assert!(!label.dark_text);
        assert_eq!(renderer.current_color(), Some(Rgba::opaque(10, 20, 30)));
    }

    #[test]
    fn test_transparent_pixels_show_checkerboard() {
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        renderer.render(&uniform(Rgba::new(0, 0, 0, 0), 64), 32.0, 32.0);

        // (6 + 6) pair -> foncé / even -> dark
        assert_eq!(pixel(&renderer, 65, 65), (204, 204, 204, 255));
        // (6 + 7) impair -> clair / odd -> light
        assert_eq!(pixel(&renderer, 65, 75), (255, 255, 255, 255));
    }

    #[test]
    fn test_partial_alpha_composites_over_checker() {
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        renderer.render(&uniform(Rgba::new(255, 0, 0, 128), 64), 32.0, 32.0);

        // Rouge à ~50% sur blanc / ~50% red over white
        let (r, g, b, a) = pixel(&renderer, 65, 75);
        assert_eq!((r, a), (255, 255));
        assert!(close(g, 127) && close(b, 127), "got ({r}, {g}, {b})");
    }

    #[test]
    fn test_outside_circle_stays_transparent() {
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        renderer.render(&uniform(Rgba::opaque(10, 20, 30), 64), 32.0, 32.0);
        assert_eq!(pixel(&renderer, 0, 0).3, 0);
        assert_eq!(pixel(&renderer, 149, 149).3, 0);
    }

    #[test]
    fn test_border_takes_current_color() {
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        renderer.render(&uniform(Rgba::opaque(200, 0, 0), 64), 32.0, 32.0);
        let (r, g, b, _) = pixel(&renderer, 75, 1);
        assert!(close(r, 200) && close(g, 0) && close(b, 0), "got ({r}, {g}, {b})");
    }

    #[test]
    fn test_edge_cells_use_default_color() {
        // Pointeur dans le coin: la moitié haut-gauche de la grille sort de la capture
        // Pointer in the corner: the top-left half of the grid leaves the capture
        let mut renderer = MagnifierRenderer::new(&PickerSettings::default()).unwrap();
        renderer.render(&uniform(Rgba::opaque(250, 250, 250), 64), 0.0, 0.0);
        // Cellule (6, 6) -> source (-1, -1) hors limites / out of range
        assert_eq!(pixel(&renderer, 65, 65), (0, 0, 0, 255));
        // Cellule (8, 8) -> source (1, 1)
        assert_eq!(pixel(&renderer, 85, 85), (250, 250, 250, 255));
    }
}
