// =============================================================================
// bitmap.rs - Capture d'écran décodée
// bitmap.rs - Decoded screen capture
// =============================================================================
//
// Une capture est immuable: une recapture remplace l'objet entier.
// A capture is immutable: a recapture replaces the whole object.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::color::Rgba;
use crate::error::CaptureError;

/// Dimensions logiques de la zone visible (pixels CSS)
/// Logical size of the visible area (CSS pixels)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Capture décodée en RGBA avec ses facteurs d'échelle
/// Capture decoded as RGBA with its scale factors
///
/// `scale_x` / `scale_y` sont calculés une seule fois ici; le mapper les
/// réutilise tels quels pour l'échantillonnage et le rendu.
/// `scale_x` / `scale_y` are computed once here; the mapper reuses them as-is
/// for both sampling and rendering.
#[derive(Clone, Debug)]
pub struct CapturedBitmap {
    width: u32,
    height: u32,
    /// Pixels RGBA, ligne par ligne / RGBA pixels, row by row
    pixels: Vec<u8>,
    scale_x: f64,
    scale_y: f64,
}

impl CapturedBitmap {
    /// Construit une capture depuis un buffer RGBA brut
    /// Builds a capture from a raw RGBA buffer
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        viewport: Viewport,
    ) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyImage);
        }
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return Err(CaptureError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CaptureError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        let scale_x = width as f64 / viewport.width;
        let scale_y = height as f64 / viewport.height;
        debug!(width, height, scale_x, scale_y, "capture measured against viewport");

        Ok(Self {
            width,
            height,
            pixels,
            scale_x,
            scale_y,
        })
    }

    /// Décode une data URI (`data:image/png;base64,...`) renvoyée par le broker
    /// Decodes a data URI (`data:image/png;base64,...`) returned by the broker
    pub fn from_data_uri(uri: &str, viewport: Viewport) -> Result<Self, CaptureError> {
        let bytes = decode_data_uri(uri)?;
        Self::from_encoded(&bytes, viewport)
    }

    /// Décode une image encodée (PNG, JPEG) / Decodes an encoded image (PNG, JPEG)
    pub fn from_encoded(bytes: &[u8], viewport: Viewport) -> Result<Self, CaptureError> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw(), viewport)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Lit un pixel; `None` hors limites
    /// Reads a pixel; `None` when out of bounds
    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgba> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some(Rgba::new(px[0], px[1], px[2], px[3]))
    }
}

/// Extrait le corps base64 d'une data URI
/// Extracts the base64 body of a data URI
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, CaptureError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or(CaptureError::MalformedDataUri)?;
    let (header, body) = rest.split_once(',').ok_or(CaptureError::MalformedDataUri)?;
    if !header.ends_with(";base64") {
        return Err(CaptureError::MalformedDataUri);
    }
    Ok(STANDARD.decode(body)?)
}

/// Encode des octets d'image en data URI PNG (utilisé par les brokers de test et la CLI)
/// Encodes image bytes as a PNG data URI (used by test brokers and the CLI)
pub fn png_data_uri(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba as ImgRgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_scale_from_viewport() {
        let bitmap = CapturedBitmap::from_rgba(300, 120, vec![0; 300 * 120 * 4], Viewport::new(200.0, 40.0)).unwrap();
        assert_eq!(bitmap.scale_x(), 1.5);
        assert_eq!(bitmap.scale_y(), 3.0);
    }

    #[test]
    fn test_data_uri_round_trip() {
        let mut image = RgbaImage::new(4, 2);
        image.put_pixel(3, 1, ImgRgba([10, 20, 30, 255]));
        let uri = png_data_uri(&encode_png(&image));

        let bitmap = CapturedBitmap::from_data_uri(&uri, Viewport::new(2.0, 1.0)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 2));
        assert_eq!(bitmap.scale_x(), 2.0);
        assert_eq!(bitmap.pixel(3, 1), Some(Rgba::opaque(10, 20, 30)));
        assert_eq!(bitmap.pixel(4, 1), None);
        assert_eq!(bitmap.pixel(-1, 0), None);
    }

    #[test]
    fn test_rejects_malformed_uri() {
        let viewport = Viewport::new(10.0, 10.0);
        assert!(matches!(
            CapturedBitmap::from_data_uri("image/png;base64,AAAA", viewport),
            Err(CaptureError::MalformedDataUri)
        ));
        assert!(matches!(
            CapturedBitmap::from_data_uri("data:image/png,AAAA", viewport),
            Err(CaptureError::MalformedDataUri)
        ));
        assert!(matches!(
            CapturedBitmap::from_data_uri("data:image/png;base64,@@@", viewport),
            Err(CaptureError::Base64(_))
        ));
    }

    #[test]
    fn test_rejects_empty_viewport() {
        let err = CapturedBitmap::from_rgba(1, 1, vec![0; 4], Viewport::new(0.0, 10.0)).unwrap_err();
        assert!(matches!(err, CaptureError::EmptyViewport { .. }));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = CapturedBitmap::from_rgba(2, 2, vec![0; 8], Viewport::new(2.0, 2.0)).unwrap_err();
        assert!(matches!(err, CaptureError::BufferSize { expected: 16, actual: 8 }));
    }
}
