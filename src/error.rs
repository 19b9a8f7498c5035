// =============================================================================
// error.rs - Types d'erreurs du picker
// error.rs - Picker error types
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Échec d'acquisition ou de décodage d'une capture
/// Failure to acquire or decode a capture
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Le broker a refusé la capture (aucune image utilisable)
    /// The broker refused the capture (no usable image)
    #[error("capture broker returned no image: {0}")]
    Refused(String),

    #[error("capture payload is not a base64 data URI")]
    MalformedDataUri,

    #[error("capture payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("capture image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    /// Image de taille nulle / Zero-sized image
    #[error("captured image is empty")]
    EmptyImage,

    /// Viewport de taille nulle, impossible de calculer l'échelle
    /// Zero-sized viewport, scale cannot be computed
    #[error("viewport {width}x{height} cannot be used to scale a capture")]
    EmptyViewport { width: f64, height: f64 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Échec de copie dans le presse-papiers
/// Clipboard copy failure
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Erreur de chargement des réglages
/// Settings loading error
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Erreur de haut niveau de la bibliothèque
/// Top-level library error
#[derive(Debug, Error)]
pub enum PickerError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
