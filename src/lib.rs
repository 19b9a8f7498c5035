//! =============================================================================
//! Pixel Loupe - Échantillonnage de couleurs à l'écran avec loupe
//! Pixel Loupe - On-screen color sampling with a magnifier
//! =============================================================================
//!
//! Une session capture la zone visible, affiche une loupe circulaire qui suit
//! le pointeur, et valide une couleur exacte au clic.
//! A session captures the visible area, shows a circular magnifier following
//! the pointer, and commits an exact color on click.
//!
//! # Contrôles / Controls
//! - Souris / Mouse: déplacer la loupe / move the magnifier
//! - Clic, Entrée / Click, Enter: valider / commit
//! - ESC: annuler / cancel
//! - R: nouvelle capture / recapture
//! - Flèches / Arrow keys: 1 pixel (10 avec Shift / with Shift)

// =============================================================================
// MODULES
// =============================================================================

/// Constantes et réglages / Constants and settings
pub mod config;

/// Types d'erreurs / Error types
pub mod error;

/// Couleurs et formatage / Colors and formatting
pub mod color;

/// Capture décodée et viewport / Decoded capture and viewport
pub mod bitmap;

/// Conversion viewport -> capture / Viewport -> capture conversion
pub mod mapper;

/// Lecture d'un pixel / Pixel lookup
pub mod sampler;

/// Rendu de la loupe / Magnifier rendering
pub mod magnifier;

/// Placement près du pointeur / Placement next to the pointer
pub mod placement;

/// Fournisseur de captures / Capture broker
pub mod broker;

/// Événements / Events
pub mod events;

/// Fenêtre de résultat / Result popover
pub mod popover;

/// Cycle de vie d'une session / Session lifecycle
pub mod session;

pub mod logging;

pub use bitmap::{CapturedBitmap, Viewport};
pub use broker::{CaptureBroker, StaticBroker};
pub use color::{PickedColor, Rgba};
pub use config::{OutOfRangePolicy, PickerSettings};
pub use error::{CaptureError, ClipboardError, PickerError, SettingsError};
pub use events::{InputEvent, Key, ListenerKind, PickerEvent};
pub use magnifier::MagnifierRenderer;
pub use placement::{plan_position, Placement, PlacementRequest};
pub use popover::{Clipboard, ResultPopover, SystemClipboard};
pub use session::{Host, PickerSession, PickerSupervisor, SessionGuard, SessionOutcome, SessionState};
