// =============================================================================
// popover.rs - Fenêtre de résultat après validation
// popover.rs - Result popover after commit
// =============================================================================
//
// Affichée près du point de clic une fois la session nettoyée. Liste HEX, RGB
// et HSL avec une copie par champ; se ferme par clic extérieur, bouton de
// fermeture ou Échap.
// Shown near the click point once the session is cleaned up. Lists HEX, RGB
// and HSL with a per-field copy; closes on outside click, close control or
// Escape.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::bitmap::Viewport;
use crate::color::{format_hsl_color, format_rgb_color, PickedColor, Rgba};
use crate::config::{POINTER_GAP, POPOVER_HEIGHT, POPOVER_WIDTH};
use crate::error::ClipboardError;
use crate::events::PickerEvent;
use crate::placement::{plan_position, Placement, PlacementRequest};

// =============================================================================
// PRESSE-PAPIERS
// CLIPBOARD
// =============================================================================

/// Destination des copies / Copy destination
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Presse-papiers du système via arboard
/// System clipboard through arboard
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        // Ouvert à la première copie / Opened on first copy
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialized".into())),
        }
    }
}

// =============================================================================
// FENÊTRE DE RÉSULTAT
// RESULT POPOVER
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorField {
    Hex,
    Rgb,
    Hsl,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PopoverField {
    pub kind: ColorField,
    pub label: &'static str,
    pub value: String,
}

/// Action de l'utilisateur dans la fenêtre / User action in the popover
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopoverInput {
    Copy(ColorField),
    OpenHistory,
    Close,
    OutsideClick,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopoverOutcome {
    Copied(ColorField),
    /// Rien de visible (copie échouée, fenêtre déjà fermée)
    /// Nothing visible (copy failed, popover already closed)
    Stayed,
    PanelRequested,
    Dismissed,
}

pub struct ResultPopover {
    color: PickedColor,
    swatch: Rgba,
    fields: [PopoverField; 3],
    placement: Placement,
    open: bool,
    events: UnboundedSender<PickerEvent>,
}

impl ResultPopover {
    /// Construit la fenêtre ancrée près du clic / Builds the popover anchored near the click
    pub fn new(color: PickedColor, viewport: Viewport, events: UnboundedSender<PickerEvent>) -> Self {
        let swatch = color.rgba.unwrap_or(Rgba::opaque(0, 0, 0));
        let fields = [
            PopoverField {
                kind: ColorField::Hex,
                label: "HEX",
                value: color.hex.clone(),
            },
            PopoverField {
                kind: ColorField::Rgb,
                label: "RGB",
                value: format_rgb_color(swatch.r, swatch.g, swatch.b),
            },
            PopoverField {
                kind: ColorField::Hsl,
                label: "HSL",
                value: format_hsl_color(swatch.r, swatch.g, swatch.b),
            },
        ];
        let placement = plan_position(&PlacementRequest {
            pointer_x: color.viewport_x,
            pointer_y: color.viewport_y,
            widget_width: POPOVER_WIDTH,
            widget_height: POPOVER_HEIGHT,
            label_height: 0.0,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            gap: POINTER_GAP,
        });

        Self {
            color,
            swatch,
            fields,
            placement,
            open: true,
            events,
        }
    }

    pub fn color(&self) -> &PickedColor {
        &self.color
    }

    pub fn swatch(&self) -> Rgba {
        self.swatch
    }

    pub fn fields(&self) -> &[PopoverField] {
        &self.fields
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn field(&self, kind: ColorField) -> &str {
        self.fields
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    /// Traite une action; la fenêtre fermée ignore tout
    /// Handles an action; a closed popover ignores everything
    pub fn handle(&mut self, input: PopoverInput, clipboard: &mut dyn Clipboard) -> PopoverOutcome {
        if !self.open {
            return PopoverOutcome::Stayed;
        }
        match input {
            PopoverInput::Copy(kind) => {
                let value = self.field(kind).to_owned();
                match clipboard.set_text(&value) {
                    Ok(()) => {
                        debug!(?kind, %value, "copied color field");
                        PopoverOutcome::Copied(kind)
                    }
                    Err(e) => {
                        // Journalisé puis ignoré / Logged then ignored
                        warn!(?kind, error = %e, "clipboard copy failed");
                        PopoverOutcome::Stayed
                    }
                }
            }
            PopoverInput::OpenHistory => {
                let event = PickerEvent::OpenPanel {
                    hex: self.color.hex.clone(),
                };
                if let Err(e) = self.events.send(event) {
                    debug!(event = ?e.0, "collaborator receiver closed, panel request dropped");
                }
                self.open = false;
                PopoverOutcome::PanelRequested
            }
            PopoverInput::Close | PopoverInput::OutsideClick | PopoverInput::Escape => {
                self.open = false;
                PopoverOutcome::Dismissed
            }
        }
    }
}
