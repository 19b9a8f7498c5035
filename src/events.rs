// =============================================================================
// events.rs - Événements entrants et sortants
// events.rs - Inbound and outbound events
// =============================================================================

use serde::{Deserialize, Serialize};

/// Événement émis vers le collaborateur externe
/// Event emitted to the external collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PickerEvent {
    /// Couleur validée / Color committed
    ColorPicked { hex: String },
    /// Annulation ou échec de capture initiale / Cancel or initial capture failure
    PickerCancelled,
    /// Demande d'ouverture du panneau d'historique / Request to open the history panel
    OpenPanel { hex: String },
}

/// Touches reconnues par le picker / Keys the picker recognizes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
}

impl Key {
    /// `r` / `R` déclenche une recapture / triggers a recapture
    pub fn is_recapture(&self) -> bool {
        matches!(self, Key::Char('r') | Key::Char('R'))
    }

    /// Déplacement unitaire associé à une flèche
    /// Unit displacement of an arrow key
    pub fn arrow_delta(&self) -> Option<(f64, f64)> {
        match self {
            Key::ArrowLeft => Some((-1.0, 0.0)),
            Key::ArrowRight => Some((1.0, 0.0)),
            Key::ArrowUp => Some((0.0, -1.0)),
            Key::ArrowDown => Some((0.0, 1.0)),
            _ => None,
        }
    }
}

/// Entrée brute transmise par l'hôte (coordonnées viewport)
/// Raw input forwarded by the host (viewport coordinates)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    KeyDown { key: Key, shift: bool },
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        InputEvent::KeyDown { key, shift: false }
    }

    /// Catégorie d'écouteur qui reçoit cet événement
    /// Listener category that receives this event
    pub fn listener_kind(&self) -> ListenerKind {
        match self {
            InputEvent::PointerMove { .. } => ListenerKind::PointerMove,
            InputEvent::Click { .. } => ListenerKind::Click,
            InputEvent::KeyDown { .. } => ListenerKind::KeyDown,
        }
    }
}

/// Catégories d'écouteurs installés chez l'hôte
/// Listener categories installed on the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Échap seulement, pendant l'initialisation / Escape only, while initializing
    EarlyCancel,
    PointerMove,
    Click,
    KeyDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&PickerEvent::ColorPicked { hex: "#0A141E".into() }).unwrap();
        assert_eq!(json, r##"{"type":"ColorPicked","hex":"#0A141E"}"##);
        let json = serde_json::to_string(&PickerEvent::PickerCancelled).unwrap();
        assert_eq!(json, r#"{"type":"PickerCancelled"}"#);
    }

    #[test]
    fn test_recapture_keys() {
        assert!(Key::Char('r').is_recapture());
        assert!(Key::Char('R').is_recapture());
        assert!(!Key::Char('x').is_recapture());
        assert!(!Key::Escape.is_recapture());
    }
}
