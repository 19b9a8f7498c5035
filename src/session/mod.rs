//! =============================================================================
//! SESSION - Cycle de vie d'une session de sélection
//! SESSION - Pick session lifecycle
//! =============================================================================
//!
//! Une session passe par `Idle -> Initializing -> Active -> Cleanup -> Idle`.
//! A session goes through `Idle -> Initializing -> Active -> Cleanup -> Idle`.
//!
//! # Architecture
//! - `PickerSupervisor`: distribue le jeton unique `SessionGuard`
//!   hands out the single `SessionGuard` token
//! - `PickerSession`: machine à états, possède les abonnements et la capture
//!   state machine, owns the subscriptions and the capture
//! - `Host`: surface visuelle et écouteurs (fenêtre overlay, page web...)
//!   visual surface and listeners (overlay window, web page...)
//!
//! # Flux d'exécution / Execution flow
//! 1. `activate()` prend le jeton, `run()` monte l'overlay et attend le délai
//! 2. Le broker renvoie une capture, les écouteurs complets sont installés
//! 3. Chaque mouvement redessine la loupe et la replace
//! 4. Clic / Entrée valide, Échap annule; `cleanup()` libère tout
//!
//! Tout tourne sur une seule boucle d'événements (runtime tokio current-thread).
//! Everything runs on a single event loop (tokio current-thread runtime).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tiny_skia::Pixmap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use crate::bitmap::{CapturedBitmap, Viewport};
use crate::broker::CaptureBroker;
use crate::color::{PickedColor, Rgba};
use crate::config::{PickerSettings, DEFAULT_SAMPLE_COLOR, NUDGE_PIXELS, SHIFT_NUDGE_PIXELS};
use crate::error::{CaptureError, PickerError};
use crate::events::{InputEvent, Key, ListenerKind, PickerEvent};
use crate::magnifier::{MagnifierLabel, MagnifierRenderer};
use crate::placement::{plan_position, Placement, PlacementRequest};
use crate::popover::ResultPopover;
use crate::sampler::sample_at_viewport;


// =============================================================================
// JETON DE SESSION
// SESSION TOKEN
// =============================================================================

/// Jeton d'exclusivité: une seule session à la fois
/// Exclusivity token: one session at a time
///
/// Libéré dans `Drop`, donc sur toutes les sorties (validation, annulation,
/// échec, session abandonnée).
/// Released in `Drop`, so on every exit (commit, cancel, failure, dropped
/// session).
#[derive(Debug)]
pub struct SessionGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        trace!("session guard released");
    }
}

/// Superviseur de la fonctionnalité, détient le drapeau "actif"
/// Feature supervisor, owns the "active" flag
#[derive(Clone, Debug, Default)]
pub struct PickerSupervisor {
    active: Arc<AtomicBool>,
}

impl PickerSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Superviseur partagé par tout le processus
    /// Process-wide shared supervisor
    pub fn global() -> &'static PickerSupervisor {
        static GLOBAL: OnceLock<PickerSupervisor> = OnceLock::new();
        GLOBAL.get_or_init(PickerSupervisor::new)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Prend le jeton s'il est libre / Takes the token if it is free
    pub fn try_acquire(&self) -> Option<SessionGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionGuard {
                flag: Arc::clone(&self.active),
            })
    }

    /// Crée une session; `Ok(None)` si une session est déjà en cours (sans erreur)
    /// Creates a session; `Ok(None)` when one is already running (not an error)
    ///
    /// Les réglages invalides sont refusés avant de prendre le jeton.
    /// Invalid settings are rejected before the token is taken.
    pub fn activate<H: Host>(
        &self,
        broker: Arc<dyn CaptureBroker>,
        host: H,
        events: UnboundedSender<PickerEvent>,
        settings: PickerSettings,
    ) -> Result<Option<PickerSession<H>>, PickerError> {
        if let Err(e) = settings.validate() {
            warn!(error = %e, "picker settings rejected, activation refused");
            return Err(e.into());
        }
        let Some(guard) = self.try_acquire() else {
            debug!("picker already active, activation ignored");
            return Ok(None);
        };
        // Le jeton est relâché si la loupe ne peut pas être créée
        // The token is released when the magnifier cannot be created
        let Some(renderer) = MagnifierRenderer::new(&settings) else {
            warn!(diameter = settings.diameter, "magnifier surface could not be allocated");
            return Ok(None);
        };

        Ok(Some(PickerSession {
            guard: Some(guard),
            state: SessionState::Idle,
            host,
            broker,
            events,
            settings,
            renderer,
            bitmap: None,
            subscriptions: Subscriptions::default(),
            overlay_mounted: false,
            pointer: None,
            opacity: 1.0,
        }))
    }
}

// =============================================================================
// HÔTE VISUEL
// VISUAL HOST
// =============================================================================

/// Identifiant d'écouteur attribué par l'hôte / Listener id assigned by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Ce que l'hôte affiche à chaque mouvement / What the host displays on every move
pub struct MagnifierView<'a> {
    /// Surface circulaire rendue, affichée en mode "pixelated"
    /// Rendered circular surface, displayed nearest-neighbor
    pub surface: &'a Pixmap,
    /// Libellé hex + pastille, et couleur de la bordure
    /// Hex label + swatch, and border color
    pub label: &'a MagnifierLabel,
    pub placement: Placement,
    pub opacity: f32,
}

/// Surface d'affichage et source d'entrées de la session
/// Display surface and input source of the session
///
/// L'hôte ne transmet dans le canal d'entrée que les catégories écoutées.
/// The host only forwards the listened categories into the input channel.
pub trait Host: Send {
    fn viewport(&self) -> Viewport;

    /// Overlay plein écran + curseur en croix / Fullscreen overlay + crosshair cursor
    fn mount_overlay(&mut self);
    fn unmount_overlay(&mut self);

    fn listen(&mut self, kind: ListenerKind) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);

    fn present_magnifier(&mut self, view: &MagnifierView<'_>);
    fn set_widget_opacity(&mut self, opacity: f32);

    fn show_result(&mut self, popover: ResultPopover);

    /// Avis d'échec visible par l'utilisateur / User-visible failure notice
    fn notify_failure(&mut self, message: &str);
}

// =============================================================================
// ABONNEMENTS
// SUBSCRIPTIONS
// =============================================================================

/// Liste unique des écouteurs installés, vidée uniquement par `cleanup`
/// Single list of installed listeners, emptied only by `cleanup`
#[derive(Debug, Default)]
struct Subscriptions {
    active: Vec<(ListenerKind, ListenerId)>,
}

impl Subscriptions {
    fn install<H: Host>(&mut self, host: &mut H, kind: ListenerKind) {
        if self.accepts(kind) {
            return;
        }
        let id = host.listen(kind);
        self.active.push((kind, id));
    }

    /// Retire l'écouteur limité à l'initialisation / Removes the init-scoped listener
    fn remove<H: Host>(&mut self, host: &mut H, kind: ListenerKind) {
        self.active.retain(|(k, id)| {
            if *k == kind {
                host.unlisten(*id);
                false
            } else {
                true
            }
        });
    }

    fn accepts(&self, kind: ListenerKind) -> bool {
        self.active.iter().any(|(k, _)| *k == kind)
    }

    fn clear<H: Host>(&mut self, host: &mut H) {
        for (_, id) in self.active.drain(..) {
            host.unlisten(id);
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Active,
    Cleanup,
}

/// Fin d'une session / How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    Picked(PickedColor),
    Cancelled,
    Failed(CaptureError),
}

/// Réaction à une entrée pendant `Active` / Reaction to an input while `Active`
enum Step {
    Continue,
    Recapture,
    Commit { x: f64, y: f64 },
    Cancel,
}

type PendingCapture = BoxFuture<'static, (Viewport, Result<String, CaptureError>)>;

pub struct PickerSession<H: Host> {
    guard: Option<SessionGuard>,
    state: SessionState,
    host: H,
    broker: Arc<dyn CaptureBroker>,
    events: UnboundedSender<PickerEvent>,
    settings: PickerSettings,
    renderer: MagnifierRenderer,
    bitmap: Option<CapturedBitmap>,
    subscriptions: Subscriptions,
    overlay_mounted: bool,
    /// Dernière position du pointeur (pour les flèches et Entrée)
    /// Last pointer position (for arrow keys and Enter)
    pointer: Option<(f64, f64)>,
    opacity: f32,
}

impl<H: Host> PickerSession<H> {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Déroule la session jusqu'à son état terminal
    /// Drives the session to its terminal state
    pub async fn run(mut self, mut input: UnboundedReceiver<InputEvent>) -> SessionOutcome {
        self.drive(&mut input).await
    }

    async fn drive(&mut self, input: &mut UnboundedReceiver<InputEvent>) -> SessionOutcome {
        // ---------------------------------------------------------------------
        // Idle -> Initializing
        // ---------------------------------------------------------------------
        self.state = SessionState::Initializing;
        self.host.mount_overlay();
        self.overlay_mounted = true;
        self.subscriptions.install(&mut self.host, ListenerKind::EarlyCancel);
        info!("picker session started");

        // Laisse le contenu tardif finir de s'afficher
        // Let late content finish painting
        tokio::select! {
            _ = tokio::time::sleep(self.settings.settle_delay()) => {}
            _ = wait_for_escape(input) => {
                debug!("cancelled during settle delay");
                return self.finish_cancelled();
            }
        }

        let viewport = self.host.viewport();
        let broker = Arc::clone(&self.broker);
        let response = tokio::select! {
            response = broker.capture() => response,
            _ = wait_for_escape(input) => {
                debug!("cancelled while waiting for the capture");
                return self.finish_cancelled();
            }
        };
        let bitmap = match response.and_then(|uri| CapturedBitmap::from_data_uri(&uri, viewport)) {
            Ok(bitmap) => bitmap,
            Err(e) => return self.finish_failed(e),
        };

        // ---------------------------------------------------------------------
        // Initializing -> Active
        // ---------------------------------------------------------------------
        self.bitmap = Some(bitmap);
        self.subscriptions.remove(&mut self.host, ListenerKind::EarlyCancel);
        for kind in [ListenerKind::PointerMove, ListenerKind::Click, ListenerKind::KeyDown] {
            self.subscriptions.install(&mut self.host, kind);
        }
        self.state = SessionState::Active;
        debug!("session active");

        // Recaptures en vol; la dernière réponse arrivée l'emporte
        // In-flight recaptures; the last response to arrive wins
        let mut recaptures: FuturesUnordered<PendingCapture> = FuturesUnordered::new();

        loop {
            tokio::select! {
                event = input.recv() => {
                    // Source fermée: l'hôte a disparu / Source closed: host went away
                    let Some(event) = event else {
                        return self.finish_cancelled();
                    };
                    match self.on_active_input(event) {
                        Step::Continue => {}
                        Step::Recapture => {
                            self.set_opacity(self.settings.dimmed_opacity);
                            recaptures.push(self.request_capture());
                        }
                        Step::Commit { x, y } => return self.finish_committed(x, y),
                        Step::Cancel => return self.finish_cancelled(),
                    }
                }
                Some((viewport, response)) = recaptures.next(), if !recaptures.is_empty() => {
                    self.on_recapture(viewport, response, recaptures.is_empty());
                }
            }
        }
    }

    fn on_active_input(&mut self, event: InputEvent) -> Step {
        if !self.subscriptions.accepts(event.listener_kind()) {
            return Step::Continue;
        }
        match event {
            InputEvent::PointerMove { x, y } => {
                self.pointer = Some((x, y));
                self.refresh(x, y);
                Step::Continue
            }
            InputEvent::Click { x, y } => Step::Commit { x, y },
            InputEvent::KeyDown { key: Key::Escape, .. } => Step::Cancel,
            InputEvent::KeyDown { key: Key::Enter, .. } => match self.pointer {
                Some((x, y)) => Step::Commit { x, y },
                None => Step::Continue,
            },
            InputEvent::KeyDown { key, .. } if key.is_recapture() => Step::Recapture,
            InputEvent::KeyDown { key, shift } => {
                if let Some((dx, dy)) = key.arrow_delta() {
                    self.nudge(dx, dy, shift);
                }
                Step::Continue
            }
        }
    }

    /// Déplace le point d'échantillonnage au clavier
    /// Moves the sampling point from the keyboard
    fn nudge(&mut self, dx: f64, dy: f64, shift: bool) {
        let Some((x, y)) = self.pointer else {
            return;
        };
        let step = if shift { SHIFT_NUDGE_PIXELS } else { NUDGE_PIXELS };
        let viewport = self.host.viewport();
        let x = (x + dx * step).clamp(0.0, viewport.width.max(0.0));
        let y = (y + dy * step).clamp(0.0, viewport.height.max(0.0));
        self.pointer = Some((x, y));
        self.refresh(x, y);
    }

    /// Redessine la loupe et la replace près du pointeur
    /// Redraws the magnifier and moves it next to the pointer
    fn refresh(&mut self, x: f64, y: f64) {
        let Some(bitmap) = self.bitmap.as_ref() else {
            return;
        };
        let color = self.renderer.render(bitmap, x, y);
        trace!(x, y, hex = %color.hex(), "magnifier rendered");

        let viewport = self.host.viewport();
        let diameter = self.settings.diameter as f64;
        let placement = plan_position(&PlacementRequest {
            pointer_x: x,
            pointer_y: y,
            widget_width: diameter,
            widget_height: diameter,
            label_height: self.settings.label_height,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            gap: self.settings.gap,
        });

        if let Some(label) = self.renderer.label() {
            self.host.present_magnifier(&MagnifierView {
                surface: self.renderer.surface(),
                label,
                placement,
                opacity: self.opacity,
            });
        }
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
        self.host.set_widget_opacity(opacity);
    }

    fn request_capture(&self) -> PendingCapture {
        let broker = Arc::clone(&self.broker);
        let viewport = self.host.viewport();
        debug!("recapture requested");
        async move { (viewport, broker.capture().await) }.boxed()
    }

    /// Remplace la capture si la recapture réussit; garde l'ancienne sinon
    /// Replaces the capture when the recapture succeeds; keeps the old one otherwise
    fn on_recapture(&mut self, viewport: Viewport, response: Result<String, CaptureError>, settled: bool) {
        match response.and_then(|uri| CapturedBitmap::from_data_uri(&uri, viewport)) {
            Ok(bitmap) => {
                debug!(width = bitmap.width(), height = bitmap.height(), "capture replaced");
                self.bitmap = Some(bitmap);
            }
            Err(e) => {
                warn!(error = %e, "recapture failed, keeping previous capture");
                self.host.notify_failure(&format!("Screen capture failed: {e}"));
            }
        }
        if settled {
            self.set_opacity(1.0);
        }
        if let Some((x, y)) = self.pointer {
            self.refresh(x, y);
        }
    }

    /// Couleur de secours quand aucun mouvement n'a encore eu lieu
    /// Fallback color when no pointer move happened yet
    fn sample_now(&self, x: f64, y: f64) -> Rgba {
        self.bitmap
            .as_ref()
            .map(|bitmap| sample_at_viewport(bitmap, x, y, self.settings.out_of_range))
            .unwrap_or(DEFAULT_SAMPLE_COLOR)
    }

    // -------------------------------------------------------------------------
    // TRANSITIONS TERMINALES
    // TERMINAL TRANSITIONS
    // -------------------------------------------------------------------------

    /// Envoie un événement au collaborateur; un récepteur fermé est journalisé
    /// Sends an event to the collaborator; a closed receiver is logged
    fn emit(&self, event: PickerEvent) {
        if let Err(e) = self.events.send(event) {
            debug!(event = ?e.0, "collaborator receiver closed, event dropped");
        }
    }

    fn finish_committed(&mut self, x: f64, y: f64) -> SessionOutcome {
        let color = self.renderer.current_color().unwrap_or_else(|| self.sample_now(x, y));
        let picked = PickedColor::new(color, x, y);
        let viewport = self.host.viewport();

        self.cleanup();

        let popover = ResultPopover::new(picked.clone(), viewport, self.events.clone());
        self.host.show_result(popover);
        self.emit(PickerEvent::ColorPicked {
            hex: picked.hex.clone(),
        });
        info!(hex = %picked.hex, x, y, "color picked");
        SessionOutcome::Picked(picked)
    }

    fn finish_cancelled(&mut self) -> SessionOutcome {
        self.cleanup();
        self.emit(PickerEvent::PickerCancelled);
        info!("picker cancelled");
        SessionOutcome::Cancelled
    }

    fn finish_failed(&mut self, error: CaptureError) -> SessionOutcome {
        warn!(error = %error, "initial capture failed");
        self.host.notify_failure(&format!("Screen capture failed: {error}"));
        self.cleanup();
        self.emit(PickerEvent::PickerCancelled);
        SessionOutcome::Failed(error)
    }

    /// Seul endroit où les écouteurs sont retirés et le jeton libéré
    /// The only place listeners are removed and the token released
    fn cleanup(&mut self) {
        if self.guard.is_none() {
            return;
        }
        self.state = SessionState::Cleanup;
        self.subscriptions.clear(&mut self.host);
        if self.overlay_mounted {
            self.host.unmount_overlay();
            self.overlay_mounted = false;
        }
        self.bitmap = None;
        self.pointer = None;
        self.guard = None;
        self.state = SessionState::Idle;
        debug!("session cleaned up");
    }
}

impl<H: Host> Drop for PickerSession<H> {
    fn drop(&mut self) {
        // Session abandonnée en cours de route (tâche annulée...)
        // Session dropped midway (task aborted...)
        self.cleanup();
    }
}

/// Écouteur limité à l'initialisation: seul Échap est pris en compte
/// Init-scoped listener: only Escape is honored
async fn wait_for_escape(input: &mut UnboundedReceiver<InputEvent>) {
    while let Some(event) = input.recv().await {
        if let InputEvent::KeyDown { key: Key::Escape, .. } = event {
            return;
        }
        trace!(?event, "ignored while initializing");
    }
    // Source fermée: traité comme une annulation / Source closed: treated as a cancel
}
