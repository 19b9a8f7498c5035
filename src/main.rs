//! =============================================================================
//! Pixel Loupe - Outil en ligne de commande
//! Pixel Loupe - Command-line tool
//! =============================================================================
//!
//! Rejoue une session de sélection sans écran: l'image fournie sert de
//! capture, le pointeur est placé sur `--at` puis un clic valide la couleur.
//! Replays a pick session headlessly: the given image acts as the capture,
//! the pointer is placed at `--at` then a click commits the color.
//!
//! # Commandes / Commands
//! - `sample --image shot.png --viewport 500x500 --at 120,80 [--out loupe.png]`
//! - `place --pointer 120,80 --viewport 1024x768`

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tiny_skia::Pixmap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, info, warn};

use pixel_loupe::bitmap::png_data_uri;
use pixel_loupe::color::format_hsl_color;
use pixel_loupe::config::DEFAULT_SAMPLE_COLOR;
use pixel_loupe::mapper::to_bitmap_space;
use pixel_loupe::popover::ColorField;
use pixel_loupe::session::{ListenerId, MagnifierView};
use pixel_loupe::{
    logging, plan_position, CapturedBitmap, Host, InputEvent, ListenerKind, PickerSettings, PickerSupervisor,
    PlacementRequest, ResultPopover, SessionOutcome, StaticBroker, Viewport,
};

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Parser)]
#[command(name = "pixel-loupe", version, about = "Sample exact screen colors through a magnifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Échantillonne une image comme si c'était une capture d'écran
    /// Samples an image as if it were a screen capture
    Sample {
        #[arg(long)]
        image: PathBuf,
        /// Taille logique du viewport / Logical viewport size (WxH)
        #[arg(long)]
        viewport: Size,
        /// Point viewport à échantillonner / Viewport point to sample (X,Y)
        #[arg(long)]
        at: Point,
        /// Écrit la loupe rendue en PNG / Writes the rendered magnifier as PNG
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Affiche la position planifiée de la loupe
    /// Prints the planned magnifier position
    Place {
        #[arg(long)]
        pointer: Point,
        #[arg(long)]
        viewport: Size,
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

/// `WxH`, ex. `1024x768`
#[derive(Clone, Copy, Debug, PartialEq)]
struct Size {
    width: f64,
    height: f64,
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got `{s}`"))?;
        let width = w.trim().parse::<f64>().map_err(|e| format!("width: {e}"))?;
        let height = h.trim().parse::<f64>().map_err(|e| format!("height: {e}"))?;
        if width <= 0.0 || height <= 0.0 {
            return Err(format!("viewport must not be empty, got `{s}`"));
        }
        Ok(Size { width, height })
    }
}

/// `X,Y`, ex. `120,80`
#[derive(Clone, Copy, Debug, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
        let x = x.trim().parse::<f64>().map_err(|e| format!("x: {e}"))?;
        let y = y.trim().parse::<f64>().map_err(|e| format!("y: {e}"))?;
        Ok(Point { x, y })
    }
}

// =============================================================================
// HÔTE SANS ÉCRAN
// HEADLESS HOST
// =============================================================================

/// Ce que l'hôte a reçu pendant la session / What the host received during the session
#[derive(Default)]
struct Shown {
    frame: Option<Pixmap>,
    hsl: Option<String>,
    failure: Option<String>,
}

/// Hôte qui rejoue un mouvement puis un clic dès que la session écoute
/// Host that replays a move then a click as soon as the session listens
struct HeadlessHost {
    viewport: Viewport,
    at: Point,
    input: UnboundedSender<InputEvent>,
    next_id: u64,
    shown: Arc<Mutex<Shown>>,
}

impl HeadlessHost {
    fn with_shown(&self, f: impl FnOnce(&mut Shown)) {
        if let Ok(mut shown) = self.shown.lock() {
            f(&mut shown);
        }
    }
}

impl Host for HeadlessHost {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn mount_overlay(&mut self) {
        debug!("overlay mounted");
    }

    fn unmount_overlay(&mut self) {
        debug!("overlay unmounted");
    }

    fn listen(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        if kind == ListenerKind::Click {
            let Point { x, y } = self.at;
            let _ = self.input.send(InputEvent::PointerMove { x, y });
            let _ = self.input.send(InputEvent::Click { x, y });
        }
        ListenerId(self.next_id)
    }

    fn unlisten(&mut self, _id: ListenerId) {}

    fn present_magnifier(&mut self, view: &MagnifierView<'_>) {
        debug!(hex = %view.label.hex, left = view.placement.left, top = view.placement.top, "magnifier presented");
        let frame = view.surface.clone();
        self.with_shown(|shown| shown.frame = Some(frame));
    }

    fn set_widget_opacity(&mut self, _opacity: f32) {}

    fn show_result(&mut self, popover: ResultPopover) {
        let hsl = popover.field(ColorField::Hsl).to_owned();
        self.with_shown(|shown| shown.hsl = Some(hsl));
    }

    fn notify_failure(&mut self, message: &str) {
        warn!(%message, "capture failure");
        let message = message.to_owned();
        self.with_shown(|shown| shown.failure = Some(message));
    }
}

// =============================================================================
// COMMANDES
// COMMANDS
// =============================================================================

fn load_settings(path: Option<&Path>) -> Result<PickerSettings> {
    match path {
        Some(path) => PickerSettings::load(path).with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(PickerSettings::default()),
    }
}

fn sample(image: &Path, viewport: Size, at: Point, out: Option<&Path>, settings: PickerSettings) -> Result<ExitCode> {
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let viewport = Viewport::new(viewport.width, viewport.height);

    // Vérifie d'abord que le point tombe dans la capture
    // Check first that the point lands inside the capture
    let bitmap = CapturedBitmap::from_encoded(&bytes, viewport).context("decoding image")?;
    if !to_bitmap_space(at.x, at.y, &bitmap).in_range(&bitmap) {
        eprintln!("Point ({}, {}) is outside the capture", at.x, at.y);
        return Ok(ExitCode::FAILURE);
    }
    drop(bitmap);

    let (input_tx, input_rx) = unbounded_channel();
    let (events_tx, mut events_rx) = unbounded_channel();
    let shown = Arc::new(Mutex::new(Shown::default()));
    let host = HeadlessHost {
        viewport,
        at,
        input: input_tx,
        next_id: 0,
        shown: Arc::clone(&shown),
    };

    let session = PickerSupervisor::global()
        .activate(Arc::new(StaticBroker::new(png_data_uri(&bytes))), host, events_tx, settings)
        .context("starting the pick session")?
        .context("a pick session is already running")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("starting the event loop")?;
    let outcome = runtime.block_on(session.run(input_rx));

    while let Ok(event) = events_rx.try_recv() {
        debug!(event = %serde_json::to_string(&event)?, "picker event");
    }

    let shown = shown.lock().map_err(|_| anyhow!("headless host state poisoned"))?;
    match outcome {
        SessionOutcome::Picked(picked) => {
            let rgba = picked.rgba.unwrap_or(DEFAULT_SAMPLE_COLOR);
            let hsl = shown
                .hsl
                .clone()
                .unwrap_or_else(|| format_hsl_color(rgba.r, rgba.g, rgba.b));
            println!("RGB({}, {}, {}) | HEX: {} | HSL: {}", rgba.r, rgba.g, rgba.b, picked.hex, hsl);

            if let (Some(path), Some(frame)) = (out, shown.frame.as_ref()) {
                frame
                    .save_png(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "magnifier written");
            }
            Ok(ExitCode::SUCCESS)
        }
        SessionOutcome::Cancelled => Ok(ExitCode::FAILURE),
        SessionOutcome::Failed(e) => {
            Err(anyhow::Error::new(e).context(shown.failure.clone().unwrap_or_else(|| "capture failed".into())))
        }
    }
}

fn place(pointer: Point, viewport: Size, settings: &PickerSettings) {
    let diameter = settings.diameter as f64;
    let placement = plan_position(&PlacementRequest {
        pointer_x: pointer.x,
        pointer_y: pointer.y,
        widget_width: diameter,
        widget_height: diameter,
        label_height: settings.label_height,
        viewport_width: viewport.width,
        viewport_height: viewport.height,
        gap: settings.gap,
    });
    println!("left: {} | top: {}", placement.left, placement.top);
}

// =============================================================================
// POINT D'ENTRÉE
// ENTRY POINT
// =============================================================================

fn main() -> Result<ExitCode> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Sample {
            image,
            viewport,
            at,
            out,
            settings,
        } => {
            let settings = load_settings(settings.as_deref())?;
            sample(&image, viewport, at, out.as_deref(), settings)
        }
        Command::Place {
            pointer,
            viewport,
            settings,
        } => {
            let settings = load_settings(settings.as_deref())?;
            place(pointer, viewport, &settings);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(
            "1024x768".parse::<Size>().unwrap(),
            Size {
                width: 1024.0,
                height: 768.0
            }
        );
        assert!("1024".parse::<Size>().is_err());
        assert!("0x10".parse::<Size>().is_err());
    }

    #[test]
    fn test_parse_point() {
        assert_eq!("120,80".parse::<Point>().unwrap(), Point { x: 120.0, y: 80.0 });
        assert_eq!("1.5, 2".parse::<Point>().unwrap(), Point { x: 1.5, y: 2.0 });
        assert!("120;80".parse::<Point>().is_err());
    }

    #[test]
    fn test_cli_parses_sample() {
        let cli = Cli::try_parse_from([
            "pixel-loupe",
            "sample",
            "--image",
            "shot.png",
            "--viewport",
            "500x500",
            "--at",
            "120,80",
        ])
        .unwrap();
        let Command::Sample { viewport, at, out, .. } = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(viewport.width, 500.0);
        assert_eq!(at, Point { x: 120.0, y: 80.0 });
        assert!(out.is_none());
    }
}
