// =============================================================================
// logging.rs - Configuration de la journalisation
// logging.rs - Logging setup
// =============================================================================
//
// `RUST_LOG` prend le dessus; sinon `info`, ou `debug` pour ce crate quand
// `PICKER_DEBUG` est défini.
// `RUST_LOG` wins; otherwise `info`, or `debug` for this crate when
// `PICKER_DEBUG` is set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtre par défaut selon `PICKER_DEBUG` / Default filter according to `PICKER_DEBUG`
fn default_directives(debug_logging: bool) -> &'static str {
    if debug_logging {
        "info,pixel_loupe=debug"
    } else {
        "info"
    }
}

/// Installe le subscriber global (sans effet s'il existe déjà)
/// Installs the global subscriber (no-op when one already exists)
pub fn init() {
    let debug_logging = std::env::var_os("PICKER_DEBUG").is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug_logging)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}
