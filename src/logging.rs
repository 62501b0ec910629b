// Structured logging init: an EnvFilter seeded from config with a
// plain-text or JSON fmt layer on top.

use crate::config::LoggingSection;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber from a `LoggingSection`. Safe to
/// call once at process startup; a second call is a no-op (the underlying
/// `set_global_default` failure is swallowed via `try_init`).
pub fn init_tracing(config: &LoggingSection) {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer()).try_init();
    }
}
