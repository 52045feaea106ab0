//! Tracing subscriber setup for binaries embedding the gate.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "ADMIT_LOG";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Install a global subscriber honoring `RUST_LOG`, `ADMIT_LOG` and `LOG_FORMAT=json`.
///
/// A subscriber that is already installed is left in place.
pub fn init_tracing() {
    let use_json = std::env::var(LOG_FORMAT_ENV).as_deref() == Ok("json");
    let registry = tracing_subscriber::registry().with(env_filter());
    let layer = fmt::layer().with_writer(std::io::stderr);

    let _ = if use_json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
}

/// `RUST_LOG` verbatim when set, otherwise a single `admit=<level>` directive.
fn env_filter() -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let level = std::env::var(LOG_ENV).ok();
    EnvFilter::new(format!("admit={}", level_name(level.as_deref())))
}

fn level_name(level: Option<&str>) -> &'static str {
    match level {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialized");
    }

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(level_name(None), "info");
        assert_eq!(level_name(Some("loud")), "info");
    }

    #[test]
    fn level_accepts_known_names() {
        assert_eq!(level_name(Some("debug")), "debug");
        assert_eq!(level_name(Some("warning")), "warn");
        assert_eq!(level_name(Some("error")), "error");
    }
}
