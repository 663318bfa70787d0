use crate::draw::EngineSettings;
use tracing_subscriber::EnvFilter;

/// Filter for the engine's subscriber. `RUST_LOG` only applies with debug logging on, so
/// a stray variable in the host's environment can't make a release session verbose.
pub fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Install a fmt subscriber. A host that already installed one keeps it.
pub fn init(debug: bool) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .try_init()
        .is_ok();
    if installed {
        let debug_logging = debug;
        tracing::debug!(debug_logging, "engine logging initialised");
    }
}

pub fn init_from_settings(settings: &EngineSettings) {
    init(settings.debug_logging);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_filter_ignores_rust_log() {
        assert_eq!(env_filter(false).to_string(), "info");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init_from_settings(&EngineSettings::default());
    }
}
