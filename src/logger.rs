pub use tracing::{debug, error, info, warn, trace, instrument};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

use crate::image_pipeline::Verbosity;

/// Default filter directive for a verbosity level when `RUST_LOG` is unset.
fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::None => "warn",
        Verbosity::Normal | Verbosity::More => "info",
        Verbosity::Debug | Verbosity::DebugSave => "debug",
    }
}

pub fn init(verbosity: Verbosity) {

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let is_debug = verbosity >= Verbosity::Debug ||
                   env_filter.to_string().contains("debug");

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .with_span_events(if is_debug {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    // A global subscriber may already be installed by the host.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(default_directive(Verbosity::Quiet), "error");
        assert_eq!(default_directive(Verbosity::Normal), "info");
        assert_eq!(default_directive(Verbosity::DebugSave), "debug");
    }
}
