use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global tracing subscriber. Safe to call more than once;
/// only the first call has an effect. The `NEUVO_LOG` environment
/// variable overrides the default `info` filter.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("NEUVO_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init();
    });
}
