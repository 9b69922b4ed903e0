use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter; `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer().with_target(true).with_line_number(true);

    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base)
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing already initialised: {e}");
    }
}
