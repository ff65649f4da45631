use tracing_subscriber::EnvFilter;

/// Dependency targets quieted below the crate's own level: the blocking
/// HTTP stack and the render backend log per request/frame and would
/// drown out the portal's fetch and navigation events.
const QUIET_DEPS: &str = "hyper=warn,reqwest=warn,rustls=warn,egui_glow=warn,eframe=info";

/// Initialise logging. The crate logs at `info` by default; `debug_logging`
/// in the settings file raises it to `debug` and additionally lets the
/// `RUST_LOG` environment variable override the whole filter.
pub fn init(debug: bool) {
    // With debug logging off the filter is pinned so a stray RUST_LOG in
    // the environment cannot make the shell verbose.
    let level = if debug { "debug" } else { "info" };
    let directives = format!("{level},{QUIET_DEPS}");

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives))
    } else {
        EnvFilter::new(&directives)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
