//! Tracing setup for the binary.
//!
//! `RUST_LOG` wins when set. Otherwise `-q` keeps errors only and each `-v`
//! raises the level from `info` to `debug` and then `trace`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn,app=info,services=info",
        1 => "debug,sqlx=warn,hyper=info,reqwest=info",
        _ => "trace",
    }
}
