pub mod grammar;
pub mod parse;
pub mod reduce;

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr. `-v` raises whittle crates to debug,
/// `-vv` everything; `RUST_LOG` overrides when set.
pub fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn,whittle_reduce=info",
        1 => "info,whittle_reduce=debug,whittle_ddmin=debug,whittle_core=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print an error and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}
