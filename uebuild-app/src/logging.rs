use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// Level after applying `-v` flags on top of the configured level
pub fn effective_level(configured: &str, verbosity: u8) -> LevelFilter {
    let base = configured.parse::<LevelFilter>().unwrap_or_else(|_| {
        eprintln!("warning: unknown log level '{configured}', using warn");
        LevelFilter::WARN
    });

    let levels = [
        LevelFilter::OFF,
        LevelFilter::ERROR,
        LevelFilter::WARN,
        LevelFilter::INFO,
        LevelFilter::DEBUG,
        LevelFilter::TRACE,
    ];
    let index = levels.iter().position(|level| *level == base).unwrap_or(2);
    levels[(index + verbosity as usize).min(levels.len() - 1)]
}

/// Initialize logging to stderr. `RUST_LOG` overrides everything else.
pub fn init_logging(configured: &str, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(effective_level(configured, verbosity).into())
    });

    // A subscriber may already be installed when embedded in tests.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
