//! Verbosity flags to tracing filter directives.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Crates whose level follows the verbosity flags directly
const APP_TARGETS: [&str; 4] = [
    "docmerge",
    "docmerge_core",
    "docmerge_sheet",
    "docmerge_stamper",
];

/// Levels for our own crates and for everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevels {
    pub app: LevelFilter,
    pub dependencies: LevelFilter,
}

impl LogLevels {
    /// Levels for a verbosity tally (`-v` count minus `-q` count)
    pub fn from_verbosity(verbosity: i16) -> Self {
        let (app, dependencies) = match verbosity {
            i16::MIN..=-1 => (LevelFilter::ERROR, LevelFilter::ERROR),
            0 => (LevelFilter::WARN, LevelFilter::ERROR),
            1 => (LevelFilter::INFO, LevelFilter::ERROR),
            2 => (LevelFilter::DEBUG, LevelFilter::ERROR),
            3 => (LevelFilter::DEBUG, LevelFilter::INFO),
            _ => (LevelFilter::TRACE, LevelFilter::DEBUG),
        };
        Self { app, dependencies }
    }

    /// `EnvFilter` directives, e.g. `error,docmerge=info,docmerge_core=info,...`
    pub fn directives(&self) -> String {
        let app = self.app.to_string().to_ascii_lowercase();
        let mut directives = vec![self.dependencies.to_string().to_ascii_lowercase()];
        directives.extend(APP_TARGETS.iter().map(|target| format!("{target}={app}")));
        directives.join(",")
    }
}

/// Tally repeated `-v` and `-q` flags
pub fn verbosity(verbose: u8, quiet: u8) -> i16 {
    i16::from(verbose) - i16::from(quiet)
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over the flags.
pub fn init(verbosity: i16) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogLevels::from_verbosity(verbosity).directives()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
