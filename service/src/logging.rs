use crate::config::{Config, RustEnv};
use log::LevelFilter;
use simplelog::{self, ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose logs are hidden unless running at Trace level.
/// The WebSocket and Redis clients log every frame and command at Debug.
const NOISY_DEPENDENCIES: &[&str] = &[
    "sqlx",
    "sea_orm",
    "sea_orm_migration",
    "redis",
    "tungstenite",
    "tokio_tungstenite",
    "hyper",
    "tower_http",
    "axum",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    pub fn init_logger(config: &Config) {
        let log_config = Self::build_log_config(config.log_level_filter);

        TermLogger::init(
            Self::to_simplelog(config.log_level_filter),
            log_config,
            Self::terminal_mode(&config.runtime_env),
            ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    fn to_simplelog(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    // Deployed environments are collected from stderr as a single stream.
    fn terminal_mode(env: &RustEnv) -> TerminalMode {
        match env {
            RustEnv::Development => TerminalMode::Mixed,
            RustEnv::Production | RustEnv::Staging => TerminalMode::Stderr,
        }
    }

    fn hides_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if Self::hides_dependencies(level) {
            for module in NOISY_DEPENDENCIES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
