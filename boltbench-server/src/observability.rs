//! Logging and error reporting.

use std::env;
use std::io::IsTerminal;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{Config, LogFormat};

/// Initializes Sentry if a DSN is configured.
///
/// Keep the returned guard alive for the lifetime of the process to flush pending events.
pub fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let sentry_config = &config.sentry;
    let dsn = sentry_config.dsn.as_ref()?;

    let guard = sentry::init(sentry::ClientOptions {
        dsn: dsn.expose_secret().as_str().parse().ok(),
        release: Some(env!("CARGO_PKG_VERSION").into()),
        environment: sentry_config.environment.clone(),
        server_name: sentry_config.server_name.clone(),
        sample_rate: sentry_config.sample_rate,
        traces_sample_rate: sentry_config.traces_sample_rate,
        debug: sentry_config.debug,
        enable_logs: true,
        ..Default::default()
    });

    Some(guard)
}

/// Installs the global tracing subscriber, writing to stderr in the configured format.
pub fn init_tracing(config: &Config) {
    // Same as the default filter, except it converts warnings into events
    // and also sends everything at or above INFO as logs instead of breadcrumbs.
    let sentry_layer = config.sentry.is_enabled().then(|| {
        sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
            Level::ERROR | Level::WARN => {
                sentry_tracing::EventFilter::Event | sentry_tracing::EventFilter::Log
            }
            Level::INFO => sentry_tracing::EventFilter::Log,
            Level::DEBUG | Level::TRACE => sentry_tracing::EventFilter::Ignore,
        })
    });

    let (level, env_filter) = parse_rust_log(config.logging.level);

    let format = match config.logging.format {
        LogFormat::Auto if std::io::stderr().is_terminal() => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Simplified,
        format => format,
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let format_layer = match format {
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Simplified => base.with_ansi(false).compact().boxed(),
        LogFormat::Pretty | LogFormat::Auto => base.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(format_layer.with_filter(level))
        .with(sentry_layer)
        .with(env_filter)
        .init();
}

/// Resolves the effective log level and the maximum-verbosity filter.
///
/// A `RUST_LOG` holding a plain level overrides the configured level. Any other `RUST_LOG` value is
/// used literally as a filter directive.
pub fn parse_rust_log(configured: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => configured,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        tower_http=TRACE,\
        boltbench=TRACE,\
        boltbench_server=TRACE,\
        boltbench_perf=TRACE,\
        boltbench_service=TRACE,\
        ",
    );

    (level, env_filter)
}
