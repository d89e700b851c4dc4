use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use argh::FromArgs;
use boltbench_perf::{BenchmarkReport, BenchmarkRequest, PerfEvent};

use crate::config::Config;
use crate::state::State;
use crate::{healthcheck, observability, web};

/// Comparative benchmarks of an object store and its caching proxy.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunCommand),
    Perf(PerfCommand),
    Healthcheck(HealthcheckCommand),
    Version(VersionCommand),
}

/// run the benchmark web server
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCommand {}

/// run a single benchmark against the configured stores and print its report
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "perf")]
struct PerfCommand {
    /// the bucket to benchmark
    #[argh(option, short = 'b')]
    bucket: String,

    /// the workload, e.g. GET_OBJECT or ALL (default)
    #[argh(option, short = 't', default = "String::new()")]
    request_type: String,

    /// maximum number of keys, at most 1000 (default 1000)
    #[argh(option, short = 'n', default = "String::new()")]
    num_keys: String,

    /// length of generated objects in bytes (default 100)
    #[argh(option, short = 'l', default = "String::new()")]
    obj_length: String,

    /// number of listings per store (default 10)
    #[argh(option, short = 'i', default = "String::new()")]
    num_iter: String,

    /// output format, `json` (default) or `text`
    #[argh(option, short = 'f', default = "OutputFormat::Json")]
    format: OutputFormat,
}

impl PerfCommand {
    fn event(&self) -> PerfEvent {
        PerfEvent {
            request_type: self.request_type.clone(),
            bucket: self.bucket.clone(),
            num_keys: self.num_keys.clone(),
            obj_length: self.obj_length.clone(),
            num_iter: self.num_iter.clone(),
        }
    }
}

/// How the `perf` command prints its report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("json") => Ok(OutputFormat::Json),
            s if s.eq_ignore_ascii_case("text") => Ok(OutputFormat::Text),
            s => Err(format!("unknown format `{s}`, expected `json` or `text`")),
        }
    }
}

/// perform a healthcheck against the running benchmark web server
///
/// This command checks if the server is available on the configured host and port. This is used
/// for Docker healthchecks.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "healthcheck")]
struct HealthcheckCommand {}

/// print the boltbench version
#[derive(Default, Debug, FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCommand {}

async fn perf(config: Config, command: PerfCommand) -> Result<()> {
    let request = BenchmarkRequest::try_from(&command.event()).context("invalid benchmark")?;
    let state = State::new(config).await?;

    let report = boltbench_perf::run(&request, &state.backends)
        .await
        .context("benchmark failed")?;
    print_report(&report, command.format)
}

fn print_report(report: &BenchmarkReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}

/// Bootstrap the runtime and execute the CLI command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    // Special switch to just print the version and exit.
    if let Command::Version(_) = args.command {
        println!("boltbench {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;

    // Sentry should be initialized before creating the async runtime.
    let _sentry_guard = observability::init_sentry(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("main-rt")
        .enable_all()
        .worker_threads(config.runtime.worker_threads)
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(&config);
    tracing::debug!(?config);

    runtime.block_on(async move {
        match args.command {
            Command::Run(RunCommand {}) => web::server(config).await,
            Command::Perf(command) => perf(config, command).await,
            Command::Healthcheck(HealthcheckCommand {}) => healthcheck::healthcheck(config).await,
            Command::Version(VersionCommand {}) => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf_command(args: &[&str]) -> PerfCommand {
        let args = Args::from_args(&["boltbench"], args).unwrap();
        match args.command {
            Command::Perf(command) => command,
            command => panic!("expected perf command, got {command:?}"),
        }
    }

    #[test]
    fn config_flag_precedes_the_command() {
        let args = Args::from_args(&["boltbench"], &["-c", "config.yml", "version"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("config.yml")));
    }

    #[test]
    fn perf_flags_become_an_event() {
        let command = perf_command(&["perf", "-b", "b", "-t", "get_object", "-n", "5"]);

        let event = command.event();
        assert_eq!(event.bucket, "b");
        assert_eq!(event.request_type, "get_object");
        assert_eq!(event.num_keys, "5");
        assert_eq!(event.obj_length, "");
        assert_eq!(command.format, OutputFormat::Json);
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
