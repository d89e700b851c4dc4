//! Server and CLI settings.
//!
//! Settings are layered, with later layers winning:
//!
//! 1. Built-in defaults, see [`Config::default`]
//! 2. A YAML file passed with `-c`/`--config`
//! 3. `BB__`-prefixed environment variables
//!
//! Nested fields are addressed in the environment by joining their path with `__`. For instance,
//! `BB__PROXY__TYPE=s3` and `BB__PROXY__ENDPOINT=http://bolt.internal:9000` are equivalent to:
//!
//! ```yaml
//! proxy:
//!   type: s3
//!   endpoint: http://bolt.internal:9000
//!   force_path_style: true
//! ```

use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

const ENV_PREFIX: &str = "BB__";

/// A configured secret that prints as `[redacted]`.
///
/// Wrap it in [`SecretBox`] so it is zeroed on drop.
#[derive(Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConfigSecret {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl CloneableSecret for ConfigSecret {}

impl SerializableSecret for ConfigSecret {}

/// Where one of the two benchmarked stores lives, selected by `type`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Storage {
    /// An S3-compatible endpoint.
    ///
    /// Credentials come from the default AWS provider chain: environment, profile or instance
    /// role.
    S3 {
        /// Endpoint URL. Unset means Amazon S3 itself.
        #[serde(default)]
        endpoint: Option<String>,
        /// Signing region. Unset falls back to the provider chain, then `us-east-1`.
        #[serde(default)]
        region: Option<String>,
        /// Address buckets by path rather than by virtual host. The proxy usually needs this.
        #[serde(default)]
        force_path_style: bool,
    },

    /// A store held in process memory.
    ///
    /// When both stores are `memory`, the proxy serves the baseline's objects.
    Memory,
}

impl Default for Storage {
    fn default() -> Self {
        Storage::S3 {
            endpoint: None,
            region: None,
            force_path_style: false,
        }
    }
}

/// Tokio runtime settings.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Worker threads of the multi-threaded runtime, one per CPU core by default.
    ///
    /// A single benchmark never runs requests in parallel. More threads only serve concurrent
    /// invocations.
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

/// Error reporting to [Sentry](https://sentry.io/). Off unless `dsn` is set.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Sentry {
    /// Project DSN, e.g. from `BB__SENTRY__DSN`.
    pub dsn: Option<SecretBox<ConfigSecret>>,
    /// Reported environment tag.
    pub environment: Option<Cow<'static, str>>,
    /// Reported server name.
    pub server_name: Option<Cow<'static, str>>,
    /// Share of error events sent, `1.0` by default.
    pub sample_rate: f32,
    /// Share of transactions traced, `0.01` by default.
    pub traces_sample_rate: f32,
    /// Turns on the SDK's own debug output.
    pub debug: bool,
}

impl Sentry {
    /// Whether a DSN was configured.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            server_name: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.01,
            debug: false,
        }
    }
}

/// How log lines are rendered.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// [`Pretty`](Self::Pretty) on a terminal, [`Simplified`](Self::Simplified) elsewhere.
    Auto,
    /// Multi-line, colored.
    Pretty,
    /// One plain line per event.
    Simplified,
    /// One JSON object per event.
    Json,
}

/// Returned when a log format name is not recognized.
#[derive(Clone, Debug)]
pub struct FormatParseError(String);

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown log format `{}`, use auto, pretty, simplified or json",
            self.0
        )
    }
}

impl std::error::Error for FormatParseError {}

impl FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(LogFormat::Auto),
            "pretty" => Ok(LogFormat::Pretty),
            "simplified" => Ok(LogFormat::Simplified),
            "json" => Ok(LogFormat::Json),
            _ => Err(FormatParseError(s.to_owned())),
        }
    }
}

/// (De)serializes a value through its `Display` and `FromStr` impls.
mod as_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: Display, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Log output settings. Logs go to stderr so that CLI reports on stdout stay machine-readable.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Lowest level written, `info` by default. A `RUST_LOG` value overrides it.
    ///
    /// Individual samples are logged at `trace`.
    #[serde(with = "as_string")]
    pub level: LevelFilter,
    /// Output format, `auto` by default.
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Auto-heal check settings.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoHeal {
    /// Wait between two reads of a not yet healed object, such as `250ms`. Zero retries at once.
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,
}

/// Settings of the `boltbench` binary.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Listen address of the HTTP API, `0.0.0.0:8888` by default.
    pub http_addr: SocketAddr,
    /// The store benchmarks compare against.
    pub baseline: Storage,
    /// The caching proxy under test.
    pub proxy: Storage,
    pub runtime: Runtime,
    pub logging: Logging,
    pub sentry: Sentry,
    pub autoheal: AutoHeal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
            baseline: Storage::default(),
            proxy: Storage::default(),
            runtime: Runtime::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
            autoheal: AutoHeal::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from defaults, the optional YAML file at `path` and the
    /// environment.
    ///
    /// Fails if the file cannot be read or a value does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }
}
