use std::sync::Arc;

use boltbench_perf::Backends;
use boltbench_service::{BoxedBackend, InMemoryBackend, S3Backend, S3BackendConfig};

use crate::config::{Config, Storage};

/// Shared reference to the [server state](State).
pub type ServiceState = Arc<State>;

/// Handles shared by all HTTP request handlers.
///
/// In request handlers, use `axum::extract::State<ServiceState>` to retrieve a shared reference to
/// this structure.
#[derive(Debug)]
pub struct State {
    /// The server configuration.
    pub config: Config,
    /// The baseline store and the proxy.
    pub backends: Backends,
}

impl State {
    /// Connects to the configured stores.
    pub async fn new(config: Config) -> anyhow::Result<ServiceState> {
        let backends = create_backends(&config).await;
        Ok(Self::with_backends(config, backends))
    }

    /// Creates the state with already constructed backends.
    pub fn with_backends(config: Config, backends: Backends) -> ServiceState {
        Arc::new(Self { config, backends })
    }
}

async fn create_backends(config: &Config) -> Backends {
    // Two memory stores share their contents, like a proxy in front of its baseline.
    if let (Storage::Memory, Storage::Memory) = (&config.baseline, &config.proxy) {
        let baseline = InMemoryBackend::new("s3");
        let proxy = baseline.renamed("bolt");
        return Backends::new(Box::new(baseline), Box::new(proxy));
    }

    let baseline = create_backend("s3", &config.baseline).await;
    let proxy = create_backend("bolt", &config.proxy).await;
    Backends::new(baseline, proxy)
}

async fn create_backend(name: &'static str, storage: &Storage) -> BoxedBackend {
    match storage {
        Storage::S3 {
            endpoint,
            region,
            force_path_style,
        } => {
            let config = S3BackendConfig {
                endpoint: endpoint.clone(),
                region: region.clone(),
                force_path_style: *force_path_style,
            };
            tracing::info!(name, ?config, "using s3 backend");
            Box::new(S3Backend::new(name, config).await)
        }
        Storage::Memory => {
            tracing::info!(name, "using in-memory backend");
            Box::new(InMemoryBackend::new(name))
        }
    }
}
