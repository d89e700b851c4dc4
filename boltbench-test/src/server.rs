//! Exposes an in-process test server for use in integration tests.
//!
//! ```
//! use boltbench_test::server::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestServer::new().await;
//!    server.store().insert("bucket", "key", "value");
//!    let url = server.url("/v1/perf");
//!    // use the URL in tests...
//! }
//! ```

use std::net::{SocketAddr, TcpListener};

use boltbench_perf::Backends;
use boltbench_server::config::{Config, Storage};
use boltbench_server::state::State;
use boltbench_server::web::App;
use boltbench_service::InMemoryBackend;

/// An in-process test server for use in integration tests.
///
/// The baseline store and the proxy are in-memory backends sharing one store. It listens on a
/// random available port on localhost.
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    baseline: InMemoryBackend,
    proxy: InMemoryBackend,
}

impl TestServer {
    /// Starts a server with default configuration and empty stores.
    pub async fn new() -> Self {
        Self::with_baseline(InMemoryBackend::new("s3")).await
    }

    /// Starts a server whose proxy shares the given baseline store.
    ///
    /// Use this to configure simulated latency before the server starts.
    pub async fn with_baseline(baseline: InMemoryBackend) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let config = Config {
            http_addr: socket,
            baseline: Storage::Memory,
            proxy: Storage::Memory,
            ..Default::default()
        };

        let proxy = baseline.renamed("bolt");
        let backends = Backends::new(Box::new(baseline.clone()), Box::new(proxy.clone()));
        let app = App::new(State::with_backends(config, backends));

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            app.serve(listener).await.unwrap();
        });

        Self {
            handle,
            socket,
            baseline,
            proxy,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }

    /// A handle to the baseline store, for seeding data and inspecting requests.
    pub fn store(&self) -> &InMemoryBackend {
        &self.baseline
    }

    /// A handle to the proxy, for injecting failures.
    pub fn proxy(&self) -> &InMemoryBackend {
        &self.proxy
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
