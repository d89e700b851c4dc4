use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal::unix::SignalKind;

use crate::config::Config;
use crate::state::State;
use crate::web::app::App;

const LISTEN_BACKLOG: u32 = 1024;

/// Serves the HTTP API until the process receives SIGTERM, SIGINT, SIGHUP or SIGQUIT.
///
/// In-flight benchmarks are allowed to finish before the server returns.
pub async fn server(config: Config) -> Result<()> {
    let addr = config.http_addr;
    let listener = bind(addr).with_context(|| format!("failed to listen on {addr}"))?;
    let state = State::new(config)
        .await
        .context("failed to set up the stores")?;

    tracing::info!(%addr, "serving benchmark API");
    let serving = tokio::spawn(App::new(state).graceful_shutdown(true).serve(listener));

    elegant_departure::tokio::depart()
        .on_termination()
        .on_sigint()
        .on_signal(SignalKind::hangup())
        .on_signal(SignalKind::quit())
        .await;
    tracing::info!("shutdown requested, draining connections");

    let result = serving.await.context("server task failed")?;
    tracing::info!("server stopped");
    result
}

fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
    socket.set_reuseport(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}
