use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::Request;
use axum::{Router, ServiceExt};
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use crate::endpoints;
use crate::state::ServiceState;
use crate::web::middleware;

/// The HTTP application: all routes with their middleware stack, bound to a [`ServiceState`].
#[derive(Debug)]
pub struct App {
    router: Router,
    graceful_shutdown: bool,
}

impl App {
    /// Builds the router. Nothing listens until [`serve`](Self::serve) is awaited.
    pub fn new(state: ServiceState) -> Self {
        // Outermost first: the timing log covers panics and the Sentry hub covers tracing.
        let layers = ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::log_request_timing))
            .layer(CatchPanicLayer::custom(middleware::handle_panic))
            .layer(middleware::set_server_header())
            .layer(NewSentryLayer::new_from_top())
            .layer(SentryHttpLayer::new().enable_transaction())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(middleware::make_http_span)
                    .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
            );

        Self {
            router: endpoints::routes().layer(layers).with_state(state),
            graceful_shutdown: false,
        }
    }

    /// Stops accepting connections once the process-wide shutdown guard fires. Off by default.
    pub fn graceful_shutdown(self, enable: bool) -> Self {
        Self {
            graceful_shutdown: enable,
            ..self
        }
    }

    /// Serves connections from `listener` until the server stops.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let Self {
            router,
            graceful_shutdown,
        } = self;

        let service =
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(router);
        let serve = axum::serve(listener, service);

        if graceful_shutdown {
            let guard = elegant_departure::get_shutdown_guard();
            serve.with_graceful_shutdown(guard.wait_owned()).await?;
        } else {
            serve.await?;
        }

        Ok(())
    }
}
