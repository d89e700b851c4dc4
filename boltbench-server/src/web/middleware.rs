use std::any::Any;
use std::net::SocketAddr;

use axum::Json;
use axum::RequestExt;
use axum::extract::{ConnectInfo, MatchedPath, Request};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokio::time::Instant;
use tower_http::set_header::SetResponseHeaderLayer;

const SERVER_HEADER: &str = concat!("boltbench/", env!("CARGO_PKG_VERSION"));

/// Stamps every response with `Server: boltbench/<version>`.
pub fn set_server_header() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::SERVER, HeaderValue::from_static(SERVER_HEADER))
}

/// Opens the span that request handling and the benchmark run inside it log into.
///
/// The peer address is recorded when the server was started with connect info.
pub fn make_http_span(request: &Request) -> tracing::Span {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    tracing::debug_span!(
        "http",
        method = %request.method(),
        path = request.uri().path(),
        peer = peer.map(tracing::field::display),
    )
}

/// Converts a panicking handler into a 500 with the usual `{"error": ..}` body.
///
/// Installed through [`CatchPanicLayer`](tower_http::catch_panic::CatchPanicLayer).
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or("handler panicked", |message| *message)
            .to_owned(),
    };

    tracing::error!(%message, "handler panicked");
    let body = Json(json!({ "error": message }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

/// Logs one `INFO` line per finished request with its route, status and duration.
///
/// A benchmark request can take minutes, so the duration is worth seeing at the default level.
pub async fn log_request_timing(mut request: Request, next: Next) -> Response {
    let route = match request.extract_parts::<MatchedPath>().await {
        Ok(path) => path.as_str().to_owned(),
        Err(_) => "<unmatched>".to_owned(),
    };
    let method = request.method().clone();

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        %method,
        %route,
        status = response.status().as_u16(),
        elapsed = ?start.elapsed(),
        "handled request"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_become_json_errors() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
