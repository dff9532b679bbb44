pub(crate) use server::{ServerOptions, start_server};

use axum::{
    body::Body,
    http::{Response, StatusCode},
};

mod app_state;
mod mosaic_query;
mod mosaic_route;
mod point_route;
mod server;
mod tile_route;
mod tile_url;
mod tilejson_route;
mod wmts_route;

pub(crate) fn plain_response(status: StatusCode, message: impl Into<Body>) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(message.into())
        .expect("body should be built")
}

/// `X-Server-Timings` header value, durations in milliseconds.
pub(crate) fn server_timings(timings: &[(&str, std::time::Duration)]) -> String {
    timings
        .iter()
        .map(|(name, elapsed)| format!("{name} - {:.2}", elapsed.as_secs_f64() * 1000.0))
        .collect::<Vec<_>>()
        .join("; ")
}
