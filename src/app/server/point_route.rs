use crate::{
    app::server::{app_state::AppState, mosaic_query::MosaicQuery, plain_response, server_timings},
    mosaic::MosaicBackend,
    render::{PointRequest, ReError, RenderError},
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use std::time::Instant;
use tracing::error;

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(coordinates): Path<String>,
    Query(query): Query<MosaicQuery>,
) -> Response<Body> {
    let Some((lon, lat)) = parse_lon_lat(&coordinates) else {
        return plain_response(
            StatusCode::BAD_REQUEST,
            format!("expected '{{lon}},{{lat}}', got '{coordinates}'"),
        );
    };

    let backend = match query.open_backend(&state) {
        Ok(backend) => backend,
        Err(response) => return response,
    };

    let request = PointRequest {
        lon,
        lat,
        assets: backend.assets_for_point(lon, lat),
        options: backend.reader_options().clone(),
    };

    let started_at = Instant::now();

    let values = match state.render_worker_pool.query_point(request).await {
        Ok(values) => values,
        Err(ReError::RenderError(RenderError::NoData)) => {
            return plain_response(StatusCode::NOT_FOUND, "no asset has data at this point");
        }
        Err(err) => {
            error!("Point {lon},{lat} failed: {err}");

            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "point read error");
        }
    };

    let timings = server_timings(&[("Read-values", started_at.elapsed())]);

    (
        [("X-Server-Timings", timings)],
        Json(json!({
            "coordinates": [lon, lat],
            "values": values,
        })),
    )
        .into_response()
}

fn parse_lon_lat(input: &str) -> Option<(f64, f64)> {
    let (lon, lat) = input.split_once(',')?;

    let lon = lon.trim().parse::<f64>().ok()?;
    let lat = lat.trim().parse::<f64>().ok()?;

    (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
}
