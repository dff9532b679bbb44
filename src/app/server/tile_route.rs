use crate::{
    app::{
        server::{app_state::AppState, mosaic_query::MosaicQuery, plain_response, server_timings},
        tile_coord::TileCoord,
    },
    mosaic::{MosaicBackend, StaticBackend},
    render::{ImageFormat, PixelSelection, ReError, RenderError, TileRequest},
};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, Response, StatusCode},
};
use geo::Rect;
use serde::Deserialize;
use tracing::{debug, error, warn};

const TILE_SIZE: u32 = 256;

#[derive(Debug, Deserialize)]
pub(crate) struct TileQuery {
    #[serde(default)]
    pixel_selection: PixelSelection,
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path((zoom, x, y_with_suffix)): Path<(u8, u32, String)>,
    Query(query): Query<MosaicQuery>,
    Query(tile_query): Query<TileQuery>,
) -> Response<Body> {
    let backend = match query.open_backend(&state) {
        Ok(backend) => backend,
        Err(response) => return response,
    };

    serve_tile(&state, &backend, &tile_query, zoom, x, &y_with_suffix).await
}

pub(crate) async fn get_tms(
    State(state): State<AppState>,
    Path((tms, zoom, x, y_with_suffix)): Path<(String, u8, u32, String)>,
    Query(query): Query<MosaicQuery>,
    Query(tile_query): Query<TileQuery>,
) -> Response<Body> {
    let backend = match query.open_backend(&state) {
        Ok(backend) => backend,
        Err(response) => return response,
    };

    if tms != backend.tms() {
        return plain_response(
            StatusCode::BAD_REQUEST,
            format!("unsupported tile matrix set '{tms}'"),
        );
    }

    serve_tile(&state, &backend, &tile_query, zoom, x, &y_with_suffix).await
}

async fn serve_tile(
    state: &AppState,
    backend: &StaticBackend,
    tile_query: &TileQuery,
    zoom: u8,
    x: u32,
    y_with_suffix: &str,
) -> Response<Body> {
    let Some((y, scale, ext)) = parse_y_suffix(y_with_suffix) else {
        return plain_response(StatusCode::BAD_REQUEST, Body::empty());
    };

    let coord = TileCoord { zoom, x, y };

    let mosaic_def = backend.mosaic_def();

    if zoom < mosaic_def.minzoom() || zoom > mosaic_def.maxzoom() || !coord.is_valid() {
        return plain_response(StatusCode::NOT_FOUND, Body::empty());
    }

    if !state.allowed_scales.contains(&scale) {
        return plain_response(StatusCode::NOT_FOUND, Body::empty());
    }

    let format = match ext {
        None => None,
        Some(ext) => match ImageFormat::from_extension(ext) {
            Some(format) => Some(format),
            None => {
                return plain_response(
                    StatusCode::BAD_REQUEST,
                    format!("unsupported image format '{ext}'"),
                );
            }
        },
    };

    let assets = backend.assets_for_tile(coord);

    debug!(tile = %coord, scale, assets = ?assets.as_slice(), "rendering tile");

    let request = TileRequest {
        bbox: tile_bounds_to_epsg3857(coord.x, coord.y, coord.zoom, TILE_SIZE),
        tile_size: TILE_SIZE * u32::from(scale),
        format,
        pixel_selection: tile_query.pixel_selection,
        assets,
        options: backend.reader_options().clone(),
    };

    let rendered = match state.render_worker_pool.render_tile(request).await {
        Ok(rendered) => rendered,
        Err(ReError::RenderError(RenderError::NoData)) => {
            return plain_response(StatusCode::NOT_FOUND, "no asset has data for this tile");
        }
        Err(err) => {
            error!("Render tile {coord}@{scale}x failed: {err}");

            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "render error");
        }
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", rendered.format.content_type())
        .header("X-Server-Timings", server_timings(&rendered.timings))
        .body(Body::from(rendered.data))
        .expect("body should be built");

    match HeaderValue::try_from(rendered.assets_used.join(",")) {
        Ok(assets) => {
            response.headers_mut().insert("x-assets", assets);
        }
        Err(_) => warn!("Omitting X-Assets of tile {coord}, asset names are not a valid header"),
    }

    response
}

/// Splits `{y}[@{scale}x][.{ext}]`.
fn parse_y_suffix(input: &str) -> Option<(u32, u8, Option<&str>)> {
    let mut y_part = input;
    let mut scale = 1;
    let mut ext = None;

    if let Some((left, right)) = input.split_once('@') {
        y_part = left;

        let (scale_str, rest) = right.split_once('x')?;

        scale = scale_str.parse::<u8>().ok()?;

        if let Some(after_dot) = rest.strip_prefix('.') {
            if after_dot.is_empty() {
                return None;
            }

            ext = Some(after_dot);
        } else if !rest.is_empty() {
            return None;
        }
    } else if let Some((left, right)) = input.split_once('.') {
        y_part = left;

        if right.is_empty() {
            return None;
        }

        ext = Some(right);
    }

    let y = y_part.parse::<u32>().ok()?;

    Some((y, scale, ext))
}

pub fn tile_bounds_to_epsg3857(x: u32, y: u32, zoom: u8, tile_size: u32) -> Rect<f64> {
    const HALF_CIRCUMFERENCE: f64 = std::f64::consts::PI * 6_378_137.0;

    let total_pixels = tile_size as f64 * (zoom as f64).exp2();
    let pixel_size = (2.0 * HALF_CIRCUMFERENCE) / total_pixels;

    let min_x = (x as f64 * tile_size as f64).mul_add(pixel_size, -HALF_CIRCUMFERENCE);
    let max_y = (y as f64 * tile_size as f64).mul_add(-pixel_size, HALF_CIRCUMFERENCE);

    let max_x = (tile_size as f64).mul_add(pixel_size, min_x);
    let min_y = (tile_size as f64).mul_add(-pixel_size, max_y);

    Rect::new((min_x, min_y), (max_x, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_suffix_variants() {
        assert_eq!(parse_y_suffix("12"), Some((12, 1, None)));
        assert_eq!(parse_y_suffix("12.png"), Some((12, 1, Some("png"))));
        assert_eq!(parse_y_suffix("12@2x"), Some((12, 2, None)));
        assert_eq!(parse_y_suffix("12@2x.jpg"), Some((12, 2, Some("jpg"))));
    }

    #[test]
    fn malformed_y_suffix_is_rejected() {
        assert_eq!(parse_y_suffix("12."), None);
        assert_eq!(parse_y_suffix("12@2"), None);
        assert_eq!(parse_y_suffix("12@2xpng"), None);
        assert_eq!(parse_y_suffix("12@1.5x"), None);
        assert_eq!(parse_y_suffix("abc.png"), None);
    }

    #[test]
    fn zoom_zero_covers_web_mercator_extent() {
        let bbox = tile_bounds_to_epsg3857(0, 0, 0, 256);

        assert!((bbox.min().x + 20_037_508.342_789_244).abs() < 1e-6);
        assert!((bbox.max().y - 20_037_508.342_789_244).abs() < 1e-6);
        assert!((bbox.width() - 2.0 * 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn tile_one_one_one_is_south_east_quadrant() {
        let bbox = tile_bounds_to_epsg3857(1, 1, 1, 256);

        assert!(bbox.min().x.abs() < 1e-6);
        assert!(bbox.max().y.abs() < 1e-6);
        assert!(bbox.max().x > 0.0 && bbox.min().y < 0.0);
    }
}
