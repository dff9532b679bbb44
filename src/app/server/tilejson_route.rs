use crate::{
    app::server::{
        app_state::AppState,
        mosaic_query::MosaicQuery,
        tile_url::{TileUrl, TileUrlQuery},
    },
    mosaic::{Bounds, MosaicBackend, MosaicMetadata},
};
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Response, Uri},
    response::IntoResponse,
};
use serde::Serialize;

const TILEJSON_VERSION: &str = "2.2.0";

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct TileJson {
    tilejson: &'static str,
    name: String,
    version: &'static str,
    scheme: &'static str,
    tiles: Vec<String>,
    minzoom: u8,
    maxzoom: u8,
    bounds: Bounds,
    center: [f64; 3],
}

impl TileJson {
    fn new(metadata: MosaicMetadata, tile_url: String) -> Self {
        Self {
            tilejson: TILEJSON_VERSION,
            center: metadata.center(),
            name: metadata.name,
            version: "1.0.0",
            scheme: "xyz",
            tiles: vec![tile_url],
            minzoom: metadata.minzoom,
            maxzoom: metadata.maxzoom,
            bounds: metadata.bounds,
        }
    }
}

pub(crate) async fn get(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<MosaicQuery>,
    Query(params): Query<TileUrlQuery>,
) -> Response<Body> {
    let backend = match query.open_backend(&state) {
        Ok(backend) => backend,
        Err(response) => return response,
    };

    let tile_url = match TileUrl::from_request(&state, &uri, &headers, params, None) {
        Ok(tile_url) => tile_url,
        Err(response) => return response,
    };

    Json(TileJson::new(backend.metadata(), tile_url.tiles("{z}/{x}/{y}"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilejson_uses_declared_metadata() {
        let tilejson = TileJson::new(
            MosaicMetadata {
                name: "a.tif".into(),
                bounds: Bounds::WORLD,
                minzoom: 0,
                maxzoom: 30,
            },
            "http://x/tiles/{z}/{x}/{y}@1x".into(),
        );

        let value = serde_json::to_value(&tilejson).unwrap();

        assert_eq!(value["tilejson"], "2.2.0");
        assert_eq!(value["minzoom"], 0);
        assert_eq!(value["maxzoom"], 30);
        assert_eq!(value["bounds"], serde_json::json!([-180.0, -90.0, 180.0, 90.0]));
        assert_eq!(value["center"], serde_json::json!([0.0, 0.0, 0.0]));
    }
}
