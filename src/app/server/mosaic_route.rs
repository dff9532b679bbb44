use crate::{
    app::server::{app_state::AppState, mosaic_query::MosaicQuery, plain_response},
    mosaic::{
        AssetSet, BackendError, Bounds, MosaicBackend, MosaicInfo, PlaceholderMosaic,
        MAX_ZOOM, ReaderOptions, ResolverConfig, StaticBackend,
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{Response, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Deserialize)]
pub(crate) struct CreateMosaic {
    files: Vec<String>,
    minzoom: Option<u8>,
    maxzoom: Option<u8>,
}

#[derive(Deserialize)]
pub(crate) struct UpdateMosaic {
    url: String,
    files: Vec<String>,
    #[serde(default = "default_add_first")]
    add_first: bool,
}

fn default_add_first() -> bool {
    true
}

#[derive(Serialize)]
pub(crate) struct MosaicBounds {
    bounds: Bounds,
}

fn backend_error(operation: &str, err: BackendError) -> Response<Body> {
    error!("Mosaic {operation} failed: {err}");

    plain_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("mosaic {operation} error"),
    )
}

pub(crate) async fn read(
    State(state): State<AppState>,
    Query(query): Query<MosaicQuery>,
) -> Result<Json<PlaceholderMosaic>, Response<Body>> {
    let backend = query.open_backend(&state)?;

    Ok(Json(backend.mosaic_def()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateMosaic>,
) -> Result<Json<PlaceholderMosaic>, Response<Body>> {
    let defaults = state.resolver_config.as_ref();

    let config = ResolverConfig {
        minzoom: body.minzoom.unwrap_or(defaults.minzoom),
        maxzoom: body.maxzoom.unwrap_or(defaults.maxzoom),
        ..defaults.clone()
    };

    if config.maxzoom > MAX_ZOOM {
        return Err(plain_response(
            StatusCode::BAD_REQUEST,
            format!("maxzoom must be at most {MAX_ZOOM}"),
        ));
    }

    if config.minzoom > config.maxzoom {
        return Err(plain_response(
            StatusCode::BAD_REQUEST,
            "minzoom must not exceed maxzoom",
        ));
    }

    let backend = StaticBackend::new(body.files.into(), ReaderOptions::default(), config);

    backend
        .write(false)
        .map_err(|err| backend_error("write", err))?;

    Ok(Json(backend.mosaic_def()))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateMosaic>,
) -> Result<Json<PlaceholderMosaic>, Response<Body>> {
    let mut backend = MosaicQuery {
        url: body.url,
        bidx: None,
        nodata: None,
        rescale: None,
    }
    .open_backend(&state)?;

    backend
        .update(&AssetSet::from(body.files), body.add_first)
        .map_err(|err| backend_error("update", err))?;

    Ok(Json(backend.mosaic_def()))
}

pub(crate) async fn bounds(
    State(state): State<AppState>,
    Query(query): Query<MosaicQuery>,
) -> Result<Json<MosaicBounds>, Response<Body>> {
    let backend = query.open_backend(&state)?;

    Ok(Json(MosaicBounds {
        bounds: backend.metadata().bounds,
    }))
}

pub(crate) async fn info(
    State(state): State<AppState>,
    Query(query): Query<MosaicQuery>,
) -> Result<Json<MosaicInfo>, Response<Body>> {
    let backend = query.open_backend(&state)?;

    Ok(Json(backend.info()))
}
