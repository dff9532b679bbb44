use crate::{
    app::server::{app_state::AppState, plain_response},
    mosaic::{AssetSet, MosaicBackend, ReaderOptions, StaticBackend},
};
use axum::{
    body::Body,
    http::{Response, StatusCode},
};
use serde::Deserialize;
use tracing::error;

/// Query parameters shared by all mosaic routes.
#[derive(Debug, Deserialize)]
pub(crate) struct MosaicQuery {
    /// Comma separated asset paths or URLs.
    pub(crate) url: String,
    pub(crate) bidx: Option<String>,
    pub(crate) nodata: Option<f64>,
    pub(crate) rescale: Option<String>,
}

impl MosaicQuery {
    /// Builds the backend for this request, like entering a mosaic context.
    pub(crate) fn open_backend(&self, state: &AppState) -> Result<StaticBackend, Response<Body>> {
        let reader_options = ReaderOptions::parse(
            self.bidx.as_deref(),
            self.nodata,
            self.rescale.as_deref(),
        )
        .map_err(|err| plain_response(StatusCode::BAD_REQUEST, err.to_string()))?;

        let assets = AssetSet::from_query(&self.url);

        let mut backend =
            StaticBackend::new(assets, reader_options, state.resolver_config.as_ref().clone());

        backend.read().map_err(|err| {
            error!("Read mosaic {} failed: {err}", self.url);

            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "mosaic read error")
        })?;

        Ok(backend)
    }
}
