use crate::{
    app::server::{app_state::AppState, plain_response},
    render::ImageFormat,
};
use axum::{
    body::Body,
    http::{HeaderMap, Response, StatusCode, Uri, header::HOST},
};
use serde::Deserialize;

/// Tile URL parameters of the TileJSON and WMTS documents.
#[derive(Deserialize)]
pub(crate) struct TileUrlQuery {
    tile_scale: Option<u8>,
    tile_format: Option<String>,
}

/// Builds tile URLs pointing back at this server, keeping the request's
/// mosaic query.
#[derive(Debug, PartialEq)]
pub(crate) struct TileUrl {
    endpoint: String,
    suffix: String,
    query: String,
    pub(crate) format: Option<ImageFormat>,
}

impl TileUrl {
    pub(crate) fn from_request(
        state: &AppState,
        uri: &Uri,
        headers: &HeaderMap,
        params: TileUrlQuery,
        default_format: Option<ImageFormat>,
    ) -> Result<Self, Response<Body>> {
        let scale = params.tile_scale.unwrap_or(1);

        if !state.allowed_scales.contains(&scale) {
            return Err(plain_response(
                StatusCode::BAD_REQUEST,
                format!("tile_scale {scale} is not allowed"),
            ));
        }

        let format = match params.tile_format.as_deref() {
            None => default_format,
            Some(ext) => Some(ImageFormat::from_extension(ext).ok_or_else(|| {
                plain_response(StatusCode::BAD_REQUEST, "unsupported tile_format")
            })?),
        };

        let base_url = match state.public_url.as_ref() {
            Some(public_url) => public_url.trim_end_matches('/').to_owned(),
            None => match headers.get(HOST).and_then(|host| host.to_str().ok()) {
                Some(host) => format!("http://{host}"),
                None => {
                    return Err(plain_response(
                        StatusCode::BAD_REQUEST,
                        "missing Host header",
                    ));
                }
            },
        };

        Ok(Self::new(
            format!("{base_url}{}", state.url_prefix),
            scale,
            format,
            uri.query().unwrap_or_default(),
        ))
    }

    fn new(endpoint: String, scale: u8, format: Option<ImageFormat>, query: &str) -> Self {
        let mut suffix = format!("@{scale}x");

        if let Some(format) = format {
            suffix.push('.');
            suffix.push_str(format.extension());
        }

        let query = query
            .split('&')
            .filter(|pair| {
                let key = pair.split_once('=').map_or(*pair, |(key, _)| key);

                !pair.is_empty() && key != "tile_scale" && key != "tile_format"
            })
            .collect::<Vec<_>>()
            .join("&");

        Self {
            endpoint,
            suffix,
            query,
            format,
        }
    }

    /// `{endpoint}/tiles/{path}@{scale}x[.{ext}][?{query}]`, `path` holding
    /// the placeholders of the consumer.
    pub(crate) fn tiles(&self, path: &str) -> String {
        self.with_query(format!("{}/tiles/{path}{}", self.endpoint, self.suffix))
    }

    /// `{endpoint}{path}[?{query}]`.
    pub(crate) fn resource(&self, path: &str) -> String {
        self.with_query(format!("{}{path}", self.endpoint))
    }

    fn with_query(&self, mut url: String) -> String {
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_document_parameters() {
        let url = TileUrl::new(
            "http://localhost:3050/mosaic".into(),
            2,
            Some(ImageFormat::Png),
            "url=a.tif,b.tif&tile_scale=2&tile_format=png&bidx=1",
        );

        assert_eq!(
            url.tiles("{z}/{x}/{y}"),
            "http://localhost:3050/mosaic/tiles/{z}/{x}/{y}@2x.png?url=a.tif,b.tif&bidx=1"
        );
        assert_eq!(
            url.resource("/WMTSCapabilities.xml"),
            "http://localhost:3050/mosaic/WMTSCapabilities.xml?url=a.tif,b.tif&bidx=1"
        );
    }

    #[test]
    fn without_format_or_query() {
        let url = TileUrl::new("https://tiles.example.com".into(), 1, None, "");

        assert_eq!(
            url.tiles("{z}/{x}/{y}"),
            "https://tiles.example.com/tiles/{z}/{x}/{y}@1x"
        );
    }
}
