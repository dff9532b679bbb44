use crate::{
    app::server::{
        app_state::AppState,
        mosaic_query::MosaicQuery,
        tile_url::{TileUrl, TileUrlQuery},
    },
    mosaic::{Bounds, MosaicBackend},
    render::ImageFormat,
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Response, StatusCode, Uri},
};
use std::ops::RangeInclusive;

const TITLE: &str = "Cloud Optimized GeoTIFF";

const TILE_SIZE: u32 = 256;

const HALF_CIRCUMFERENCE: f64 = std::f64::consts::PI * 6_378_137.0;

/// OGC standardized rendering pixel size, in meters.
const STANDARD_PIXEL_SIZE: f64 = 0.000_28;

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

    let tile_url =
        match TileUrl::from_request(&state, &uri, &headers, params, Some(ImageFormat::Png)) {
            Ok(tile_url) => tile_url,
            Err(response) => return response,
        };

    let mosaic_def = backend.mosaic_def();

    let xml = capabilities(
        &tile_url,
        backend.tms(),
        backend.metadata().bounds,
        mosaic_def.minzoom()..=mosaic_def.maxzoom(),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/xml")
        .body(Body::from(xml))
        .expect("body should be built")
}

/// One `TileMatrix` of the WebMercatorQuad set.
fn tile_matrix(zoom: u8) -> String {
    let matrix_size = 1u64 << zoom;
    let resolution = 2.0 * HALF_CIRCUMFERENCE / (f64::from(TILE_SIZE) * matrix_size as f64);

    format!(
        r#"
            <TileMatrix>
                <ows:Identifier>{zoom}</ows:Identifier>
                <ScaleDenominator>{scale_denominator}</ScaleDenominator>
                <TopLeftCorner>{min} {max}</TopLeftCorner>
                <TileWidth>{TILE_SIZE}</TileWidth>
                <TileHeight>{TILE_SIZE}</TileHeight>
                <MatrixWidth>{matrix_size}</MatrixWidth>
                <MatrixHeight>{matrix_size}</MatrixHeight>
            </TileMatrix>"#,
        scale_denominator = resolution / STANDARD_PIXEL_SIZE,
        min = -HALF_CIRCUMFERENCE,
        max = HALF_CIRCUMFERENCE,
    )
}

fn capabilities(
    tile_url: &TileUrl,
    tms: &str,
    bounds: Bounds,
    zooms: RangeInclusive<u8>,
) -> String {
    let media_type = tile_url.format.unwrap_or(ImageFormat::Png).content_type();

    let tile_path = format!("{tms}/{{TileMatrix}}/{{TileCol}}/{{TileRow}}");

    let tile_template = escape(&tile_url.tiles(&tile_path));
    let capabilities_url = escape(&tile_url.resource("/WMTSCapabilities.xml"));
    let tiles_url = escape(&tile_url.resource("/tiles"));

    let matrices = zooms.map(tile_matrix).collect::<String>();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Capabilities
    xmlns="http://www.opengis.net/wmts/1.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:gml="http://www.opengis.net/gml"
    xsi:schemaLocation="http://www.opengis.net/wmts/1.0 http://schemas.opengis.net/wmts/1.0/wmtsGetCapabilities_response.xsd"
    version="1.0.0">
    <ows:ServiceIdentification>
        <ows:Title>{TITLE}</ows:Title>
        <ows:ServiceType>OGC WMTS</ows:ServiceType>
        <ows:ServiceTypeVersion>1.0.0</ows:ServiceTypeVersion>
    </ows:ServiceIdentification>
    <ows:OperationsMetadata>
        <ows:Operation name="GetCapabilities">
            <ows:DCP>
                <ows:HTTP>
                    <ows:Get xlink:href="{capabilities_url}">
                        <ows:Constraint name="GetEncoding">
                            <ows:AllowedValues>
                                <ows:Value>RESTful</ows:Value>
                            </ows:AllowedValues>
                        </ows:Constraint>
                    </ows:Get>
                </ows:HTTP>
            </ows:DCP>
        </ows:Operation>
        <ows:Operation name="GetTile">
            <ows:DCP>
                <ows:HTTP>
                    <ows:Get xlink:href="{tiles_url}">
                        <ows:Constraint name="GetEncoding">
                            <ows:AllowedValues>
                                <ows:Value>RESTful</ows:Value>
                            </ows:AllowedValues>
                        </ows:Constraint>
                    </ows:Get>
                </ows:HTTP>
            </ows:DCP>
        </ows:Operation>
    </ows:OperationsMetadata>
    <Contents>
        <Layer>
            <ows:Title>{TITLE}</ows:Title>
            <ows:Identifier>{TITLE}</ows:Identifier>
            <ows:Abstract>static mosaic</ows:Abstract>
            <ows:WGS84BoundingBox crs="urn:ogc:def:crs:OGC:2:84">
                <ows:LowerCorner>{west} {south}</ows:LowerCorner>
                <ows:UpperCorner>{east} {north}</ows:UpperCorner>
            </ows:WGS84BoundingBox>
            <Style isDefault="true">
                <ows:Identifier>default</ows:Identifier>
            </Style>
            <Format>{media_type}</Format>
            <TileMatrixSetLink>
                <TileMatrixSet>{tms}</TileMatrixSet>
            </TileMatrixSetLink>
            <ResourceURL format="{media_type}" resourceType="tile" template="{tile_template}"/>
        </Layer>
        <TileMatrixSet>
            <ows:Title>{tms}</ows:Title>
            <ows:Identifier>{tms}</ows:Identifier>
            <ows:SupportedCRS>urn:ogc:def:crs:EPSG::3857</ows:SupportedCRS>{matrices}
        </TileMatrixSet>
    </Contents>
    <ServiceMetadataURL xlink:href="{capabilities_url}"/>
</Capabilities>
"#,
        west = bounds.west,
        south = bounds.south,
        east = bounds.east,
        north = bounds.north,
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_zero_matrix() {
        let matrix = tile_matrix(0);

        assert!(matrix.contains("<ScaleDenominator>559082264.028"));
        assert!(matrix.contains("<MatrixWidth>1</MatrixWidth>"));
        assert!(matrix.contains("<TopLeftCorner>-20037508.342789244 20037508.342789244"));
    }

    #[test]
    fn matrix_width_doubles_per_zoom() {
        assert!(tile_matrix(3).contains("<MatrixWidth>8</MatrixWidth>"));
        assert!(tile_matrix(30).contains("<MatrixHeight>1073741824</MatrixHeight>"));
    }

    #[test]
    fn escapes_query_separators() {
        assert_eq!(escape("a?url=x.tif&bidx=1"), "a?url=x.tif&amp;bidx=1");
    }
}
