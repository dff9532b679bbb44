use crate::{
    mosaic::{AssetSet, ReaderOptions},
    render::{ImageFormat, PixelSelection},
};
use geo::Rect;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct TileRequest {
    /// Tile bounds in EPSG:3857.
    pub(crate) bbox: Rect<f64>,
    pub(crate) tile_size: u32,
    /// `None` picks the format from the mosaicked data.
    pub(crate) format: Option<ImageFormat>,
    pub(crate) pixel_selection: PixelSelection,
    pub(crate) assets: AssetSet,
    pub(crate) options: ReaderOptions,
}

#[derive(Debug, Clone)]
pub(crate) struct PointRequest {
    pub(crate) lon: f64,
    pub(crate) lat: f64,
    pub(crate) assets: AssetSet,
    pub(crate) options: ReaderOptions,
}

#[derive(Debug)]
pub(crate) struct RenderedTile {
    pub(crate) data: Vec<u8>,
    pub(crate) format: ImageFormat,
    pub(crate) assets_used: Vec<String>,
    pub(crate) timings: Vec<(&'static str, Duration)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AssetValues {
    pub(crate) asset: String,
    pub(crate) values: Vec<f64>,
}
