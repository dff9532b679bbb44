pub(crate) use asset_reader::{AssetReader, ReadError};
pub(crate) use gdal_reader::GdalReader;
pub(crate) use image_format::ImageFormat;
pub(crate) use pixel_selection::PixelSelection;
pub(crate) use raster_tile::RasterTile;
pub(crate) use render::RenderError;
#[cfg(test)]
pub(crate) use render::tests::FakeReader;
pub(crate) use render_request::{PointRequest, TileRequest};
pub(crate) use render_worker_pool::{ReError, RenderWorkerPool};

mod asset_reader;
mod gdal_reader;
mod image_format;
mod pixel_selection;
mod raster_tile;
mod render;
mod render_request;
mod render_worker_pool;
