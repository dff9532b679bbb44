use crate::{mosaic::ReaderOptions, render::RasterTile};
use geo::Rect;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReadError {
    #[error("GDAL error reading {asset}: {source}")]
    Gdal {
        asset: String,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("cannot build transformation for {asset}: {source}")]
    Projection {
        asset: String,
        #[source]
        source: proj::ProjCreateError,
    },

    #[error("{asset} has a non-invertible geotransform")]
    GeoTransform { asset: String },

    #[error("{asset} has no band {index}")]
    MissingBand { asset: String, index: usize },
}

/// Raster access used by the renderer. Instances live on a single render
/// worker thread.
pub(crate) trait AssetReader {
    /// Reads the part of `asset` covering `bbox` (EPSG:3857) resampled to
    /// `size`×`size` pixels. `None` when the asset does not touch the tile.
    fn read_tile(
        &mut self,
        asset: &str,
        bbox: Rect<f64>,
        size: u32,
        options: &ReaderOptions,
    ) -> Result<Option<RasterTile>, ReadError>;

    /// Reads band values at a WGS84 point. `None` when the point is outside
    /// the asset.
    fn read_point(
        &mut self,
        asset: &str,
        lon: f64,
        lat: f64,
        options: &ReaderOptions,
    ) -> Result<Option<Vec<f64>>, ReadError>;
}
