use crate::{
    app::TileCoord,
    mosaic::{AssetSet, MosaicInfo, MosaicMetadata, PlaceholderMosaic, ReaderOptions},
};

/// Failure of the mosaic document storage. Only backends persisting the
/// document produce one; [`StaticBackend`](crate::mosaic::StaticBackend)
/// never does.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BackendError {
    #[error("mosaic storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data source contract of the tiling pipeline: which assets feed a request,
/// plus the mosaic document lifecycle.
pub(crate) trait MosaicBackend {
    fn assets_for_tile(&self, tile: TileCoord) -> AssetSet;

    fn assets_for_point(&self, lon: f64, lat: f64) -> AssetSet;

    fn mosaic_def(&self) -> PlaceholderMosaic;

    fn metadata(&self) -> MosaicMetadata;

    fn reader_options(&self) -> &ReaderOptions;

    /// Persists the mosaic document.
    fn write(&self, overwrite: bool) -> Result<(), BackendError>;

    /// Adds assets to the persisted mosaic document.
    fn update(&mut self, assets: &AssetSet, add_first: bool) -> Result<(), BackendError>;

    /// Reloads the mosaic document from its storage.
    fn read(&mut self) -> Result<(), BackendError>;

    fn info(&self) -> MosaicInfo {
        let metadata = self.metadata();

        MosaicInfo {
            bounds: metadata.bounds,
            center: metadata.center(),
            maxzoom: metadata.maxzoom,
            minzoom: metadata.minzoom,
            quadkeys: self.mosaic_def().tiles().quadkeys(),
            name: metadata.name,
        }
    }
}
