pub(crate) use asset_set::AssetSet;
pub(crate) use backend::{BackendError, MosaicBackend};
pub(crate) use bounds::Bounds;
pub(crate) use mosaic_document::{MosaicInfo, MosaicMetadata, PlaceholderMosaic};
pub(crate) use reader_options::ReaderOptions;
pub(crate) use static_backend::{MAX_ZOOM, ResolverConfig, StaticBackend};

mod asset_set;
mod backend;
mod bounds;
mod mosaic_document;
mod reader_options;
mod static_backend;
