use crate::{
    app::TileCoord,
    mosaic::{
        AssetSet, BackendError, Bounds, MosaicBackend, MosaicMetadata, PlaceholderMosaic,
        ReaderOptions,
    },
};

const PLACEHOLDER_NAME: &str = "it's fake but it's ok";

/// Deepest zoom the tile routes serve.
pub(crate) const MAX_ZOOM: u8 = 30;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolverConfig {
    pub(crate) bounds: Bounds,
    pub(crate) minzoom: u8,
    pub(crate) maxzoom: u8,
    pub(crate) tms: &'static str,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::WORLD,
            minzoom: 0,
            maxzoom: MAX_ZOOM,
            tms: "WebMercatorQuad",
        }
    }
}

/// Backend that serves the same asset list for every tile and point.
///
/// Useful when the caller already knows which files belong together and
/// wants all of them mosaicked everywhere. Bounds and zoom range are only
/// declared, nothing checks them against the assets.
#[derive(Clone, Debug)]
pub(crate) struct StaticBackend {
    assets: AssetSet,
    reader_options: ReaderOptions,
    config: ResolverConfig,
}

impl StaticBackend {
    pub(crate) fn new(
        assets: AssetSet,
        reader_options: ReaderOptions,
        config: ResolverConfig,
    ) -> Self {
        Self {
            assets,
            reader_options,
            config,
        }
    }

    pub(crate) fn tms(&self) -> &str {
        self.config.tms
    }
}

impl MosaicBackend for StaticBackend {
    fn assets_for_tile(&self, _tile: TileCoord) -> AssetSet {
        self.assets.clone()
    }

    fn assets_for_point(&self, _lon: f64, _lat: f64) -> AssetSet {
        self.assets.clone()
    }

    fn mosaic_def(&self) -> PlaceholderMosaic {
        PlaceholderMosaic::new(PLACEHOLDER_NAME, self.config.minzoom, self.config.maxzoom)
    }

    fn metadata(&self) -> MosaicMetadata {
        MosaicMetadata {
            name: self.assets.to_string(),
            bounds: self.config.bounds,
            minzoom: self.config.minzoom,
            maxzoom: self.config.maxzoom,
        }
    }

    fn reader_options(&self) -> &ReaderOptions {
        &self.reader_options
    }

    fn write(&self, _overwrite: bool) -> Result<(), BackendError> {
        Ok(())
    }

    fn update(&mut self, _assets: &AssetSet, _add_first: bool) -> Result<(), BackendError> {
        Ok(())
    }

    fn read(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cogs() -> StaticBackend {
        StaticBackend::new(
            AssetSet::from(["cog1.tif", "cog2.tif"]),
            ReaderOptions::default(),
            ResolverConfig::default(),
        )
    }

    #[test]
    fn tile_lookup_returns_all_assets_in_order() {
        let backend = cogs();

        let assets = backend.assets_for_tile(TileCoord { zoom: 1, x: 1, y: 1 });

        assert_eq!(assets.as_slice(), ["cog1.tif", "cog2.tif"]);
    }

    #[test]
    fn tile_lookup_ignores_coordinates() {
        let backend = cogs();

        for tile in [
            TileCoord { zoom: 0, x: 0, y: 0 },
            TileCoord { zoom: 12, x: 2200, y: 1400 },
            TileCoord { zoom: 30, x: u32::MAX, y: u32::MAX },
        ] {
            assert_eq!(backend.assets_for_tile(tile).as_slice(), ["cog1.tif", "cog2.tif"]);
        }
    }

    #[test]
    fn point_lookup_ignores_coordinates() {
        let backend = cogs();

        assert_eq!(backend.assets_for_point(10.5, 45.2).as_slice(), ["cog1.tif", "cog2.tif"]);

        // outside the declared bounds
        assert_eq!(backend.assets_for_point(400.0, -95.0).as_slice(), ["cog1.tif", "cog2.tif"]);
    }

    #[test]
    fn empty_asset_list_yields_empty_lookups() {
        let backend = StaticBackend::new(
            AssetSet::default(),
            ReaderOptions::default(),
            ResolverConfig::default(),
        );

        assert!(backend.assets_for_tile(TileCoord { zoom: 3, x: 1, y: 2 }).is_empty());
        assert!(backend.assets_for_point(0.0, 0.0).is_empty());
    }

    #[test]
    fn lookups_are_idempotent() {
        let backend = cogs();
        let tile = TileCoord { zoom: 5, x: 10, y: 20 };

        assert_eq!(backend.assets_for_tile(tile), backend.assets_for_tile(tile));
        assert_eq!(
            backend.assets_for_point(-3.0, 51.0),
            backend.assets_for_point(-3.0, 51.0)
        );
    }

    #[test]
    fn default_placeholder_reports_full_zoom_range_and_no_tiles() {
        let doc = cogs().mosaic_def();

        assert_eq!(doc.minzoom(), 0);
        assert_eq!(doc.maxzoom(), 30);
        assert_eq!(serde_json::to_value(doc).unwrap()["tiles"], json!({}));
    }

    #[test]
    fn placeholder_reports_configured_zoom_range() {
        let backend = StaticBackend::new(
            AssetSet::from(["a.tif"]),
            ReaderOptions::default(),
            ResolverConfig {
                minzoom: 7,
                maxzoom: 16,
                ..ResolverConfig::default()
            },
        );

        let doc = backend.mosaic_def();

        assert_eq!((doc.minzoom(), doc.maxzoom()), (7, 16));
        assert_eq!(backend.metadata().minzoom, 7);
        assert_eq!(backend.metadata().maxzoom, 16);
    }

    #[test]
    fn persistence_hooks_are_noops() {
        let mut backend = cogs();

        backend.write(true).unwrap();
        backend.update(&AssetSet::from(["cog3.tif"]), true).unwrap();
        backend.read().unwrap();

        assert_eq!(
            backend.assets_for_tile(TileCoord { zoom: 0, x: 0, y: 0 }).as_slice(),
            ["cog1.tif", "cog2.tif"]
        );
    }

    #[test]
    fn info_lists_no_quadkeys() {
        let info = cogs().info();

        assert!(info.quadkeys.is_empty());
        assert_eq!(info.name, "cog1.tif,cog2.tif");
        assert_eq!(info.bounds, Bounds::WORLD);
        assert_eq!(info.center, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn reader_options_are_passed_through() {
        let options = ReaderOptions {
            indexes: Some(vec![3, 2, 1]),
            nodata: Some(0.0),
            rescale: None,
        };

        let backend = StaticBackend::new(
            AssetSet::from(["a.tif"]),
            options.clone(),
            ResolverConfig::default(),
        );

        assert_eq!(backend.reader_options(), &options);
        assert_eq!(backend.tms(), "WebMercatorQuad");
    }
}
