use crate::render::{
    AssetReader, ImageFormat, RasterTile, ReadError,
    image_format::encode,
    render_request::{AssetValues, PointRequest, RenderedTile, TileRequest},
};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RenderError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("{asset} has {found} bands, expected {expected}")]
    BandCountMismatch {
        asset: String,
        expected: usize,
        found: usize,
    },

    #[error("no asset has data for this request")]
    NoData,

    #[error("Error encoding image: {0}")]
    ImageEncoding(Box<dyn std::error::Error + Send + Sync>),
}

/// Stacks the assets in order and combines overlapping pixels with the
/// request's pixel selection. With `first`, reading stops once the tile is
/// complete.
pub(crate) fn mosaic_assets<R: AssetReader>(
    reader: &mut R,
    request: &TileRequest,
) -> Result<Option<(RasterTile, Vec<String>)>, RenderError> {
    let _span = tracy_client::span!("mosaic_assets");

    let selection = request.pixel_selection;

    let mut mosaic: Option<RasterTile> = None;
    let mut layers = Vec::new();
    let mut assets_used = Vec::new();

    for asset in request.assets.iter() {
        let Some(tile) =
            reader.read_tile(asset, request.bbox, request.tile_size, &request.options)?
        else {
            continue;
        };

        if !tile.has_data() {
            continue;
        }

        let expected = mosaic
            .as_ref()
            .or(layers.first())
            .map(RasterTile::band_count);

        if let Some(expected) = expected.filter(|&expected| expected != tile.band_count()) {
            return Err(RenderError::BandCountMismatch {
                asset: asset.clone(),
                expected,
                found: tile.band_count(),
            });
        }

        if !selection.stops_when_full() {
            assets_used.push(asset.clone());
            layers.push(tile);

            continue;
        }

        match mosaic.as_mut() {
            None => {
                assets_used.push(asset.clone());
                mosaic = Some(tile);
            }
            Some(mosaic) => {
                if mosaic.fill_from(&tile) > 0 {
                    assets_used.push(asset.clone());
                }
            }
        }

        if mosaic.as_ref().is_some_and(RasterTile::is_full) {
            break;
        }
    }

    let mosaic = if selection.stops_when_full() {
        mosaic
    } else {
        selection.merge(&layers)
    };

    Ok(mosaic.map(|tile| (tile, assets_used)))
}

pub(crate) fn render_tile<R: AssetReader>(
    request: &TileRequest,
    reader: &mut R,
) -> Result<RenderedTile, RenderError> {
    let _span = tracy_client::span!("render_tile");

    let started_at = Instant::now();

    let (tile, assets_used) = mosaic_assets(reader, request)?.ok_or(RenderError::NoData)?;

    let mosaicked_at = Instant::now();

    let format = request.format.unwrap_or_else(|| ImageFormat::auto(&tile));
    let data = encode(&tile, format, request.options.rescale)?;

    Ok(RenderedTile {
        data,
        format,
        assets_used,
        timings: vec![
            ("Read-and-mosaic", mosaicked_at - started_at),
            ("Format", mosaicked_at.elapsed()),
        ],
    })
}

/// Values of every asset covering the point, in asset order.
pub(crate) fn query_point<R: AssetReader>(
    request: &PointRequest,
    reader: &mut R,
) -> Result<Vec<AssetValues>, RenderError> {
    let _span = tracy_client::span!("query_point");

    let mut result = Vec::new();

    for asset in request.assets.iter() {
        let values = reader.read_point(asset, request.lon, request.lat, &request.options)?;

        if let Some(values) = values {
            result.push(AssetValues {
                asset: asset.clone(),
                values,
            });
        }
    }

    if result.is_empty() {
        return Err(RenderError::NoData);
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        mosaic::{AssetSet, ReaderOptions},
        render::PixelSelection,
    };
    use geo::Rect;
    use std::collections::HashMap;

    /// In-memory reader: every asset is a 2x2 tile, `None` values are empty.
    #[derive(Clone, Default)]
    pub(crate) struct FakeReader {
        pub(crate) tiles: HashMap<String, Vec<Vec<Option<f64>>>>,
        pub(crate) reads: Vec<String>,
    }

    impl FakeReader {
        pub(crate) fn with(mut self, asset: &str, bands: Vec<Vec<Option<f64>>>) -> Self {
            self.tiles.insert(asset.to_owned(), bands);
            self
        }
    }

    impl AssetReader for FakeReader {
        fn read_tile(
            &mut self,
            asset: &str,
            _bbox: Rect<f64>,
            _size: u32,
            _options: &ReaderOptions,
        ) -> Result<Option<RasterTile>, ReadError> {
            self.reads.push(asset.to_owned());

            let Some(bands) = self.tiles.get(asset) else {
                return Ok(None);
            };

            let mut tile = RasterTile::new(2, 2, bands.len());

            for i in 0..4 {
                tile.mask[i] = bands.iter().all(|band| band[i].is_some());

                for (b, band) in bands.iter().enumerate() {
                    tile.bands[b][i] = band[i].unwrap_or(0.0);
                }
            }

            Ok(Some(tile))
        }

        fn read_point(
            &mut self,
            asset: &str,
            _lon: f64,
            _lat: f64,
            _options: &ReaderOptions,
        ) -> Result<Option<Vec<f64>>, ReadError> {
            Ok(self
                .tiles
                .get(asset)
                .and_then(|bands| bands.iter().map(|band| band[0]).collect()))
        }
    }

    fn request(assets: AssetSet) -> TileRequest {
        TileRequest {
            bbox: Rect::new((0.0, 0.0), (1.0, 1.0)),
            tile_size: 2,
            format: None,
            pixel_selection: PixelSelection::First,
            assets,
            options: ReaderOptions::default(),
        }
    }

    #[test]
    fn first_asset_wins_and_gaps_are_filled_in_order() {
        let mut reader = FakeReader::default()
            .with("a.tif", vec![vec![Some(1.0), None, Some(1.0), None]])
            .with("b.tif", vec![vec![Some(2.0), Some(2.0), None, None]])
            .with("c.tif", vec![vec![Some(3.0); 4]]);

        let request = request(["a.tif", "b.tif", "c.tif"].into());

        let (tile, used) = mosaic_assets(&mut reader, &request).unwrap().unwrap();

        assert_eq!(tile.bands[0], vec![1.0, 2.0, 1.0, 3.0]);
        assert!(tile.is_full());
        assert_eq!(used, vec!["a.tif", "b.tif", "c.tif"]);
    }

    #[test]
    fn stops_reading_once_full() {
        let mut reader = FakeReader::default()
            .with("a.tif", vec![vec![Some(1.0); 4]])
            .with("b.tif", vec![vec![Some(2.0); 4]]);

        let request = request(["a.tif", "b.tif"].into());

        let (_, used) = mosaic_assets(&mut reader, &request).unwrap().unwrap();

        assert_eq!(used, vec!["a.tif"]);
        assert_eq!(reader.reads, vec!["a.tif"]);
    }

    #[test]
    fn assets_adding_nothing_are_not_reported() {
        let mut reader = FakeReader::default()
            .with("a.tif", vec![vec![Some(1.0), Some(1.0), None, None]])
            .with("b.tif", vec![vec![Some(2.0), Some(2.0), None, None]]);

        let request = request(["a.tif", "b.tif"].into());

        let (tile, used) = mosaic_assets(&mut reader, &request).unwrap().unwrap();

        assert_eq!(used, vec!["a.tif"]);
        assert_eq!(tile.mask, vec![true, true, false, false]);
    }

    #[test]
    fn highest_reads_every_asset() {
        let mut reader = FakeReader::default()
            .with("a.tif", vec![vec![Some(1.0); 4]])
            .with("b.tif", vec![vec![Some(4.0), None, Some(0.5), None]])
            .with("c.tif", vec![vec![None; 4]]);

        let request = TileRequest {
            pixel_selection: PixelSelection::Highest,
            ..request(["a.tif", "b.tif", "c.tif"].into())
        };

        let (tile, used) = mosaic_assets(&mut reader, &request).unwrap().unwrap();

        assert_eq!(tile.bands[0], vec![4.0, 1.0, 1.0, 1.0]);
        assert_eq!(used, vec!["a.tif", "b.tif"]);
        assert_eq!(reader.reads, vec!["a.tif", "b.tif", "c.tif"]);
    }

    #[test]
    fn band_count_mismatch_is_an_error() {
        let mut reader = FakeReader::default()
            .with("gray.tif", vec![vec![Some(1.0), None, None, None]])
            .with("rgb.tif", vec![vec![Some(1.0); 4]; 3]);

        let result = mosaic_assets(&mut reader, &request(["gray.tif", "rgb.tif"].into()));

        assert!(matches!(
            result,
            Err(RenderError::BandCountMismatch {
                expected: 1,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn no_assets_means_no_data() {
        let mut reader = FakeReader::default();

        assert!(matches!(
            render_tile(&request(AssetSet::default()), &mut reader),
            Err(RenderError::NoData)
        ));
    }

    #[test]
    fn render_reports_format_and_timings() {
        let mut reader =
            FakeReader::default().with("a.tif", vec![vec![Some(1.0), None, Some(1.0), None]]);

        let rendered = render_tile(&request(["a.tif"].into()), &mut reader).unwrap();

        assert_eq!(rendered.format, ImageFormat::Png);
        assert_eq!(rendered.assets_used, vec!["a.tif"]);
        assert_eq!(rendered.timings.len(), 2);
        assert!(!rendered.data.is_empty());
    }

    #[test]
    fn point_skips_assets_without_value() {
        let mut reader = FakeReader::default()
            .with("a.tif", vec![vec![Some(5.0), None, None, None]])
            .with("b.tif", vec![vec![None; 4]]);

        let values = query_point(
            &PointRequest {
                lon: 10.5,
                lat: 45.2,
                assets: ["missing.tif", "a.tif", "b.tif"].into(),
                options: ReaderOptions::default(),
            },
            &mut reader,
        )
        .unwrap();

        assert_eq!(
            values,
            vec![AssetValues {
                asset: "a.tif".into(),
                values: vec![5.0],
            }]
        );
    }
}
