use crate::{
    mosaic::ReaderOptions,
    render::{AssetReader, RasterTile, ReadError},
};
use gdal::{Dataset, errors::GdalError, raster::ResampleAlg};
use geo::Rect;
use proj::{Proj, ProjCreateError};
use std::{
    borrow::Cow,
    collections::{HashMap, hash_map::Entry},
};
use tracing::debug;

const MAX_OPEN_ASSETS: usize = 64;

/// Output pixel centres are projected exactly on a grid of this many cells
/// per side and interpolated in between.
const GRID_CELLS: usize = 16;

/// Assumed CRS of rasters without a projection.
const DEFAULT_CRS: &str = "EPSG:4326";

/// World to pixel mapping, the inverse of a GDAL geotransform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InverseGeoTransform {
    origin_x: f64,
    origin_y: f64,
    a: f64,
    b: f64,
    d: f64,
    e: f64,
}

impl InverseGeoTransform {
    pub(crate) fn new(gt: &[f64; 6]) -> Option<Self> {
        let det = gt[1] * gt[5] - gt[2] * gt[4];

        if det == 0.0 || !det.is_finite() {
            return None;
        }

        Some(Self {
            origin_x: gt[0],
            origin_y: gt[3],
            a: gt[5] / det,
            b: -gt[2] / det,
            d: -gt[4] / det,
            e: gt[1] / det,
        })
    }

    /// Returns fractional `(column, row)`.
    pub(crate) fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        (
            self.a.mul_add(dx, self.b * dy),
            self.d.mul_add(dx, self.e * dy),
        )
    }
}

struct OpenAsset {
    dataset: Dataset,
    size: (usize, usize),
    band_count: usize,
    to_pixel: InverseGeoTransform,
    from_web_mercator: Proj,
    from_wgs84: Proj,
}

impl OpenAsset {
    fn open(asset: &str) -> Result<Self, ReadError> {
        let gdal_err = |source: GdalError| ReadError::Gdal {
            asset: asset.to_owned(),
            source,
        };

        let proj_err = |source: ProjCreateError| ReadError::Projection {
            asset: asset.to_owned(),
            source,
        };

        let dataset = Dataset::open(&*gdal_path(asset)).map_err(gdal_err)?;

        let to_pixel = InverseGeoTransform::new(&dataset.geo_transform().map_err(gdal_err)?)
            .ok_or_else(|| ReadError::GeoTransform {
                asset: asset.to_owned(),
            })?;

        let projection = dataset.projection();

        let crs = if projection.trim().is_empty() {
            DEFAULT_CRS
        } else {
            projection.as_str()
        };

        let from_web_mercator = Proj::new_known_crs("EPSG:3857", crs, None).map_err(proj_err)?;
        let from_wgs84 = Proj::new_known_crs("EPSG:4326", crs, None).map_err(proj_err)?;

        let size = dataset.raster_size();
        let band_count = usize::try_from(dataset.raster_count()).unwrap_or(0);

        debug!(asset, width = size.0, height = size.1, band_count, "opened asset");

        Ok(Self {
            dataset,
            size,
            band_count,
            to_pixel,
            from_web_mercator,
            from_wgs84,
        })
    }

    fn band_indexes(&self, asset: &str, options: &ReaderOptions) -> Result<Vec<usize>, ReadError> {
        let indexes = options.indexes.clone().unwrap_or_else(|| {
            if self.band_count >= 3 {
                vec![1, 2, 3]
            } else {
                vec![1]
            }
        });

        if let Some(&index) = indexes.iter().find(|&&index| index > self.band_count) {
            return Err(ReadError::MissingBand {
                asset: asset.to_owned(),
                index,
            });
        }

        Ok(indexes)
    }

    fn contains(&self, column: f64, row: f64) -> bool {
        column >= 0.0 && row >= 0.0 && column < self.size.0 as f64 && row < self.size.1 as f64
    }
}

/// GDAL backed reader. Keeps opened datasets between requests.
pub(crate) struct GdalReader {
    assets: HashMap<String, OpenAsset>,
}

impl GdalReader {
    pub(crate) fn new() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }

    fn open(&mut self, asset: &str) -> Result<&OpenAsset, ReadError> {
        if self.assets.len() >= MAX_OPEN_ASSETS && !self.assets.contains_key(asset) {
            self.assets.clear();
        }

        let open = match self.assets.entry(asset.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(OpenAsset::open(asset)?),
        };

        Ok(&*open)
    }
}

impl AssetReader for GdalReader {
    fn read_tile(
        &mut self,
        asset: &str,
        bbox: Rect<f64>,
        size: u32,
        options: &ReaderOptions,
    ) -> Result<Option<RasterTile>, ReadError> {
        let _span = tracy_client::span!("read_tile");

        let gdal_err = |source: GdalError| ReadError::Gdal {
            asset: asset.to_owned(),
            source,
        };

        let open = self.open(asset)?;
        let indexes = open.band_indexes(asset, options)?;

        let pixels = source_pixels(bbox, size as usize, |x, y| {
            open.from_web_mercator
                .convert((x, y))
                .ok()
                .map(|(sx, sy)| open.to_pixel.to_pixel(sx, sy))
        });

        let Some(window) = Window::covering(&pixels, open.size) else {
            return Ok(None);
        };

        let buffer_size = (
            window.size.0.min(size as usize * 2),
            window.size.1.min(size as usize * 2),
        );

        let mut band_data = Vec::with_capacity(indexes.len());

        for &index in &indexes {
            let band = open.dataset.rasterband(index).map_err(gdal_err)?;

            let buffer = band
                .read_as::<f64>(
                    (window.offset.0 as isize, window.offset.1 as isize),
                    window.size,
                    buffer_size,
                    Some(ResampleAlg::NearestNeighbour),
                )
                .map_err(gdal_err)?;

            band_data.push((buffer, options.nodata.or_else(|| band.no_data_value())));
        }

        let mut tile = RasterTile::new(size, size, indexes.len());

        for (i, pixel) in pixels.iter().enumerate() {
            let Some((column, row)) = *pixel else {
                continue;
            };

            if !open.contains(column, row) {
                continue;
            }

            let (bx, by) = window.buffer_position(column, row, buffer_size);
            let mut valid = true;

            for (b, (buffer, nodata)) in band_data.iter().enumerate() {
                let value = buffer.data()[by * buffer_size.0 + bx];

                if is_nodata(value, *nodata) {
                    valid = false;
                }

                tile.bands[b][i] = value;
            }

            tile.mask[i] = valid;
        }

        Ok(tile.has_data().then_some(tile))
    }

    fn read_point(
        &mut self,
        asset: &str,
        lon: f64,
        lat: f64,
        options: &ReaderOptions,
    ) -> Result<Option<Vec<f64>>, ReadError> {
        let gdal_err = |source: GdalError| ReadError::Gdal {
            asset: asset.to_owned(),
            source,
        };

        let open = self.open(asset)?;
        let indexes = open.band_indexes(asset, options)?;

        let Ok((x, y)) = open.from_wgs84.convert((lon, lat)) else {
            return Ok(None);
        };

        let (column, row) = open.to_pixel.to_pixel(x, y);

        if !open.contains(column, row) {
            return Ok(None);
        }

        let mut samples = Vec::with_capacity(indexes.len());

        for index in indexes {
            let band = open.dataset.rasterband(index).map_err(gdal_err)?;

            let buffer = band
                .read_as::<f64>((column as isize, row as isize), (1, 1), (1, 1), None)
                .map_err(gdal_err)?;

            samples.push((buffer.data()[0], options.nodata.or_else(|| band.no_data_value())));
        }

        Ok(point_values(&samples))
    }
}

/// Source raster window, in pixels, that the tile samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Window {
    offset: (usize, usize),
    size: (usize, usize),
}

impl Window {
    fn covering(pixels: &[Option<(f64, f64)>], raster_size: (usize, usize)) -> Option<Self> {
        let (width, height) = (raster_size.0 as f64, raster_size.1 as f64);

        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for &(column, row) in pixels.iter().flatten() {
            if column < 0.0 || row < 0.0 || column >= width || row >= height {
                continue;
            }

            min = (min.0.min(column), min.1.min(row));
            max = (max.0.max(column), max.1.max(row));
        }

        if !min.0.is_finite() {
            return None;
        }

        let offset = (min.0.floor() as usize, min.1.floor() as usize);
        let end = (
            (max.0.floor() as usize + 1).min(raster_size.0),
            (max.1.floor() as usize + 1).min(raster_size.1),
        );

        Some(Self {
            offset,
            size: (end.0 - offset.0, end.1 - offset.1),
        })
    }

    fn buffer_position(
        &self,
        column: f64,
        row: f64,
        buffer_size: (usize, usize),
    ) -> (usize, usize) {
        let scale = |value: f64, offset: usize, window: usize, buffer: usize| {
            let position = (value - offset as f64) / window as f64 * buffer as f64;

            (position.max(0.0) as usize).min(buffer - 1)
        };

        (
            scale(column, self.offset.0, self.size.0, buffer_size.0),
            scale(row, self.offset.1, self.size.1, buffer_size.1),
        )
    }
}

/// Source pixel position of every output pixel centre, row by row.
fn source_pixels(
    bbox: Rect<f64>,
    size: usize,
    to_source_pixel: impl Fn(f64, f64) -> Option<(f64, f64)>,
) -> Vec<Option<(f64, f64)>> {
    let step_x = bbox.width() / GRID_CELLS as f64;
    let step_y = bbox.height() / GRID_CELLS as f64;
    let stride = GRID_CELLS + 1;

    let mut nodes = Vec::with_capacity(stride * stride);

    for j in 0..stride {
        for i in 0..stride {
            nodes.push(to_source_pixel(
                (i as f64).mul_add(step_x, bbox.min().x),
                (j as f64).mul_add(-step_y, bbox.max().y),
            ));
        }
    }

    let cell = |pixel: usize| {
        let u = (pixel as f64 + 0.5) / size as f64 * GRID_CELLS as f64;
        let index = (u.floor() as usize).min(GRID_CELLS - 1);

        (index, u - index as f64)
    };

    let mut pixels = Vec::with_capacity(size * size);

    for py in 0..size {
        let (j, ty) = cell(py);

        for px in 0..size {
            let (i, tx) = cell(px);

            let corners = (
                nodes[j * stride + i],
                nodes[j * stride + i + 1],
                nodes[(j + 1) * stride + i],
                nodes[(j + 1) * stride + i + 1],
            );

            pixels.push(match corners {
                (Some(tl), Some(tr), Some(bl), Some(br)) => {
                    let lerp = |a: f64, b: f64, t: f64| (b - a).mul_add(t, a);

                    let top = (lerp(tl.0, tr.0, tx), lerp(tl.1, tr.1, tx));
                    let bottom = (lerp(bl.0, br.0, tx), lerp(bl.1, br.1, tx));

                    Some((lerp(top.0, bottom.0, ty), lerp(top.1, bottom.1, ty)))
                }
                _ => None,
            });
        }
    }

    pixels
}

fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nodata) if nodata.is_nan() => value.is_nan(),
        Some(nodata) => value == nodata,
        None => false,
    }
}

/// Band values at a point, `None` when every band is nodata there.
fn point_values(samples: &[(f64, Option<f64>)]) -> Option<Vec<f64>> {
    if samples.iter().all(|&(value, nodata)| is_nodata(value, nodata)) {
        return None;
    }

    Some(samples.iter().map(|&(value, _)| value).collect())
}

/// Maps remote URLs to GDAL virtual file system paths.
fn gdal_path(asset: &str) -> Cow<'_, str> {
    if asset.starts_with("http://") || asset.starts_with("https://") {
        Cow::Owned(format!("/vsicurl/{asset}"))
    } else if let Some(rest) = asset.strip_prefix("s3://") {
        Cow::Owned(format!("/vsis3/{rest}"))
    } else {
        Cow::Borrowed(asset)
    }
}
