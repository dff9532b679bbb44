use crate::mosaic::Bounds;
use serde::{Serialize, Serializer, ser::SerializeMap};

pub(crate) const MOSAICJSON_VERSION: &str = "0.0.2";

/// Tile index of a mosaic that has none. It cannot hold entries and always
/// serializes as `{}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EmptyTileIndex;

impl EmptyTileIndex {
    pub(crate) fn quadkeys(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Serialize for EmptyTileIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// Synthetic mosaic document exposed by backends without a spatial index.
///
/// Only the zoom range is meaningful; asset lookup never goes through it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct PlaceholderMosaic {
    mosaicjson: &'static str,
    name: String,
    minzoom: u8,
    maxzoom: u8,
    tiles: EmptyTileIndex,
}

impl PlaceholderMosaic {
    pub(crate) fn new(name: impl Into<String>, minzoom: u8, maxzoom: u8) -> Self {
        Self {
            mosaicjson: MOSAICJSON_VERSION,
            name: name.into(),
            minzoom,
            maxzoom,
            tiles: EmptyTileIndex,
        }
    }

    pub(crate) fn minzoom(&self) -> u8 {
        self.minzoom
    }

    pub(crate) fn maxzoom(&self) -> u8 {
        self.maxzoom
    }

    pub(crate) fn tiles(&self) -> EmptyTileIndex {
        self.tiles
    }
}

/// Declared metadata of a mosaic.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MosaicMetadata {
    pub(crate) name: String,
    pub(crate) bounds: Bounds,
    pub(crate) minzoom: u8,
    pub(crate) maxzoom: u8,
}

impl MosaicMetadata {
    /// `[lon, lat, zoom]` at the middle of the bounds, on the lowest zoom.
    pub(crate) fn center(&self) -> [f64; 3] {
        let (lon, lat) = self.bounds.center();

        [lon, lat, self.minzoom as f64]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MosaicInfo {
    pub(crate) bounds: Bounds,
    pub(crate) center: [f64; 3],
    pub(crate) maxzoom: u8,
    pub(crate) minzoom: u8,
    pub(crate) name: String,
    pub(crate) quadkeys: Vec<String>,
}
