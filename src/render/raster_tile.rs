/// Pixel block read from one or more assets, bands stored one after another.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RasterTile {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) bands: Vec<Vec<f64>>,
    /// `true` where the pixel holds data.
    pub(crate) mask: Vec<bool>,
}

impl RasterTile {
    pub(crate) fn new(width: u32, height: u32, band_count: usize) -> Self {
        let len = width as usize * height as usize;

        Self {
            width,
            height,
            bands: vec![vec![0.0; len]; band_count],
            mask: vec![false; len],
        }
    }

    pub(crate) fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub(crate) fn has_data(&self) -> bool {
        self.mask.iter().any(|valid| *valid)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.mask.iter().all(|valid| *valid)
    }

    /// Copies valid pixels of `other` into pixels that are still empty.
    /// Returns how many pixels were filled.
    pub(crate) fn fill_from(&mut self, other: &RasterTile) -> usize {
        debug_assert_eq!(self.mask.len(), other.mask.len());
        debug_assert_eq!(self.band_count(), other.band_count());

        let mut filled = 0;

        for (i, valid) in self.mask.iter_mut().enumerate() {
            if *valid || !other.mask[i] {
                continue;
            }

            for (band, other_band) in self.bands.iter_mut().zip(&other.bands) {
                band[i] = other_band[i];
            }

            *valid = true;
            filled += 1;
        }

        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(values: [f64; 4], mask: [bool; 4]) -> RasterTile {
        RasterTile {
            width: 2,
            height: 2,
            bands: vec![values.to_vec()],
            mask: mask.to_vec(),
        }
    }

    #[test]
    fn fill_keeps_existing_pixels() {
        let mut base = tile([1.0, 0.0, 3.0, 0.0], [true, false, true, false]);
        let top = tile([9.0, 9.0, 9.0, 9.0], [true, true, true, false]);

        assert_eq!(base.fill_from(&top), 1);
        assert_eq!(base.bands[0], vec![1.0, 9.0, 3.0, 0.0]);
        assert_eq!(base.mask, vec![true, true, true, false]);
        assert!(!base.is_full());
    }

    #[test]
    fn new_tile_is_empty() {
        let tile = RasterTile::new(4, 3, 3);

        assert_eq!(tile.band_count(), 3);
        assert_eq!(tile.mask.len(), 12);
        assert!(!tile.has_data());
    }
}
