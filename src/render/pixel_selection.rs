use crate::render::RasterTile;
use serde::Deserialize;

/// How overlapping assets are combined into one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PixelSelection {
    /// Value of the first asset with data.
    #[default]
    First,
    Highest,
    Lowest,
    Mean,
    Median,
    /// Population standard deviation.
    Stdev,
}

impl PixelSelection {
    /// Reading may stop once every pixel holds a value.
    pub(crate) fn stops_when_full(self) -> bool {
        self == Self::First
    }

    /// Merges tiles of equal size and band count, band by band.
    /// Returns `None` when no layer has data.
    pub(crate) fn merge(self, layers: &[RasterTile]) -> Option<RasterTile> {
        let first = layers.first()?;

        let mut merged = RasterTile::new(first.width, first.height, first.band_count());
        let mut values = Vec::with_capacity(layers.len());

        for i in 0..merged.mask.len() {
            for b in 0..merged.band_count() {
                values.clear();
                values.extend(
                    layers
                        .iter()
                        .filter(|layer| layer.mask[i])
                        .map(|layer| layer.bands[b][i]),
                );

                if values.is_empty() {
                    break;
                }

                merged.bands[b][i] = self.reduce(&mut values);
                merged.mask[i] = true;
            }
        }

        merged.has_data().then_some(merged)
    }

    fn reduce(self, values: &mut [f64]) -> f64 {
        let count = values.len() as f64;

        match self {
            Self::First => values[0],
            Self::Highest => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Lowest => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Mean => values.iter().sum::<f64>() / count,
            Self::Median => {
                values.sort_by(f64::total_cmp);

                let mid = values.len() / 2;

                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
            Self::Stdev => {
                let mean = values.iter().sum::<f64>() / count;

                (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt()
            }
        }
    }
}
