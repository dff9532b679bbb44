use regex::Regex;
use std::sync::LazyLock;

static BAND_INDEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Options forwarded untouched to the raster reader.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ReaderOptions {
    /// 1-based band indexes; all bands (up to 3) when unset.
    pub(crate) indexes: Option<Vec<usize>>,
    pub(crate) nodata: Option<f64>,
    pub(crate) rescale: Option<(f64, f64)>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum ReaderOptionsError {
    #[error("band indexes are 1-based, got {0}")]
    ZeroBandIndex(String),

    #[error("invalid band index list '{0}'")]
    InvalidBandIndex(String),

    #[error("rescale must be 'min,max', got '{0}'")]
    InvalidRescale(String),
}

impl ReaderOptions {
    pub(crate) fn parse(
        bidx: Option<&str>,
        nodata: Option<f64>,
        rescale: Option<&str>,
    ) -> Result<Self, ReaderOptionsError> {
        let indexes = bidx.map(parse_band_indexes).transpose()?;
        let rescale = rescale.map(parse_rescale).transpose()?;

        Ok(Self {
            indexes,
            nodata,
            rescale,
        })
    }
}

fn parse_band_indexes(value: &str) -> Result<Vec<usize>, ReaderOptionsError> {
    let indexes = BAND_INDEX
        .find_iter(value)
        .map(|m| {
            m.as_str()
                .parse::<usize>()
                .map_err(|_| ReaderOptionsError::InvalidBandIndex(value.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if indexes.is_empty() {
        return Err(ReaderOptionsError::InvalidBandIndex(value.to_owned()));
    }

    if indexes.contains(&0) {
        return Err(ReaderOptionsError::ZeroBandIndex(value.to_owned()));
    }

    Ok(indexes)
}

fn parse_rescale(value: &str) -> Result<(f64, f64), ReaderOptionsError> {
    let invalid = || ReaderOptionsError::InvalidRescale(value.to_owned());

    let (min, max) = value.split_once(',').ok_or_else(invalid)?;
    let min = min.trim().parse::<f64>().map_err(|_| invalid())?;
    let max = max.trim().parse::<f64>().map_err(|_| invalid())?;

    if min >= max {
        return Err(invalid());
    }

    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_indexes_accept_any_delimiter() {
        let options = ReaderOptions::parse(Some("3,2, 1"), None, None).unwrap();
        assert_eq!(options.indexes, Some(vec![3, 2, 1]));

        let options = ReaderOptions::parse(Some("1;4"), None, None).unwrap();
        assert_eq!(options.indexes, Some(vec![1, 4]));
    }

    #[test]
    fn band_index_zero_is_rejected() {
        assert_eq!(
            ReaderOptions::parse(Some("0,1"), None, None),
            Err(ReaderOptionsError::ZeroBandIndex("0,1".into()))
        );
    }

    #[test]
    fn band_indexes_without_digits_are_rejected() {
        assert!(ReaderOptions::parse(Some("red"), None, None).is_err());
    }

    #[test]
    fn rescale_is_min_max() {
        let options = ReaderOptions::parse(None, Some(-9999.0), Some("0, 3000")).unwrap();
        assert_eq!(options.rescale, Some((0.0, 3000.0)));
        assert_eq!(options.nodata, Some(-9999.0));
    }

    #[test]
    fn inverted_rescale_is_rejected() {
        assert!(ReaderOptions::parse(None, None, Some("10,1")).is_err());
        assert!(ReaderOptions::parse(None, None, Some("10")).is_err());
    }

    #[test]
    fn nothing_given_is_default() {
        assert_eq!(
            ReaderOptions::parse(None, None, None).unwrap(),
            ReaderOptions::default()
        );
    }
}
