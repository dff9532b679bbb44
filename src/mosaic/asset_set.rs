use std::{fmt, ops::Deref, sync::Arc};

/// Ordered, immutable list of source identifiers (file paths or URLs).
///
/// Cloning is cheap; all clones share the same backing slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AssetSet(Arc<[String]>);

impl AssetSet {
    /// Splits a comma separated `url` parameter. Blank items are skipped, so
    /// an empty parameter yields an empty set.
    pub(crate) fn from_query(value: &str) -> Self {
        value
            .split(',')
            .map(str::trim)
            .filter(|asset| !asset.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into()
    }

    pub(crate) fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for AssetSet {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl Deref for AssetSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for AssetSet {
    fn from(assets: Vec<String>) -> Self {
        Self(Arc::from(assets))
    }
}

impl<const N: usize> From<[&str; N]> for AssetSet {
    fn from(assets: [&str; N]) -> Self {
        assets.into_iter().map(str::to_owned).collect::<Vec<_>>().into()
    }
}

impl fmt::Display for AssetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
