use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct TileCoord {
    pub(crate) zoom: u8,
    pub(crate) x: u32,
    pub(crate) y: u32,
}

impl TileCoord {
    /// Whether the column and row exist at this zoom.
    pub(crate) fn is_valid(self) -> bool {
        let tiles = 1u64.checked_shl(u32::from(self.zoom)).unwrap_or(u64::MAX);

        u64::from(self.x) < tiles && u64::from(self.y) < tiles
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_path() {
        assert_eq!(
            TileCoord {
                zoom: 5,
                x: 10,
                y: 20
            }
            .to_string(),
            "5/10/20"
        );
    }

    #[test]
    fn validity_depends_on_zoom() {
        assert!(TileCoord { zoom: 0, x: 0, y: 0 }.is_valid());
        assert!(!TileCoord { zoom: 0, x: 1, y: 0 }.is_valid());
        assert!(TileCoord { zoom: 1, x: 1, y: 1 }.is_valid());
        assert!(!TileCoord { zoom: 1, x: 2, y: 1 }.is_valid());
        assert!(TileCoord {
            zoom: 30,
            x: (1 << 30) - 1,
            y: 0
        }
        .is_valid());
    }
}
