use serde::Serialize;

/// Geographic bounds in degrees, serialized as `[west, south, east, north]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(into = "[f64; 4]")]
pub(crate) struct Bounds {
    pub(crate) west: f64,
    pub(crate) south: f64,
    pub(crate) east: f64,
    pub(crate) north: f64,
}

impl Bounds {
    pub(crate) const WORLD: Self = Self {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    pub(crate) fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::WORLD
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(b: Bounds) -> Self {
        [b.west, b.south, b.east, b.north]
    }
}

impl TryFrom<&[f64]> for Bounds {
    type Error = String;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        match *values {
            [west, south, east, north] => Ok(Self {
                west,
                south,
                east,
                north,
            }),
            _ => Err(format!(
                "bounds need exactly 4 values (west,south,east,north), got {}",
                values.len()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_array() {
        assert_eq!(
            serde_json::to_string(&Bounds::WORLD).unwrap(),
            "[-180.0,-90.0,180.0,90.0]"
        );
    }

    #[test]
    fn world_center_is_origin() {
        assert_eq!(Bounds::WORLD.center(), (0.0, 0.0));
    }

    #[test]
    fn try_from_requires_four_values() {
        assert!(Bounds::try_from([1.0, 2.0, 3.0].as_slice()).is_err());

        let bounds = Bounds::try_from([16.8, 47.7, 22.6, 49.6].as_slice()).unwrap();
        assert_eq!(bounds.east, 22.6);
    }
}
