use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(value: Coordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

#[test]
fn coordinate_display_test() {
    let coord = Coordinate::new(50.0755, 14.4378);
    assert_eq!(coord.to_string(), "50.0755, 14.4378");
}

#[test]
fn coordinate_tuple_test() {
    let (lat, lon) = Coordinate::new(49.19, 16.61).into();
    assert_eq!(lat, 49.19);
    assert_eq!(lon, 16.61);
}
