use serde::{Deserialize, Serialize};

/// Raw GTFS rows, one struct per table. Only the columns the graph build
/// consumes are bound; feeds carry plenty more and the reader ignores them.

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsRoute {
    pub route_id: String,
    pub route_short_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub location_type: Option<u8>,
    pub parent_station: Option<String>,
}

impl GtfsStop {
    /// Stations (`location_type == 1`) group physical boarding points.
    pub fn is_station(&self) -> bool {
        self.location_type == Some(1)
    }
}

/// Times stay as strings here; they are parsed tolerantly downstream so one
/// malformed value skips a row instead of aborting the stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
}

#[test]
fn is_station_test() {
    let stop = GtfsStop {
        stop_id: "p1".into(),
        stop_name: "Hlavní nádraží".into(),
        stop_lat: Some(49.19),
        stop_lon: Some(16.61),
        location_type: Some(1),
        parent_station: None,
    };
    assert!(stop.is_station());
}
