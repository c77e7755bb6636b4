pub struct Config {
    pub routes_path: String,
    pub calendar_path: String,
    pub trips_path: String,
    pub stops_path: String,
    pub stop_times_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            routes_path: "routes.txt".into(),
            calendar_path: "calendar.txt".into(),
            trips_path: "trips.txt".into(),
            stops_path: "stops.txt".into(),
            stop_times_path: "stop_times.txt".into(),
        }
    }
}
