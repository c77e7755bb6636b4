use crate::graph::{
    Error, GraphEdge, GraphMetadata, Profile, StopExport, TransitGraph,
};
use crate::gtfs::Gtfs;
use crate::shared::{Coordinate, Time, median_f64, median_u32, round1};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, info, warn};

/// Travel times above two hours between consecutive stops are data errors.
pub const MAX_TRAVEL_SECONDS: u32 = 7200;
/// Exported edge floor in minutes; same-minute hops still cost something.
pub const MIN_EDGE_MINUTES: f64 = 0.5;
/// Headway assumed for a stop with a single departure in the window.
pub const HEADWAY_PENALTY_MINUTES: f64 = 60.0;
pub const HEADWAY_MIN_MINUTES: f64 = 2.0;
pub const HEADWAY_MAX_MINUTES: f64 = 120.0;

const EXPORT_VERSION: u32 = 2;

/// One stop-time row buffered while its trip is still streaming in.
struct TripCall {
    stop_id: String,
    arrival: Time,
    departure: Time,
}

#[derive(Default)]
struct EdgeSamples {
    travel_seconds: Vec<u32>,
    routes: BTreeSet<Arc<str>>,
}

/// Builds a [`TransitGraph`] from a GTFS source in a single pass per table.
///
/// `stop_times.txt` is streamed row by row; rows are trip-contiguous in the
/// feed and a change of `trip_id` closes the buffered trip. Everything else
/// is a hash-map accumulator that [`GraphBuilder::finish`] freezes into
/// sorted exports.
pub struct GraphBuilder {
    profile: Profile,
    source: String,

    route_short: HashMap<String, Arc<str>>,
    services: HashSet<String>,
    trip_route: HashMap<String, Arc<str>>,
    parent_of: HashMap<String, Arc<str>>,
    parent_info: HashMap<Arc<str>, (String, Coordinate)>,

    edges: HashMap<(Arc<str>, Arc<str>), EdgeSamples>,
    departures: HashMap<(Arc<str>, Arc<str>), Vec<u32>>,
    skipped_rows: usize,
}

impl GraphBuilder {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            source: "gtfs".into(),
            route_short: HashMap::new(),
            services: HashSet::new(),
            trip_route: HashMap::new(),
            parent_of: HashMap::new(),
            parent_info: HashMap::new(),
            edges: HashMap::new(),
            departures: HashMap::new(),
            skipped_rows: 0,
        }
    }

    /// Source label written into the export metadata.
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }

    pub fn build(mut self, gtfs: &mut Gtfs) -> Result<TransitGraph, Error> {
        self.load_routes(gtfs)?;
        self.load_services(gtfs)?;
        self.load_trips(gtfs)?;
        self.load_stops(gtfs)?;
        self.stream_stop_times(gtfs)?;
        Ok(self.finish())
    }

    fn load_routes(&mut self, gtfs: &mut Gtfs) -> Result<(), Error> {
        debug!("Loading routes...");
        let now = Instant::now();
        let stats = gtfs.stream_routes(|(_, route)| {
            let route_id = route.route_id.trim();
            let Some(short) = route.route_short_name.as_deref().map(str::trim) else {
                return;
            };
            if route_id.is_empty() || short.is_empty() {
                return;
            }
            self.route_short
                .insert(route_id.to_string(), Arc::from(short));
        })?;
        self.skipped_rows += stats.skipped;
        debug!(
            "Loading {} routes took {:?}",
            self.route_short.len(),
            now.elapsed()
        );
        Ok(())
    }

    fn load_services(&mut self, gtfs: &mut Gtfs) -> Result<(), Error> {
        debug!("Loading calendar...");
        let now = Instant::now();
        let profile = self.profile;
        let stats = gtfs.stream_calendar(|(_, calendar)| {
            if profile.service_runs(&calendar) {
                self.services.insert(calendar.service_id.trim().to_string());
            }
        })?;
        self.skipped_rows += stats.skipped;
        debug!(
            "Loading {} {} services took {:?}",
            self.services.len(),
            self.profile.weekday_name(),
            now.elapsed()
        );
        Ok(())
    }

    fn load_trips(&mut self, gtfs: &mut Gtfs) -> Result<(), Error> {
        debug!("Loading trips...");
        let now = Instant::now();
        let stats = gtfs.stream_trips(|(_, trip)| {
            if !self.services.contains(trip.service_id.trim()) {
                return;
            }
            let Some(short) = self.route_short.get(trip.route_id.trim()) else {
                return;
            };
            let trip_id = trip.trip_id.trim();
            if trip_id.is_empty() {
                return;
            }
            self.trip_route.insert(trip_id.to_string(), short.clone());
        })?;
        self.skipped_rows += stats.skipped;
        debug!(
            "Loading {} filtered trips took {:?}",
            self.trip_route.len(),
            now.elapsed()
        );
        Ok(())
    }

    /// Resolves every stop id to its canonical parent: stations map to
    /// themselves, children to their `parent_station`, standalone stops to
    /// themselves.
    fn load_stops(&mut self, gtfs: &mut Gtfs) -> Result<(), Error> {
        debug!("Loading stops...");
        let now = Instant::now();
        let stats = gtfs.stream_stops(|(_, stop)| {
            let stop_id = stop.stop_id.trim();
            if stop_id.is_empty() {
                return;
            }
            let coordinate = Coordinate::new(
                stop.stop_lat.unwrap_or_default(),
                stop.stop_lon.unwrap_or_default(),
            );
            let parent = stop
                .parent_station
                .as_deref()
                .map(str::trim)
                .filter(|parent| !parent.is_empty());

            if stop.is_station() {
                let id: Arc<str> = Arc::from(stop_id);
                self.parent_of.insert(stop_id.to_string(), id.clone());
                self.parent_info
                    .insert(id, (stop.stop_name.trim().to_string(), coordinate));
            } else if let Some(parent) = parent {
                self.parent_of.insert(stop_id.to_string(), Arc::from(parent));
            } else {
                let id: Arc<str> = Arc::from(stop_id);
                self.parent_of.insert(stop_id.to_string(), id.clone());
                self.parent_info
                    .entry(id)
                    .or_insert_with(|| (stop.stop_name.trim().to_string(), coordinate));
            }
        })?;
        self.skipped_rows += stats.skipped;
        debug!(
            "Loading {} stops ({} parents) took {:?}",
            self.parent_of.len(),
            self.parent_info.len(),
            now.elapsed()
        );
        Ok(())
    }

    fn stream_stop_times(&mut self, gtfs: &mut Gtfs) -> Result<(), Error> {
        debug!("Streaming stop times...");
        let now = Instant::now();

        let mut current_trip: Option<String> = None;
        let mut calls: Vec<TripCall> = Vec::new();
        let mut rows = 0usize;
        let mut bad_times = 0usize;

        // Moving the maps out keeps the closure borrow disjoint from the
        // accumulators it feeds.
        let trip_route = std::mem::take(&mut self.trip_route);
        let parent_of = std::mem::take(&mut self.parent_of);
        let profile = self.profile;
        let mut edges = std::mem::take(&mut self.edges);
        let mut departures = std::mem::take(&mut self.departures);

        let stats = gtfs.stream_stop_times(|(_, row)| {
            rows += 1;
            if rows % 1_000_000 == 0 {
                debug!("...{}M rows", rows / 1_000_000);
            }

            let trip_id = row.trip_id.trim();
            if current_trip.as_deref() != Some(trip_id) {
                if let Some(finished) = current_trip.take() {
                    process_trip(
                        &finished,
                        &calls,
                        &trip_route,
                        &parent_of,
                        &profile,
                        &mut edges,
                        &mut departures,
                    );
                }
                current_trip = Some(trip_id.to_string());
                calls.clear();
            }

            if !trip_route.contains_key(trip_id) {
                return;
            }

            let (Some(arrival), Some(departure)) = (
                Time::from_hms(&row.arrival_time),
                Time::from_hms(&row.departure_time),
            ) else {
                bad_times += 1;
                return;
            };
            calls.push(TripCall {
                stop_id: row.stop_id.trim().to_string(),
                arrival,
                departure,
            });
        })?;

        if let Some(finished) = current_trip.take() {
            process_trip(
                &finished,
                &calls,
                &trip_route,
                &parent_of,
                &profile,
                &mut edges,
                &mut departures,
            );
        }

        self.trip_route = trip_route;
        self.parent_of = parent_of;
        self.edges = edges;
        self.departures = departures;
        self.skipped_rows += stats.skipped + bad_times;

        debug!("Streaming {} stop time rows took {:?}", rows, now.elapsed());
        Ok(())
    }

    /// Freezes the accumulators into the sorted, immutable export form.
    fn finish(self) -> TransitGraph {
        debug!("Aggregating edges...");
        let mut edges: BTreeMap<String, Vec<GraphEdge>> = BTreeMap::new();
        let mut directed_edges = 0usize;
        for ((from, to), samples) in &self.edges {
            let Some(median_seconds) = median_u32(&samples.travel_seconds) else {
                continue;
            };
            let travel_minutes = round1(median_seconds / 60.0).max(MIN_EDGE_MINUTES);
            let routes: Vec<String> = samples
                .routes
                .iter()
                .map(|route| route.to_string())
                .collect();
            edges
                .entry(from.to_string())
                .or_default()
                .push(GraphEdge(to.to_string(), travel_minutes, routes));
            directed_edges += 1;
        }
        for neighbors in edges.values_mut() {
            neighbors.sort_by(|a, b| a.0.cmp(&b.0));
        }

        debug!("Computing headways...");
        let mut route_intervals: HashMap<Arc<str>, Vec<f64>> = HashMap::new();
        for ((route, _stop), seconds) in &self.departures {
            let value = if seconds.len() < 2 {
                HEADWAY_PENALTY_MINUTES
            } else {
                let mut sorted = seconds.clone();
                sorted.sort_unstable();
                let intervals: Vec<f64> = sorted
                    .windows(2)
                    .map(|pair| f64::from(pair[1] - pair[0]) / 60.0)
                    .collect();
                match median_f64(&intervals) {
                    Some(median) => median,
                    None => continue,
                }
            };
            route_intervals.entry(route.clone()).or_default().push(value);
        }
        let mut headways: BTreeMap<String, f64> = BTreeMap::new();
        for (route, values) in &route_intervals {
            let Some(median) = median_f64(values) else {
                continue;
            };
            let headway = round1(median).clamp(HEADWAY_MIN_MINUTES, HEADWAY_MAX_MINUTES);
            headways.insert(route.to_string(), headway);
        }

        debug!("Collecting exported stops...");
        let mut referenced: BTreeSet<&str> = BTreeSet::new();
        for (from, neighbors) in &edges {
            referenced.insert(from);
            for edge in neighbors {
                referenced.insert(&edge.0);
            }
        }
        let mut stops: BTreeMap<String, StopExport> = BTreeMap::new();
        for id in referenced {
            if let Some((name, coordinate)) = self.parent_info.get(id) {
                stops.insert(
                    id.to_string(),
                    StopExport(name.clone(), coordinate.latitude, coordinate.longitude),
                );
            }
        }

        if self.skipped_rows > 0 {
            warn!(skipped = self.skipped_rows, "rows skipped during build");
        }

        let origins = edges.len().max(1);
        let metadata = GraphMetadata {
            source: self.source,
            profile: self.profile.key(),
            parent_stations: stops.len(),
            directed_edges,
            avg_out_degree: round1(directed_edges as f64 / origins as f64),
            routes_with_headway: headways.len(),
            version: EXPORT_VERSION,
        };
        info!(
            stops = metadata.parent_stations,
            edges = metadata.directed_edges,
            routes = metadata.routes_with_headway,
            "graph frozen"
        );

        TransitGraph {
            metadata,
            stops,
            edges,
            headways,
        }
    }
}

/// Folds one finished trip into the edge and headway accumulators.
#[allow(clippy::too_many_arguments)]
fn process_trip(
    trip_id: &str,
    calls: &[TripCall],
    trip_route: &HashMap<String, Arc<str>>,
    parent_of: &HashMap<String, Arc<str>>,
    profile: &Profile,
    edges: &mut HashMap<(Arc<str>, Arc<str>), EdgeSamples>,
    departures: &mut HashMap<(Arc<str>, Arc<str>), Vec<u32>>,
) {
    let Some(route) = trip_route.get(trip_id) else {
        return;
    };

    for pair in calls.windows(2) {
        let parent_from = resolve_parent(parent_of, &pair[0].stop_id);
        let parent_to = resolve_parent(parent_of, &pair[1].stop_id);
        if parent_from == parent_to {
            // Child-to-sibling movement inside one station.
            continue;
        }
        let Some(travel) = pair[1].arrival.since(pair[0].departure) else {
            continue;
        };
        if travel.as_seconds() > MAX_TRAVEL_SECONDS {
            continue;
        }
        let entry = edges.entry((parent_from, parent_to)).or_default();
        entry.travel_seconds.push(travel.as_seconds());
        entry.routes.insert(route.clone());
    }

    if let Some(first) = calls.first() {
        let departure = first.departure.as_seconds();
        if profile.window_contains(departure) {
            let parent = resolve_parent(parent_of, &first.stop_id);
            departures
                .entry((route.clone(), parent))
                .or_default()
                .push(departure);
        }
    }
}

fn resolve_parent(parent_of: &HashMap<String, Arc<str>>, stop_id: &str) -> Arc<str> {
    parent_of
        .get(stop_id)
        .cloned()
        .unwrap_or_else(|| Arc::from(stop_id))
}
