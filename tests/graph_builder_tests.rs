use spojka::graph::{self, GraphBuilder, Profile, TransitGraph};
use spojka::gtfs::{self, Gtfs};
use std::fs;
use std::path::Path;

fn write_gtfs(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

fn build(dir: &Path, profile: Profile) -> TransitGraph {
    let mut gtfs = Gtfs::new().from_directory(dir);
    GraphBuilder::new(profile)
        .with_source("test")
        .build(&mut gtfs)
        .unwrap()
}

/// A small feed: two parent stations with children, one standalone stop,
/// services on Monday and Saturday.
fn fixture_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "routes.txt",
            "route_id,route_short_name,route_long_name\n\
             R1,17,Tram seventeen\n\
             R2,99,Weekend bus\n\
             R3,,No short name\n",
        ),
        (
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             S1,1,1,1,1,1,0,0,20250101,20251231\n\
             S2,0,0,0,0,0,1,1,20250101,20251231\n",
        ),
        (
            "trips.txt",
            "route_id,service_id,trip_id\n\
             R1,S1,T1\n\
             R2,S2,T2\n",
        ),
        (
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station\n\
             p,Hlavni nadrazi,49.19,16.61,1,\n\
             p:child1,Hlavni nadrazi 1,49.1901,16.6101,,p\n\
             p:child2,Hlavni nadrazi 2,49.1902,16.6102,,p\n\
             q,Ceska,49.2,16.6,1,\n\
             q:child,Ceska 1,49.2001,16.6001,,q\n\
             s,Samostatna,49.21,16.62,,\n",
        ),
        (
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,07:00:00,07:00:00,p:child1,1\n\
             T1,07:01:00,07:01:00,p:child2,2\n\
             T1,07:05:00,07:05:30,q:child,3\n\
             T1,07:09:00,07:09:00,s,4\n\
             T2,10:00:00,10:00:00,p:child1,1\n\
             T2,10:07:00,10:07:00,s,2\n",
        ),
    ]
}

#[test]
fn e3_weekday_filter_test() {
    // T2 runs on a Saturday-only service; a Monday profile must drop it.
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());
    let graph = build(dir.path(), Profile::default());

    let from_p = &graph.edges["p"];
    assert_eq!(from_p.len(), 1);
    assert_eq!(from_p[0].0, "q");
    assert_eq!(from_p[0].2, vec!["17".to_string()]);
    // T2's direct p->s edge must not exist.
    assert!(!from_p.iter().any(|edge| edge.0 == "s"));

    // The Saturday profile sees only T2.
    let graph = build(dir.path(), "saturday:07-11".parse().unwrap());
    let from_p = &graph.edges["p"];
    assert_eq!(from_p.len(), 1);
    assert_eq!(from_p[0].0, "s");
    assert_eq!(from_p[0].2, vec!["99".to_string()]);
}

#[test]
fn e4_parent_folding_test() {
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());
    let graph = build(dir.path(), Profile::default());

    // child1 -> child2 folds into p and vanishes; child2 -> q:child becomes
    // p -> q with the time from child2's departure to q:child's arrival.
    let from_p = &graph.edges["p"];
    assert_eq!(from_p[0].0, "q");
    assert_eq!(from_p[0].1, 4.0);

    // No exported stop id is a child, no edge loops onto its own parent.
    for (id, _) in &graph.stops {
        assert!(!id.contains(":child"));
    }
    for (from, neighbors) in &graph.edges {
        for edge in neighbors {
            assert_ne!(from, &edge.0);
        }
    }

    // Stations touched only through their children still export under the
    // parent id, with the parent's name.
    assert_eq!(graph.stops["p"].0, "Hlavni nadrazi");
    assert_eq!(graph.stops["q"].0, "Ceska");
    assert_eq!(graph.stops["s"].0, "Samostatna");
}

#[test]
fn e5_headway_test() {
    // Route 17 leaves every 12 minutes inside the window.
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files[2] = (
        "trips.txt",
        "route_id,service_id,trip_id\n\
         R1,S1,T1\nR1,S1,T2\nR1,S1,T3\nR1,S1,T4\n",
    );
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:00:00,07:00:00,s,1\n\
         T1,07:04:00,07:04:00,q:child,2\n\
         T2,07:12:00,07:12:00,s,1\n\
         T2,07:16:00,07:16:00,q:child,2\n\
         T3,07:24:00,07:24:00,s,1\n\
         T3,07:28:00,07:28:00,q:child,2\n\
         T4,07:36:00,07:36:00,s,1\n\
         T4,07:40:00,07:40:00,q:child,2\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    assert_eq!(graph.headways["17"], 12.0);
    assert_eq!(graph.headway_or_default("unknown"), 120.0);
}

#[test]
fn headway_penalty_and_clamp_test() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files[2] = (
        "trips.txt",
        "route_id,service_id,trip_id\n\
         R1,S1,T1\nR1,S1,T2\nR2,S1,T3\n",
    );
    // Route 17 departs twice one minute apart (clamps up to 2.0); route 99
    // has a single departure (60-minute penalty).
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:00:00,07:00:00,s,1\n\
         T1,07:04:00,07:04:00,q:child,2\n\
         T2,07:01:00,07:01:00,s,1\n\
         T2,07:05:00,07:05:00,q:child,2\n\
         T3,07:30:00,07:30:00,s,1\n\
         T3,07:35:00,07:35:00,q:child,2\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    assert_eq!(graph.headways["17"], 2.0);
    assert_eq!(graph.headways["99"], 60.0);
    for headway in graph.headways.values() {
        assert!((2.0..=120.0).contains(headway));
    }
}

#[test]
fn median_not_mean_test() {
    // Samples of 5, 5, 5 and 30 minutes must report 5.0, not the 11.25 mean.
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files[2] = (
        "trips.txt",
        "route_id,service_id,trip_id\n\
         R1,S1,T1\nR1,S1,T2\nR1,S1,T3\nR1,S1,T4\n",
    );
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:00:00,07:00:00,s,1\n\
         T1,07:05:00,07:05:00,q:child,2\n\
         T2,08:00:00,08:00:00,s,1\n\
         T2,08:05:00,08:05:00,q:child,2\n\
         T3,09:00:00,09:00:00,s,1\n\
         T3,09:05:00,09:05:00,q:child,2\n\
         T4,10:00:00,10:00:00,s,1\n\
         T4,10:30:00,10:30:00,q:child,2\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    let from_s = &graph.edges["s"];
    assert_eq!(from_s[0].0, "q");
    assert_eq!(from_s[0].1, 5.0);
}

#[test]
fn edge_bounds_and_floor_test() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    // Same-minute hop (floors to 0.5), a reversed pair and a nine-hour gap
    // (both dropped as corrupt).
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:00:00,07:00:00,s,1\n\
         T1,07:00:10,07:00:10,q:child,2\n\
         T1,06:59:00,06:59:00,p:child1,3\n\
         T1,16:00:00,16:00:00,s,4\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    let from_s = &graph.edges["s"];
    assert_eq!(from_s.len(), 1);
    assert_eq!(from_s[0].0, "q");
    assert_eq!(from_s[0].1, 0.5);
    // q -> p went backwards in time, p -> s took nine hours.
    assert!(!graph.edges.contains_key("q"));
    assert!(!graph.edges.contains_key("p"));

    for neighbors in graph.edges.values() {
        for edge in neighbors {
            assert!((0.5..=120.0).contains(&edge.1));
        }
    }
}

#[test]
fn after_midnight_times_test() {
    // Hour values past 24 parse and aggregate like any others.
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,24:59:00,25:00:00,s,1\n\
         T1,25:06:00,25:06:00,q:child,2\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    let from_s = &graph.edges["s"];
    assert_eq!(from_s[0].0, "q");
    assert_eq!(from_s[0].1, 6.0);
}

#[test]
fn unparsable_rows_skipped_test() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files[4] = (
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:00:00,07:00:00,s,1\n\
         T1,bogus,07:02:00,p:child1,2\n\
         T1,07:04:00,07:04:00,q:child,3\n",
    );
    write_gtfs(dir.path(), &files);
    let graph = build(dir.path(), Profile::default());

    // The malformed middle row drops out; the surviving rows still pair up.
    let from_s = &graph.edges["s"];
    assert_eq!(from_s.len(), 1);
    assert_eq!(from_s[0].0, "q");
    assert_eq!(from_s[0].1, 4.0);
}

#[test]
fn isolated_parents_dropped_test() {
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());
    let graph = build(dir.path(), Profile::default());

    // Every exported stop is an endpoint of some edge.
    for id in graph.stops.keys() {
        let referenced = graph.edges.contains_key(id)
            || graph
                .edges
                .values()
                .any(|neighbors| neighbors.iter().any(|edge| &edge.0 == id));
        assert!(referenced, "stop {id} is isolated");
    }
}

#[test]
fn metadata_test() {
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());
    let graph = build(dir.path(), Profile::default());

    assert_eq!(graph.metadata.source, "test");
    assert_eq!(graph.metadata.profile, "monday_07_08");
    assert_eq!(graph.metadata.parent_stations, graph.stops.len());
    assert_eq!(
        graph.metadata.directed_edges,
        graph.edges.values().map(Vec::len).sum::<usize>()
    );
    assert_eq!(graph.metadata.routes_with_headway, graph.headways.len());
}

#[test]
fn determinism_test() {
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());

    let a = build(dir.path(), Profile::default()).to_json().unwrap();
    let b = build(dir.path(), Profile::default()).to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn graph_write_test() {
    let dir = tempfile::tempdir().unwrap();
    write_gtfs(dir.path(), &fixture_files());
    let graph = build(dir.path(), Profile::default());

    let out = dir.path().join("graph.json");
    graph.write(&out).unwrap();
    let back: TransitGraph = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(graph, back);
}

#[test]
fn zip_source_test() {
    use std::io::Write as _;

    let dir = tempfile::tempdir().unwrap();
    let zip_path = dir.path().join("feed.zip");
    let file = fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in fixture_files() {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    let mut gtfs = Gtfs::new().from_zip(&zip_path).unwrap();
    let graph = GraphBuilder::new(Profile::default())
        .with_source("zip")
        .build(&mut gtfs)
        .unwrap();
    assert_eq!(graph.edges["p"][0].0, "q");
}

#[test]
fn missing_table_is_fatal_test() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    files.remove(4); // no stop_times.txt
    write_gtfs(dir.path(), &files);

    let mut gtfs = Gtfs::new().from_directory(dir.path());
    let result = GraphBuilder::new(Profile::default()).build(&mut gtfs);
    assert!(matches!(
        result,
        Err(graph::Error::Gtfs(gtfs::Error::FileNotFound(name))) if name == "stop_times.txt"
    ));
}

#[test]
fn bom_header_test() {
    // A UTF-8 BOM on the first header cell must not break column binding.
    let dir = tempfile::tempdir().unwrap();
    let mut files = fixture_files();
    write_gtfs(dir.path(), &files[1..]);
    let routes = files.remove(0).1;
    fs::write(
        dir.path().join("routes.txt"),
        [b"\xef\xbb\xbf".as_slice(), routes.as_bytes()].concat(),
    )
    .unwrap();

    let graph = build(dir.path(), Profile::default());
    assert_eq!(graph.edges["p"][0].2, vec!["17".to_string()]);
}
