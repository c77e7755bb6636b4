use crate::shared::round1;
use crate::tt::Decoded;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-edge summary in the per-file export: the stop names, the mean travel
/// time to a tenth of a minute, and the sample spread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeExport {
    pub from_stop: String,
    pub to_stop: String,
    pub travel_time_avg: f64,
    pub travel_time_min: u32,
    pub travel_time_max: u32,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FileStats {
    pub stops: usize,
    pub trips: usize,
    pub edges: usize,
    pub total_travel_times: usize,
    pub p_records: usize,
    pub wrapped_indices: u32,
}

/// The JSON document written next to each decoded file. Edge keys are
/// `"from->to"` stop indices; the map is ordered so reruns are
/// byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileExport {
    pub source_file: String,
    pub status: String,
    pub stops: Vec<String>,
    pub stats: FileStats,
    pub edges: BTreeMap<String, EdgeExport>,
}

impl FileExport {
    pub fn from_decoded(decoded: &Decoded) -> Self {
        let mut edges = BTreeMap::new();
        for ((from, to), times) in decoded.edges.iter() {
            let sum: u32 = times.iter().sum();
            let avg = f64::from(sum) / times.len() as f64;
            edges.insert(
                format!("{from}->{to}"),
                EdgeExport {
                    from_stop: stop_name(decoded, from),
                    to_stop: stop_name(decoded, to),
                    travel_time_avg: round1(avg),
                    travel_time_min: times.iter().copied().min().unwrap_or(0),
                    travel_time_max: times.iter().copied().max().unwrap_or(0),
                    samples: times.len(),
                },
            );
        }

        Self {
            source_file: decoded.source_file.clone(),
            status: decoded.status.as_str().to_string(),
            stops: decoded.stops.names.clone(),
            stats: FileStats {
                stops: decoded.stops.len(),
                trips: decoded.trips.len(),
                edges: decoded.edges.len(),
                total_travel_times: decoded.edges.total_samples(),
                p_records: decoded.p_records.len(),
                wrapped_indices: decoded.wrapped_indices,
            },
            edges,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

fn stop_name(decoded: &Decoded, idx: usize) -> String {
    decoded
        .stops
        .name(idx)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Stop#{idx}"))
}

#[cfg(test)]
use crate::tt::{Call, DecodeStatus, EdgeSet, StopTable, Trip};

#[cfg(test)]
fn decoded_fixture() -> Decoded {
    let trips = vec![
        Trip {
            calls: vec![
                Call { stop_idx: 0, minute: 480 },
                Call { stop_idx: 1, minute: 485 },
                Call { stop_idx: 2, minute: 491 },
            ],
        },
        Trip {
            calls: vec![
                Call { stop_idx: 0, minute: 495 },
                Call { stop_idx: 1, minute: 501 },
            ],
        },
    ];
    let edges = EdgeSet::from_trips(&trips);
    Decoded {
        source_file: "brno.tt".into(),
        stops: StopTable {
            names: vec!["Adamov".into(), "Bystrc".into(), "Chrlice".into()],
        },
        p_records: vec!["P1".into()],
        trips,
        edges,
        wrapped_indices: 0,
        status: DecodeStatus::Complete,
    }
}

#[test]
fn file_export_test() {
    let export = FileExport::from_decoded(&decoded_fixture());
    assert_eq!(export.status, "ok");
    assert_eq!(export.stats.trips, 2);
    assert_eq!(export.stats.total_travel_times, 3);

    let ab = &export.edges["0->1"];
    assert_eq!(ab.from_stop, "Adamov");
    assert_eq!(ab.to_stop, "Bystrc");
    assert_eq!(ab.travel_time_avg, 5.5);
    assert_eq!(ab.travel_time_min, 5);
    assert_eq!(ab.travel_time_max, 6);
    assert_eq!(ab.samples, 2);

    let bc = &export.edges["1->2"];
    assert_eq!(bc.travel_time_avg, 6.0);
    assert_eq!(bc.samples, 1);
}

#[test]
fn file_export_deterministic_test() {
    let decoded = decoded_fixture();
    let a = FileExport::from_decoded(&decoded).to_json().unwrap();
    let b = FileExport::from_decoded(&decoded).to_json().unwrap();
    assert_eq!(a, b);
}
