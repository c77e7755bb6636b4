use crate::graph::Error;
use crate::shared::write_atomic;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/// `[name, lat, lon]` in the export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopExport(pub String, pub f64, pub f64);

/// `[destination, travel_minutes, [route, ...]]` in the export. Routes are
/// sorted; travel time is one fractional digit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge(pub String, pub f64, pub Vec<String>);

/// Field order here is the key order in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphMetadata {
    pub source: String,
    pub profile: String,
    pub parent_stations: usize,
    pub directed_edges: usize,
    pub avg_out_degree: f64,
    pub routes_with_headway: usize,
    pub version: u32,
}

/// The frozen travel-time graph. Every map is a `BTreeMap`, so serializing
/// the same graph twice yields the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitGraph {
    pub metadata: GraphMetadata,
    pub stops: BTreeMap<String, StopExport>,
    pub edges: BTreeMap<String, Vec<GraphEdge>>,
    pub headways: BTreeMap<String, f64>,
}

impl TransitGraph {
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let json = self.to_json()?;
        write_atomic(path, &json)?;
        Ok(())
    }

    /// Headway for a route, or the penalty ceiling when the route never
    /// produced one.
    pub fn headway_or_default(&self, route: &str) -> f64 {
        self.headways
            .get(route)
            .copied()
            .unwrap_or(crate::graph::HEADWAY_MAX_MINUTES)
    }
}

#[cfg(test)]
fn graph_fixture() -> TransitGraph {
    let mut stops = BTreeMap::new();
    stops.insert(
        "p1".to_string(),
        StopExport("Hlavní nádraží".into(), 49.19, 16.61),
    );
    stops.insert("p2".to_string(), StopExport("Česká".into(), 49.2, 16.6));

    let mut edges = BTreeMap::new();
    edges.insert(
        "p1".to_string(),
        vec![GraphEdge("p2".into(), 2.5, vec!["1".into(), "4".into()])],
    );

    let mut headways = BTreeMap::new();
    headways.insert("1".to_string(), 6.0);

    TransitGraph {
        metadata: GraphMetadata {
            source: "test".into(),
            profile: "monday_07_08".into(),
            parent_stations: 2,
            directed_edges: 1,
            avg_out_degree: 1.0,
            routes_with_headway: 1,
            version: 2,
        },
        stops,
        edges,
        headways,
    }
}

#[test]
fn export_shape_test() {
    let json = graph_fixture().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["stops"]["p1"][0], "Hlavní nádraží");
    assert_eq!(value["edges"]["p1"][0][0], "p2");
    assert_eq!(value["edges"]["p1"][0][1], 2.5);
    assert_eq!(value["edges"]["p1"][0][2][1], "4");
    assert_eq!(value["headways"]["1"], 6.0);
    assert_eq!(value["metadata"]["version"], 2);
}

#[test]
fn export_roundtrip_test() {
    let graph = graph_fixture();
    let json = graph.to_json().unwrap();
    let back: TransitGraph = serde_json::from_slice(&json).unwrap();
    assert_eq!(graph, back);
}

#[test]
fn headway_or_default_test() {
    let graph = graph_fixture();
    assert_eq!(graph.headway_or_default("1"), 6.0);
    assert_eq!(graph.headway_or_default("99"), 120.0);
}
