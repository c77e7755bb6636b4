use crate::tt::{
    self, Deadline, DecodeStatus, EdgeSet, Error, SegmentedTrips, StopTable, Trip, TtFile,
};
use encoding_rs::WINDOWS_1250;
use tracing::debug;

/// P-record scan region. These identifiers sit behind the main sections and
/// are separated by a two-byte marker.
const P_RECORD_SCAN_START: usize = 0x1000;
const P_RECORD_SCAN_SPAN: usize = 50_000;
const P_RECORD_SEPARATOR: [u8; 2] = [0xA4, 0xA4];
const P_RECORD_LIMIT: usize = 50;

/// Everything recovered from one TT file, frozen after the decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub source_file: String,
    pub stops: StopTable,
    pub p_records: Vec<String>,
    pub trips: Vec<Trip>,
    pub edges: EdgeSet,
    pub wrapped_indices: u32,
    pub status: DecodeStatus,
}

/// Runs the full per-file pipeline: header, stop table, P-records, section
/// scoring, trip segmentation, edge extraction.
///
/// Fatal problems (bad magic, no stop table, timeout, IO) surface as `Err`;
/// a file that loses only its time section or its edges still decodes, with
/// a degraded [`DecodeStatus`].
pub fn decode_file(path: &std::path::Path, deadline: Deadline) -> Result<Decoded, Error> {
    let file = TtFile::open(path)?;
    decode(&file, deadline)
}

pub fn decode(file: &TtFile, deadline: Deadline) -> Result<Decoded, Error> {
    file.verify_header()?;

    let stops = StopTable::find(file, &deadline)?;
    debug!(file = %file.file_name(), stops = stops.len(), "stop table located");

    let p_records = find_p_records(file);

    let Some(section) = tt::find_best_section(file, &deadline)? else {
        debug!(file = %file.file_name(), "no candidate time section");
        return Ok(Decoded {
            source_file: file.file_name(),
            stops,
            p_records,
            trips: Vec::new(),
            edges: EdgeSet::default(),
            wrapped_indices: 0,
            status: DecodeStatus::NoTimeSection,
        });
    };
    debug!(
        file = %file.file_name(),
        offset = section.offset,
        score = section.score,
        "time section selected"
    );

    let SegmentedTrips {
        trips,
        wrapped_indices,
    } = tt::decode_section(file, section.offset, stops.len(), &deadline)?;

    if trips.is_empty() {
        return Ok(Decoded {
            source_file: file.file_name(),
            stops,
            p_records,
            trips,
            edges: EdgeSet::default(),
            wrapped_indices,
            status: DecodeStatus::NoTimeSection,
        });
    }

    let edges = EdgeSet::from_trips(&trips);
    let status = if edges.is_empty() {
        DecodeStatus::NoEdges
    } else {
        DecodeStatus::Complete
    };

    Ok(Decoded {
        source_file: file.file_name(),
        stops,
        p_records,
        trips,
        edges,
        wrapped_indices,
        status,
    })
}

/// Scans for trip identifiers starting with `P`, separated by `0xA4 0xA4`.
/// Whether they pair 1-to-1 with decoded trips is unknown; they are only
/// counted and exported.
fn find_p_records(file: &TtFile) -> Vec<String> {
    let end = file.len().min(P_RECORD_SCAN_START + P_RECORD_SCAN_SPAN);
    if end <= P_RECORD_SCAN_START + 100 {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut i = P_RECORD_SCAN_START;
    while i < end - 100 && records.len() < P_RECORD_LIMIT {
        let Ok(byte) = file.slice(i, 1) else { break };
        if byte[0] != b'P' {
            i += 1;
            continue;
        }
        let mut record_end = i + 1;
        while record_end < end {
            match file.slice(record_end, 2) {
                Ok(sep) if sep == P_RECORD_SEPARATOR => break,
                Ok(_) => record_end += 1,
                Err(_) => break,
            }
        }
        if let Ok(bytes) = file.slice(i, record_end - i) {
            let (decoded, _, _) = WINDOWS_1250.decode(bytes);
            if decoded.starts_with('P') {
                records.push(decoded.into_owned());
            }
        }
        i = record_end + 2;
    }
    records
}

#[cfg(test)]
fn p_record_file(records: &[&str]) -> TtFile {
    let mut data = vec![0u8; P_RECORD_SCAN_START];
    for record in records {
        data.extend_from_slice(record.as_bytes());
        data.extend_from_slice(&P_RECORD_SEPARATOR);
    }
    data.extend_from_slice(&[0u8; 256]);
    TtFile::from_bytes("p.tt", data)
}

#[test]
fn find_p_records_test() {
    let file = p_record_file(&["P123 Brno-Lesna", "P456 Brno-Stred"]);
    let records = find_p_records(&file);
    assert_eq!(records, vec!["P123 Brno-Lesna", "P456 Brno-Stred"]);
}

#[test]
fn find_p_records_ignores_other_text_test() {
    let file = p_record_file(&["Q999 not a p-record", "P77"]);
    let records = find_p_records(&file);
    assert_eq!(records, vec!["P77"]);
}

#[test]
fn find_p_records_short_file_test() {
    let file = TtFile::from_bytes("short.tt", vec![0u8; 128]);
    assert!(find_p_records(&file).is_empty());
}
