use spojka::report::RunStats;
use spojka::tt::{
    self, BatchConfig, Deadline, Error, FileExport, Outcome, TtFile, decode, decode_batch,
};
use std::{fs, time::Duration};

const STOP_NAMES: [&str; 12] = [
    "Stop A",
    "Stop B",
    "Stop C",
    "Stop D",
    "Stop E",
    "Stop F",
    "Stop G",
    "Stop H",
    "Stop I",
    "Stop J",
    "Stop K",
    "Stop L",
];

const HEADER_END: usize = 0x48;
const TIME_SECTION: usize = 0x500;

fn pack(stop_idx: u32, minute: u32, flag: bool) -> u32 {
    let mut val = (stop_idx & 0xFF) | (minute << 16);
    if flag {
        val |= 0x8000_0000;
    }
    val
}

/// Assembles a complete synthetic TT file: vendor header, offset-indexed
/// stop table, 0xFF filler (never a valid record), and the packed time
/// section at a scanned offset.
fn build_tt(names: &[&str], time_words: &[u32]) -> Vec<u8> {
    let mut data = b"TT 1.2 TimeTable CHAPS spol. s r.o.".to_vec();
    data.resize(HEADER_END, 0);

    let mut offsets: Vec<u32> = Vec::with_capacity(names.len() + 1);
    let mut blob: Vec<u8> = Vec::new();
    for name in names {
        offsets.push(blob.len() as u32);
        blob.extend_from_slice(name.as_bytes());
        blob.push(0);
    }
    offsets.push(blob.len() as u32);

    data.extend_from_slice(&((offsets.len() as u32) * 4).to_le_bytes());
    data.extend_from_slice(&(offsets.len() as u32).to_le_bytes());
    for off in &offsets {
        data.extend_from_slice(&off.to_le_bytes());
    }
    data.extend_from_slice(&(blob.len() as u32).to_le_bytes());
    data.extend_from_slice(&(blob.len() as u32).to_le_bytes());
    data.extend_from_slice(&blob);

    assert!(data.len() <= TIME_SECTION, "stop table overruns time section");
    data.resize(TIME_SECTION, 0xFF);
    for word in time_words {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.resize(TIME_SECTION + 0x200, 0xFF);
    data
}

fn deadline() -> Deadline {
    Deadline::new(Duration::from_secs(10))
}

/// The morning schedule of scenario: three overlapping runs over stops
/// A, B, C plus filler records on unrelated stops so the section scoring
/// has enough variety to qualify.
fn e1_words(flag: bool) -> Vec<u32> {
    [
        (0u32, 480u32), // A 8:00
        (1, 485),       // B 8:05
        (2, 491),       // C 8:11
        (0, 495),       // A 8:15
        (1, 501),       // B 8:21
        (1, 510),       // B 8:30
        (2, 516),       // C 8:36
        // Filler runs on other stops.
        (3, 520),
        (4, 530),
        (5, 541),
        (6, 553),
        (7, 560),
        (8, 570),
        (9, 581),
        (10, 590),
        (11, 601),
    ]
    .iter()
    .map(|&(stop, minute)| pack(stop, minute, flag))
    .collect()
}

#[test]
fn e1_happy_path_test() {
    let file = TtFile::from_bytes("mesto.tt", build_tt(&STOP_NAMES, &e1_words(false)));
    let decoded = decode(&file, deadline()).unwrap();

    assert_eq!(decoded.status, tt::DecodeStatus::Complete);
    assert_eq!(decoded.stops.len(), 12);
    assert_eq!(decoded.stops.name(0), Some("Stop A"));

    let ab = decoded.edges.get(0, 1).unwrap();
    assert_eq!(ab, [5, 6]);
    let bc = decoded.edges.get(1, 2).unwrap();
    assert_eq!(bc, [6, 6]);

    let export = FileExport::from_decoded(&decoded);
    assert_eq!(export.status, "ok");
    assert_eq!(export.edges["0->1"].travel_time_avg, 5.5);
    assert_eq!(export.edges["0->1"].samples, 2);
    assert_eq!(export.edges["1->2"].travel_time_avg, 6.0);
    assert_eq!(export.edges["1->2"].samples, 2);

    // Self-loops never survive; B is visited twice in a row at 8:21/8:30.
    assert!(decoded.edges.get(1, 1).is_none());
    for key in export.edges.keys() {
        let (from, to) = key.split_once("->").unwrap();
        assert_ne!(from, to);
    }
}

#[test]
fn e1_edge_bounds_test() {
    let file = TtFile::from_bytes("mesto.tt", build_tt(&STOP_NAMES, &e1_words(false)));
    let decoded = decode(&file, deadline()).unwrap();
    for (_, times) in decoded.edges.iter() {
        for &minutes in times {
            assert!((1..=60).contains(&minutes));
        }
    }
}

#[test]
fn e2_dialect_detection_test() {
    // Identical schedules, with and without the flag bit, must decode to the
    // same trips. Minutes stay inside one 256-minute block so the flagged
    // route key is constant.
    let schedule: Vec<(u32, u32)> = (0..12).map(|i| (i, 480 + i * 2)).collect();
    let plain: Vec<u32> = schedule
        .iter()
        .map(|&(stop, minute)| pack(stop, minute, false))
        .collect();
    let marked: Vec<u32> = schedule
        .iter()
        .map(|&(stop, minute)| pack(stop, minute, true))
        .collect();

    let decoded_plain = decode(
        &TtFile::from_bytes("plain.tt", build_tt(&STOP_NAMES, &plain)),
        deadline(),
    )
    .unwrap();
    let decoded_marked = decode(
        &TtFile::from_bytes("marked.tt", build_tt(&STOP_NAMES, &marked)),
        deadline(),
    )
    .unwrap();

    assert!(!decoded_plain.trips.is_empty());
    assert_eq!(decoded_plain.trips, decoded_marked.trips);
}

#[test]
fn e6_degraded_decode_test() {
    // Valid header and stop table, but nothing in the file scores as a time
    // section.
    let file = TtFile::from_bytes("prazdny.tt", build_tt(&STOP_NAMES, &[]));
    let decoded = decode(&file, deadline()).unwrap();

    assert_eq!(decoded.status, tt::DecodeStatus::NoTimeSection);
    assert!(decoded.trips.is_empty());
    assert!(decoded.edges.is_empty());

    let export = FileExport::from_decoded(&decoded);
    assert_eq!(export.status, "degraded");
    assert!(export.edges.is_empty());
    assert_eq!(export.stats.stops, 12);
}

#[test]
fn header_rejection_test() {
    let mut data = vec![0x42u8; 4096];
    data[0] = b'X';
    let file = TtFile::from_bytes("junk.tt", data);
    assert!(matches!(decode(&file, deadline()), Err(Error::BadMagic)));
}

#[test]
fn short_file_rejection_test() {
    let file = TtFile::from_bytes("tiny.tt", b"TT".to_vec());
    assert!(matches!(decode(&file, deadline()), Err(Error::BadMagic)));
}

#[test]
fn export_determinism_test() {
    let bytes = build_tt(&STOP_NAMES, &e1_words(false));
    let a = FileExport::from_decoded(
        &decode(&TtFile::from_bytes("a.tt", bytes.clone()), deadline()).unwrap(),
    )
    .to_json()
    .unwrap();
    let b = FileExport::from_decoded(
        &decode(&TtFile::from_bytes("a.tt", bytes), deadline()).unwrap(),
    )
    .to_json()
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn batch_decode_test() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    fs::write(
        dir.path().join("dobre.tt"),
        build_tt(&STOP_NAMES, &e1_words(false)),
    )
    .unwrap();
    fs::write(dir.path().join("spatne.tt"), vec![0u8; 512]).unwrap();
    fs::write(
        dir.path().join("chude.tt"),
        build_tt(&STOP_NAMES, &[]),
    )
    .unwrap();
    // Non-tt files are not picked up.
    fs::write(dir.path().join("readme.txt"), b"ignore me").unwrap();

    let files = tt::collect_tt_files(dir.path()).unwrap();
    assert_eq!(files.len(), 3);

    let mut config = BatchConfig::new(&out);
    config.workers = 2;
    let result = decode_batch(&files, &config).unwrap();

    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.succeeded, 1);
    assert_eq!(result.stats.degraded, 1);
    assert_eq!(result.stats.failed, 1);
    assert_eq!(result.stats.by_reason["bad_magic"], 1);
    assert_eq!(result.stats.by_reason["no_time_section"], 1);

    // Reports come back in input order.
    assert_eq!(result.reports[0].file, "chude.tt");
    assert_eq!(result.reports[1].file, "dobre.tt");
    assert_eq!(result.reports[1].outcome, Outcome::Ok);
    assert_eq!(
        result.reports[2].outcome,
        Outcome::Failed { reason: "bad_magic" }
    );

    // Per-file exports for everything that decoded, stats.json for the run,
    // and no leftover temp files.
    assert!(out.join("dobre.json").is_file());
    assert!(out.join("chude.json").is_file());
    assert!(!out.join("spatne.json").exists());
    let stats: RunStats =
        serde_json::from_slice(&fs::read(out.join("stats.json")).unwrap()).unwrap();
    assert_eq!(stats, result.stats);
    for entry in fs::read_dir(&out).unwrap() {
        let path = entry.unwrap().path();
        assert!(path.extension().is_some_and(|ext| ext == "json"));
    }
}

#[test]
fn batch_report_roundtrip_test() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::write(
        dir.path().join("mesto.tt"),
        build_tt(&STOP_NAMES, &e1_words(false)),
    )
    .unwrap();

    let files = tt::collect_tt_files(dir.path()).unwrap();
    decode_batch(&files, &BatchConfig::new(&out)).unwrap();

    let report = spojka::report::load(&out).unwrap();
    assert_eq!(report.stats.total, 1);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.exported_files, 1);
    assert_eq!(report.stops, 12);
    let rendered = report.render();
    assert!(rendered.contains("succeeded:       1 (100%)"));
}
