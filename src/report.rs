use crate::shared::round1;
use crate::tt::{FileExport, Outcome};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Write as _, fs, io, path::Path};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The machine-readable outcome summary of one batch run, written as
/// `stats.json` next to the per-file exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub succeeded: usize,
    pub degraded: usize,
    pub failed: usize,
    pub by_reason: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Ok => self.succeeded += 1,
            Outcome::Degraded { .. } => self.degraded += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        if let Some(reason) = outcome.reason() {
            *self.by_reason.entry(reason.to_string()).or_default() += 1;
        }
    }

    /// Share of fully successful files, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round1(self.succeeded as f64 * 100.0 / self.total as f64)
    }
}

/// Aggregate view over an output directory: the run stats plus totals summed
/// from every per-file export found there.
#[derive(Debug, Default)]
pub struct Report {
    pub stats: RunStats,
    pub exported_files: usize,
    pub stops: usize,
    pub trips: usize,
    pub edges: usize,
    pub travel_samples: usize,
}

pub fn load(dir: &Path) -> Result<Report, Error> {
    let stats_path = dir.join("stats.json");
    let stats: RunStats = serde_json::from_slice(&fs::read(stats_path)?)?;

    let mut report = Report {
        stats,
        ..Default::default()
    };

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != "stats.json")
        })
        .collect();
    paths.sort();

    for path in paths {
        let export: FileExport = match fs::read(&path)
            .map_err(Error::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(Error::from))
        {
            Ok(export) => export,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable export");
                continue;
            }
        };
        report.exported_files += 1;
        report.stops += export.stats.stops;
        report.trips += export.stats.trips;
        report.edges += export.stats.edges;
        report.travel_samples += export.stats.total_travel_times;
    }

    Ok(report)
}

impl Report {
    /// Human-readable multi-line summary for the `report` command.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "files total:     {}", self.stats.total);
        let _ = writeln!(
            out,
            "succeeded:       {} ({}%)",
            self.stats.succeeded,
            self.stats.success_rate()
        );
        let _ = writeln!(out, "degraded:        {}", self.stats.degraded);
        let _ = writeln!(out, "failed:          {}", self.stats.failed);
        for (reason, count) in &self.stats.by_reason {
            let _ = writeln!(out, "  {reason}: {count}");
        }
        let _ = writeln!(out, "exported files:  {}", self.exported_files);
        let _ = writeln!(out, "stops:           {}", self.stops);
        let _ = writeln!(out, "trips:           {}", self.trips);
        let _ = writeln!(out, "edges:           {}", self.edges);
        let _ = writeln!(out, "travel samples:  {}", self.travel_samples);
        out
    }
}

#[test]
fn run_stats_record_test() {
    let mut stats = RunStats::default();
    stats.record(&Outcome::Ok);
    stats.record(&Outcome::Ok);
    stats.record(&Outcome::Degraded { reason: "no_edges" });
    stats.record(&Outcome::Failed { reason: "bad_magic" });
    stats.record(&Outcome::Failed { reason: "bad_magic" });

    assert_eq!(stats.total, 5);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.degraded, 1);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.by_reason["bad_magic"], 2);
    assert_eq!(stats.by_reason["no_edges"], 1);
    assert_eq!(stats.success_rate(), 40.0);
}

#[test]
fn success_rate_empty_test() {
    assert_eq!(RunStats::default().success_rate(), 0.0);
}
