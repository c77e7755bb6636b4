use crate::report::RunStats;
use crate::shared::write_atomic;
use crate::tt::{Deadline, Error, FileExport, FileStats, decode_file};
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub out_dir: PathBuf,
    /// Worker threads for the decode phase. Zero means the rayon default.
    pub workers: usize,
    /// Per-file decode budget.
    pub timeout: Duration,
}

impl BatchConfig {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            workers: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The per-file result value. Errors never escape the file boundary; they
/// land here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Degraded { reason: &'static str },
    Failed { reason: &'static str },
}

impl Outcome {
    pub fn category(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Degraded { .. } => "degraded",
            Outcome::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Outcome::Ok => None,
            Outcome::Degraded { reason } | Outcome::Failed { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub outcome: Outcome,
    pub stats: FileStats,
}

impl FileReport {
    /// One stdout line per file, the user-visible contract of the batch run.
    pub fn status_line(&self) -> String {
        match &self.outcome {
            Outcome::Ok => format!(
                "{}: ok ({} stops, {} trips, {} edges)",
                self.file, self.stats.stops, self.stats.trips, self.stats.edges
            ),
            Outcome::Degraded { reason } => format!(
                "{}: degraded ({}; {} stops, {} trips, {} edges)",
                self.file, reason, self.stats.stops, self.stats.trips, self.stats.edges
            ),
            Outcome::Failed { reason } => format!("{}: failed ({})", self.file, reason),
        }
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub reports: Vec<FileReport>,
    pub stats: RunStats,
}

/// Expands the CLI argument into the work list: a single file as-is, a
/// directory as its sorted `*.tt` entries.
pub fn collect_tt_files(path: &Path) -> Result<Vec<PathBuf>, Error> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("tt"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Decodes every file on a worker pool, writes one JSON per file plus a
/// `stats.json`, and returns the reports in input order.
///
/// Decoding is embarrassingly parallel; the stats aggregation and its write
/// happen on this thread after the pool drains.
pub fn decode_batch(files: &[PathBuf], config: &BatchConfig) -> Result<BatchResult, Error> {
    fs::create_dir_all(&config.out_dir)?;

    let reports: Vec<FileReport> = if config.workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(io::Error::other)?;
        pool.install(|| files.par_iter().map(|file| decode_one(file, config)).collect())
    } else {
        files.par_iter().map(|file| decode_one(file, config)).collect()
    };

    let mut stats = RunStats::default();
    for report in &reports {
        stats.record(&report.outcome);
    }
    let json = serde_json::to_vec_pretty(&stats).map_err(io::Error::other)?;
    write_atomic(config.out_dir.join("stats.json"), &json)?;

    Ok(BatchResult { reports, stats })
}

fn decode_one(path: &Path, config: &BatchConfig) -> FileReport {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let deadline = Deadline::new(config.timeout);

    let decoded = match decode_file(path, deadline) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(%file, %err, "decode failed");
            return FileReport {
                file,
                outcome: Outcome::Failed { reason: err.reason() },
                stats: FileStats::default(),
            };
        }
    };

    let export = FileExport::from_decoded(&decoded);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.clone());
    let out_path = config.out_dir.join(format!("{stem}.json"));

    let written = export
        .to_json()
        .map_err(io::Error::other)
        .and_then(|json| write_atomic(&out_path, &json));
    if let Err(err) = written {
        warn!(%file, %err, "export write failed");
        return FileReport {
            file,
            outcome: Outcome::Failed { reason: "io" },
            stats: export.stats,
        };
    }

    debug!(%file, status = %export.status, "decoded");
    let outcome = match decoded.status.reason() {
        None => Outcome::Ok,
        Some(reason) => Outcome::Degraded { reason },
    };
    FileReport {
        file,
        outcome,
        stats: export.stats,
    }
}

#[test]
fn outcome_category_test() {
    assert_eq!(Outcome::Ok.category(), "ok");
    assert_eq!(
        Outcome::Degraded { reason: "no_edges" }.category(),
        "degraded"
    );
    assert_eq!(Outcome::Failed { reason: "bad_magic" }.reason(), Some("bad_magic"));
}

#[test]
fn status_line_test() {
    let report = FileReport {
        file: "brno.tt".into(),
        outcome: Outcome::Failed { reason: "bad_magic" },
        stats: FileStats::default(),
    };
    assert_eq!(report.status_line(), "brno.tt: failed (bad_magic)");
}
