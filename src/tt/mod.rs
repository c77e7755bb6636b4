mod batch;
mod decoder;
mod edges;
mod export;
mod reader;
mod records;
mod stops;

pub use batch::*;
pub use decoder::*;
pub use edges::*;
pub use export::*;
pub use reader::*;
pub use records::*;
pub use stops::*;

use std::{
    io,
    time::{Duration, Instant},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("file too short or header tokens missing")]
    BadMagic,
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("no stop table found")]
    StopsNotFound,
    #[error("decode budget of {0:?} exceeded")]
    Timeout(Duration),
}

impl Error {
    /// Stable identifier used in `stats.json` breakdowns and status lines.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::BadMagic => "bad_magic",
            Error::OutOfBounds { .. } => "out_of_bounds",
            Error::StopsNotFound => "stops_not_found",
            Error::Timeout(_) => "timeout",
        }
    }
}

/// Cooperative per-file decode budget. The scan loops poll it so a stuck
/// decode aborts instead of pinning a worker.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.started.elapsed() > self.budget {
            Err(Error::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}

/// How far a decode got. `Complete` is the only non-degraded value; the other
/// variants still produce an export, just with empty or partial edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Complete,
    /// Stops were found but no section of the file scored as time records.
    NoTimeSection,
    /// Trips were decoded but every candidate edge was rejected.
    NoEdges,
}

impl DecodeStatus {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, DecodeStatus::Complete)
    }

    /// The coarse status written into the per-file export.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStatus::Complete => "ok",
            DecodeStatus::NoTimeSection | DecodeStatus::NoEdges => "degraded",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            DecodeStatus::Complete => None,
            DecodeStatus::NoTimeSection => Some("no_time_section"),
            DecodeStatus::NoEdges => Some("no_edges"),
        }
    }
}
