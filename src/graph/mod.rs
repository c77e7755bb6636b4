mod builder;
mod export;
mod profile;

pub use builder::*;
pub use export::*;
pub use profile::*;

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GTFS error: {0}")]
    Gtfs(#[from] crate::gtfs::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
