pub mod geo;
pub mod stats;
pub mod time;

pub use geo::*;
pub use stats::*;
pub use time::*;

use std::{fs, io, path::Path};

/// Writes `bytes` to `path` through a sibling temp file followed by a rename,
/// so readers never observe a half-written artifact.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
