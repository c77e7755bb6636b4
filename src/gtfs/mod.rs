mod config;
pub mod models;

pub use config::*;
use models::*;
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File},
    io::{self},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;
use zip::{ZipArchive, read::ZipFile};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not find file with name: {0}")]
    FileNotFound(String),
    #[error("Missing any source to pull data from")]
    MissingSource,
}

/// Row counters for one streamed table. Rows that fail to deserialize are
/// skipped and counted rather than aborting the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamStats {
    pub rows: usize,
    pub skipped: usize,
}

#[derive(Default)]
pub enum Source {
    #[default]
    None,
    Zip(ZipArchive<File>),
    Directory(PathBuf),
}

/// A streaming GTFS source. Tables are read one row at a time through a
/// callback, so `stop_times.txt` never has to fit in memory.
#[derive(Default)]
pub struct Gtfs {
    config: Config,
    storage: Source,
}

impl Gtfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn from_zip<P: AsRef<Path>>(mut self, path: P) -> Result<Self, self::Error> {
        let zip_file = File::open(path)?;
        let archive = ZipArchive::new(zip_file)?;
        self.storage = Source::Zip(archive);
        Ok(self)
    }

    pub fn from_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage = Source::Directory(path.as_ref().to_path_buf());
        self
    }

    /// Picks the source kind from the path: a file is opened as a zip
    /// archive, a directory as an extracted feed.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<Self, self::Error> {
        let path = path.as_ref();
        if path.is_file() {
            self.from_zip(path)
        } else {
            Ok(self.from_directory(path))
        }
    }

    pub fn stream_routes<F>(&mut self, f: F) -> Result<StreamStats, self::Error>
    where
        F: FnMut((usize, GtfsRoute)),
    {
        let path = self.config.routes_path.clone();
        self.stream(&path, f)
    }

    pub fn stream_calendar<F>(&mut self, f: F) -> Result<StreamStats, self::Error>
    where
        F: FnMut((usize, GtfsCalendar)),
    {
        let path = self.config.calendar_path.clone();
        self.stream(&path, f)
    }

    pub fn stream_trips<F>(&mut self, f: F) -> Result<StreamStats, self::Error>
    where
        F: FnMut((usize, GtfsTrip)),
    {
        let path = self.config.trips_path.clone();
        self.stream(&path, f)
    }

    pub fn stream_stops<F>(&mut self, f: F) -> Result<StreamStats, self::Error>
    where
        F: FnMut((usize, GtfsStop)),
    {
        let path = self.config.stops_path.clone();
        self.stream(&path, f)
    }

    pub fn stream_stop_times<F>(&mut self, f: F) -> Result<StreamStats, self::Error>
    where
        F: FnMut((usize, GtfsStopTime)),
    {
        let path = self.config.stop_times_path.clone();
        self.stream(&path, f)
    }

    fn stream<T, F>(&mut self, file_name: &str, f: F) -> Result<StreamStats, self::Error>
    where
        T: DeserializeOwned,
        F: FnMut((usize, T)),
    {
        match &mut self.storage {
            Source::None => Err(self::Error::MissingSource),
            Source::Zip(archive) => stream_from_zip(archive, file_name, f),
            Source::Directory(path) => stream_from_dir(path, file_name, f),
        }
    }
}

fn stream_from_zip<T, F>(
    archive: &mut ZipArchive<File>,
    file_name: &str,
    f: F,
) -> Result<StreamStats, self::Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let file = get_file_from_zip(archive, file_name)?;
    let reader = csv::Reader::from_reader(file);
    drain(reader, file_name, f)
}

fn stream_from_dir<T, F>(
    dir_path: &Path,
    file_name: &str,
    f: F,
) -> Result<StreamStats, self::Error>
where
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let file_path = dir_path.join(file_name);
    let file = fs::File::open(&file_path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            self::Error::FileNotFound(file_name.to_string())
        } else {
            self::Error::Io(err)
        }
    })?;

    // BufReader is critical here for speed
    let reader = io::BufReader::with_capacity(128 * 1024, file);
    let csv_reader = csv::Reader::from_reader(reader);
    drain(csv_reader, file_name, f)
}

fn drain<R, T, F>(
    mut reader: csv::Reader<R>,
    file_name: &str,
    mut f: F,
) -> Result<StreamStats, self::Error>
where
    R: io::Read,
    T: DeserializeOwned,
    F: FnMut((usize, T)),
{
    let mut stats = StreamStats::default();
    for result in reader.deserialize() {
        match result {
            Ok(record) => {
                f((stats.rows, record));
                stats.rows += 1;
            }
            Err(err) => {
                stats.skipped += 1;
                if stats.skipped <= 5 {
                    warn!(file = file_name, %err, "skipping malformed row");
                }
            }
        }
    }
    Ok(stats)
}

fn get_file_from_zip<'a>(
    archive: &'a mut ZipArchive<File>,
    name: &'a str,
) -> Result<ZipFile<'a, File>, self::Error> {
    let index = archive
        .index_for_name(name)
        .ok_or(self::Error::FileNotFound(name.to_string()))?;
    let file = archive.by_index(index)?;
    Ok(file)
}
