use crate::tt::Error;
use encoding_rs::WINDOWS_1250;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// The header region is fixed-size; the tokens below must all appear in it,
/// decoded as Windows-1250. Their positions vary between vendor versions.
const HEADER_LEN: usize = 60;
const MIN_FILE_LEN: usize = 66;
const HEADER_TOKENS: [&str; 3] = ["TT", "TimeTable", "CHAPS"];

/// A TT file loaded into memory. Files are small (tens of KB to a few MB),
/// so the whole body is read up front and every access is bounds-checked.
#[derive(Debug, Clone)]
pub struct TtFile {
    path: PathBuf,
    data: Vec<u8>,
}

impl TtFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let data = fs::read(&path)?;
        Ok(Self { path, data })
    }

    pub fn from_bytes<P: AsRef<Path>>(path: P, data: Vec<u8>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }

    /// Little-endian 32-bit read at an arbitrary byte offset.
    pub fn u32_le(&self, offset: usize) -> Result<u32, Error> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], Error> {
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds { offset, len })?;
        if end > self.data.len() {
            return Err(Error::OutOfBounds { offset, len });
        }
        Ok(&self.data[offset..end])
    }

    /// Validates the vendor header. Anything else about the file is only
    /// worth looking at once this passes.
    pub fn verify_header(&self) -> Result<(), Error> {
        if self.data.len() < MIN_FILE_LEN {
            return Err(Error::BadMagic);
        }
        let (header, _, _) = WINDOWS_1250.decode(&self.data[..HEADER_LEN]);
        if HEADER_TOKENS.iter().all(|token| header.contains(token)) {
            Ok(())
        } else {
            Err(Error::BadMagic)
        }
    }
}

#[test]
fn u32_le_test() {
    let file = TtFile::from_bytes("t.tt", vec![0x01, 0x02, 0x03, 0x04, 0xFF]);
    assert_eq!(file.u32_le(0).unwrap(), 0x04030201);
    assert_eq!(file.u32_le(1).unwrap(), 0xFF040302);
}

#[test]
fn u32_le_out_of_bounds_test() {
    let file = TtFile::from_bytes("t.tt", vec![0x01, 0x02, 0x03, 0x04]);
    assert!(matches!(
        file.u32_le(1),
        Err(Error::OutOfBounds { offset: 1, len: 4 })
    ));
}

#[test]
fn slice_out_of_bounds_test() {
    let file = TtFile::from_bytes("t.tt", vec![0; 16]);
    assert!(file.slice(8, 8).is_ok());
    assert!(file.slice(9, 8).is_err());
    assert!(file.slice(usize::MAX, 4).is_err());
}

#[test]
fn verify_header_test() {
    let mut data = b"TT 1.2 TimeTable CHAPS spol. s r.o.".to_vec();
    data.resize(128, 0);
    let file = TtFile::from_bytes("brno.tt", data);
    assert!(file.verify_header().is_ok());
}

#[test]
fn verify_header_missing_token_test() {
    let mut data = b"TT 1.2 TimeTable someone else".to_vec();
    data.resize(128, 0);
    let file = TtFile::from_bytes("brno.tt", data);
    assert!(matches!(file.verify_header(), Err(Error::BadMagic)));
}

#[test]
fn verify_header_short_file_test() {
    let file = TtFile::from_bytes("brno.tt", b"TT TimeTable CHAPS".to_vec());
    assert!(matches!(file.verify_header(), Err(Error::BadMagic)));
}
