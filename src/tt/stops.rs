use crate::tt::{Deadline, Error, TtFile};
use encoding_rs::WINDOWS_1250;

/// Scan window for the offset-table/string-blob pair, relative to the end of
/// the header.
const SCAN_START: usize = 0x40;
const SCAN_SPAN: usize = 10_000;

const MIN_ITEMS: u32 = 2;
const MAX_ITEMS: u32 = 10_000;
const MIN_STOPS: usize = 10;
const PREFERRED_STOPS: usize = 20;

/// Names containing any of these belong to metadata blobs (copyright lines,
/// vendor banners), not the stop table.
const BAD_TOKENS: [&str; 6] = ["Copyright", "http://", "Internet", "MHD ", "ROPID", "PID.tt"];

/// If more than this share of names is a single character the candidate is a
/// transport-mode glyph table.
const MAX_SINGLE_CHAR_RATIO: f64 = 0.3;

/// The file's stop names, indexed from zero the way the time records index
/// them.
#[derive(Debug, Clone, Default)]
pub struct StopTable {
    pub names: Vec<String>,
}

impl StopTable {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// Locates the stop table by scanning every byte alignment for an
    /// offset-table followed by a string blob.
    ///
    /// The shape being matched:
    /// 1. `total_bytes` / `item_count` words with `total_bytes == item_count * 4`.
    /// 2. `item_count` non-decreasing little-endian offsets.
    /// 3. A blob header whose two words are equal (1-byte items).
    /// 4. The last offset equals the blob length (sentinel).
    ///
    /// The first candidate with more than [`PREFERRED_STOPS`] names wins;
    /// otherwise the largest one with at least [`MIN_STOPS`] does.
    pub fn find(file: &TtFile, deadline: &Deadline) -> Result<Self, Error> {
        let mut best: Vec<String> = Vec::new();
        let end = (SCAN_START + SCAN_SPAN).min(file.len().saturating_sub(8));

        for alignment in 0..4 {
            let mut offset = SCAN_START + alignment;
            while offset < end {
                deadline.check()?;
                if let Some(names) = candidate(file, offset) {
                    if names.len() > PREFERRED_STOPS {
                        return Ok(Self { names });
                    }
                    if names.len() > best.len() {
                        best = names;
                    }
                }
                offset += 4;
            }
        }

        if best.len() >= MIN_STOPS {
            Ok(Self { names: best })
        } else {
            Err(Error::StopsNotFound)
        }
    }
}

/// Checks one offset for the full table/blob shape and returns the decoded
/// names, or `None` when any invariant fails.
fn candidate(file: &TtFile, offset: usize) -> Option<Vec<String>> {
    let total_bytes = file.u32_le(offset).ok()?;
    let item_count = file.u32_le(offset + 4).ok()?;

    if total_bytes != item_count.checked_mul(4)? {
        return None;
    }
    if !(MIN_ITEMS..=MAX_ITEMS).contains(&item_count) {
        return None;
    }

    let offsets_start = offset + 8;
    let offsets_end = offsets_start + total_bytes as usize;
    if offsets_end > file.len() {
        return None;
    }

    let mut offsets = Vec::with_capacity(item_count as usize);
    let mut prev = 0u32;
    for i in 0..item_count as usize {
        let off = file.u32_le(offsets_start + i * 4).ok()?;
        if off < prev {
            return None;
        }
        prev = off;
        offsets.push(off);
    }

    // String blob header directly behind the offsets: byte total == item
    // count because items are single bytes.
    let blob_start = offsets_end;
    let blob_total_bytes = file.u32_le(blob_start).ok()?;
    let blob_item_count = file.u32_le(blob_start + 4).ok()?;
    if blob_total_bytes != blob_item_count {
        return None;
    }
    if *offsets.last()? != blob_total_bytes {
        return None;
    }

    let blob = file.slice(blob_start + 8, blob_total_bytes as usize).ok()?;

    let mut names = Vec::with_capacity(offsets.len().saturating_sub(1));
    for pair in offsets.windows(2) {
        let bytes = &blob[pair[0] as usize..pair[1] as usize];
        let (decoded, _, _) = WINDOWS_1250.decode(bytes);
        names.push(decoded.trim_end_matches('\0').to_string());
    }

    if names
        .iter()
        .any(|name| BAD_TOKENS.iter().any(|token| name.contains(token)))
    {
        return None;
    }

    let single_char = names
        .iter()
        .filter(|name| name.trim().chars().count() <= 1)
        .count();
    if (single_char as f64) > (names.len() as f64) * MAX_SINGLE_CHAR_RATIO {
        return None;
    }

    if names.len() < MIN_STOPS {
        return None;
    }

    Some(names)
}

#[cfg(test)]
fn table_bytes(names: &[&str]) -> Vec<u8> {
    let mut offsets: Vec<u32> = Vec::with_capacity(names.len() + 1);
    let mut blob: Vec<u8> = Vec::new();
    for name in names {
        offsets.push(blob.len() as u32);
        let (encoded, _, _) = WINDOWS_1250.encode(name);
        blob.extend_from_slice(&encoded);
        blob.push(0);
    }
    offsets.push(blob.len() as u32);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&((offsets.len() as u32) * 4).to_le_bytes());
    bytes.extend_from_slice(&(offsets.len() as u32).to_le_bytes());
    for off in &offsets {
        bytes.extend_from_slice(&off.to_le_bytes());
    }
    bytes.extend_from_slice(&(blob.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(blob.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&blob);
    bytes
}

#[cfg(test)]
fn file_with_table(table: &[u8]) -> TtFile {
    let mut data = vec![0xFFu8; 0x48];
    data.extend_from_slice(table);
    data.extend_from_slice(&[0xFF; 64]);
    TtFile::from_bytes("test.tt", data)
}

#[cfg(test)]
const TEST_NAMES: [&str; 12] = [
    "Hlavní nádraží",
    "Náměstí Svobody",
    "Česká",
    "Moravské náměstí",
    "Konečného náměstí",
    "Tábor",
    "Klusáčkova",
    "Skácelova",
    "Slovanské náměstí",
    "Semilasso",
    "Kartouzská",
    "Husitská",
];

#[cfg(test)]
fn deadline() -> Deadline {
    Deadline::new(std::time::Duration::from_secs(5))
}

#[test]
fn find_table_test() {
    let file = file_with_table(&table_bytes(&TEST_NAMES));
    let table = StopTable::find(&file, &deadline()).unwrap();
    assert_eq!(table.len(), 12);
    assert_eq!(table.name(0), Some("Hlavní nádraží"));
    assert_eq!(table.name(11), Some("Husitská"));
}

#[test]
fn reject_bad_token_test() {
    let mut names = TEST_NAMES.to_vec();
    names[3] = "Copyright 2009 CHAPS spol. s r.o.";
    let file = file_with_table(&table_bytes(&names));
    assert!(matches!(
        StopTable::find(&file, &deadline()),
        Err(Error::StopsNotFound)
    ));
}

#[test]
fn reject_single_char_glyphs_test() {
    let names = ["A", "B", "C", "D", "E", "F", "G", "H", "Dlouhá", "Krátká"];
    let file = file_with_table(&table_bytes(&names));
    assert!(StopTable::find(&file, &deadline()).is_err());
}

#[test]
fn reject_too_few_names_test() {
    let names = ["Alpha", "Beta", "Gamma"];
    let file = file_with_table(&table_bytes(&names));
    assert!(StopTable::find(&file, &deadline()).is_err());
}

#[test]
fn reject_non_monotonic_offsets_test() {
    let mut table = table_bytes(&TEST_NAMES);
    // Swap two offsets so the table is no longer sorted.
    let a = 8;
    let b = 8 + 4;
    for i in 0..4 {
        table.swap(a + i, b + i);
    }
    let file = file_with_table(&table);
    assert!(StopTable::find(&file, &deadline()).is_err());
}

#[test]
fn windows_1250_decode_test() {
    // "Příliš žluťoučký" in Windows-1250 bytes must round-trip through the
    // blob decode.
    let file = file_with_table(&table_bytes(&[
        "Hlavní nádraží",
        "Příliš žluťoučký",
        "Újezd",
        "Výstaviště",
        "Švandovo divadlo",
        "Anděl",
        "Karlovo náměstí",
        "Palackého náměstí",
        "Staroměstská",
        "Malostranská",
        "Hradčanská",
    ]));
    let table = StopTable::find(&file, &deadline()).unwrap();
    assert_eq!(table.name(1), Some("Příliš žluťoučký"));
}
