use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::mail::Month;

/// Supplies the raw text of one (year, month) archive unit.
pub trait ArchiveSource: Sync {
    /// `Ok(None)` when the unit does not exist.
    fn load(&self, year: u16, month: Month) -> Result<Option<String>>;
}

/// Pipermail text archives on disk, named `<year>-<Month>.txt`.
///
/// Files are looked up in `<root>/<year>/` first, then directly in `<root>`.
#[derive(Debug, Clone)]
pub struct ArchiveDir {
    root: PathBuf,
}

impl ArchiveDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an existing archive file for this unit, if any
    pub fn find(&self, year: u16, month: Month) -> Option<PathBuf> {
        let name = archive_file_name(year, month);
        [self.root.join(year.to_string()).join(&name), self.root.join(&name)]
            .into_iter()
            .find(|p| p.is_file())
    }

    /// All (year, month) units present under the root, sorted.
    pub fn discover(&self) -> Vec<(u16, Month)> {
        let units: BTreeSet<(u16, Month)> = WalkDir::new(&self.root)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.file_name().to_str().and_then(parse_archive_file_name))
            .collect();

        units.into_iter().collect()
    }
}

impl ArchiveSource for ArchiveDir {
    fn load(&self, year: u16, month: Month) -> Result<Option<String>> {
        let Some(path) = self.find(year, month) else {
            return Ok(None);
        };

        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(decode_latin1(&bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

/// `2007-January.txt`
pub fn archive_file_name(year: u16, month: Month) -> String {
    format!("{}-{}.txt", year, month.name())
}

/// Inverse of [`archive_file_name`]
pub fn parse_archive_file_name(name: &str) -> Option<(u16, Month)> {
    let stem = name.strip_suffix(".txt")?;
    let (year, month) = stem.split_once('-')?;
    Some((year.parse().ok()?, Month::from_name(month)?))
}

/// Decode single-byte legacy text. Every byte maps to the code point of the
/// same value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Reverse of [`decode_latin1`]. Characters above U+00FF (which decoding never
/// produces) become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c).unwrap_or(b'?'))
        .collect()
}
