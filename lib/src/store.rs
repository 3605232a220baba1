// Copyright 2025 The Fxdump Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk baseline storage. A dump version is one file: a one-line ASCII
//! header carrying the entry count, archive byte count, and content hash,
//! followed by the zstd-compressed textar archive. The header alone is
//! enough to decide whether a save can be skipped.

use std::fs;
use std::io;
use std::io::BufRead as _;
use std::io::Read as _;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::instrument;

use crate::dump::dump_hash;
use crate::dump::is_identifier;
use crate::textar;
use crate::textar::KeyValue;

/// Upper bound on entries per stored dump.
pub const MAX_ENTRIES: usize = 10_000;
/// Upper bound on the uncompressed archive size per stored dump.
pub const MAX_TOTAL_BYTES: usize = 10_000_000;

const MAGIC: &str = "fxdump1";
const ZSTD_LEVEL: i32 = 0;

/// Errors from loading or saving stored dumps.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No stored dump under the requested version label.
    #[error("dump for version \"{0}\" not found, save that version first")]
    NotFound(String),
    /// The version label is not usable as a file name.
    #[error("\"{0}\" is not a short alphanumeric identifier")]
    InvalidVersion(String),
    /// The stored file's header line does not parse.
    #[error("malformed dump header in {0}")]
    MalformedHeader(PathBuf),
    /// The stored dump declares more entries than allowed.
    #[error("dump has {0} entries, the limit is {MAX_ENTRIES}")]
    TooManyEntries(usize),
    /// The stored dump declares a larger archive than allowed.
    #[error("dump has {0} bytes, the limit is {MAX_TOTAL_BYTES}")]
    TooLarge(usize),
    /// The decompressed archive does not match its header.
    #[error("dump content disagrees with its header (corrupted? re-save the version)")]
    Corrupt,
    /// Keys are out of order or duplicated in the stored archive.
    #[error("key {0:?} out of order (corrupted? re-save the version)")]
    OutOfOrder(String),
    /// Underlying filesystem or decompression failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result of a save: either the file was written, or an identical dump was
/// already stored and the write was skipped.
#[derive(Debug, Eq, PartialEq)]
pub enum SaveOutcome {
    /// The dump was written to this path.
    Written(PathBuf),
    /// An identical dump already exists at this path.
    Unchanged(PathBuf),
}

/// Access to one dump's state directory.
#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
    sep_char: char,
}

impl Store {
    /// Opens the store for the dump called `name`. The directory is, in
    /// order of preference: the explicit override, the `FXDUMP_DIR`
    /// environment variable, or a per-user directory under the system temp
    /// dir. Nothing is created until the first save.
    pub fn new(name: &str, dir: Option<PathBuf>, sep_char: char) -> Result<Store, StoreError> {
        if !is_identifier(name) {
            return Err(StoreError::InvalidVersion(name.to_string()));
        }
        let dir = dir
            .or_else(|| std::env::var_os("FXDUMP_DIR").map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::temp_dir().join(format!("fxdump-{}-{name}", whoami::username()))
            });
        Ok(Store { dir, sep_char })
    }

    /// The state directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn version_path(&self, version: &str) -> Result<PathBuf, StoreError> {
        if !is_identifier(version) {
            return Err(StoreError::InvalidVersion(version.to_string()));
        }
        Ok(self.dir.join(format!("{version}.zst")))
    }

    /// Stores a key-sorted effect list under `version`, skipping the write
    /// when a stored dump with the same content hash already exists.
    #[instrument(skip(self, effects))]
    pub fn save(&self, version: &str, effects: &[KeyValue]) -> Result<SaveOutcome, StoreError> {
        let path = self.version_path(version)?;
        let hash = dump_hash(effects);
        if let Ok(existing) = self.peek_hash(version) {
            if existing == hash {
                tracing::debug!(?path, "stored dump already matches");
                return Ok(SaveOutcome::Unchanged(path));
            }
        }

        let archive = textar::format(effects, self.sep_char);
        let mut buf = Vec::with_capacity(archive.len() / 4 + 64);
        writeln!(buf, "{MAGIC} {} {} {hash:016x}", effects.len(), archive.len())?;
        let mut encoder = zstd::Encoder::new(buf, ZSTD_LEVEL)?;
        encoder.write_all(archive.as_bytes())?;
        let buf = encoder.finish()?;

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, buf)?;
        tracing::debug!(?path, entries = effects.len(), "dump saved");
        Ok(SaveOutcome::Written(path))
    }

    /// Loads the effect list stored under `version`, enforcing the size
    /// limits and verifying that keys are sorted and duplicate-free.
    #[instrument(skip(self))]
    pub fn load(&self, version: &str) -> Result<Vec<KeyValue>, StoreError> {
        let path = self.version_path(version)?;
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(version.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut reader = io::BufReader::new(file);
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let (entries, bytes, _) =
            parse_header(&header).ok_or_else(|| StoreError::MalformedHeader(path.clone()))?;
        if entries > MAX_ENTRIES {
            return Err(StoreError::TooManyEntries(entries));
        }
        if bytes > MAX_TOTAL_BYTES {
            return Err(StoreError::TooLarge(bytes));
        }

        let mut archive = String::with_capacity(bytes);
        zstd::Decoder::new(reader)?
            .take(bytes as u64 + 1)
            .read_to_string(&mut archive)?;
        if archive.len() != bytes {
            return Err(StoreError::Corrupt);
        }
        let kvs = textar::parse(&archive);
        if kvs.len() != entries {
            return Err(StoreError::Corrupt);
        }
        for pair in kvs.windows(2) {
            if pair[1].key <= pair[0].key {
                return Err(StoreError::OutOfOrder(pair[1].key.clone()));
            }
        }
        Ok(kvs)
    }

    /// Reads only the stored header and returns its content hash, without
    /// decompressing anything.
    pub fn peek_hash(&self, version: &str) -> Result<u64, StoreError> {
        let path = self.version_path(version)?;
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(version.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut header = String::new();
        io::BufReader::new(file).read_line(&mut header)?;
        let (_, _, hash) =
            parse_header(&header).ok_or_else(|| StoreError::MalformedHeader(path.clone()))?;
        Ok(hash)
    }

    /// Deletes all stored dumps and reports from the state directory, then
    /// the directory itself if it ended up empty. Returns the number of
    /// files removed. A missing directory counts as already clear.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            let ours = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("zst" | "html")
            );
            if ours && fs::remove_file(&path).is_ok() {
                tracing::debug!(?path, "deleted");
                removed += 1;
            }
        }
        let _ = fs::remove_dir(&self.dir);
        Ok(removed)
    }
}

fn parse_header(line: &str) -> Option<(usize, usize, u64)> {
    let mut fields = line.trim_end_matches('\n').split(' ');
    if fields.next() != Some(MAGIC) {
        return None;
    }
    let entries = fields.next()?.parse().ok()?;
    let bytes = fields.next()?.parse().ok()?;
    let hash = u64::from_str_radix(fields.next()?, 16).ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((entries, bytes, hash))
}
