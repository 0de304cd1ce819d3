//! On-disk format for the lexical index
//!
//! The index file stores the whole [`InvertedIndex`]: documents, postings,
//! per-document lengths, scoring constants and analyzer language.
//!
//! Layout: `magic "CIDX" | u32 LE format version | MessagePack payload`.
//! Written atomically via temp + fsync + rename, so readers never observe a
//! partially written file.

use crate::index::InvertedIndex;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for the index file
const INDEX_MAGIC: &[u8; 4] = b"CIDX";
/// Current index file version
const INDEX_VERSION: u32 = 1;
/// Magic + version
const HEADER_LEN: usize = 8;

/// Sibling path used while writing.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Serialize the index into the versioned file format.
pub fn encode_index(index: &InvertedIndex) -> io::Result<Vec<u8>> {
    let payload = rmp_serde::to_vec_named(index)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("serialize error: {}", e)))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(INDEX_MAGIC);
    buf.extend_from_slice(&INDEX_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode bytes produced by [`encode_index`].
pub fn decode_index(buf: &[u8]) -> io::Result<InvertedIndex> {
    if buf.len() < HEADER_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "index file too small"));
    }
    if &buf[0..4] != INDEX_MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad index magic"));
    }
    let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    if version != INDEX_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported index version {}", version),
        ));
    }
    let index: InvertedIndex = rmp_serde::from_slice(&buf[HEADER_LEN..])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("decode error: {}", e)))?;
    index
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("corrupt index: {}", e)))?;
    Ok(index)
}

/// Write the index to `path` atomically (temp + rename).
pub fn write_index(path: &Path, index: &InvertedIndex) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let buf = encode_index(index)?;

    let tmp_path = temp_path(path);
    let result = write_and_rename(&tmp_path, path, &buf);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_rename(tmp_path: &Path, path: &Path, buf: &[u8]) -> io::Result<()> {
    {
        let mut file = std::fs::File::create(tmp_path)?;
        file.write_all(buf)?;
        file.sync_all()?;
    }
    std::fs::rename(tmp_path, path)
}

/// Load the index persisted at `path`.
///
/// Returns `Ok(None)` when no file exists or the file is empty: the caller
/// must build a fresh index. Any other failure is an error.
pub fn load_index(path: &Path) -> io::Result<Option<InvertedIndex>> {
    let buf = match std::fs::read(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if buf.is_empty() {
        return Ok(None);
    }
    decode_index(&buf).map(Some)
}

// ============================================================================
// Tests
// ============================================================================
