//! Snapshot codec for the two companion index files.
//!
//! `<base>.fvec` holds the geometric structure: an 8-byte magic, dimension
//! (u32 LE), row count (u64 LE), then the row-major float32 payload in
//! little-endian order. `<base>.json` holds the side-table
//! `{documents, metadata, dimension}`. Writes go to a temp path in the same
//! directory and are renamed into place, so one `save` call is all-or-nothing.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use finrag_core::error::{Error, Result};
use finrag_core::types::Meta;

const VEC_MAGIC: &[u8; 8] = b"FINRAGV1";

/// Serialized record paired with the geometric file.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SideTable {
    pub documents: Vec<String>,
    pub metadata: Vec<Meta>,
    pub dimension: usize,
}

pub(crate) fn vectors_path(base: &Path) -> PathBuf {
    with_extension(base, "fvec")
}

pub(crate) fn side_table_path(base: &Path) -> PathBuf {
    with_extension(base, "json")
}

// `Path::with_extension` would strip a dotted base name ("AAPL_10-K_2023"
// survives, "index.v2" would not); append instead.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(ext);
    base.with_file_name(name)
}

pub(crate) fn write_vectors(path: &Path, dim: usize, data: &[f32]) -> Result<()> {
    let mut payload = Vec::with_capacity(VEC_MAGIC.len() + 12 + data.len() * 4);
    payload.extend_from_slice(VEC_MAGIC);
    payload.extend_from_slice(&u32::try_from(dim).map_err(invalid_header)?.to_le_bytes());
    let count = if dim == 0 { 0 } else { data.len() / dim };
    payload.extend_from_slice(&(count as u64).to_le_bytes());
    for value in data {
        payload.extend_from_slice(&value.to_le_bytes());
    }
    write_atomic(path, &payload)
}

pub(crate) fn read_vectors(path: &Path) -> Result<(usize, Vec<f32>)> {
    let mut file = fs::File::open(path)?;
    let mut magic = [0u8; 8];
    file.read_exact(&mut magic)?;
    if &magic != VEC_MAGIC {
        return Err(Error::Configuration(format!(
            "{} is not a finrag vector snapshot",
            path.display()
        )));
    }
    let mut dim_bytes = [0u8; 4];
    file.read_exact(&mut dim_bytes)?;
    let dim = u32::from_le_bytes(dim_bytes) as usize;
    let mut count_bytes = [0u8; 8];
    file.read_exact(&mut count_bytes)?;
    let count = u64::from_le_bytes(count_bytes) as usize;

    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| invalid_header(path.display()))?;
    if raw.len() != expected {
        return Err(Error::Configuration(format!(
            "{}: payload is {} bytes, header promises {}",
            path.display(),
            raw.len(),
            expected
        )));
    }
    let data = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((dim, data))
}

pub(crate) fn write_side_table(path: &Path, table: &SideTable) -> Result<()> {
    let payload = serde_json::to_vec(table)?;
    write_atomic(path, &payload)
}

pub(crate) fn read_side_table(path: &Path) -> Result<SideTable> {
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Write via a sibling temp file and rename so readers never observe a
/// partial artifact.
fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(payload)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn invalid_header(detail: impl std::fmt::Display) -> Error {
    Error::Configuration(format!("invalid vector snapshot header: {detail}"))
}

pub(crate) fn not_found(base: &Path) -> Error {
    Error::NotFound(format!("index files not found at {}", base.display()))
}

pub(crate) fn io_not_found(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn vectors_round_trip() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("index.fvec");
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        write_vectors(&path, 3, &data).expect("write");
        let (dim, read) = read_vectors(&path).expect("read");
        assert_eq!(dim, 3);
        assert_eq!(read, data);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("index.fvec");
        write_vectors(&path, 2, &[1.0, 2.0, 3.0, 4.0]).expect("write");
        let raw = fs::read(&path).expect("read raw");
        fs::write(&path, &raw[..raw.len() - 4]).expect("truncate");
        assert!(read_vectors(&path).is_err());
    }

    #[test]
    fn companion_paths_keep_dotted_base_names() {
        let base = Path::new("/store/AAPL_10-K_2023");
        assert_eq!(vectors_path(base), Path::new("/store/AAPL_10-K_2023.fvec"));
        assert_eq!(side_table_path(base), Path::new("/store/AAPL_10-K_2023.json"));
    }
}
