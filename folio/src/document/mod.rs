// Record encoding - tab-indented JSON with a trailing newline

use crate::error::{FolioError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Serialize a record into its on-disk form.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Deserialize a stored record. `path` is only used for error reporting.
pub fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| FolioError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the raw records returned by `Store::read_all`.
/// Stops at the first record that fails to parse.
pub fn decode_all<T: DeserializeOwned>(records: &[String]) -> Result<Vec<T>> {
    records
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_str(raw)
                .map_err(|source| FolioError::CorruptEntry { index: i, source })
        })
        .collect()
}
