//! Reading and writing the single JSON document a run works on. The pipeline
//! itself never touches the filesystem; only the binary calls these.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use crate::error::{EnrichError, Result};

pub fn read_document(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| {
        EnrichError::Io(std::io::Error::new(e.kind(), format!("Failed to open '{}': {}", path.display(), e)))
    })?;
    let document = serde_json::from_reader(BufReader::new(file))?;
    Ok(document)
}

/// Writes the whole document in one go. Non-ASCII text is kept as is.
pub fn write_document(path: &Path, document: &Value, pretty: bool) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, document)?;
    } else {
        serde_json::to_writer(&mut writer, document)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
