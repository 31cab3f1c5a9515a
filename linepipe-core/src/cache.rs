//! Snapshot persistence for materialized datasets
//!
//! Snapshots are written through a temporary file in the target directory
//! and renamed into place only if the target still does not exist, so two
//! processes racing to produce the same snapshot at worst duplicate work.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::record::Record;

pub(crate) fn write_snapshot(path: &Path, records: &[Record]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        bincode::serialize_into(&mut writer, records)?;
        writer.flush()?;
    }
    if !path.exists() {
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    }
    Ok(())
}

pub(crate) fn read_snapshot(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}
