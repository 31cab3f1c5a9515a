//! Line-indexed text file stores

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use memmap2::{Mmap, MmapOptions};

use linepipe_core::error::{Error as CoreError, Result as CoreResult};
use linepipe_core::{ConcatStore, Dataset, Record, RecordIter, Store, ZipStore};

use crate::error::{Error, Result};

/// A random-access view over the lines of a text file
///
/// Sequential iteration streams the file through a scoped buffered reader
/// and needs no index. The first indexed access or length query memory-maps
/// the file and scans it once for line starts; the offset index and the map
/// are memoized for the life of the store and released when it is dropped.
/// Lines are yielded with the trailing newline stripped.
pub struct TextFile {
    path: PathBuf,

    /// Whole-file map, created on first indexed access
    mmap: OnceLock<Mmap>,

    /// Byte offset of each line start
    offsets: OnceLock<Vec<usize>>,

    /// How many offset scans have run; stays at one after the first index
    scans: AtomicUsize,
}

impl TextFile {
    /// Open a view over `path`; the file must exist
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::metadata(&path)?;
        Ok(Self {
            path,
            mmap: OnceLock::new(),
            offsets: OnceLock::new(),
            scans: AtomicUsize::new(0),
        })
    }

    /// The path this store reads from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map_file(&self) -> CoreResult<&Mmap> {
        if let Some(mmap) = self.mmap.get() {
            return Ok(mmap);
        }
        let file = File::open(&self.path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(self.mmap.get_or_init(|| mmap))
    }

    fn offsets(&self) -> CoreResult<&[usize]> {
        if let Some(offsets) = self.offsets.get() {
            return Ok(offsets);
        }
        self.scans.fetch_add(1, Ordering::Relaxed);
        // a zero-length file cannot be mapped and holds no lines
        if fs::metadata(&self.path)?.len() == 0 {
            return Ok(self.offsets.get_or_init(Vec::new));
        }
        let data = self.map_file()?;
        let mut offsets = vec![0];
        for (position, byte) in data.iter().enumerate() {
            if *byte == b'\n' && position + 1 < data.len() {
                offsets.push(position + 1);
            }
        }
        tracing::debug!(path = %self.path.display(), lines = offsets.len(), "indexed text file");
        Ok(self.offsets.get_or_init(|| offsets))
    }
}

impl Store for TextFile {
    fn len(&self) -> CoreResult<usize> {
        Ok(self.offsets()?.len())
    }

    fn get(&self, index: usize) -> CoreResult<Record> {
        let offsets = self.offsets()?;
        let len = offsets.len();
        if index >= len {
            return Err(CoreError::IndexOutOfBounds { index, len });
        }
        let data = self.map_file()?;
        let start = offsets[index];
        let end = offsets.get(index + 1).copied().unwrap_or(data.len());
        let mut line = &data[start..end];
        if line.last() == Some(&b'\n') {
            line = &line[..line.len() - 1];
        }
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        let line = std::str::from_utf8(line)
            .map_err(|e| CoreError::Decode(format!("{}: {e}", self.path.display())))?;
        Ok(Record::Text(line.to_owned()))
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        Box::new(LineIter {
            path: self.path.clone(),
            reader: None,
            done: false,
        })
    }
}

/// Streaming line iteration with a file handle scoped to the iterator
struct LineIter {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    done: bool,
}

impl Iterator for LineIter {
    type Item = CoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.reader.is_none() {
            match File::open(&self.path) {
                Ok(file) => self.reader = Some(BufReader::new(file)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        let reader = self.reader.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(Ok(Record::Text(line)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

/// How to combine several files into one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Tuple-wise alignment, bounded by the shortest file
    Zip,

    /// Sequential chaining
    Concat,
}

impl FromStr for CombineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zip" => Ok(CombineMode::Zip),
            "concat" => Ok(CombineMode::Concat),
            other => Err(Error::InvalidArgument(format!(
                "only 'zip' and 'concat' are valid combine modes, but '{other}' was given"
            ))),
        }
    }
}

/// A dataset over the lines of one text file
pub fn text_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    Ok(Dataset::new(Arc::new(TextFile::new(path)?)))
}

/// A dataset over several text files, combined per `mode`
pub fn multi_text_dataset<P: AsRef<Path>>(paths: &[P], mode: CombineMode) -> Result<Dataset> {
    let stores = paths
        .iter()
        .map(|path| Ok(Arc::new(TextFile::new(path)?) as Arc<dyn Store>))
        .collect::<Result<Vec<_>>>()?;
    let store: Arc<dyn Store> = match mode {
        CombineMode::Zip => Arc::new(ZipStore::new(stores)?),
        CombineMode::Concat => Arc::new(ConcatStore::new(stores)?),
    };
    Ok(Dataset::new(store))
}
