//! Delimited text file stores
//!
//! [`CsvFile`] layers field parsing over the line index of a [`TextFile`],
//! so every record stays addressable in O(1) once the line offsets are
//! built. Records are line-oriented: a quoted field must not span lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use linepipe_core::error::{Error as CoreError, Result as CoreResult};
use linepipe_core::{Dataset, Record, RecordIter, Store};

use crate::error::{Error, Result};
use crate::text::TextFile;

/// Options for delimited file stores
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Whether the first row names the fields
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: false,
        }
    }
}

/// A random-access view over the rows of a delimited text file
///
/// Without a header, rows come back as lists of field strings. With one,
/// the header row is parsed once at construction, excluded from the logical
/// index and length, and rows come back as ordered field-name mappings.
pub struct CsvFile {
    inner: Arc<TextFile>,
    delimiter: u8,
    header: Option<Vec<String>>,
}

impl CsvFile {
    /// Open a view over `path`; the file must exist
    pub fn new<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let inner = Arc::new(TextFile::new(path)?);
        let header = if options.header {
            Some(read_header(inner.path(), options.delimiter)?)
        } else {
            None
        };
        Ok(Self {
            inner,
            delimiter: options.delimiter,
            header,
        })
    }

    /// The field names from the header row, when one was requested
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Physical lines to skip so logical row 0 is the first data row
    fn skip(&self) -> usize {
        usize::from(self.header.is_some())
    }

    fn parse_line(&self, line: &str) -> CoreResult<Record> {
        let fields = split_fields(line, self.delimiter).map_err(CoreError::from)?;
        Ok(match &self.header {
            Some(names) => Record::Map(
                names
                    .iter()
                    .cloned()
                    .zip(fields.into_iter().map(Record::Text))
                    .collect(),
            ),
            None => Record::List(fields.into_iter().map(Record::Text).collect()),
        })
    }

    fn parse_record(&self, record: Record) -> CoreResult<Record> {
        match record {
            Record::Text(line) => self.parse_line(&line),
            other => Err(CoreError::Decode(format!(
                "expected a text line, got {other:?}"
            ))),
        }
    }
}

impl Store for CsvFile {
    fn len(&self) -> CoreResult<usize> {
        Ok(self.inner.len()?.saturating_sub(self.skip()))
    }

    fn get(&self, index: usize) -> CoreResult<Record> {
        let len = self.len()?;
        if index >= len {
            return Err(CoreError::IndexOutOfBounds { index, len });
        }
        let line = self.inner.get(index + self.skip())?;
        self.parse_record(line)
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        let mut lines = self.inner.clone().iter();
        if self.header.is_some() {
            // drop the header row so sequential and indexed views agree
            if let Some(Err(e)) = lines.next() {
                return Box::new(std::iter::once(Err(e)));
            }
        }
        let this = self;
        Box::new(lines.map(move |item| item.and_then(|record| this.parse_record(record))))
    }
}

fn read_header(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    let mut line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut line)?;
    if line.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{}: a header row was requested but the file is empty",
            path.display()
        )));
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    split_fields(&line, delimiter)
}

/// Split one line into fields, honoring quoting
fn split_fields(line: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = ::csv::StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_owned).collect())
    } else {
        Ok(Vec::new())
    }
}

/// A dataset over the rows of one delimited file
pub fn csv_dataset<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Dataset> {
    Ok(Dataset::new(Arc::new(CsvFile::new(path, options)?)))
}
