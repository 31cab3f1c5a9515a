//! File-backed store implementations for data pipelines
//!
//! This crate provides the random-access backing stores the dataset layer
//! composes over: line-indexed text files and delimited (CSV) files, plus
//! constructors that combine several files into one dataset.

mod error;

pub mod csv;
pub mod text;

pub use csv::{csv_dataset, CsvFile, CsvOptions};
pub use error::{Error, Result};
pub use text::{multi_text_dataset, text_dataset, CombineMode, TextFile};

// Re-export core types
pub use linepipe_core::{Dataset, Record, RecordIter, Store};
