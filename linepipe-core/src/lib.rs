//! Core traits, record types and dataset abstractions for lazy data pipelines
//!
//! This crate provides the dataset abstraction layer for building lazy,
//! composable transformation pipelines over line-oriented and tabular data,
//! feeding training loops through plain sequential iteration or indexed
//! access. Evaluation is pull-based and single-threaded: transformations are
//! thin wrappers computed on demand, with compute-once memoization for the
//! few internal caches (lengths, offset tables) that are worth remembering.

#![warn(missing_docs)]

pub mod apply;
mod cache;
pub mod combine;
pub mod dataset;
pub mod error;
pub mod iterable;
pub mod ops;
pub mod prefetch;
pub mod record;
pub mod split;
pub mod store;
pub mod transform;

// Re-export key types for convenience
pub use apply::{apply, apply_all, FieldApply};
pub use combine::{ConcatStore, ZipStore};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use iterable::IterableStore;
pub use ops::{concat, filter, flat_map, load, window, zip};
pub use prefetch::PrefetchIterator;
pub use record::{Key, Record};
pub use split::{
    cross_validation, cross_validation_random, split_at, split_n, split_random, SubStore,
};
pub use store::{InMemoryStore, RecordIter, Store};
pub use transform::{FuncChain, RecordFn};
