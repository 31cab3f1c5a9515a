//! The dataset container and its composition operators

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::cache;
use crate::combine::ConcatStore;
use crate::error::{Error, Result};
use crate::iterable::{IterableStore, Windows};
use crate::record::Record;
use crate::store::{InMemoryStore, RecordIter, Store};
use crate::transform::{FuncChain, RecordFn};

/// A composable view over a store of records
///
/// Datasets are cheap to clone and never mutate: every operator returns a
/// new dataset. A dataset pairs a store with a chain of deferred functions
/// applied per record at access time; [`map`](Dataset::map) appends to a
/// copy of that chain while keeping the same untransformed store reference,
/// so chained maps never nest wrappers. Iterating a dataset in order and
/// indexing it `0..len` yield the same sequence.
#[derive(Clone)]
pub struct Dataset {
    store: Arc<dyn Store>,

    /// Pending transformations, applied lazily per access
    funcs: FuncChain,

    /// Transformations already folded into the store's content by `save`
    processed: FuncChain,

    /// Memoized total length, shared across derived views of the same store
    length: Arc<OnceLock<usize>>,
}

impl Dataset {
    /// Wrap a store in a dataset
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            funcs: FuncChain::new(),
            processed: FuncChain::new(),
            length: Arc::new(OnceLock::new()),
        }
    }

    /// A dataset over already-materialized records
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(Arc::new(InMemoryStore::new(records)))
    }

    /// Number of records in this dataset, memoized after the first call
    pub fn len(&self) -> Result<usize> {
        if let Some(len) = self.length.get() {
            return Ok(*len);
        }
        let len = self.store.len()?;
        Ok(*self.length.get_or_init(|| len))
    }

    /// Whether this dataset holds no records
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Retrieve the record at `index`, with pending transformations applied
    pub fn get(&self, index: usize) -> Result<Record> {
        let record = self.store.get(index)?;
        self.funcs.apply(record)
    }

    /// Realize a sub-range of records with Python slice semantics
    ///
    /// `start` and `stop` may be negative (counted from the end) or absent
    /// (full extent in the direction of `step`); `step` may be negative and
    /// must not be zero.
    pub fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    ) -> Result<Vec<Record>> {
        if step == 0 {
            return Err(Error::InvalidArgument("slice step cannot be zero".into()));
        }
        let len = isize::try_from(self.len()?)
            .map_err(|_| Error::InvalidArgument("dataset too large to slice".into()))?;
        let clamp = |bound: Option<isize>, default: isize| -> isize {
            match bound {
                None => default,
                Some(mut value) => {
                    if value < 0 {
                        value += len;
                        if value < 0 {
                            value = if step < 0 { -1 } else { 0 };
                        }
                    } else if value >= len {
                        value = if step < 0 { len - 1 } else { len };
                    }
                    value
                }
            }
        };
        let start = clamp(start, if step < 0 { len - 1 } else { 0 });
        let stop = clamp(stop, if step < 0 { -1 } else { len });

        let mut records = Vec::new();
        let mut index = start;
        while (step > 0 && index < stop) || (step < 0 && index > stop) {
            records.push(self.get(index as usize)?);
            index += step;
        }
        Ok(records)
    }

    /// Produce a fresh sequential iteration over all records
    pub fn iter(&self) -> RecordIter {
        if self.funcs.is_empty() {
            return self.store.clone().iter();
        }
        let funcs = self.funcs.clone();
        Box::new(
            self.store
                .clone()
                .iter()
                .map(move |item| item.and_then(|record| funcs.apply(record))),
        )
    }

    /// Append a per-record transformation, applied lazily
    ///
    /// The returned dataset references the same untransformed store and an
    /// independent copy of the function chain, so pipelines that branch from
    /// a shared prefix do not affect each other.
    pub fn map(&self, func: impl Fn(Record) -> Record + Send + Sync + 'static) -> Dataset {
        self.try_map(move |record| Ok(func(record)))
    }

    /// Append a fallible per-record transformation, applied lazily
    pub fn try_map(
        &self,
        func: impl Fn(Record) -> Result<Record> + Send + Sync + 'static,
    ) -> Dataset {
        self.push_fn(Arc::new(func))
    }

    pub(crate) fn push_fn(&self, func: RecordFn) -> Dataset {
        Dataset {
            store: self.store.clone(),
            funcs: self.funcs.push(func),
            processed: self.processed.clone(),
            length: self.length.clone(),
        }
    }

    /// Chain `other` after this dataset
    ///
    /// Composition happens at the store level: chain-less datasets
    /// contribute their raw stores, so stacking operators does not
    /// accumulate wrapper indirection.
    pub fn concat(&self, other: &Dataset) -> Dataset {
        Dataset::new(Arc::new(ConcatStore::pair(
            self.as_store(),
            other.as_store(),
        )))
    }

    /// Apply `func` to every record and flatten the results by one level
    ///
    /// The view is lazy and replayable; the first `len`/`get` materializes
    /// it.
    pub fn flat_map(
        &self,
        func: impl Fn(Record) -> Vec<Record> + Send + Sync + 'static,
    ) -> Dataset {
        let parent = self.clone();
        let func = Arc::new(func);
        Dataset::new(Arc::new(IterableStore::new(move || {
            let func = func.clone();
            Box::new(parent.iter().flat_map(move |item| match item {
                Ok(record) => func(record).into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            }))
        })))
    }

    /// Keep only the records for which `predicate` holds
    pub fn filter(
        &self,
        predicate: impl Fn(&Record) -> bool + Send + Sync + 'static,
    ) -> Dataset {
        let parent = self.clone();
        let predicate = Arc::new(predicate);
        Dataset::new(Arc::new(IterableStore::new(move || {
            let predicate = predicate.clone();
            Box::new(parent.iter().filter(move |item| match item {
                Ok(record) => predicate(record),
                Err(_) => true,
            }))
        })))
    }

    /// Slide a window of `size` records forward by `shift` (default `size`)
    ///
    /// Windows are emitted as tuples. The first window may be short only
    /// when the whole dataset is shorter than `size`; later windows are
    /// emitted only when full, so trailing partials are dropped.
    pub fn window(&self, size: usize, shift: Option<usize>) -> Result<Dataset> {
        if size == 0 {
            return Err(Error::InvalidArgument("window size must be positive".into()));
        }
        let shift = shift.unwrap_or(size);
        if shift == 0 {
            return Err(Error::InvalidArgument("window shift must be positive".into()));
        }
        let parent = self.clone();
        Ok(Dataset::new(Arc::new(IterableStore::new(move || {
            Box::new(Windows::new(parent.iter(), size, shift))
        }))))
    }

    /// Realize the full sequential iteration
    pub fn all(&self) -> Result<Vec<Record>> {
        self.iter().collect()
    }

    /// Realize the first `n` records; fewer when the dataset is shorter
    pub fn take(&self, n: usize) -> Result<Vec<Record>> {
        self.iter().take(n).collect()
    }

    /// The first record; fails with [`Error::SourceExhausted`] when empty
    pub fn first(&self) -> Result<Record> {
        self.iter().next().unwrap_or(Err(Error::SourceExhausted))
    }

    /// Materialize this dataset into a snapshot at `path`, memoized by path
    ///
    /// When `path` already exists its content is loaded back instead of
    /// recomputing — the pipeline's functions are not re-run. Otherwise the
    /// dataset is fully materialized, parent directories are created as
    /// needed, and the snapshot is written via a temporary file renamed into
    /// place only if no concurrent writer got there first.
    ///
    /// The returned dataset serves the realized records from memory; its
    /// pending chain is empty and the functions that produced the content
    /// are folded into its processed history.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let records = if path.exists() {
            tracing::info!(path = %path.display(), "loading dataset snapshot");
            cache::read_snapshot(path)?
        } else {
            tracing::info!(path = %path.display(), "saving dataset snapshot");
            let records = self.all()?;
            cache::write_snapshot(path, &records)?;
            records
        };
        let length = Arc::new(OnceLock::new());
        let _ = length.set(records.len());
        Ok(Dataset {
            store: Arc::new(InMemoryStore::new(records)),
            funcs: FuncChain::new(),
            processed: self.processed.extend(&self.funcs),
            length,
        })
    }

    /// This dataset as a store, unwrapping to the raw store when possible
    pub fn as_store(&self) -> Arc<dyn Store> {
        if self.funcs.is_empty() {
            self.store.clone()
        } else {
            Arc::new(self.clone())
        }
    }

    /// Number of pending transformations
    pub fn pending_fns(&self) -> usize {
        self.funcs.len()
    }

    /// Number of transformations already folded into the store by `save`
    pub fn processed_fns(&self) -> usize {
        self.processed.len()
    }
}

impl Store for Dataset {
    fn len(&self) -> Result<usize> {
        Dataset::len(self)
    }

    fn get(&self, index: usize) -> Result<Record> {
        Dataset::get(self, index)
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        Dataset::iter(&self)
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Dataset::from_records(records)
    }
}

impl From<Arc<dyn Store>> for Dataset {
    fn from(store: Arc<dyn Store>) -> Self {
        Dataset::new(store)
    }
}
