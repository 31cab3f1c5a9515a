//! Module-level pipeline operations
//!
//! Functional mirrors of the [`Dataset`] methods. Raw stores participate
//! without ceremony through `Dataset::from`/`Dataset::new`. The lazy views
//! returned here are chainable; realize them eagerly with
//! [`Dataset::all`].

use std::path::Path;
use std::sync::Arc;

use crate::combine::{ConcatStore, ZipStore};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::record::Record;
use crate::{cache, store::Store};

/// Chain several datasets end to end
///
/// Random access over the result binary-searches a lazily-built cumulative
/// length table; iteration concatenates the children's iteration order
/// exactly.
pub fn concat(datasets: &[Dataset]) -> Result<Dataset> {
    let stores: Vec<Arc<dyn Store>> = datasets.iter().map(Dataset::as_store).collect();
    Ok(Dataset::new(Arc::new(ConcatStore::new(stores)?)))
}

/// Align several datasets tuple-wise, bounded by the shortest
pub fn zip(datasets: &[Dataset]) -> Result<Dataset> {
    let stores: Vec<Arc<dyn Store>> = datasets.iter().map(Dataset::as_store).collect();
    Ok(Dataset::new(Arc::new(ZipStore::new(stores)?)))
}

/// Keep only the records for which `predicate` holds
pub fn filter(
    predicate: impl Fn(&Record) -> bool + Send + Sync + 'static,
    dataset: &Dataset,
) -> Dataset {
    dataset.filter(predicate)
}

/// Apply `func` to every record and flatten the results by one level
pub fn flat_map(
    func: impl Fn(Record) -> Vec<Record> + Send + Sync + 'static,
    dataset: &Dataset,
) -> Dataset {
    dataset.flat_map(func)
}

/// Slide a window of `size` records forward by `shift` (default `size`)
pub fn window(dataset: &Dataset, size: usize, shift: Option<usize>) -> Result<Dataset> {
    dataset.window(size, shift)
}

/// Load a previously persisted snapshot as a plain dataset
///
/// The result carries no transformation history; it is the content exactly
/// as materialized by [`Dataset::save`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading dataset snapshot");
    Ok(Dataset::from_records(cache::read_snapshot(path)?))
}
