//! Deferred per-record transformation chains

use std::sync::Arc;

use crate::error::Result;
use crate::record::Record;

/// A deferred transformation applied to one record at access time
pub type RecordFn = Arc<dyn Fn(Record) -> Result<Record> + Send + Sync>;

/// An ordered chain of deferred transformations
///
/// Chains have value semantics: appending produces a new chain and never
/// mutates the original, so pipelines that diverge from a shared prefix
/// cannot alias each other's functions. The copy is shallow — functions are
/// shared behind `Arc` — which gives the same independence guarantee as a
/// deep copy without one.
#[derive(Clone, Default)]
pub struct FuncChain {
    funcs: Vec<RecordFn>,
}

impl FuncChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// A new chain with `func` appended
    #[must_use]
    pub fn push(&self, func: RecordFn) -> FuncChain {
        let mut funcs = self.funcs.clone();
        funcs.push(func);
        FuncChain { funcs }
    }

    /// A new chain holding this chain's functions followed by `other`'s
    #[must_use]
    pub fn extend(&self, other: &FuncChain) -> FuncChain {
        let mut funcs = self.funcs.clone();
        funcs.extend(other.funcs.iter().cloned());
        FuncChain { funcs }
    }

    /// Apply every function in order to `record`
    pub fn apply(&self, record: Record) -> Result<Record> {
        self.funcs.iter().try_fold(record, |record, func| func(record))
    }

    /// Number of functions in this chain
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Whether this chain holds no functions
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
