//! Lazily-produced, replayable record sequences
//!
//! [`IterableStore`] backs the non-random-access views (`flat_map`,
//! `filter`, `window`). It is an explicit two-state machine: while
//! streaming, every iteration re-invokes the stored producer and replays
//! the sequence from the start; the first operation that needs a count or
//! an index materializes the sequence once, and all later access — indexed
//! or sequential — is served from the realized records.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::{RecordIter, Store};

/// A producer of one fresh pass over a lazy sequence
pub type Producer = Box<dyn Fn() -> RecordIter + Send + Sync>;

/// A store over a lazily-produced sequence of records
///
/// Upstream computations must be pure for replay to be observationally
/// identical across iterations; the pipeline assumes but does not enforce
/// this.
pub struct IterableStore {
    producer: Producer,
    materialized: OnceLock<Vec<Record>>,
}

impl IterableStore {
    /// Create a store whose records come from `producer`
    pub fn new(producer: impl Fn() -> RecordIter + Send + Sync + 'static) -> Self {
        Self {
            producer: Box::new(producer),
            materialized: OnceLock::new(),
        }
    }

    /// Drain the producer into a realized sequence, once
    fn force(&self) -> Result<&Vec<Record>> {
        if let Some(records) = self.materialized.get() {
            return Ok(records);
        }
        let records = (self.producer)().collect::<Result<Vec<_>>>()?;
        Ok(self.materialized.get_or_init(|| records))
    }
}

impl Store for IterableStore {
    fn len(&self) -> Result<usize> {
        Ok(self.force()?.len())
    }

    fn get(&self, index: usize) -> Result<Record> {
        let records = self.force()?;
        records.get(index).cloned().ok_or(Error::IndexOutOfBounds {
            index,
            len: records.len(),
        })
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        if self.materialized.get().is_some() {
            Box::new(MaterializedIter {
                store: self,
                index: 0,
            })
        } else {
            (self.producer)()
        }
    }
}

struct MaterializedIter {
    store: Arc<IterableStore>,
    index: usize,
}

impl Iterator for MaterializedIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.store.materialized.get()?.get(self.index)?.clone();
        self.index += 1;
        Some(Ok(record))
    }
}

/// Sliding windows over a record sequence
///
/// Windows start at multiples of `shift`. The first window is emitted even
/// when the source holds fewer than `size` records; every later window is
/// emitted only when full, so trailing partials are dropped. With
/// `shift > size`, the records between consecutive windows never appear in
/// any window.
pub(crate) struct Windows {
    source: RecordIter,
    size: usize,
    shift: usize,
    buffer: VecDeque<Record>,
    started: bool,
    done: bool,
}

impl Windows {
    pub(crate) fn new(source: RecordIter, size: usize, shift: usize) -> Self {
        Self {
            source,
            size,
            shift,
            buffer: VecDeque::with_capacity(size),
            started: false,
            done: false,
        }
    }

    fn emit(&self) -> Record {
        Record::Tuple(self.buffer.iter().cloned().collect())
    }

    /// Pull up to `count` records, evicting from the front to keep the
    /// buffer at `size`. Returns how many records were pulled, or an error
    /// from the source.
    fn pull(&mut self, count: usize) -> Result<usize> {
        let mut pulled = 0;
        while pulled < count {
            match self.source.next() {
                Some(Ok(record)) => {
                    if self.buffer.len() == self.size {
                        self.buffer.pop_front();
                    }
                    self.buffer.push_back(record);
                    pulled += 1;
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }
        Ok(pulled)
    }
}

impl Iterator for Windows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            match self.pull(self.size) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => return Some(Ok(self.emit())),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        match self.pull(self.shift) {
            Ok(pulled) if pulled == self.shift && self.buffer.len() == self.size => {
                Some(Ok(self.emit()))
            }
            Ok(_) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn counting_store(n: i64, invocations: Arc<AtomicUsize>) -> IterableStore {
        IterableStore::new(move || {
            invocations.fetch_add(1, Ordering::Relaxed);
            Box::new((0..n).map(|i| Ok(Record::Int(i))))
        })
    }

    #[test]
    fn replays_from_the_start_before_materialization() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(counting_store(5, invocations.clone()));

        let first: Vec<Record> = store.clone().iter().collect::<Result<_>>().unwrap();
        let second: Vec<Record> = store.clone().iter().collect::<Result<_>>().unwrap();

        assert_eq!(first, second);
        assert_eq!(invocations.load(Ordering::Relaxed), 2);
    }

    fn ints(n: i64) -> Dataset {
        Dataset::from_records((0..n).map(Record::Int).collect())
    }

    fn tuples(windows: Vec<Record>) -> Vec<Vec<i64>> {
        windows
            .into_iter()
            .map(|window| match window {
                Record::Tuple(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Record::Int(i) => i,
                        other => panic!("expected int, got {other:?}"),
                    })
                    .collect(),
                other => panic!("expected tuple, got {other:?}"),
            })
            .collect()
    }

    #[test_case(3, &[&[0, 1, 2], &[3, 4, 5], &[6, 7, 8]] ; "tiling drops the trailing partial")]
    #[test_case(1, &[
        &[0, 1, 2], &[1, 2, 3], &[2, 3, 4], &[3, 4, 5],
        &[4, 5, 6], &[5, 6, 7], &[6, 7, 8], &[7, 8, 9],
    ] ; "overlapping windows")]
    #[test_case(5, &[&[0, 1, 2], &[5, 6, 7]] ; "gapped windows skip records entirely")]
    fn window_boundaries(shift: usize, expected: &[&[i64]]) {
        let windows = ints(10).window(3, Some(shift)).unwrap();
        let expected: Vec<Vec<i64>> = expected.iter().map(|w| w.to_vec()).collect();
        assert_eq!(tuples(windows.all().unwrap()), expected);
    }

    #[test]
    fn window_defaults_to_non_overlapping() {
        let windows = ints(9).window(3, None).unwrap();
        assert_eq!(
            tuples(windows.all().unwrap()),
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]
        );
    }

    #[test]
    fn short_sources_yield_one_partial_window() {
        let windows = ints(2).window(3, None).unwrap();
        assert_eq!(tuples(windows.all().unwrap()), vec![vec![0, 1]]);

        let windows = ints(0).window(3, None).unwrap();
        assert_eq!(windows.len().unwrap(), 0);
    }

    #[test]
    fn zero_size_or_shift_is_rejected_eagerly() {
        assert!(ints(5).window(0, None).is_err());
        assert!(ints(5).window(3, Some(0)).is_err());
    }

    #[test]
    fn materializes_once_on_first_counted_access() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(counting_store(5, invocations.clone()));

        assert_eq!(store.len().unwrap(), 5);
        assert_eq!(store.len().unwrap(), 5);
        assert_eq!(store.get(3).unwrap(), Record::Int(3));

        // iteration after materialization reads the cache
        assert_eq!(store.clone().iter().count(), 5);
        assert_eq!(invocations.load(Ordering::Relaxed), 1);
    }
}
