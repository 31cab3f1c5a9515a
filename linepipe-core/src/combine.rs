//! Store combinators: tuple-wise zip and sequential concat

use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::{RecordIter, Store};

/// Tuple-wise alignment of several child stores
///
/// The logical length is the minimum of the children's lengths. Indexed
/// access past that length fails, while sequential iteration silently stops
/// at the shortest child — extra records in longer children are dropped,
/// matching language-level zip semantics.
pub struct ZipStore {
    /// The aligned child stores, in tuple order
    children: Vec<Arc<dyn Store>>,
}

impl ZipStore {
    /// Create a zip over one or more child stores
    pub fn new(children: Vec<Arc<dyn Store>>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::InvalidArgument(
                "zip requires at least one child store".into(),
            ));
        }
        Ok(Self { children })
    }
}

impl Store for ZipStore {
    // Recomputed on every call: children are immutable, and containers
    // memoize their own length on top of this.
    fn len(&self) -> Result<usize> {
        let mut min = usize::MAX;
        for child in &self.children {
            min = min.min(child.len()?);
        }
        Ok(min)
    }

    fn get(&self, index: usize) -> Result<Record> {
        let len = self.len()?;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let items = self
            .children
            .iter()
            .map(|child| child.get(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Record::Tuple(items))
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        let iters = self
            .children
            .iter()
            .map(|child| child.clone().iter())
            .collect();
        Box::new(ZipIter { iters })
    }
}

struct ZipIter {
    iters: Vec<RecordIter>,
}

impl Iterator for ZipIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut items = Vec::with_capacity(self.iters.len());
        for iter in &mut self.iters {
            match iter.next()? {
                Ok(record) => items.push(record),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(Record::Tuple(items)))
    }
}

/// Sequential chaining of several child stores
///
/// Construction is cheap: the cumulative length table used to resolve
/// indexed access is built on the first `len`/`get` call and memoized for
/// the life of the store. Iteration never needs the table.
pub struct ConcatStore {
    /// The chained child stores, in iteration order
    children: Vec<Arc<dyn Store>>,

    /// Cumulative child lengths, built lazily
    cumulative: OnceLock<Vec<usize>>,
}

impl ConcatStore {
    /// Create a concatenation of one or more child stores
    pub fn new(children: Vec<Arc<dyn Store>>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::InvalidArgument(
                "concat requires at least one child store".into(),
            ));
        }
        Ok(Self {
            children,
            cumulative: OnceLock::new(),
        })
    }

    pub(crate) fn pair(first: Arc<dyn Store>, second: Arc<dyn Store>) -> Self {
        Self {
            children: vec![first, second],
            cumulative: OnceLock::new(),
        }
    }

    fn cumulative(&self) -> Result<&[usize]> {
        if let Some(table) = self.cumulative.get() {
            return Ok(table);
        }
        let mut table = Vec::with_capacity(self.children.len());
        let mut total = 0;
        for child in &self.children {
            total += child.len()?;
            table.push(total);
        }
        Ok(self.cumulative.get_or_init(|| table))
    }
}

impl Store for ConcatStore {
    fn len(&self) -> Result<usize> {
        Ok(self.cumulative()?.last().copied().unwrap_or(0))
    }

    fn get(&self, index: usize) -> Result<Record> {
        let table = self.cumulative()?;
        let len = table.last().copied().unwrap_or(0);
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let child = table.partition_point(|&end| end <= index);
        let offset = if child == 0 { 0 } else { table[child - 1] };
        self.children[child].get(index - offset)
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        Box::new(ConcatIter {
            store: self,
            child: 0,
            current: None,
        })
    }
}

struct ConcatIter {
    store: Arc<ConcatStore>,
    child: usize,
    current: Option<RecordIter>,
}

impl Iterator for ConcatIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(item) = current.next() {
                    return Some(item);
                }
                self.current = None;
            }
            let child = self.store.children.get(self.child)?;
            self.current = Some(child.clone().iter());
            self.child += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use proptest::prelude::*;

    fn ints(range: std::ops::Range<i64>) -> Arc<dyn Store> {
        Arc::new(InMemoryStore::new(range.map(Record::Int).collect()))
    }

    #[test]
    fn zip_is_bounded_by_the_shortest_child() {
        let zipped = Arc::new(ZipStore::new(vec![ints(0..5), ints(10..13)]).unwrap());

        assert_eq!(zipped.len().unwrap(), 3);
        assert_eq!(
            zipped.get(2).unwrap(),
            Record::Tuple(vec![Record::Int(2), Record::Int(12)])
        );
        assert!(matches!(
            zipped.get(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        ));

        // iteration truncates silently instead of failing
        assert_eq!(zipped.iter().count(), 3);
    }

    #[test]
    fn concat_chains_children_in_order() {
        let chained = Arc::new(ConcatStore::new(vec![ints(0..5), ints(10..13)]).unwrap());

        assert_eq!(chained.len().unwrap(), 8);
        assert_eq!(chained.get(5).unwrap(), Record::Int(10));
        assert_eq!(chained.get(4).unwrap(), Record::Int(4));
        assert!(matches!(
            chained.get(8),
            Err(Error::IndexOutOfBounds { index: 8, len: 8 })
        ));
    }

    #[test]
    fn concat_builds_its_offset_table_lazily() {
        let chained = ConcatStore::new(vec![ints(0..100), ints(0..100)]).unwrap();
        assert!(chained.cumulative.get().is_none());

        // pure iteration does not need the table
        let chained = Arc::new(chained);
        assert_eq!(chained.clone().iter().count(), 200);
        assert!(chained.cumulative.get().is_none());

        assert_eq!(chained.len().unwrap(), 200);
        assert!(chained.cumulative.get().is_some());
    }

    #[test]
    fn empty_children_are_rejected() {
        assert!(ZipStore::new(Vec::new()).is_err());
        assert!(ConcatStore::new(Vec::new()).is_err());
    }

    proptest! {
        #[test]
        fn indexed_access_matches_iteration(len_a in 0i64..40, len_b in 0i64..40) {
            let zipped = Arc::new(ZipStore::new(vec![ints(0..len_a), ints(0..len_b)]).unwrap());
            let chained = Arc::new(ConcatStore::new(vec![ints(0..len_a), ints(0..len_b)]).unwrap());

            for store in [zipped as Arc<dyn Store>, chained as Arc<dyn Store>] {
                let by_iter: Vec<Record> =
                    store.clone().iter().collect::<Result<_>>().unwrap();
                prop_assert_eq!(by_iter.len(), store.len().unwrap());
                for (i, record) in by_iter.iter().enumerate() {
                    prop_assert_eq!(&store.get(i).unwrap(), record);
                }
            }
        }
    }
}
