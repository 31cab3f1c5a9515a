//! Dataset splitting for training/validation workflows

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::{RecordIter, Store};

/// A contiguous view over a base store, optionally through a permutation
///
/// The permutation, when present, covers the whole base store; the view
/// selects `start..end` of it. Record access goes straight to the base
/// store, so views stay cheap no matter how large the base is.
pub struct SubStore {
    base: Arc<dyn Store>,
    start: usize,
    end: usize,
    indices: Option<Arc<Vec<usize>>>,
}

impl SubStore {
    /// Create a view over `start..end` of `base`
    pub fn new(
        base: Arc<dyn Store>,
        start: usize,
        end: usize,
        indices: Option<Arc<Vec<usize>>>,
    ) -> Result<Self> {
        let len = base.len()?;
        if start > end || end > len {
            return Err(Error::InvalidArgument(format!(
                "subset {start}..{end} overruns the base dataset of length {len}"
            )));
        }
        if let Some(indices) = &indices {
            if indices.len() != len {
                return Err(Error::InvalidArgument(format!(
                    "permutation length {} does not match the base dataset length {len}",
                    indices.len()
                )));
            }
        }
        Ok(Self {
            base,
            start,
            end,
            indices,
        })
    }
}

impl Store for SubStore {
    fn len(&self) -> Result<usize> {
        Ok(self.end - self.start)
    }

    fn get(&self, index: usize) -> Result<Record> {
        let len = self.end - self.start;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let position = self.start + index;
        let position = match &self.indices {
            Some(indices) => indices[position],
            None => position,
        };
        self.base.get(position)
    }

    fn iter(self: Arc<Self>) -> RecordIter {
        Box::new(SubIter {
            store: self,
            index: 0,
        })
    }
}

struct SubIter {
    store: Arc<SubStore>,
    index: usize,
}

impl Iterator for SubIter {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.store.end - self.store.start {
            return None;
        }
        let item = self.store.get(self.index);
        self.index += 1;
        Some(item)
    }
}

fn split_with(
    dataset: &Dataset,
    at: usize,
    indices: Option<Arc<Vec<usize>>>,
) -> Result<(Dataset, Dataset)> {
    let len = dataset.len()?;
    if at > len {
        return Err(Error::InvalidArgument(format!(
            "split point {at} exceeds the dataset size {len}"
        )));
    }
    let base = dataset.as_store();
    let head = SubStore::new(base.clone(), 0, at, indices.clone())?;
    let tail = SubStore::new(base, at, len, indices)?;
    Ok((Dataset::new(Arc::new(head)), Dataset::new(Arc::new(tail))))
}

fn shuffled_indices(len: usize, seed: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    indices.shuffle(&mut rng);
    indices
}

/// Split a dataset in two at `at`
pub fn split_at(dataset: &Dataset, at: usize) -> Result<(Dataset, Dataset)> {
    split_with(dataset, at, None)
}

/// Split a dataset in two at `first_size` after shuffling
///
/// Pass a seed for reproducible splits; `None` draws one from entropy.
pub fn split_random(
    dataset: &Dataset,
    first_size: usize,
    seed: Option<u64>,
) -> Result<(Dataset, Dataset)> {
    let indices = shuffled_indices(dataset.len()?, seed);
    split_with(dataset, first_size, Some(Arc::new(indices)))
}

/// Split a dataset into `n` equally-sized parts, dropping the remainder
pub fn split_n(dataset: &Dataset, n: usize) -> Result<Vec<Dataset>> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "cannot split a dataset into zero parts".into(),
        ));
    }
    let len = dataset.len()?;
    let part = len / n;
    let base = dataset.as_store();
    (0..n)
        .map(|i| {
            let store = SubStore::new(base.clone(), part * i, part * (i + 1), None)?;
            Ok(Dataset::new(Arc::new(store)))
        })
        .collect()
}

/// Produce `n_fold` (train, test) pairs covering the dataset
///
/// Fold `k` holds records `len * k / n_fold .. len * (k + 1) / n_fold` as
/// its test split and everything else as its training split.
pub fn cross_validation(dataset: &Dataset, n_fold: usize) -> Result<Vec<(Dataset, Dataset)>> {
    let len = dataset.len()?;
    cross_validation_with(dataset, n_fold, (0..len).collect())
}

/// Shuffled variant of [`cross_validation`]
pub fn cross_validation_random(
    dataset: &Dataset,
    n_fold: usize,
    seed: Option<u64>,
) -> Result<Vec<(Dataset, Dataset)>> {
    let indices = shuffled_indices(dataset.len()?, seed);
    cross_validation_with(dataset, n_fold, indices)
}

fn cross_validation_with(
    dataset: &Dataset,
    n_fold: usize,
    indices: Vec<usize>,
) -> Result<Vec<(Dataset, Dataset)>> {
    if n_fold == 0 {
        return Err(Error::InvalidArgument(
            "cross validation requires at least one fold".into(),
        ));
    }
    let len = indices.len();
    let borders: Vec<usize> = (0..=n_fold).map(|i| len * i / n_fold).collect();

    let mut folds = Vec::with_capacity(n_fold);
    for fold in 0..n_fold {
        let (test_start, test_end) = (borders[fold], borders[fold + 1]);
        // training indices first, then the fold's test block at the end
        let mut permutation = Vec::with_capacity(len);
        permutation.extend_from_slice(&indices[..test_start]);
        permutation.extend_from_slice(&indices[test_end..]);
        permutation.extend_from_slice(&indices[test_start..test_end]);
        let (train, test) = split_with(
            dataset,
            len - (test_end - test_start),
            Some(Arc::new(permutation)),
        )?;
        folds.push((train, test));
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(n: i64) -> Dataset {
        Dataset::from_records((0..n).map(Record::Int).collect())
    }

    fn values(dataset: &Dataset) -> Vec<i64> {
        dataset
            .all()
            .unwrap()
            .into_iter()
            .map(|r| match r {
                Record::Int(i) => i,
                other => panic!("expected int, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn splits_in_order() {
        let (head, tail) = split_at(&ints(10), 3).unwrap();
        assert_eq!(values(&head), vec![0, 1, 2]);
        assert_eq!(values(&tail), vec![3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(head.get(2).unwrap(), Record::Int(2));
        assert!(head.get(3).is_err());
    }

    #[test]
    fn rejects_out_of_range_split_points() {
        assert!(split_at(&ints(5), 6).is_err());
    }

    #[test]
    fn random_split_partitions_the_dataset() {
        let (head, tail) = split_random(&ints(10), 4, Some(42)).unwrap();
        assert_eq!(head.len().unwrap(), 4);
        assert_eq!(tail.len().unwrap(), 6);

        let mut combined = values(&head);
        combined.extend(values(&tail));
        combined.sort_unstable();
        assert_eq!(combined, (0..10).collect::<Vec<_>>());

        // same seed, same split
        let (again, _) = split_random(&ints(10), 4, Some(42)).unwrap();
        assert_eq!(values(&again), values(&head));
    }

    #[test]
    fn splits_into_equal_parts() {
        let parts = split_n(&ints(10), 3).unwrap();
        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(part.len().unwrap(), 3);
        }
        assert_eq!(values(&parts[1]), vec![3, 4, 5]);
    }

    #[test]
    fn cross_validation_covers_every_record() {
        let folds = cross_validation(&ints(10), 3).unwrap();
        assert_eq!(folds.len(), 3);
        for (train, test) in &folds {
            assert_eq!(train.len().unwrap() + test.len().unwrap(), 10);
            let mut combined = values(train);
            combined.extend(values(test));
            combined.sort_unstable();
            assert_eq!(combined, (0..10).collect::<Vec<_>>());
        }
        assert_eq!(values(&folds[0].1), vec![0, 1, 2]);
        assert_eq!(values(&folds[2].1), vec![6, 7, 8, 9]);
    }
}
