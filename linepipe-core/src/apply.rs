//! Field-targeted function application
//!
//! [`apply`] lifts a function over a single value to a function over one
//! named or indexed slot of a composite record, leaving sibling slots
//! untouched. Stacking [`FieldApply::and`] accumulates an ordered queue of
//! keys all routed through the same function, applied in queue order
//! against the possibly already-rewritten record.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::record::{Key, Record};

/// A function targeted at specific slots of composite records
#[derive(Clone)]
pub struct FieldApply {
    keys: Vec<Key>,
    func: Arc<dyn Fn(Record) -> Record + Send + Sync>,
}

/// Target `func` at the record slot addressed by `key`
pub fn apply(
    key: impl Into<Key>,
    func: impl Fn(Record) -> Record + Send + Sync + 'static,
) -> FieldApply {
    FieldApply {
        keys: vec![key.into()],
        func: Arc::new(func),
    }
}

impl FieldApply {
    /// Queue one more slot for the same function
    #[must_use]
    pub fn and(mut self, key: impl Into<Key>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Rewrite every queued slot of `record`, in queue order
    ///
    /// Fails with [`Error::TypeMismatch`] when `record` is not a tuple,
    /// list or mapping.
    pub fn call(&self, record: Record) -> Result<Record> {
        let mut record = record;
        for key in &self.keys {
            record = record.update(key, self.func.as_ref())?;
        }
        Ok(record)
    }

    /// Adapt this applicator for [`Dataset::try_map`](crate::Dataset::try_map)
    pub fn into_fn(self) -> impl Fn(Record) -> Result<Record> + Send + Sync + 'static {
        move |record| self.call(record)
    }
}

/// Apply `func` to every slot of a composite record except the ignored keys
pub fn apply_all(
    ignores: Vec<Key>,
    func: impl Fn(Record) -> Record + Send + Sync + 'static,
) -> impl Fn(Record) -> Result<Record> + Send + Sync + 'static {
    move |record| match record {
        Record::Tuple(items) => Ok(Record::Tuple(apply_positional(items, &ignores, &func))),
        Record::List(items) => Ok(Record::List(apply_positional(items, &ignores, &func))),
        Record::Map(pairs) => Ok(Record::Map(
            pairs
                .into_iter()
                .map(|(name, value)| {
                    if ignores.iter().any(|key| matches!(key, Key::Field(f) if *f == name)) {
                        (name, value)
                    } else {
                        let value = func(value);
                        (name, value)
                    }
                })
                .collect(),
        )),
        other => Err(Error::TypeMismatch(format!(
            "record should be a tuple, list or mapping, but a scalar was passed: {other:?}"
        ))),
    }
}

fn apply_positional(
    items: Vec<Record>,
    ignores: &[Key],
    func: &impl Fn(Record) -> Record,
) -> Vec<Record> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if ignores.iter().any(|key| matches!(key, Key::Index(n) if *n == i)) {
                item
            } else {
                func(item)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(record: Record) -> Record {
        match record {
            Record::Text(s) => Record::Text(s.to_uppercase()),
            other => other,
        }
    }

    #[test]
    fn rewrites_only_the_queued_slots() {
        let func = apply(2usize, upper).and(0usize);
        let record = Record::Tuple(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            func.call(record).unwrap(),
            Record::Tuple(vec!["A".into(), "b".into(), "C".into()])
        );
    }

    #[test]
    fn targets_named_slots_of_mappings() {
        let func = apply("en", upper);
        let record = Record::Map(vec![
            ("en".to_owned(), "hi".into()),
            ("ja".to_owned(), "konnichiwa".into()),
        ]);
        assert_eq!(
            func.call(record).unwrap(),
            Record::Map(vec![
                ("en".to_owned(), "HI".into()),
                ("ja".to_owned(), "konnichiwa".into()),
            ])
        );
    }

    #[test]
    fn fails_on_scalar_records() {
        let func = apply(0usize, upper);
        assert!(matches!(
            func.call(Record::Text("a".to_owned())),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn apply_all_skips_ignored_slots() {
        let func = apply_all(vec![Key::Index(1)], upper);
        let record = Record::List(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            func(record).unwrap(),
            Record::List(vec!["A".into(), "b".into(), "C".into()])
        );

        let by_name = apply_all(vec![Key::from("ja")], upper);
        let record = Record::Map(vec![
            ("en".to_owned(), "hi".into()),
            ("ja".to_owned(), "konnichiwa".into()),
        ]);
        assert_eq!(
            by_name(record).unwrap(),
            Record::Map(vec![
                ("en".to_owned(), "HI".into()),
                ("ja".to_owned(), "konnichiwa".into()),
            ])
        );
    }

    #[test]
    fn composes_with_dataset_map() {
        let data = crate::Dataset::from_records(vec![Record::Tuple(vec![
            "a".into(),
            "b".into(),
        ])]);
        let mapped = data.try_map(apply(0usize, upper).into_fn());
        assert_eq!(
            mapped.first().unwrap(),
            Record::Tuple(vec!["A".into(), "b".into()])
        );
    }
}
