//! The record value type flowing through pipelines
//!
//! Every store produces and every transformation consumes [`Record`] values.
//! A record is either a scalar (text, integer, float, boolean) or a composite
//! (tuple, list, or ordered mapping). Composite records expose a single
//! "update one slot" operation used by field-targeted transformations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Address of one slot inside a composite record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Positional slot of a tuple or list
    Index(usize),

    /// Named slot of a mapping
    Field(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Field(name) => write!(f, "{name}"),
        }
    }
}

/// A single data record
///
/// Records are cheap to clone relative to the I/O they originate from and
/// serialize losslessly, which is what snapshot persistence relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// A line of text or a single string field
    Text(String),

    /// An integer scalar
    Int(i64),

    /// A floating point scalar
    Float(f64),

    /// A boolean scalar
    Bool(bool),

    /// A fixed-shape positional composite (zip results, windows)
    Tuple(Vec<Record>),

    /// A variable-length positional composite (token sequences, CSV rows)
    List(Vec<Record>),

    /// An insertion-ordered named composite (header-keyed CSV rows)
    Map(Vec<(String, Record)>),
}

impl Record {
    /// Borrow the text content, if this record is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Record::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the slot addressed by `key`, if present
    pub fn get(&self, key: &Key) -> Option<&Record> {
        match (self, key) {
            (Record::Tuple(items) | Record::List(items), Key::Index(index)) => items.get(*index),
            (Record::Map(pairs), Key::Field(name)) => {
                pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Rewrite the slot addressed by `key` through `func`, leaving every
    /// other slot untouched. The result has the same concrete shape.
    ///
    /// Fails with [`Error::TypeMismatch`] when the record is not a tuple,
    /// list or mapping, and with an index/argument error when the key does
    /// not address a slot of this record.
    pub fn update(self, key: &Key, func: &dyn Fn(Record) -> Record) -> Result<Record> {
        match self {
            Record::Tuple(items) => Ok(Record::Tuple(update_positional(items, key, func)?)),
            Record::List(items) => Ok(Record::List(update_positional(items, key, func)?)),
            Record::Map(mut pairs) => {
                let name = match key {
                    Key::Field(name) => name,
                    Key::Index(index) => {
                        return Err(Error::InvalidArgument(format!(
                            "cannot address a mapping slot by position {index}"
                        )))
                    }
                };
                let slot = pairs
                    .iter_mut()
                    .find(|(k, _)| k == name)
                    .ok_or_else(|| Error::InvalidArgument(format!("no field named `{name}`")))?;
                slot.1 = func(slot.1.clone());
                Ok(Record::Map(pairs))
            }
            other => Err(Error::TypeMismatch(format!(
                "record should be a tuple, list or mapping, but {} was passed",
                variant_name(&other)
            ))),
        }
    }
}

fn update_positional(
    mut items: Vec<Record>,
    key: &Key,
    func: &dyn Fn(Record) -> Record,
) -> Result<Vec<Record>> {
    let index = match key {
        Key::Index(index) => *index,
        Key::Field(name) => {
            return Err(Error::InvalidArgument(format!(
                "cannot address a positional slot by name `{name}`"
            )))
        }
    };
    let len = items.len();
    let slot = items
        .get_mut(index)
        .ok_or(Error::IndexOutOfBounds { index, len })?;
    *slot = func(slot.clone());
    Ok(items)
}

fn variant_name(record: &Record) -> &'static str {
    match record {
        Record::Text(_) => "text",
        Record::Int(_) => "int",
        Record::Float(_) => "float",
        Record::Bool(_) => "bool",
        Record::Tuple(_) => "tuple",
        Record::List(_) => "list",
        Record::Map(_) => "map",
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Record::Text(value.to_owned())
    }
}

impl From<String> for Record {
    fn from(value: String) -> Self {
        Record::Text(value)
    }
}

impl From<i64> for Record {
    fn from(value: i64) -> Self {
        Record::Int(value)
    }
}

impl From<f64> for Record {
    fn from(value: f64) -> Self {
        Record::Float(value)
    }
}

impl From<bool> for Record {
    fn from(value: bool) -> Self {
        Record::Bool(value)
    }
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
    fn updates_tuple_slot() {
        let record = Record::Tuple(vec!["a".into(), "b".into()]);
        let updated = record.update(&Key::Index(1), &upper).unwrap();
        assert_eq!(updated, Record::Tuple(vec!["a".into(), "B".into()]));
    }

    #[test]
    fn updates_map_slot() {
        let record = Record::Map(vec![
            ("en".to_owned(), "hi".into()),
            ("ja".to_owned(), "konnichiwa".into()),
        ]);
        let updated = record.update(&Key::from("en"), &upper).unwrap();
        assert_eq!(updated.get(&Key::from("en")), Some(&Record::Text("HI".to_owned())));
        assert_eq!(
            updated.get(&Key::from("ja")),
            Some(&Record::Text("konnichiwa".to_owned()))
        );
    }

    #[test]
    fn rejects_scalar_records() {
        let err = Record::Text("a".to_owned())
            .update(&Key::Index(0), &upper)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn rejects_missing_slots() {
        let err = Record::List(vec!["a".into()])
            .update(&Key::Index(3), &upper)
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 3, len: 1 }));

        let err = Record::Map(vec![("en".to_owned(), "hi".into())])
            .update(&Key::from("fr"), &upper)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
