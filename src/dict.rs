use std::rc::Rc;
use std::slice;

use log::warn;

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

#[derive(Clone, Debug, PartialEq)]
pub struct DictEntry {
    pub key: Value,
    pub value: Value,
}

/// A D-Bus dictionary, written on the wire as an array of dict-entries.
///
/// Keys are basic values and unique; entries keep insertion order. Once the
/// dict holds an entry, every later key and value must have the same kinds
/// as the first ones. Like [`Container`](crate::container::Container),
/// clones share their entries until one of them is mutated.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dict {
    entries: Rc<Vec<DictEntry>>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    fn unhook(&mut self) -> &mut Vec<DictEntry> {
        Rc::make_mut(&mut self.entries)
    }

    pub fn try_append(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if !key.is_basic() {
            return Err(Error::NonBasicKey(key.kind()));
        }

        if let Some(first) = self.entries.first() {
            if first.key.kind() != key.kind() || first.value.kind() != value.kind() {
                return Err(Error::HeterogeneousDict {
                    expected_key: first.key.kind(),
                    expected_value: first.value.kind(),
                    found_key: key.kind(),
                    found_value: value.kind(),
                });
            }
        }

        let entries = self.unhook();
        match entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => entries.push(DictEntry { key, value }),
        }
        Ok(())
    }

    /// Inserts or overwrites the entry for `key`. Non-basic keys and
    /// entries whose kinds differ from the first entry are dropped (and
    /// logged).
    pub fn append(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        if let Err(e) = self.try_append(key, value) {
            warn!("{}, ignoring", e);
        }
    }

    /// Builder-style [`append`](Dict::append).
    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.append(key, value);
        self
    }

    pub fn remove(&mut self, key: &Value) {
        if let Some(ix) = self.entries.iter().position(|e| &e.key == key) {
            self.unhook().remove(ix);
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| &e.value)
    }

    /// The value stored under `key`, or an invalid value.
    pub fn find(&self, key: &Value) -> Value {
        self.get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.unhook().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, DictEntry> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&DictEntry> {
        self.entries.first()
    }

    fn first_entry(&self) -> &DictEntry {
        self.entries
            .first()
            .expect("can't get key or value type of an empty dict")
    }

    /// # Panics
    ///
    /// If the dict is empty.
    pub fn key_type(&self) -> ValueKind {
        self.first_entry().key.kind()
    }

    /// # Panics
    ///
    /// If the dict is empty.
    pub fn value_type(&self) -> ValueKind {
        self.first_entry().value.kind()
    }

    /// # Panics
    ///
    /// If the dict is empty.
    pub fn value_type_is_container(&self) -> bool {
        self.first_entry().value.is_container()
    }

    pub fn shares_storage_with(&self, other: &Dict) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = &'a DictEntry;
    type IntoIter = slice::Iter<'a, DictEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<Value>, V: Into<Value>> Extend<(K, V)> for Dict {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl<K: Into<Value>, V: Into<Value>> std::iter::FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        dict.extend(iter);
        dict
    }
}
