use std::iter::FromIterator;
use std::rc::Rc;
use std::slice;

use log::warn;

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Array,
    Struct,
}

/// An ordered list of values, either an array or a struct.
///
/// Cloning is O(1): clones share their elements until one of them is
/// mutated, at which point the mutated handle gets its own copy.
///
/// In array mode every element must have the kind of the first one.
/// [`Container::append`] silently drops an element of another kind;
/// [`Container::try_append`] reports it instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    mode: Mode,
    items: Rc<Vec<Value>>,
}

impl Container {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            items: Rc::new(Vec::new()),
        }
    }

    pub fn create_array() -> Self {
        Self::new(Mode::Array)
    }

    pub fn create_struct() -> Self {
        Self::new(Mode::Struct)
    }

    pub fn is_array(&self) -> bool {
        self.mode == Mode::Array
    }

    pub fn is_struct(&self) -> bool {
        self.mode == Mode::Struct
    }

    // Copies the elements if they are shared with another handle.
    fn unhook(&mut self) -> &mut Vec<Value> {
        Rc::make_mut(&mut self.items)
    }

    pub fn try_append(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.is_array() {
            if let Some(first) = self.items.first() {
                if first.kind() != value.kind() {
                    return Err(Error::HeterogeneousArray {
                        expected: first.kind(),
                        found: value.kind(),
                    });
                }
            }
        }
        self.unhook().push(value);
        Ok(())
    }

    /// Appends `value`. In array mode a value whose kind differs from the
    /// first element is dropped (and logged).
    pub fn append(&mut self, value: impl Into<Value>) {
        if let Err(e) = self.try_append(value) {
            warn!("{}, ignoring", e);
        }
    }

    /// Builder-style [`append`](Container::append).
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.append(value);
        self
    }

    /// Removes the first element equal to `value`.
    pub fn remove(&mut self, value: &Value) {
        if let Some(ix) = self.items.iter().position(|v| v == value) {
            self.unhook().remove(ix);
        }
    }

    /// Removes every element equal to `value`.
    pub fn remove_all(&mut self, value: &Value) {
        if self.items.contains(value) {
            self.unhook().retain(|v| v != value);
        }
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.unhook().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, ix: usize) -> Option<&Value> {
        self.items.get(ix)
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Kind of the elements of an array. Structs report
    /// [`ValueKind::Invalid`].
    ///
    /// # Panics
    ///
    /// If the container is empty.
    pub fn value_type(&self) -> ValueKind {
        let first = self
            .items
            .first()
            .expect("can't get value type of an empty container");
        if self.is_array() {
            first.kind()
        } else {
            ValueKind::Invalid
        }
    }

    /// Whether array elements are themselves arrays, structs or dicts.
    ///
    /// # Panics
    ///
    /// If the container is empty.
    pub fn value_type_is_container(&self) -> bool {
        let first = self
            .items
            .first()
            .expect("can't get value type of an empty container");
        self.is_array() && first.is_container()
    }

    /// Whether both handles currently point at the same elements.
    pub fn shares_storage_with(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Into<Value>> Extend<V> for Container {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}

/// Collects into an array.
impl<V: Into<Value>> FromIterator<V> for Container {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut arr = Container::create_array();
        arr.extend(iter);
        arr
    }
}

#[cfg(test)]
mod tests {
    use super::Container;
    use crate::error::{Error, Result};
    use crate::value::{Value, ValueKind};
    use test_log::test;

    #[test]
    fn array_basics() {
        let mut arr = Container::create_array();
        assert!(arr.is_array());
        arr.extend(vec![1, 2, 3, 4, 5]);
        assert_eq!(arr.value_type(), ValueKind::Int32);
        assert!(!arr.value_type_is_container());
        assert_eq!(arr.size(), 5);
        let ints: Vec<i32> = arr.iter().map(Value::to_int32).collect();
        assert_eq!(ints, vec![1, 2, 3, 4, 5]);

        arr.remove(&Value::from_int32(5));
        assert_eq!(arr.size(), 4);
        arr.remove(&Value::from_int32(42));
        assert_eq!(arr.size(), 4);
    }

    #[test]
    fn copy_on_write() {
        let mut c1 = Container::create_array();
        c1.append(1);
        let mut c2 = c1.clone();
        assert!(c1.shares_storage_with(&c2));
        assert_eq!(c1, c2);

        c2.append(2);
        assert!(!c1.shares_storage_with(&c2));
        assert_eq!(c1.size(), 1);
        assert_eq!(c2.size(), 2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn clear_unhooks_shared_storage() {
        let arr: Container = vec![1, 2, 3].into_iter().collect();
        let mut other = arr.clone();
        other.clear();
        assert_eq!(arr.size(), 3);
        assert!(other.is_empty());
        assert_ne!(arr, other);
    }

    #[test]
    fn array_rejects_other_kinds() {
        let mut arr = Container::create_array().with(1).with(2).with(3).with(4);
        arr.append(Value::from_bool(true));
        arr.append(Value::from_byte(b'c'));
        arr.append("foo");
        arr.append(Value::from_uint32(12));
        arr.append(Value::from_int16(12));
        assert_eq!(arr.size(), 4);
    }

    #[test]
    fn try_append_reports_rejection() -> Result<()> {
        let mut arr = Container::create_array();
        arr.try_append(1)?;
        assert_eq!(
            arr.try_append(true),
            Err(Error::HeterogeneousArray {
                expected: ValueKind::Int32,
                found: ValueKind::Bool,
            })
        );
        assert_eq!(arr.size(), 1);
        Ok(())
    }

    #[test]
    fn remove_all_matches() {
        let mut arr: Container = vec![1, 2, 3, 4, 5, 5, 5].into_iter().collect();
        arr.append(4);
        assert_eq!(arr.size(), 8);
        arr.remove_all(&Value::from_int32(4));
        arr.remove_all(&Value::from_int32(5));
        assert_eq!(arr.size(), 3);
        arr.clear();
        assert_eq!(arr.size(), 0);
    }

    #[test]
    fn struct_accepts_anything() {
        let st = Container::create_struct()
            .with(1)
            .with(2)
            .with(b'c')
            .with(Value::from_int16(10))
            .with("foobar");
        assert!(st.is_struct());
        assert_eq!(st.size(), 5);
        assert_eq!(st.value_type(), ValueKind::Invalid);
        assert!(!st.value_type_is_container());
        assert_eq!(st.get(2).map(Value::to_byte), Some(b'c'));
        assert_eq!(st.get(4).map(Value::to_str), Some("foobar"));

        let mut st2 = st.clone();
        assert_eq!(st, st2);
        st2.clear();
        assert_ne!(st, st2);
    }

    #[test]
    fn mode_is_part_of_equality() {
        let arr = Container::create_array().with(1);
        let st = Container::create_struct().with(1);
        assert_ne!(arr, st);
        assert_eq!(Container::create_array(), Container::create_array());
    }

    #[test]
    fn nested_containers() {
        let inner = Container::create_array().with(1);
        let outer = Container::create_array()
            .with(inner.clone())
            .with(Container::create_struct().with(1));
        // the struct is a different kind from the first element
        assert_eq!(outer.size(), 1);
        assert!(outer.value_type_is_container());
        assert_eq!(outer.value_type(), ValueKind::Array);
    }

    #[test]
    #[should_panic]
    fn value_type_of_empty_panics() {
        Container::create_array().value_type();
    }
}
