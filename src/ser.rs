//! [`serde::Serialize`] for the value tree.
//!
//! This lets a decoded message be handed to any serde format, e.g. to log
//! it as JSON. Variants are transparent, object paths become strings,
//! arrays and structs become sequences, dicts become maps, and an invalid
//! value becomes unit.

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::container::Container;
use crate::dict::Dict;
use crate::object_path::ObjectPath;
use crate::value::{Value, Variant};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Invalid => serializer.serialize_unit(),
            Value::Byte(v) => serializer.serialize_u8(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::ObjectPath(path) => path.serialize(serializer),
            Value::Array(c) | Value::Struct(c) => c.serialize(serializer),
            Value::Dict(dict) => dict.serialize(serializer),
            Value::Variant(var) => var.serialize(serializer),
        }
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_array() {
            return serializer.collect_seq(self);
        }
        let mut tuple = serializer.serialize_tuple(self.len())?;
        for field in self {
            tuple.serialize_element(field)?;
        }
        tuple.end()
    }
}

impl Serialize for Dict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|entry| (&entry.key, &entry.value)))
    }
}

impl Serialize for ObjectPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}
