//! The [`Value`] tagged union.
//!
//! A [`Value`] holds exactly one D-Bus datum. Basic kinds carry their
//! payload inline; containers ([`Container`], [`Dict`]) and [`Variant`]s
//! are reference counted, so cloning a `Value` never deep-copies a tree.
//!
//! Pattern matching on the enum, or the `as_*` accessors returning
//! `Option`, is the intended way to read a value. The `to_*` accessors
//! exist for code that has already checked [`Value::kind`], and they
//! panic when called on the wrong kind.

use std::rc::Rc;

use crate::container::Container;
use crate::dict::Dict;
use crate::error::Result;
use crate::object_path::ObjectPath;
use crate::signature::{signature_of, Signature, TypeCode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Invalid,
    Byte,
    Bool,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Array,
    Struct,
    Dict,
    Variant,
}

impl ValueKind {
    /// Everything except arrays, structs, dicts and variants. Only basic
    /// kinds may be used as dict keys.
    pub fn is_basic(self) -> bool {
        !matches!(
            self,
            ValueKind::Array | ValueKind::Struct | ValueKind::Dict | ValueKind::Variant
        )
    }

    /// Arrays, structs and dicts. Variants are not counted, their signature
    /// is a single `v`.
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Struct | ValueKind::Dict)
    }

    /// The single-character type code of basic kinds and variants.
    pub fn type_code(self) -> Option<TypeCode> {
        match self {
            ValueKind::Byte => Some(TypeCode::Byte),
            ValueKind::Bool => Some(TypeCode::Boolean),
            ValueKind::Int16 => Some(TypeCode::Int16),
            ValueKind::UInt16 => Some(TypeCode::UInt16),
            ValueKind::Int32 => Some(TypeCode::Int32),
            ValueKind::UInt32 => Some(TypeCode::UInt32),
            ValueKind::Int64 => Some(TypeCode::Int64),
            ValueKind::UInt64 => Some(TypeCode::UInt64),
            ValueKind::Double => Some(TypeCode::Double),
            ValueKind::String => Some(TypeCode::String),
            ValueKind::ObjectPath => Some(TypeCode::ObjectPath),
            ValueKind::Variant => Some(TypeCode::Variant),
            ValueKind::Invalid | ValueKind::Array | ValueKind::Struct | ValueKind::Dict => None,
        }
    }
}

/// A variant: one value of any kind, carried with its own signature on the
/// wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant(Rc<Value>);

impl Variant {
    pub fn new(value: impl Into<Value>) -> Self {
        Variant(Rc::new(value.into()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        Rc::try_unwrap(self.0).unwrap_or_else(|shared| (*shared).clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Invalid,
    Byte(u8),
    Bool(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    ObjectPath(ObjectPath),
    Array(Container),
    Struct(Container),
    Dict(Dict),
    Variant(Variant),
}

impl Default for Value {
    fn default() -> Self {
        Value::Invalid
    }
}

macro_rules! scalar_accessors {
    ($($variant:ident($ty:ty): $from:ident, $to:ident, $as_:ident, $is:ident;)*) => {
        $(
            pub fn $from(val: $ty) -> Self {
                Value::$variant(val)
            }

            #[track_caller]
            pub fn $to(&self) -> $ty {
                match self {
                    Value::$variant(val) => *val,
                    other => other.mismatch(ValueKind::$variant),
                }
            }

            pub fn $as_(&self) -> Option<$ty> {
                match self {
                    Value::$variant(val) => Some(*val),
                    _ => None,
                }
            }

            pub fn $is(&self) -> bool {
                matches!(self, Value::$variant(_))
            }
        )*
    };
}

macro_rules! ref_accessors {
    ($($variant:ident($ty:ty): $to:ident, $as_:ident, $is:ident;)*) => {
        $(
            #[track_caller]
            pub fn $to(&self) -> &$ty {
                match self {
                    Value::$variant(val) => val,
                    other => other.mismatch(ValueKind::$variant),
                }
            }

            pub fn $as_(&self) -> Option<&$ty> {
                match self {
                    Value::$variant(val) => Some(val),
                    _ => None,
                }
            }

            pub fn $is(&self) -> bool {
                matches!(self, Value::$variant(_))
            }
        )*
    };
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Invalid => ValueKind::Invalid,
            Value::Byte(_) => ValueKind::Byte,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int16(_) => ValueKind::Int16,
            Value::UInt16(_) => ValueKind::UInt16,
            Value::Int32(_) => ValueKind::Int32,
            Value::UInt32(_) => ValueKind::UInt32,
            Value::Int64(_) => ValueKind::Int64,
            Value::UInt64(_) => ValueKind::UInt64,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::ObjectPath(_) => ValueKind::ObjectPath,
            Value::Array(_) => ValueKind::Array,
            Value::Struct(_) => ValueKind::Struct,
            Value::Dict(_) => ValueKind::Dict,
            Value::Variant(_) => ValueKind::Variant,
        }
    }

    #[track_caller]
    fn mismatch(&self, expected: ValueKind) -> ! {
        panic!(
            "expected a {:?} value, found {:?}",
            expected,
            self.kind()
        )
    }

    pub fn from_invalid() -> Self {
        Value::Invalid
    }

    scalar_accessors! {
        Byte(u8): from_byte, to_byte, as_byte, is_byte;
        Bool(bool): from_bool, to_bool, as_bool, is_bool;
        Int16(i16): from_int16, to_int16, as_int16, is_int16;
        UInt16(u16): from_uint16, to_uint16, as_uint16, is_uint16;
        Int32(i32): from_int32, to_int32, as_int32, is_int32;
        UInt32(u32): from_uint32, to_uint32, as_uint32, is_uint32;
        Int64(i64): from_int64, to_int64, as_int64, is_int64;
        UInt64(u64): from_uint64, to_uint64, as_uint64, is_uint64;
        Double(f64): from_double, to_double, as_double, is_double;
    }

    // `char` spellings of the byte accessors.
    scalar_accessors! {
        Byte(u8): from_char, to_char, as_char, is_char;
    }

    ref_accessors! {
        ObjectPath(ObjectPath): to_object_path, as_object_path, is_object_path;
        Array(Container): to_array, as_array, is_array;
        Struct(Container): to_struct, as_struct, is_struct;
        Dict(Dict): to_dict, as_dict, is_dict;
        Variant(Variant): to_variant, as_variant, is_variant;
    }

    pub fn from_string(val: impl Into<String>) -> Self {
        Value::String(val.into())
    }

    #[track_caller]
    pub fn to_str(&self) -> &str {
        match self {
            Value::String(val) => val,
            other => other.mismatch(ValueKind::String),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(val) => Some(val),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn from_object_path(val: ObjectPath) -> Self {
        Value::ObjectPath(val)
    }

    /// Wraps a container; its mode decides between the array and struct
    /// kinds.
    pub fn from_container(val: Container) -> Self {
        if val.is_array() {
            Value::Array(val)
        } else {
            Value::Struct(val)
        }
    }

    /// Same as [`Value::from_container`]: a struct-mode container still
    /// yields a struct value.
    pub fn from_array(val: Container) -> Self {
        Self::from_container(val)
    }

    /// Same as [`Value::from_container`]: an array-mode container still
    /// yields an array value.
    pub fn from_struct(val: Container) -> Self {
        Self::from_container(val)
    }

    pub fn from_dict(val: Dict) -> Self {
        Value::Dict(val)
    }

    pub fn from_variant(val: Variant) -> Self {
        Value::Variant(val)
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Invalid)
    }

    pub fn is_basic(&self) -> bool {
        self.kind().is_basic()
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    /// The D-Bus type signature of this value.
    pub fn signature(&self) -> Result<Signature> {
        signature_of(self)
    }
}

macro_rules! from_raw {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Self {
                    Value::$variant(val)
                }
            }
        )*
    };
}

from_raw! {
    u8 => Byte,
    bool => Bool,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
    String => String,
    ObjectPath => ObjectPath,
    Dict => Dict,
    Variant => Variant,
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_owned())
    }
}

impl From<Container> for Value {
    fn from(val: Container) -> Self {
        Value::from_container(val)
    }
}
