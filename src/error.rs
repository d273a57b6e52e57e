use std::str::Utf8Error;

use crate::signature::TypeCode;
use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("array holds {expected:?} elements, refusing {found:?}")]
    HeterogeneousArray { expected: ValueKind, found: ValueKind },
    #[error("dict holds {expected_key:?} => {expected_value:?}, refusing {found_key:?} => {found_value:?}")]
    HeterogeneousDict {
        expected_key: ValueKind,
        expected_value: ValueKind,
        found_key: ValueKind,
        found_value: ValueKind,
    },
    #[error("dict keys must be basic types, got {0:?}")]
    NonBasicKey(ValueKind),
    #[error("invalid object path {0:?}")]
    InvalidObjectPath(String),
    #[error("invalid signature {0:?}")]
    InvalidSignature(String),
    #[error("cannot encode an invalid value")]
    InvalidValue,
    #[error("structs must have at least one field")]
    EmptyStruct,
    #[error("empty {0:?} has no element signature")]
    EmptyContainer(ValueKind),
    #[error("expected signature {0:?}, wrote {1:?}")]
    MismatchSignature(String, String),
    #[error("{0:?} cannot be used here")]
    UnexpectedContainer(TypeCode),
    #[error("close without matching open")]
    UnbalancedClose,
    #[error("{0} containers left open")]
    UnclosedContainer(usize),
    #[error("array of {0} bytes exceeds the maximum")]
    ArrayTooLong(usize),
    #[error("dict-entry must hold one basic key and one value, got {0:?}")]
    MalformedDictEntry(String),
    #[error("string contains a nul byte")]
    InteriorNul,
    #[error("containers nested deeper than {0}")]
    TooDeep(usize),
    #[error("unsupported wire type {0:?}")]
    UnsupportedType(TypeCode),
    #[error("current element is not a container")]
    NotAContainer,
    #[error("no element at the current position")]
    Exhausted,
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("array element ends at {0}, past the array end {1}")]
    ArrayElementOverrun(usize, usize),
    #[error("non-zero padding at {0}")]
    NonZeroPadding(usize),
    #[error("{0} bytes left over after the last value")]
    LeftoverData(usize),
    #[error("invalid boolean value {0}")]
    InvalidBoolValue(u32),
    #[error("string at {0} is not nul-terminated")]
    MissingNul(usize),
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] Utf8Error),
}
