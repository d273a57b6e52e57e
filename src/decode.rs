//! Wire to values.

use crate::container::Container;
use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::message::Body;
use crate::object_path::ObjectPath;
use crate::primitives::Basic;
use crate::signature::TypeCode;
use crate::value::{Value, Variant};
use crate::wire::{BodyReader, WireRead};

/// Decodes every remaining value at the reader's level.
pub fn decode<R: WireRead>(reader: &mut R) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    for_each(reader, |r| {
        values.push(decode_value(r)?);
        Ok(())
    })?;
    Ok(values)
}

/// Decodes a whole little-endian body, failing if any bytes are left over.
pub fn decode_body(body: &Body) -> Result<Vec<Value>> {
    let mut reader: BodyReader = BodyReader::new(body);
    let values = decode(&mut reader)?;
    reader.finish()?;
    Ok(values)
}

/// Decodes the value the reader is positioned on.
pub fn decode_value<R: WireRead>(reader: &R) -> Result<Value> {
    let code = reader.arg_type().ok_or(Error::Exhausted)?;
    let value = match code {
        TypeCode::Array if reader.element_type() == Some(TypeCode::DictEntry) => {
            let mut dict = Dict::new();
            for_each(&mut reader.recurse()?, |entry| {
                let mut fields = entry.recurse()?;
                let key = decode_value(&fields)?;
                fields.next()?;
                let value = decode_value(&fields)?;
                dict.try_append(key, value)
            })?;
            Value::Dict(dict)
        }
        TypeCode::Array => {
            let mut arr = Container::create_array();
            for_each(&mut reader.recurse()?, |item| arr.try_append(decode_value(item)?))?;
            Value::Array(arr)
        }
        TypeCode::Struct => {
            let mut st = Container::create_struct();
            for_each(&mut reader.recurse()?, |field| st.try_append(decode_value(field)?))?;
            Value::Struct(st)
        }
        TypeCode::Variant => {
            let inner = reader.recurse()?;
            Value::Variant(Variant::new(decode_value(&inner)?))
        }
        TypeCode::DictEntry | TypeCode::Signature | TypeCode::UnixFd => {
            return Err(Error::UnsupportedType(code))
        }
        _ => from_basic(reader.get_basic()?)?,
    };
    Ok(value)
}

fn from_basic(basic: Basic<'_>) -> Result<Value> {
    let value = match basic {
        Basic::Byte(v) => Value::Byte(v),
        Basic::Boolean(v) => Value::Bool(v),
        Basic::Int16(v) => Value::Int16(v),
        Basic::UInt16(v) => Value::UInt16(v),
        Basic::Int32(v) => Value::Int32(v),
        Basic::UInt32(v) => Value::UInt32(v),
        Basic::Int64(v) => Value::Int64(v),
        Basic::UInt64(v) => Value::UInt64(v),
        Basic::Double(v) => Value::Double(v),
        Basic::String(s) => Value::String(s.to_owned()),
        Basic::ObjectPath(path) => Value::ObjectPath(ObjectPath::parse(path)?),
        Basic::Signature(_) | Basic::UnixFd(_) => return Err(Error::UnsupportedType(basic.code())),
    };
    Ok(value)
}

fn for_each<R, F>(reader: &mut R, mut f: F) -> Result<()>
where
    R: WireRead,
    F: FnMut(&R) -> Result<()>,
{
    if reader.arg_type().is_none() {
        return Ok(());
    }
    loop {
        f(reader)?;
        if !reader.next()? {
            return Ok(());
        }
    }
}
