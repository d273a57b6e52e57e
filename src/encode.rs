//! Values to wire.
//!
//! Every container is written through [`scoped`], so opens and closes stay
//! paired even when encoding a child fails part way.
//!
//! The element signature of an array or dict is merged from all of its
//! elements, so an empty nested container takes its type from any sibling
//! that has one, wherever that sibling sits: both `[[], [1]]` and
//! `[[1], []]` are written as `aai`. Only a slot no element can fill
//! falls back to the [`EncoderPolicy`].

use log::debug;

use crate::container::Container;
use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::policy::{DefaultEncoderPolicy, EncoderPolicy};
use crate::primitives::Basic;
use crate::signature::{
    array_element_signature, dict_entry_signature, signature_with_policy, split_first, TypeCode,
};
use crate::value::Value;
use crate::wire::{scoped, WireWrite};

pub fn encode<W: WireWrite + ?Sized>(values: &[Value], writer: &mut W) -> Result<()> {
    encode_with_policy(values, writer, &DefaultEncoderPolicy)
}

pub fn encode_with_policy<W, P>(values: &[Value], writer: &mut W, policy: &P) -> Result<()>
where
    W: WireWrite + ?Sized,
    P: EncoderPolicy,
{
    for value in values {
        write_value(value, writer, policy, None)?;
    }
    Ok(())
}

pub fn encode_value<W: WireWrite + ?Sized>(value: &Value, writer: &mut W) -> Result<()> {
    write_value(value, writer, &DefaultEncoderPolicy, None)
}

// `hint` is the signature the enclosing container expects for `value`.
fn write_value<W, P>(value: &Value, writer: &mut W, policy: &P, hint: Option<&str>) -> Result<()>
where
    W: WireWrite + ?Sized,
    P: EncoderPolicy,
{
    match value {
        Value::Invalid => Err(Error::InvalidValue),
        Value::Byte(v) => writer.append_basic(Basic::Byte(*v)),
        Value::Bool(v) => writer.append_basic(Basic::Boolean(*v)),
        Value::Int16(v) => writer.append_basic(Basic::Int16(*v)),
        Value::UInt16(v) => writer.append_basic(Basic::UInt16(*v)),
        Value::Int32(v) => writer.append_basic(Basic::Int32(*v)),
        Value::UInt32(v) => writer.append_basic(Basic::UInt32(*v)),
        Value::Int64(v) => writer.append_basic(Basic::Int64(*v)),
        Value::UInt64(v) => writer.append_basic(Basic::UInt64(*v)),
        Value::Double(v) => writer.append_basic(Basic::Double(*v)),
        Value::String(s) => writer.append_basic(Basic::String(s)),
        Value::ObjectPath(path) => writer.append_basic(Basic::ObjectPath(path.as_str())),
        Value::Array(arr) => write_array(arr, writer, policy, hint),
        Value::Struct(st) => write_struct(st, writer, policy, hint),
        Value::Dict(dict) => write_dict(dict, writer, policy, hint),
        Value::Variant(var) => {
            let inner = var.value();
            let sig = signature_with_policy(inner, policy)?;
            debug!("variant signature {}", sig);
            scoped(writer, TypeCode::Variant, Some(sig.as_str()), |w| {
                write_value(inner, w, policy, Some(sig.as_str()))
            })
        }
    }
}

// Element signature implied by an array hint, if the hint is one.
fn hinted_element(hint: Option<&str>, dict: bool) -> Option<&str> {
    let elem = hint?.strip_prefix('a')?;
    if elem.starts_with('{') == dict {
        Some(elem)
    } else {
        None
    }
}

fn write_array<W, P>(arr: &Container, writer: &mut W, policy: &P, hint: Option<&str>) -> Result<()>
where
    W: WireWrite + ?Sized,
    P: EncoderPolicy,
{
    let elem = match hinted_element(hint, false) {
        Some(elem) => elem.to_owned(),
        None => {
            let mut sig = String::new();
            array_element_signature(arr, policy, &mut sig)?;
            sig
        }
    };
    debug!("array element signature {}", elem);
    scoped(writer, TypeCode::Array, Some(&elem), |w| {
        for item in arr {
            write_value(item, w, policy, Some(&elem))?;
        }
        Ok(())
    })
}

fn write_struct<W, P>(st: &Container, writer: &mut W, policy: &P, hint: Option<&str>) -> Result<()>
where
    W: WireWrite + ?Sized,
    P: EncoderPolicy,
{
    if st.is_empty() {
        return Err(Error::EmptyStruct);
    }
    let mut fields = hint
        .and_then(|sig| sig.strip_prefix('('))
        .and_then(|sig| sig.strip_suffix(')'));
    scoped(writer, TypeCode::Struct, None, |w| {
        for item in st {
            let field = match fields.filter(|sig| !sig.is_empty()).map(split_first) {
                Some(Ok((field, rest))) => {
                    fields = Some(rest);
                    Some(field)
                }
                _ => {
                    fields = None;
                    None
                }
            };
            write_value(item, w, policy, field)?;
        }
        Ok(())
    })
}

fn write_dict<W, P>(dict: &Dict, writer: &mut W, policy: &P, hint: Option<&str>) -> Result<()>
where
    W: WireWrite + ?Sized,
    P: EncoderPolicy,
{
    let entry_sig = match hinted_element(hint, true) {
        Some(sig) => sig.to_owned(),
        None => {
            let mut sig = String::new();
            dict_entry_signature(dict, policy, &mut sig)?;
            sig
        }
    };
    debug!("dict entry signature {}", entry_sig);
    // `{` key-code value-signature `}`
    let value_sig = entry_sig.get(2..entry_sig.len() - 1);
    scoped(writer, TypeCode::Array, Some(&entry_sig), |w| {
        for entry in dict {
            scoped(w, TypeCode::DictEntry, None, |w| {
                write_value(&entry.key, w, policy, None)?;
                write_value(&entry.value, w, policy, value_sig)
            })?;
        }
        Ok(())
    })
}
