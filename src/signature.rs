//! Type codes, signatures, and the signature builder.
//!
//! Every container written to the wire needs the signature of its
//! contents. [`signature_of`] derives it from a [`Value`] tree; the
//! encoder asks the same builder for every array, dict and variant it
//! opens, and the body writer checks each written element against it.

use std::fmt;
use std::str::FromStr;

use crate::container::Container;
use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::policy::{DefaultEncoderPolicy, EmptyContainerStyle, EncoderPolicy};
use crate::value::{Value, ValueKind};

pub const MAX_SIGNATURE_LEN: usize = 255;

/// Maximum nesting of arrays, and separately of structs and dict-entries.
pub const MAX_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    UnixFd,
    Array,
    Struct,
    DictEntry,
    Variant,
}

impl TypeCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        let code = match code {
            b'y' => TypeCode::Byte,
            b'b' => TypeCode::Boolean,
            b'n' => TypeCode::Int16,
            b'q' => TypeCode::UInt16,
            b'i' => TypeCode::Int32,
            b'u' => TypeCode::UInt32,
            b'x' => TypeCode::Int64,
            b't' => TypeCode::UInt64,
            b'd' => TypeCode::Double,
            b's' => TypeCode::String,
            b'o' => TypeCode::ObjectPath,
            b'g' => TypeCode::Signature,
            b'h' => TypeCode::UnixFd,
            b'a' => TypeCode::Array,
            b'(' => TypeCode::Struct,
            b'{' => TypeCode::DictEntry,
            b'v' => TypeCode::Variant,
            _ => return None,
        };
        Some(code)
    }

    /// The code as it appears in a signature. Structs and dict-entries use
    /// their opening bracket.
    pub fn as_u8(self) -> u8 {
        match self {
            TypeCode::Byte => b'y',
            TypeCode::Boolean => b'b',
            TypeCode::Int16 => b'n',
            TypeCode::UInt16 => b'q',
            TypeCode::Int32 => b'i',
            TypeCode::UInt32 => b'u',
            TypeCode::Int64 => b'x',
            TypeCode::UInt64 => b't',
            TypeCode::Double => b'd',
            TypeCode::String => b's',
            TypeCode::ObjectPath => b'o',
            TypeCode::Signature => b'g',
            TypeCode::UnixFd => b'h',
            TypeCode::Array => b'a',
            TypeCode::Struct => b'(',
            TypeCode::DictEntry => b'{',
            TypeCode::Variant => b'v',
        }
    }

    pub fn as_char(self) -> char {
        self.as_u8() as char
    }

    pub fn alignment(self) -> usize {
        match self {
            TypeCode::Byte | TypeCode::Signature | TypeCode::Variant => 1,
            TypeCode::Int16 | TypeCode::UInt16 => 2,
            TypeCode::Boolean
            | TypeCode::Int32
            | TypeCode::UInt32
            | TypeCode::String
            | TypeCode::ObjectPath
            | TypeCode::UnixFd
            | TypeCode::Array => 4,
            TypeCode::Int64
            | TypeCode::UInt64
            | TypeCode::Double
            | TypeCode::Struct
            | TypeCode::DictEntry => 8,
        }
    }

    /// Types allowed as dict-entry keys.
    pub fn is_basic(self) -> bool {
        !matches!(
            self,
            TypeCode::Array | TypeCode::Struct | TypeCode::DictEntry | TypeCode::Variant
        )
    }

    pub fn is_container(self) -> bool {
        !self.is_basic()
    }
}

// Length of the single complete type at the start of `sig`.
fn single_len(sig: &[u8], arrays: usize, structs: usize) -> Option<usize> {
    match TypeCode::from_u8(*sig.first()?)? {
        TypeCode::Array => {
            if arrays >= MAX_DEPTH {
                return None;
            }
            let rest = &sig[1..];
            if rest.first() == Some(&b'{') {
                if structs >= MAX_DEPTH {
                    return None;
                }
                if !TypeCode::from_u8(*rest.get(1)?)?.is_basic() {
                    return None;
                }
                let value_len = single_len(&rest[2..], arrays + 1, structs + 1)?;
                if rest.get(2 + value_len) != Some(&b'}') {
                    return None;
                }
                Some(value_len + 4)
            } else {
                Some(1 + single_len(rest, arrays + 1, structs)?)
            }
        }
        TypeCode::Struct => {
            if structs >= MAX_DEPTH {
                return None;
            }
            let mut ix = 1;
            loop {
                match *sig.get(ix)? {
                    b')' if ix > 1 => return Some(ix + 1),
                    _ => ix += single_len(&sig[ix..], arrays, structs + 1)?,
                }
            }
        }
        // only valid directly inside an array
        TypeCode::DictEntry => None,
        _ => Some(1),
    }
}

/// Splits the first single complete type off `sig`.
pub(crate) fn split_first(sig: &str) -> Result<(&str, &str)> {
    match single_len(sig.as_bytes(), 0, 0) {
        Some(len) => Ok(sig.split_at(len)),
        None => Err(Error::InvalidSignature(sig.to_owned())),
    }
}

/// A validated D-Bus type signature: a sequence of zero or more single
/// complete types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Signature(String);

impl Signature {
    pub fn new(sig: &str) -> Result<Self> {
        if sig.len() > MAX_SIGNATURE_LEN {
            return Err(Error::InvalidSignature(sig.to_owned()));
        }
        let mut rest = sig;
        while !rest.is_empty() {
            rest = split_first(rest)
                .map_err(|_| Error::InvalidSignature(sig.to_owned()))?
                .1;
        }
        Ok(Signature(sig.to_owned()))
    }

    /// A signature holding exactly one complete type, as variants carry.
    pub fn single(sig: &str) -> Result<Self> {
        let signature = Self::new(sig)?;
        if signature.complete_types().count() != 1 {
            return Err(Error::InvalidSignature(sig.to_owned()));
        }
        Ok(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_code(&self) -> Option<TypeCode> {
        self.0.bytes().next().and_then(TypeCode::from_u8)
    }

    /// The first single complete type and everything after it.
    pub fn split_first(&self) -> Option<(&str, &str)> {
        if self.0.is_empty() {
            return None;
        }
        split_first(&self.0).ok()
    }

    pub fn complete_types(&self) -> CompleteTypes<'_> {
        CompleteTypes(&self.0)
    }
}

/// Iterator over the single complete types of a [`Signature`].
pub struct CompleteTypes<'a>(&'a str);

impl<'a> Iterator for CompleteTypes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.0.is_empty() {
            return None;
        }
        // validated on construction
        let (first, rest) = split_first(self.0).ok()?;
        self.0 = rest;
        Some(first)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The signature of `value`, with empty containers handled by the default
/// policy.
pub fn signature_of(value: &Value) -> Result<Signature> {
    signature_with_policy(value, &DefaultEncoderPolicy)
}

pub fn signature_with_policy<P: EncoderPolicy>(value: &Value, policy: &P) -> Result<Signature> {
    let mut sig = String::new();
    build_signature(value, policy, &mut sig)?;
    Signature::new(&sig)
}

pub(crate) fn build_signature<P: EncoderPolicy>(
    value: &Value,
    policy: &P,
    out: &mut String,
) -> Result<()> {
    let mut pattern = String::new();
    build_pattern(value, &mut pattern)?;
    resolve(&pattern, policy, out)
}

/// The signature of one element of `arr`.
pub(crate) fn array_element_signature<P: EncoderPolicy>(
    arr: &Container,
    policy: &P,
    out: &mut String,
) -> Result<()> {
    let mut pattern = String::new();
    element_pattern(arr, &mut pattern)?;
    resolve(&pattern, policy, out)
}

/// The `{kv}` signature of one entry of `dict`.
pub(crate) fn dict_entry_signature<P: EncoderPolicy>(
    dict: &Dict,
    policy: &P,
    out: &mut String,
) -> Result<()> {
    let mut pattern = String::new();
    entry_pattern(dict, &mut pattern)?;
    resolve(&pattern, policy, out)
}

// A pattern is a signature in which the element of an empty array is left
// open as `?` and the entry of an empty dict as `*`. Open slots are filled
// from sibling elements, and whatever stays open goes to the policy.
const OPEN_ELEMENT: u8 = b'?';
const OPEN_ENTRY: u8 = b'*';

fn build_pattern(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Invalid => return Err(Error::InvalidValue),
        Value::Array(arr) => {
            out.push('a');
            element_pattern(arr, out)?;
        }
        Value::Dict(dict) => {
            out.push('a');
            entry_pattern(dict, out)?;
        }
        Value::Struct(st) => {
            if st.is_empty() {
                return Err(Error::EmptyStruct);
            }
            out.push('(');
            for item in st {
                build_pattern(item, out)?;
            }
            out.push(')');
        }
        other => match other.kind().type_code() {
            Some(code) => out.push(code.as_char()),
            None => return Err(Error::InvalidValue),
        },
    }
    Ok(())
}

fn element_pattern(arr: &Container, out: &mut String) -> Result<()> {
    let mut merged: Option<String> = None;
    for item in arr {
        let mut pattern = String::new();
        build_pattern(item, &mut pattern)?;
        merged = Some(match merged {
            None => pattern,
            Some(prev) => unify(&prev, &pattern).unwrap_or(prev),
        });
        if merged.as_deref().map_or(false, is_closed) {
            break;
        }
    }
    match merged {
        Some(pattern) => out.push_str(&pattern),
        None => out.push(OPEN_ELEMENT as char),
    }
    Ok(())
}

fn entry_pattern(dict: &Dict, out: &mut String) -> Result<()> {
    let mut merged: Option<String> = None;
    for entry in dict {
        let key = entry
            .key
            .kind()
            .type_code()
            .filter(|code| code.is_basic())
            .ok_or_else(|| Error::NonBasicKey(entry.key.kind()))?;
        let mut pattern = String::new();
        pattern.push('{');
        pattern.push(key.as_char());
        build_pattern(&entry.value, &mut pattern)?;
        pattern.push('}');
        merged = Some(match merged {
            None => pattern,
            Some(prev) => unify(&prev, &pattern).unwrap_or(prev),
        });
        if merged.as_deref().map_or(false, is_closed) {
            break;
        }
    }
    match merged {
        Some(pattern) => out.push_str(&pattern),
        None => out.push(OPEN_ENTRY as char),
    }
    Ok(())
}

fn is_closed(pattern: &str) -> bool {
    !pattern.bytes().any(|c| c == OPEN_ELEMENT || c == OPEN_ENTRY)
}

// Fills the open slots of either pattern from the other. `None` if they
// disagree anywhere else.
fn unify(a: &str, b: &str) -> Option<String> {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if fills(a[i], b[j]) {
            let len = pattern_len(&b[j..]);
            out.extend_from_slice(&b[j..j + len]);
            i += 1;
            j += len;
        } else if fills(b[j], a[i]) {
            let len = pattern_len(&a[i..]);
            out.extend_from_slice(&a[i..i + len]);
            i += 1;
            j += len;
        } else {
            return None;
        }
    }
    if i != a.len() || j != b.len() {
        return None;
    }
    String::from_utf8(out).ok()
}

// Whether the type starting with `code` can fill the open slot `slot`.
fn fills(slot: u8, code: u8) -> bool {
    match slot {
        OPEN_ELEMENT => code != b'{' && code != OPEN_ENTRY,
        OPEN_ENTRY => code == b'{',
        _ => false,
    }
}

// Length of the single complete type at the start of `pattern`.
fn pattern_len(pattern: &[u8]) -> usize {
    match pattern.first() {
        None => 0,
        Some(b'a') => 1 + pattern_len(&pattern[1..]),
        Some(b'(') | Some(b'{') => {
            let mut depth = 0usize;
            for (ix, c) in pattern.iter().enumerate() {
                match c {
                    b'(' | b'{' => depth += 1,
                    b')' | b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            return ix + 1;
                        }
                    }
                    _ => {}
                }
            }
            pattern.len()
        }
        Some(_) => 1,
    }
}

// Closes every slot still open, as the policy says.
fn resolve<P: EncoderPolicy>(pattern: &str, policy: &P, out: &mut String) -> Result<()> {
    if is_closed(pattern) {
        out.push_str(pattern);
        return Ok(());
    }
    let style = policy.empty_container_style();
    for c in pattern.bytes() {
        match (c, style) {
            (OPEN_ELEMENT, EmptyContainerStyle::Variant) => out.push('v'),
            (OPEN_ENTRY, EmptyContainerStyle::Variant) => out.push_str("{sv}"),
            (OPEN_ELEMENT, EmptyContainerStyle::Reject) => {
                return Err(Error::EmptyContainer(ValueKind::Array))
            }
            (OPEN_ENTRY, EmptyContainerStyle::Reject) => {
                return Err(Error::EmptyContainer(ValueKind::Dict))
            }
            (c, _) => out.push(c as char),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{signature_of, signature_with_policy, split_first, Signature, TypeCode};
    use crate::container::Container;
    use crate::dict::Dict;
    use crate::error::{Error, Result};
    use crate::object_path::ObjectPath;
    use crate::policy::StrictEncoderPolicy;
    use crate::value::{Value, ValueKind, Variant};
    use test_log::test;

    #[test]
    fn basic_codes() -> Result<()> {
        assert_eq!(signature_of(&Value::from_byte(1))?, "y");
        assert_eq!(signature_of(&Value::from_bool(true))?, "b");
        assert_eq!(signature_of(&Value::from_int16(1))?, "n");
        assert_eq!(signature_of(&Value::from_uint16(1))?, "q");
        assert_eq!(signature_of(&Value::from_int32(1))?, "i");
        assert_eq!(signature_of(&Value::from_uint32(1))?, "u");
        assert_eq!(signature_of(&Value::from_int64(1))?, "x");
        assert_eq!(signature_of(&Value::from_uint64(1))?, "t");
        assert_eq!(signature_of(&Value::from_double(1.0))?, "d");
        assert_eq!(signature_of(&Value::from_string("s"))?, "s");
        assert_eq!(
            signature_of(&Value::from_object_path(ObjectPath::root()))?,
            "o"
        );
        assert_eq!(signature_of(&Value::from_variant(Variant::new(1)))?, "v");
        Ok(())
    }

    #[test]
    fn containers() -> Result<()> {
        let st = Container::create_struct().with(1).with("s").with(true);
        assert_eq!(signature_of(&st.clone().into())?, "(isb)");

        let arr: Container = vec![1, 2, 3].into_iter().collect();
        assert_eq!(signature_of(&arr.into())?, "ai");

        let dict = Dict::new().with("a", 1);
        assert_eq!(signature_of(&dict.into())?, "a{si}");

        let arr_of_structs = Container::create_array().with(st);
        assert_eq!(signature_of(&arr_of_structs.into())?, "a(isb)");

        let nested = Dict::new().with("outer", Dict::new().with("inner", Variant::new(1u8)));
        assert_eq!(signature_of(&nested.into())?, "a{sa{sv}}");

        let matrix = Container::create_array().with(Container::create_array().with(1.5));
        assert_eq!(signature_of(&matrix.into())?, "aad");

        let st_of_dict = Container::create_struct()
            .with(Dict::new().with(1u32, Container::create_array().with("x")))
            .with(ObjectPath::new("/a"));
        assert_eq!(signature_of(&st_of_dict.into())?, "(a{uas}o)");
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let value: Value = Dict::new()
            .with("k", Container::create_struct().with(1u64).with(-1i16))
            .into();
        let first = signature_of(&value)?;
        for _ in 0..10 {
            assert_eq!(signature_of(&value)?.as_bytes(), first.as_bytes());
        }
        Ok(())
    }

    #[test]
    fn unrepresentable_values() {
        assert_eq!(signature_of(&Value::Invalid), Err(Error::InvalidValue));
        assert_eq!(
            signature_of(&Container::create_struct().into()),
            Err(Error::EmptyStruct)
        );
    }

    #[test]
    fn empty_containers_follow_policy() -> Result<()> {
        let arr: Value = Container::create_array().into();
        let dict: Value = Dict::new().into();
        assert_eq!(signature_of(&arr)?, "av");
        assert_eq!(signature_of(&dict)?, "a{sv}");
        assert_eq!(
            signature_with_policy(&arr, &StrictEncoderPolicy),
            Err(Error::EmptyContainer(ValueKind::Array))
        );
        assert_eq!(
            signature_with_policy(&dict, &StrictEncoderPolicy),
            Err(Error::EmptyContainer(ValueKind::Dict))
        );
        Ok(())
    }

    #[test]
    fn empty_containers_take_sibling_types() -> Result<()> {
        let arr: Value = Container::create_array()
            .with(Container::create_array())
            .with(Container::create_array().with(1))
            .into();
        assert_eq!(signature_of(&arr)?, "aai");
        assert_eq!(signature_with_policy(&arr, &StrictEncoderPolicy)?, "aai");

        let dict: Value = Dict::new()
            .with("a", Dict::new())
            .with("b", Dict::new().with(1, true))
            .into();
        assert_eq!(signature_of(&dict)?, "a{sa{ib}}");

        let dicts: Value = Container::create_array()
            .with(Dict::new())
            .with(Dict::new().with(1, 2))
            .into();
        assert_eq!(signature_of(&dicts)?, "aa{ii}");
        Ok(())
    }

    #[test]
    fn validation() {
        for good in &["", "i", "a{sv}", "(i(s))", "aai", "a{oa{sv}}", "ia{sv}(ss)v"] {
            assert!(Signature::new(good).is_ok(), "{}", good);
        }
        for bad in &["a", "()", "{ss}", "a{vs}", "a{s}", "a{sss}", "(i", "i)", "z", "a{(i)s}"] {
            assert_eq!(
                Signature::new(bad),
                Err(Error::InvalidSignature(bad.to_string())),
                "{}",
                bad
            );
        }
        let deep_ok = format!("{}i", "a".repeat(32));
        assert!(Signature::new(&deep_ok).is_ok());
        let deep_bad = format!("{}i", "a".repeat(33));
        assert!(Signature::new(&deep_bad).is_err());
        assert!(Signature::new(&"i".repeat(256)).is_err());
    }

    #[test]
    fn complete_types() -> Result<()> {
        let sig = Signature::new("ia{sv}(ss)v")?;
        let types: Vec<&str> = sig.complete_types().collect();
        assert_eq!(types, vec!["i", "a{sv}", "(ss)", "v"]);
        assert_eq!(sig.first_code(), Some(TypeCode::Int32));
        assert_eq!(split_first("(ii)s")?, ("(ii)", "s"));
        assert_eq!(sig.split_first(), Some(("i", "a{sv}(ss)v")));
        assert_eq!(Signature::default().split_first(), None);
        assert!(Signature::single("ii").is_err());
        assert!(Signature::single("a(ii)").is_ok());
        Ok(())
    }

    #[test]
    fn type_codes() {
        for code in b"ybnqiuxtdsoghav({" {
            let tc = TypeCode::from_u8(*code).expect("known code");
            assert_eq!(tc.as_u8(), *code);
        }
        assert_eq!(TypeCode::from_u8(b')'), None);
        assert_eq!(TypeCode::Double.alignment(), 8);
        assert_eq!(TypeCode::Variant.alignment(), 1);
        assert!(TypeCode::ObjectPath.is_basic());
        assert!(!TypeCode::Variant.is_basic());
    }
}
