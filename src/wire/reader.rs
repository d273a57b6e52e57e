use std::marker::PhantomData;
use std::str::from_utf8;

use byteorder::{ByteOrder, LittleEndian};
use log::{error, trace};

use super::{WireRead, MAX_ARRAY_LEN, MAX_NESTING};
use crate::align::{align, padding_is_zero};
use crate::error::{Error, Result};
use crate::message::Body;
use crate::object_path::ObjectPath;
use crate::primitives::{Basic, FixedPrimitive};
use crate::signature::{split_first, Signature, TypeCode};

#[derive(Clone, Copy, Debug)]
enum Cursor<'a> {
    // The remaining complete types of a body, of the fields of a struct or
    // dict-entry, or of a variant's content.
    Sequence { sig: &'a str },
    // Elements of signature `elem` up to byte `end`.
    Array { elem: &'a str, end: usize },
}

/// Reads a marshalled message body.
///
/// A fresh reader is positioned on the first top-level value of the body.
/// Readers are cheap to clone; [`WireRead::recurse`] returns an
/// independent reader over the children of the current element and leaves
/// this one where it is.
#[derive(Clone, Debug)]
pub struct BodyReader<'a, B: ByteOrder = LittleEndian> {
    data: &'a [u8],
    pos: usize,
    cursor: Cursor<'a>,
    depth: usize,
    phantom: PhantomData<B>,
}

impl<'a, B: ByteOrder> BodyReader<'a, B> {
    pub fn new(body: &'a Body) -> Self {
        Self::from_parts(&body.data, &body.signature)
    }

    pub fn from_parts(data: &'a [u8], signature: &'a Signature) -> Self {
        Self {
            data,
            pos: 0,
            cursor: Cursor::Sequence {
                sig: signature.as_str(),
            },
            depth: 0,
            phantom: PhantomData,
        }
    }

    /// Byte offset of the current element, before its alignment padding.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Signature of the current element.
    pub fn current_signature(&self) -> Option<&'a str> {
        match self.cursor {
            Cursor::Sequence { sig } if sig.is_empty() => None,
            Cursor::Sequence { sig } => split_first(sig).ok().map(|(first, _)| first),
            Cursor::Array { elem, end } if self.pos < end => Some(elem),
            Cursor::Array { .. } => None,
        }
    }

    /// Checks that a top-level reader consumed the whole body.
    pub fn finish(&self) -> Result<()> {
        let leftover_data = self.data.len().saturating_sub(self.pos);
        if leftover_data != 0 {
            return Err(Error::LeftoverData(leftover_data));
        }
        Ok(())
    }

    fn aligned(&self, pos: usize, alignment: usize) -> Result<usize> {
        let to = align(pos, alignment);
        if to > self.data.len() {
            error!("Index out of bounds");
            return Err(Error::IndexOutOfBounds(to));
        }
        if !padding_is_zero(self.data, pos, alignment) {
            return Err(Error::NonZeroPadding(pos));
        }
        Ok(to)
    }

    fn read_at(&self, pos: usize, len: usize) -> Result<&'a [u8]> {
        let end = pos.checked_add(len).ok_or(Error::IndexOutOfBounds(pos))?;
        match self.data.get(pos..end) {
            Some(bytes) => Ok(bytes),
            None => {
                error!("Index out of bounds");
                Err(Error::IndexOutOfBounds(end))
            }
        }
    }

    fn fixed<T: FixedPrimitive>(&self, pos: usize) -> Result<(T, usize)> {
        let pos = self.aligned(pos, T::SIZE)?;
        let bytes = self.read_at(pos, T::SIZE)?;
        Ok((T::deserialize::<B>(bytes), pos + T::SIZE))
    }

    fn terminated_str(&self, pos: usize, len: usize) -> Result<(&'a str, usize)> {
        let bytes = self.read_at(pos, len)?;
        if self.read_at(pos + len, 1)?[0] != 0 {
            return Err(Error::MissingNul(pos + len));
        }
        Ok((from_utf8(bytes)?, pos + len + 1))
    }

    fn string(&self, pos: usize) -> Result<(&'a str, usize)> {
        trace!("read string at {}", pos);
        let (len, pos) = self.fixed::<u32>(pos)?;
        self.terminated_str(pos, len as usize)
    }

    fn signature_str(&self, pos: usize) -> Result<(&'a str, usize)> {
        let (len, pos) = self.fixed::<u8>(pos)?;
        let (sig, pos) = self.terminated_str(pos, len as usize)?;
        Signature::new(sig)?;
        Ok((sig, pos))
    }

    fn variant_signature(&self, pos: usize) -> Result<(&'a str, usize)> {
        let (sig, pos) = self.signature_str(pos)?;
        Signature::single(sig)?;
        Ok((sig, pos))
    }

    // Start and end of the elements of the array at `pos`.
    fn array_bounds(&self, pos: usize, elem: &str) -> Result<(usize, usize)> {
        let (len, pos) = self.fixed::<u32>(pos)?;
        let len = len as usize;
        if len > MAX_ARRAY_LEN {
            return Err(Error::ArrayTooLong(len));
        }
        let elem_code = code_of(elem)?;
        let start = self.aligned(pos, elem_code.alignment())?;
        let end = start + len;
        if end > self.data.len() {
            error!("Index out of bounds");
            return Err(Error::IndexOutOfBounds(end));
        }
        Ok((start, end))
    }

    // Position just past the single complete type `sig` stored at `pos`.
    fn skip(&self, sig: &'a str, pos: usize, depth: usize) -> Result<usize> {
        if depth > MAX_NESTING {
            return Err(Error::TooDeep(MAX_NESTING));
        }
        let end = match code_of(sig)? {
            TypeCode::Byte => self.fixed::<u8>(pos)?.1,
            TypeCode::Int16 | TypeCode::UInt16 => self.fixed::<u16>(pos)?.1,
            TypeCode::Boolean | TypeCode::Int32 | TypeCode::UInt32 | TypeCode::UnixFd => {
                self.fixed::<u32>(pos)?.1
            }
            TypeCode::Int64 | TypeCode::UInt64 | TypeCode::Double => self.fixed::<u64>(pos)?.1,
            TypeCode::String | TypeCode::ObjectPath => self.string(pos)?.1,
            TypeCode::Signature => self.signature_str(pos)?.1,
            TypeCode::Array => self.array_bounds(pos, &sig[1..])?.1,
            TypeCode::Struct | TypeCode::DictEntry => {
                let mut pos = self.aligned(pos, 8)?;
                let mut fields = &sig[1..sig.len() - 1];
                while !fields.is_empty() {
                    let (field, rest) = split_first(fields)?;
                    pos = self.skip(field, pos, depth + 1)?;
                    fields = rest;
                }
                pos
            }
            TypeCode::Variant => {
                let (content, pos) = self.variant_signature(pos)?;
                self.skip(content, pos, depth + 1)?
            }
        };
        Ok(end)
    }
}

// Dict-entry fields are not a complete type on their own, so this also
// accepts `{`.
fn code_of(sig: &str) -> Result<TypeCode> {
    sig.bytes()
        .next()
        .and_then(TypeCode::from_u8)
        .ok_or_else(|| Error::InvalidSignature(sig.to_owned()))
}

impl<'a, B: ByteOrder> WireRead for BodyReader<'a, B> {
    fn arg_type(&self) -> Option<TypeCode> {
        self.current_signature().and_then(|sig| code_of(sig).ok())
    }

    fn element_type(&self) -> Option<TypeCode> {
        self.current_signature()
            .filter(|sig| sig.starts_with('a'))
            .and_then(|sig| code_of(&sig[1..]).ok())
    }

    fn recurse(&self) -> Result<Self> {
        let sig = self.current_signature().ok_or(Error::Exhausted)?;
        if self.depth >= MAX_NESTING {
            return Err(Error::TooDeep(MAX_NESTING));
        }
        let (cursor, pos) = match code_of(sig)? {
            TypeCode::Array => {
                let elem = &sig[1..];
                let (start, end) = self.array_bounds(self.pos, elem)?;
                (Cursor::Array { elem, end }, start)
            }
            TypeCode::Struct | TypeCode::DictEntry => {
                let pos = self.aligned(self.pos, 8)?;
                (
                    Cursor::Sequence {
                        sig: &sig[1..sig.len() - 1],
                    },
                    pos,
                )
            }
            TypeCode::Variant => {
                let (content, pos) = self.variant_signature(self.pos)?;
                (Cursor::Sequence { sig: content }, pos)
            }
            _ => return Err(Error::NotAContainer),
        };
        trace!("recurse into {} at {}", sig, pos);
        Ok(Self {
            data: self.data,
            pos,
            cursor,
            depth: self.depth + 1,
            phantom: PhantomData,
        })
    }

    fn next(&mut self) -> Result<bool> {
        let sig = self.current_signature().ok_or(Error::Exhausted)?;
        let pos = self.skip(sig, self.pos, self.depth)?;
        trace!("skip {} from {} to {}", sig, self.pos, pos);
        self.pos = pos;
        match &mut self.cursor {
            Cursor::Sequence { sig: rest } => {
                let remaining: &'a str = rest;
                *rest = &remaining[sig.len()..];
            }
            Cursor::Array { end, .. } => {
                if pos > *end {
                    return Err(Error::ArrayElementOverrun(pos, *end));
                }
            }
        }
        Ok(self.current_signature().is_some())
    }

    fn get_basic(&self) -> Result<Basic<'_>> {
        let sig = self.current_signature().ok_or(Error::Exhausted)?;
        let pos = self.pos;
        let value = match code_of(sig)? {
            TypeCode::Byte => Basic::Byte(self.fixed::<u8>(pos)?.0),
            TypeCode::Boolean => match self.fixed::<u32>(pos)?.0 {
                0 => Basic::Boolean(false),
                1 => Basic::Boolean(true),
                other => return Err(Error::InvalidBoolValue(other)),
            },
            TypeCode::Int16 => Basic::Int16(self.fixed::<i16>(pos)?.0),
            TypeCode::UInt16 => Basic::UInt16(self.fixed::<u16>(pos)?.0),
            TypeCode::Int32 => Basic::Int32(self.fixed::<i32>(pos)?.0),
            TypeCode::UInt32 => Basic::UInt32(self.fixed::<u32>(pos)?.0),
            TypeCode::Int64 => Basic::Int64(self.fixed::<i64>(pos)?.0),
            TypeCode::UInt64 => Basic::UInt64(self.fixed::<u64>(pos)?.0),
            TypeCode::Double => Basic::Double(self.fixed::<f64>(pos)?.0),
            TypeCode::String => Basic::String(self.string(pos)?.0),
            TypeCode::ObjectPath => {
                let path = self.string(pos)?.0;
                if !ObjectPath::valid_path(path) {
                    return Err(Error::InvalidObjectPath(path.to_owned()));
                }
                Basic::ObjectPath(path)
            }
            TypeCode::Signature => Basic::Signature(self.signature_str(pos)?.0),
            TypeCode::UnixFd => Basic::UnixFd(self.fixed::<u32>(pos)?.0),
            other => return Err(Error::UnexpectedContainer(other)),
        };
        trace!("read {:?} at {}", value, pos);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::BodyReader;
    use crate::error::{Error, Result};
    use crate::message::Body;
    use crate::primitives::Basic;
    use crate::signature::{Signature, TypeCode};
    use crate::wire::WireRead;
    use test_log::test;

    fn open(body: &Body) -> BodyReader<'_> {
        BodyReader::new(body)
    }

    fn make_body(sig: &str, data: Vec<u8>) -> Result<Body> {
        Ok(Body {
            data,
            signature: Signature::new(sig)?,
        })
    }

    #[test]
    fn basics_in_sequence() -> Result<()> {
        let body = make_body("yib", vec![7, 0, 0, 0, 37, 0, 0, 0, 1, 0, 0, 0])?;
        let mut reader = open(&body);
        assert_eq!(reader.arg_type(), Some(TypeCode::Byte));
        assert_eq!(reader.get_basic()?, Basic::Byte(7));
        assert!(reader.next()?);
        assert_eq!(reader.get_basic()?, Basic::Int32(37));
        assert!(reader.next()?);
        assert_eq!(reader.get_basic()?, Basic::Boolean(true));
        assert!(!reader.next()?);
        assert_eq!(reader.arg_type(), None);
        assert_eq!(reader.next(), Err(Error::Exhausted));
        reader.finish()
    }

    #[test]
    fn array_elements() -> Result<()> {
        let body = make_body("ai", vec![8, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0])?;
        let reader = open(&body);
        assert_eq!(reader.arg_type(), Some(TypeCode::Array));
        assert_eq!(reader.element_type(), Some(TypeCode::Int32));
        assert_eq!(reader.get_basic(), Err(Error::UnexpectedContainer(TypeCode::Array)));

        let mut items = reader.recurse()?;
        assert_eq!(items.get_basic()?, Basic::Int32(1));
        assert!(items.next()?);
        assert_eq!(items.get_basic()?, Basic::Int32(2));
        assert!(!items.next()?);
        Ok(())
    }

    #[test]
    fn empty_array_then_value() -> Result<()> {
        let body = make_body("axy", vec![0, 0, 0, 0, 0, 0, 0, 0, 9])?;
        let mut reader = open(&body);
        assert_eq!(reader.recurse()?.arg_type(), None);
        assert!(reader.next()?);
        assert_eq!(reader.get_basic()?, Basic::Byte(9));
        assert!(!reader.next()?);
        reader.finish()
    }

    #[test]
    fn variant_and_struct() -> Result<()> {
        let body = make_body(
            "v(ys)",
            vec![
                1, b'i', 0, 0, 37, 0, 0, 0, // v
                5, 0, 0, 0, 2, 0, 0, 0, b'h', b'i', 0, // (ys)
            ],
        )?;
        let mut reader = open(&body);
        let inner = reader.recurse()?;
        assert_eq!(inner.arg_type(), Some(TypeCode::Int32));
        assert_eq!(inner.get_basic()?, Basic::Int32(37));

        assert!(reader.next()?);
        assert_eq!(reader.arg_type(), Some(TypeCode::Struct));
        let mut fields = reader.recurse()?;
        assert_eq!(fields.get_basic()?, Basic::Byte(5));
        assert!(fields.next()?);
        assert_eq!(fields.get_basic()?, Basic::String("hi"));
        assert!(!reader.next()?);
        reader.finish()
    }

    #[test]
    fn truncated() -> Result<()> {
        let body = make_body("i", vec![1, 0])?;
        let reader = open(&body);
        assert_eq!(reader.get_basic(), Err(Error::IndexOutOfBounds(4)));

        let body = make_body("s", vec![10, 0, 0, 0, b'a', 0])?;
        let reader = open(&body);
        assert_eq!(reader.get_basic(), Err(Error::IndexOutOfBounds(14)));

        let body = make_body("ai", vec![64, 0, 0, 0, 1, 0, 0, 0])?;
        let reader = open(&body);
        assert_eq!(reader.recurse().err(), Some(Error::IndexOutOfBounds(68)));
        Ok(())
    }

    #[test]
    fn malformed_values() -> Result<()> {
        let body = make_body("b", vec![2, 0, 0, 0])?;
        let reader = open(&body);
        assert_eq!(reader.get_basic(), Err(Error::InvalidBoolValue(2)));

        let body = make_body("s", vec![2, 0, 0, 0, 0xff, 0xfe, 0])?;
        let reader = open(&body);
        assert!(matches!(reader.get_basic(), Err(Error::Utf8(_))));

        let body = make_body("s", vec![1, 0, 0, 0, b'a', b'b'])?;
        let reader = open(&body);
        assert_eq!(reader.get_basic(), Err(Error::MissingNul(5)));

        let body = make_body("o", vec![1, 0, 0, 0, b'a', 0])?;
        let reader = open(&body);
        assert_eq!(
            reader.get_basic(),
            Err(Error::InvalidObjectPath("a".into()))
        );

        let body = make_body("yi", vec![1, 9, 0, 0, 1, 0, 0, 0])?;
        let mut reader = open(&body);
        assert_eq!(reader.next(), Ok(true));
        assert_eq!(reader.get_basic(), Err(Error::NonZeroPadding(1)));

        let body = make_body("v", vec![2, b'i', b'i', 0, 1, 0, 0, 0])?;
        let reader = open(&body);
        assert_eq!(reader.recurse().err(), Some(Error::InvalidSignature("ii".into())));
        Ok(())
    }

    #[test]
    fn element_overrunning_its_array() -> Result<()> {
        // array claims 2 bytes but holds a 4-byte string header
        let body = make_body("as", vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0])?;
        let reader = open(&body);
        let mut items = reader.recurse()?;
        assert_eq!(items.next(), Err(Error::ArrayElementOverrun(9, 6)));
        Ok(())
    }

    #[test]
    fn leftover_data() -> Result<()> {
        let body = make_body("y", vec![1, 2])?;
        let mut reader = open(&body);
        assert!(!reader.next()?);
        assert_eq!(reader.finish(), Err(Error::LeftoverData(1)));
        Ok(())
    }

    #[test]
    fn not_a_container() -> Result<()> {
        let body = make_body("y", vec![1])?;
        let reader = open(&body);
        assert_eq!(reader.recurse().err(), Some(Error::NotAContainer));
        Ok(())
    }
}
