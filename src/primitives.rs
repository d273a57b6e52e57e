use byteorder::ByteOrder;

use std::mem::size_of;

use crate::align::pad;
use crate::signature::TypeCode;

/// Fixed-size wire scalars.
pub(crate) trait FixedPrimitive: Sized + Copy {
    const SIZE: usize;
    fn serialize<B: ByteOrder>(self, out: &mut [u8]);
    fn deserialize<B: ByteOrder>(data: &[u8]) -> Self;
}

macro_rules! fixed_primitive {
    ($type:ident, $write:ident, $read:ident) => {
        impl FixedPrimitive for $type {
            const SIZE: usize = size_of::<$type>();

            fn serialize<B: ByteOrder>(self, out: &mut [u8]) {
                B::$write(out, self)
            }

            fn deserialize<B: ByteOrder>(data: &[u8]) -> Self {
                B::$read(data)
            }
        }
    };
}

fixed_primitive!(i16, write_i16, read_i16);
fixed_primitive!(u16, write_u16, read_u16);
fixed_primitive!(i32, write_i32, read_i32);
fixed_primitive!(u32, write_u32, read_u32);
fixed_primitive!(i64, write_i64, read_i64);
fixed_primitive!(u64, write_u64, read_u64);
fixed_primitive!(f64, write_f64, read_f64);

impl FixedPrimitive for u8 {
    const SIZE: usize = 1;

    fn serialize<B: ByteOrder>(self, out: &mut [u8]) {
        out[0] = self;
    }

    fn deserialize<B: ByteOrder>(data: &[u8]) -> Self {
        data[0]
    }
}

fn put<T: FixedPrimitive, B: ByteOrder>(buf: &mut Vec<u8>, val: T) {
    let start = buf.len();
    buf.resize(start + T::SIZE, 0);
    val.serialize::<B>(&mut buf[start..]);
}

/// A single basic value as it travels on the wire, tagged with its type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Basic<'a> {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(&'a str),
    ObjectPath(&'a str),
    Signature(&'a str),
    UnixFd(u32),
}

impl<'a> Basic<'a> {
    pub fn code(&self) -> TypeCode {
        match self {
            Basic::Byte(_) => TypeCode::Byte,
            Basic::Boolean(_) => TypeCode::Boolean,
            Basic::Int16(_) => TypeCode::Int16,
            Basic::UInt16(_) => TypeCode::UInt16,
            Basic::Int32(_) => TypeCode::Int32,
            Basic::UInt32(_) => TypeCode::UInt32,
            Basic::Int64(_) => TypeCode::Int64,
            Basic::UInt64(_) => TypeCode::UInt64,
            Basic::Double(_) => TypeCode::Double,
            Basic::String(_) => TypeCode::String,
            Basic::ObjectPath(_) => TypeCode::ObjectPath,
            Basic::Signature(_) => TypeCode::Signature,
            Basic::UnixFd(_) => TypeCode::UnixFd,
        }
    }

    /// Pads `buf` to this value's alignment and appends its encoding.
    pub(crate) fn write<B: ByteOrder>(&self, buf: &mut Vec<u8>) {
        pad(buf, self.code().alignment());
        match *self {
            Basic::Byte(v) => put::<_, B>(buf, v),
            // booleans are 32 bits wide on the wire
            Basic::Boolean(v) => put::<_, B>(buf, v as u32),
            Basic::Int16(v) => put::<_, B>(buf, v),
            Basic::UInt16(v) => put::<_, B>(buf, v),
            Basic::Int32(v) => put::<_, B>(buf, v),
            Basic::UInt32(v) | Basic::UnixFd(v) => put::<_, B>(buf, v),
            Basic::Int64(v) => put::<_, B>(buf, v),
            Basic::UInt64(v) => put::<_, B>(buf, v),
            Basic::Double(v) => put::<_, B>(buf, v),
            Basic::String(s) | Basic::ObjectPath(s) => {
                put::<_, B>(buf, s.len() as u32);
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
            }
            Basic::Signature(s) => {
                buf.push(s.len() as u8);
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
            }
        }
    }
}
