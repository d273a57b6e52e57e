use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use super::{WireWrite, MAX_ARRAY_LEN, MAX_NESTING};
use crate::align::pad;
use crate::error::{Error, Result};
use crate::message::Body;
use crate::object_path::ObjectPath;
use crate::primitives::Basic;
use crate::signature::{Signature, TypeCode};

struct Frame {
    code: TypeCode,
    // element signature of an array, content signature of a variant
    expected: Option<String>,
    // signatures of the fields of a struct or dict-entry
    written: String,
    items: usize,
    len_ix: usize,
    start_ix: usize,
}

impl Frame {
    fn new(code: TypeCode, expected: Option<String>) -> Self {
        Self {
            code,
            expected,
            written: String::new(),
            items: 0,
            len_ix: 0,
            start_ix: 0,
        }
    }
}

/// Marshals a message body in memory.
///
/// Each element is checked against the signature its enclosing container
/// declared when it was opened: every element of an array must have the
/// array's element signature, and a variant must hold exactly one value of
/// its content signature. The top-level signature accumulates as values
/// are written and is returned with the bytes by [`BodyWriter::finish`].
pub struct BodyWriter<B: ByteOrder = LittleEndian> {
    data: Vec<u8>,
    signature: String,
    frames: Vec<Frame>,
    phantom: PhantomData<B>,
}

impl<B: ByteOrder> Default for BodyWriter<B> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            signature: String::new(),
            frames: Vec::new(),
            phantom: PhantomData,
        }
    }
}

impl<B: ByteOrder> BodyWriter<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Signature of the complete top-level values written so far.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn finish(self) -> Result<Body> {
        if !self.frames.is_empty() {
            return Err(Error::UnclosedContainer(self.frames.len()));
        }
        let signature = Signature::new(&self.signature)?;
        Ok(Body {
            data: self.data,
            signature,
        })
    }

    // Accounts one complete element of signature `sig` to the innermost
    // open container, or to the body.
    fn record(&mut self, sig: &str) -> Result<()> {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => {
                self.signature.push_str(sig);
                return Ok(());
            }
        };
        frame.items += 1;
        match frame.code {
            TypeCode::Array | TypeCode::Variant => {
                let expected = frame.expected.as_deref().unwrap_or_default();
                if expected != sig {
                    return Err(Error::MismatchSignature(
                        expected.to_owned(),
                        sig.to_owned(),
                    ));
                }
                if frame.code == TypeCode::Variant && frame.items > 1 {
                    return Err(Error::MismatchSignature(
                        expected.to_owned(),
                        format!("{}{}", expected, sig),
                    ));
                }
            }
            _ => frame.written.push_str(sig),
        }
        Ok(())
    }

    fn in_dict_array(&self) -> bool {
        match self.frames.last() {
            Some(frame) => {
                frame.code == TypeCode::Array
                    && frame
                        .expected
                        .as_deref()
                        .map_or(false, |sig| sig.starts_with('{'))
            }
            None => false,
        }
    }
}

impl<B: ByteOrder> WireWrite for BodyWriter<B> {
    fn append_basic(&mut self, value: Basic<'_>) -> Result<()> {
        match value {
            Basic::String(s) if s.contains('\0') => return Err(Error::InteriorNul),
            Basic::ObjectPath(path) if !ObjectPath::valid_path(path) => {
                return Err(Error::InvalidObjectPath(path.to_owned()))
            }
            Basic::Signature(sig) => {
                Signature::new(sig)?;
            }
            _ => {}
        }
        self.record(value.code().as_char().encode_utf8(&mut [0; 4]))?;
        trace!("write {:?} at {}", value, self.data.len());
        value.write::<B>(&mut self.data);
        Ok(())
    }

    fn open_container(&mut self, code: TypeCode, signature: Option<&str>) -> Result<()> {
        if self.frames.len() >= MAX_NESTING {
            return Err(Error::TooDeep(MAX_NESTING));
        }
        let frame = match code {
            TypeCode::Array => {
                let elem = signature.unwrap_or_default();
                Signature::single(&format!("a{}", elem))?;
                let elem_code = elem
                    .bytes()
                    .next()
                    .and_then(TypeCode::from_u8)
                    .ok_or_else(|| Error::InvalidSignature(elem.to_owned()))?;

                pad(&mut self.data, 4);
                let len_ix = self.data.len();
                self.data.extend_from_slice(&[0; 4]);
                // padding to the first element is not part of the length
                pad(&mut self.data, elem_code.alignment());

                let mut frame = Frame::new(code, Some(elem.to_owned()));
                frame.len_ix = len_ix;
                frame.start_ix = self.data.len();
                frame
            }
            TypeCode::Struct => {
                pad(&mut self.data, 8);
                Frame::new(code, None)
            }
            TypeCode::DictEntry => {
                if !self.in_dict_array() {
                    return Err(Error::UnexpectedContainer(code));
                }
                pad(&mut self.data, 8);
                Frame::new(code, None)
            }
            TypeCode::Variant => {
                let content = signature.unwrap_or_default();
                Signature::single(content)?;
                Basic::Signature(content).write::<B>(&mut self.data);
                Frame::new(code, Some(content.to_owned()))
            }
            other => return Err(Error::UnexpectedContainer(other)),
        };
        trace!(
            "open {} {:?} at {}",
            code.as_char(),
            frame.expected,
            self.data.len()
        );
        self.frames.push(frame);
        Ok(())
    }

    fn close_container(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(Error::UnbalancedClose)?;
        let sig = match frame.code {
            TypeCode::Array => {
                let len = self.data.len() - frame.start_ix;
                if len > MAX_ARRAY_LEN {
                    return Err(Error::ArrayTooLong(len));
                }
                B::write_u32(&mut self.data[frame.len_ix..frame.len_ix + 4], len as u32);
                format!("a{}", frame.expected.unwrap_or_default())
            }
            TypeCode::Struct => {
                if frame.items == 0 {
                    return Err(Error::EmptyStruct);
                }
                format!("({})", frame.written)
            }
            TypeCode::DictEntry => {
                let sig = format!("{{{}}}", frame.written);
                if frame.items != 2 || Signature::single(&format!("a{}", sig)).is_err() {
                    return Err(Error::MalformedDictEntry(sig));
                }
                sig
            }
            _ => {
                if frame.items != 1 {
                    return Err(Error::MismatchSignature(
                        frame.expected.unwrap_or_default(),
                        String::new(),
                    ));
                }
                "v".to_owned()
            }
        };
        trace!("close {} at {}", sig, self.data.len());
        self.record(&sig)
    }
}
