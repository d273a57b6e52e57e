//! The wire iterator protocol.
//!
//! A transport hands the codec something implementing [`WireRead`] for an
//! incoming message body, and something implementing [`WireWrite`] for an
//! outgoing one. [`BodyWriter`] and [`BodyReader`] are in-memory
//! implementations producing and consuming marshalled D-Bus body bytes.

pub mod reader;
pub mod writer;

pub use reader::BodyReader;
pub use writer::BodyWriter;

use crate::error::Result;
use crate::primitives::Basic;
use crate::signature::TypeCode;

/// Maximum length in bytes of one marshalled array.
pub const MAX_ARRAY_LEN: usize = 1 << 26;

/// Maximum total container nesting, variants included.
pub const MAX_NESTING: usize = 64;

/// Sink side of the wire iterator protocol.
pub trait WireWrite {
    fn append_basic(&mut self, value: Basic<'_>) -> Result<()>;

    /// Opens an array, struct, dict-entry or variant. Arrays take the
    /// signature of one element, variants the signature of their content;
    /// structs and dict-entries take none.
    fn open_container(&mut self, code: TypeCode, signature: Option<&str>) -> Result<()>;

    fn close_container(&mut self) -> Result<()>;
}

/// Source side of the wire iterator protocol.
///
/// A reader is positioned on one element at a time. `recurse` yields a
/// new reader over the children of the current container element, and
/// `next` steps past the current element.
pub trait WireRead: Sized {
    /// Type of the current element, or `None` when exhausted.
    fn arg_type(&self) -> Option<TypeCode>;

    /// Element type of the current array.
    fn element_type(&self) -> Option<TypeCode>;

    fn recurse(&self) -> Result<Self>;

    /// Moves to the following element. Returns whether there is one.
    fn next(&mut self) -> Result<bool>;

    fn get_basic(&self) -> Result<Basic<'_>>;
}

/// Writes one container: opens it, runs `body`, and closes it again
/// whether or not `body` succeeded. The first error wins.
pub fn scoped<W, F>(writer: &mut W, code: TypeCode, signature: Option<&str>, body: F) -> Result<()>
where
    W: WireWrite + ?Sized,
    F: FnOnce(&mut W) -> Result<()>,
{
    writer.open_container(code, signature)?;
    let res = body(writer);
    let closed = writer.close_container();
    res.and(closed)
}
