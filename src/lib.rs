//! D-Bus values and a wire codec for them.
//!
//! A [`Value`] holds one D-Bus datum of any type: a basic value, an
//! [`ObjectPath`], an array or struct ([`Container`]), a [`Dict`], or a
//! [`Variant`]. Containers are copy-on-write, so values can be cloned and
//! passed around freely; a clone only copies its elements once it is
//! modified.
//!
//! Values are turned into bytes by the [`encode`] module, which writes
//! them through the [`WireWrite`] side of the wire iterator protocol, and
//! read back by the [`decode`] module through [`WireRead`]. The crate
//! ships in-memory implementations of both, [`BodyWriter`] and
//! [`BodyReader`], which produce and consume marshalled message bodies
//! as laid out by the [D-Bus specification]. Sending those bytes over a
//! connection is left to the caller.
//!
//! Signatures are never written by hand: [`signature_of`] derives one from
//! any value tree, and the encoder uses the same builder for every
//! container it opens. An empty array or dict nested in another container
//! takes its element type from a sibling; one with nothing to take it from
//! is written as configured by an [`EncoderPolicy`], passed to
//! [`encode_with_policy`].
//!
//! ```
//! use edbus::{decode_body, Dict, Message, Variant};
//!
//! let msg = Message::signal("/org/example", "org.example.Iface", "Changed")
//!     .with(Dict::new().with("Level", Variant::new(3u32)));
//! let body = msg.to_body()?;
//! assert_eq!(body.signature, "a{sv}");
//! assert_eq!(decode_body(&body)?, msg.values());
//! # Ok::<(), edbus::Error>(())
//! ```
//!
//! [D-Bus specification]: https://dbus.freedesktop.org/doc/dbus-specification.html
//! [`Value`]: crate::value::Value
//! [`ObjectPath`]: crate::object_path::ObjectPath
//! [`Container`]: crate::container::Container
//! [`Dict`]: crate::dict::Dict
//! [`Variant`]: crate::value::Variant
//! [`encode`]: crate::encode
//! [`decode`]: crate::decode
//! [`WireWrite`]: crate::wire::WireWrite
//! [`WireRead`]: crate::wire::WireRead
//! [`BodyWriter`]: crate::wire::BodyWriter
//! [`BodyReader`]: crate::wire::BodyReader
//! [`signature_of`]: crate::signature::signature_of()
//! [`EncoderPolicy`]: crate::policy::EncoderPolicy
//! [`encode_with_policy`]: crate::encode::encode_with_policy()

mod align;
pub mod container;
pub mod decode;
pub mod dict;
pub mod encode;
pub mod error;
pub mod message;
pub mod object_path;
pub mod policy;
mod primitives;
pub mod ser;
pub mod signature;
pub mod value;
pub mod wire;

pub use container::Container;
pub use decode::{decode, decode_body, decode_value};
pub use dict::{Dict, DictEntry};
pub use encode::{encode, encode_value, encode_with_policy};
pub use error::{Error, Result};
pub use message::{Body, Message, MessageKind};
pub use object_path::ObjectPath;
pub use policy::{DefaultEncoderPolicy, EncoderPolicy, StrictEncoderPolicy};
pub use primitives::Basic;
pub use signature::{signature_of, Signature, TypeCode};
pub use value::{Value, ValueKind, Variant};
