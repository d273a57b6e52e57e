//! Messages: header fields plus an ordered list of argument values.
//!
//! A [`Message`] never touches a connection. The transport turns it into
//! bytes with [`Message::to_body`] and back with [`Message::from_body`];
//! header fields are carried alongside as plain data.

use std::slice;

use crate::decode::decode_body;
use crate::encode::encode_with_policy;
use crate::error::Result;
use crate::object_path::ObjectPath;
use crate::policy::{DefaultEncoderPolicy, EncoderPolicy};
use crate::signature::{build_signature, Signature};
use crate::value::Value;
use crate::wire::BodyWriter;

/// Error name used by [`Message::error_reply`].
pub const ERROR_FAILED: &str = "org.freedesktop.DBus.Error.Failed";

/// A marshalled message body: little-endian argument bytes and their
/// signature.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub data: Vec<u8>,
    pub signature: Signature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Signal,
    MethodCall,
    MethodReply,
    ErrorReply,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    kind: MessageKind,
    path: Option<ObjectPath>,
    interface: Option<String>,
    member: Option<String>,
    destination: Option<String>,
    sender: Option<String>,
    error_name: Option<String>,
    serial: u32,
    reply_serial: Option<u32>,
    body: Vec<Value>,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            path: None,
            interface: None,
            member: None,
            destination: None,
            sender: None,
            error_name: None,
            serial: 0,
            reply_serial: None,
            body: Vec::new(),
        }
    }

    pub fn signal(
        path: impl Into<ObjectPath>,
        interface: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(MessageKind::Signal);
        msg.path = Some(path.into());
        msg.interface = Some(interface.into());
        msg.member = Some(member.into());
        msg
    }

    pub fn method_call(
        destination: impl Into<String>,
        path: impl Into<ObjectPath>,
        interface: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(MessageKind::MethodCall);
        msg.destination = Some(destination.into());
        msg.path = Some(path.into());
        msg.interface = Some(interface.into());
        msg.member = Some(method.into());
        msg
    }

    /// An empty reply to `call`, addressed to its sender.
    pub fn method_reply(call: &Message) -> Self {
        let mut msg = Self::new(MessageKind::MethodReply);
        msg.destination = call.sender.clone();
        msg.reply_serial = Some(call.serial);
        msg
    }

    /// A [`ERROR_FAILED`] reply to `call` carrying `text` as its only
    /// argument.
    pub fn error_reply(call: &Message, text: &str) -> Self {
        let mut msg = Self::method_reply(call);
        msg.kind = MessageKind::ErrorReply;
        msg.error_name = Some(ERROR_FAILED.to_owned());
        msg.append(text);
        msg
    }

    /// Decodes `body` into a new message of the given kind.
    pub fn from_body(kind: MessageKind, body: &Body) -> Result<Self> {
        let mut msg = Self::new(kind);
        msg.set_body(body)?;
        Ok(msg)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_signal(&self) -> bool {
        self.kind == MessageKind::Signal
    }

    pub fn is_method_call(&self) -> bool {
        self.kind == MessageKind::MethodCall
    }

    pub fn is_method_reply(&self) -> bool {
        self.kind == MessageKind::MethodReply
    }

    pub fn is_error_reply(&self, name: &str) -> bool {
        self.kind == MessageKind::ErrorReply && self.error_name.as_deref() == Some(name)
    }

    pub fn path(&self) -> Option<&ObjectPath> {
        self.path.as_ref()
    }

    pub fn set_path(&mut self, path: impl Into<ObjectPath>) {
        self.path = Some(path.into());
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn set_interface(&mut self, interface: impl Into<String>) {
        self.interface = Some(interface.into());
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn set_member(&mut self, member: impl Into<String>) {
        self.member = Some(member.into());
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn set_destination(&mut self, destination: impl Into<String>) {
        self.destination = Some(destination.into());
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn set_sender(&mut self, sender: impl Into<String>) {
        self.sender = Some(sender.into());
    }

    pub fn error_name(&self) -> Option<&str> {
        self.error_name.as_deref()
    }

    pub fn set_error_name(&mut self, name: impl Into<String>) {
        self.error_name = Some(name.into());
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn set_serial(&mut self, serial: u32) {
        self.serial = serial;
    }

    pub fn reply_serial(&self) -> Option<u32> {
        self.reply_serial
    }

    pub fn set_reply_serial(&mut self, serial: u32) {
        self.reply_serial = Some(serial);
    }

    pub fn append(&mut self, value: impl Into<Value>) {
        self.body.push(value.into());
    }

    /// Builder-style [`append`](Message::append).
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.append(value);
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.body
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Drops every argument, keeping the header.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Drops the header fields and every argument. Only the kind is kept.
    pub fn clear_all(&mut self) {
        *self = Message::new(self.kind);
    }

    /// Signature of the arguments, as [`Message::to_body`] would write it.
    pub fn signature(&self) -> Result<Signature> {
        let mut sig = String::new();
        for value in &self.body {
            build_signature(value, &DefaultEncoderPolicy, &mut sig)?;
        }
        Signature::new(&sig)
    }

    pub fn to_body(&self) -> Result<Body> {
        self.to_body_with_policy(&DefaultEncoderPolicy)
    }

    pub fn to_body_with_policy<P: EncoderPolicy>(&self, policy: &P) -> Result<Body> {
        let mut writer: BodyWriter = BodyWriter::new();
        encode_with_policy(&self.body, &mut writer, policy)?;
        writer.finish()
    }

    /// Replaces the arguments with the ones decoded from `body`. On error
    /// the message is left as it was.
    pub fn set_body(&mut self, body: &Body) -> Result<()> {
        self.body = decode_body(body)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Into<Value>> Extend<V> for Message {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.body.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::{Body, Message, MessageKind, ERROR_FAILED};
    use crate::container::Container;
    use crate::dict::Dict;
    use crate::error::{Error, Result};
    use crate::object_path::ObjectPath;
    use crate::policy::StrictEncoderPolicy;
    use crate::signature::Signature;
    use crate::value::{Value, ValueKind, Variant};
    use test_log::test;

    fn call() -> Message {
        let mut call = Message::method_call(
            "org.example.Service",
            "/org/example/Object",
            "org.example.Interface",
            "Frob",
        );
        call.set_sender(":1.42");
        call.set_serial(7);
        call
    }

    #[test]
    fn signal_headers() {
        let msg = Message::signal("/org/example", "org.example.Iface", "Changed");
        assert!(msg.is_signal());
        assert!(!msg.is_method_call());
        assert_eq!(msg.path(), Some(&ObjectPath::new("/org/example")));
        assert_eq!(msg.interface(), Some("org.example.Iface"));
        assert_eq!(msg.member(), Some("Changed"));
        assert_eq!(msg.destination(), None);
        assert!(msg.is_empty());
    }

    #[test]
    fn method_call_headers() {
        let msg = call();
        assert!(msg.is_method_call());
        assert_eq!(msg.kind(), MessageKind::MethodCall);
        assert_eq!(msg.destination(), Some("org.example.Service"));
        assert_eq!(msg.member(), Some("Frob"));
        assert_eq!(msg.serial(), 7);
        assert_eq!(msg.reply_serial(), None);
    }

    #[test]
    fn reply_goes_back_to_the_caller() {
        let reply = Message::method_reply(&call());
        assert!(reply.is_method_reply());
        assert_eq!(reply.destination(), Some(":1.42"));
        assert_eq!(reply.reply_serial(), Some(7));
        assert_eq!(reply.path(), None);
        assert!(reply.is_empty());
    }

    #[test]
    fn error_reply() {
        let reply = Message::error_reply(&call(), "it broke");
        assert!(reply.is_error_reply(ERROR_FAILED));
        assert!(!reply.is_error_reply("org.example.Error.Other"));
        assert!(!reply.is_method_reply());
        assert_eq!(reply.error_name(), Some(ERROR_FAILED));
        assert_eq!(reply.destination(), Some(":1.42"));
        assert_eq!(reply.reply_serial(), Some(7));
        assert_eq!(reply.values(), &[Value::from_string("it broke")]);
    }

    #[test]
    fn arguments() -> Result<()> {
        let mut msg = call()
            .with(1)
            .with("two")
            .with(Dict::new().with("k", Variant::new(3.0)));
        msg.extend(vec![true, false]);
        assert_eq!(msg.size(), 5);
        assert_eq!(msg.signature()?, "isa{sv}bb");
        let kinds: Vec<ValueKind> = msg.iter().map(Value::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Int32,
                ValueKind::String,
                ValueKind::Dict,
                ValueKind::Bool,
                ValueKind::Bool
            ]
        );
        msg.clear_body();
        assert!(msg.is_empty());
        assert_eq!(msg.member(), Some("Frob"));
        Ok(())
    }

    #[test]
    fn clear_all_resets_header_and_body() {
        let mut msg = call().with(1).with("two");
        msg.set_reply_serial(3);
        msg.clear_all();
        assert_eq!(msg, Message::new(MessageKind::MethodCall));
        assert_eq!(msg.member(), None);
        assert_eq!(msg.serial(), 0);
        assert!(msg.is_empty());
    }

    #[test]
    fn body_round_trip() -> Result<()> {
        let msg = Message::signal("/a", "org.example.Iface", "Changed")
            .with(ObjectPath::new("/a/b"))
            .with(Container::create_array().with(1u8).with(2u8))
            .with(Container::create_struct().with("x").with(Variant::new(-5i64)));
        let body = msg.to_body()?;
        assert_eq!(body.signature, "oay(sv)");
        let decoded = Message::from_body(MessageKind::Signal, &body)?;
        assert_eq!(decoded.values(), msg.values());
        Ok(())
    }

    #[test]
    fn strict_policy() -> Result<()> {
        let msg = Message::new(MessageKind::MethodReply).with(Container::create_array());
        assert_eq!(msg.to_body()?.signature, "av");
        assert_eq!(
            msg.to_body_with_policy(&StrictEncoderPolicy),
            Err(Error::EmptyContainer(ValueKind::Array))
        );
        Ok(())
    }

    #[test]
    fn failed_decode_keeps_the_old_body() -> Result<()> {
        let mut msg = Message::new(MessageKind::MethodReply).with(1);
        let bad = Body {
            data: vec![1, 0],
            signature: Signature::new("i")?,
        };
        assert!(msg.set_body(&bad).is_err());
        assert_eq!(msg.values(), &[Value::from_int32(1)]);
        Ok(())
    }

    #[test]
    fn invalid_arguments_cannot_be_sent() {
        let msg = Message::new(MessageKind::Signal).with(Value::Invalid);
        assert_eq!(msg.signature(), Err(Error::InvalidValue));
        assert_eq!(msg.to_body(), Err(Error::InvalidValue));
    }
}
