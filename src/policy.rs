/// What to do with an empty array or dict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyContainerStyle {
    /// Write an empty array of variants: `av` for arrays, `a{sv}` for dicts.
    Variant,
    /// Refuse to encode, with [`Error::EmptyContainer`](crate::error::Error::EmptyContainer).
    Reject,
}

/// Decides how an empty [`Container`](crate::container::Container) or
/// [`Dict`](crate::dict::Dict) is written when no sibling gives it an
/// element signature.
pub trait EncoderPolicy: Clone {
    fn empty_container_style(&self) -> EmptyContainerStyle;
}

/// Writes empty containers as arrays of variants.
#[derive(Clone, Debug, Default)]
pub struct DefaultEncoderPolicy;

impl EncoderPolicy for DefaultEncoderPolicy {
    fn empty_container_style(&self) -> EmptyContainerStyle {
        EmptyContainerStyle::Variant
    }
}

/// Refuses empty containers.
#[derive(Clone, Debug, Default)]
pub struct StrictEncoderPolicy;

impl EncoderPolicy for StrictEncoderPolicy {
    fn empty_container_style(&self) -> EmptyContainerStyle {
        EmptyContainerStyle::Reject
    }
}
