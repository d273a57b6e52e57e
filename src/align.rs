use std::num::Wrapping;

/// Rounds `ix` up to the next multiple of `alignment`.
pub(crate) fn align(ix: usize, alignment: usize) -> usize {
    debug_assert!(
        alignment.is_power_of_two(),
        "{} is not power of 2, cannot be used as alignment",
        alignment
    );
    let mask = Wrapping(alignment) - Wrapping(1);
    let ix = Wrapping(ix);
    (ix + ((-ix) & mask)).0
}

/// Pads `buf` with zero bytes until its length is a multiple of `alignment`.
pub(crate) fn pad(buf: &mut Vec<u8>, alignment: usize) {
    buf.resize(align(buf.len(), alignment), 0);
}

/// Whether the bytes between `from` and its aligned position are all zero,
/// as the wire format requires of padding.
pub(crate) fn padding_is_zero(data: &[u8], from: usize, alignment: usize) -> bool {
    let to = align(from, alignment).min(data.len());
    data[from.min(to)..to].iter().all(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::{align, pad, padding_is_zero};

    #[test]
    fn alignment() {
        assert_eq!(align(23, 4), 24);
        assert_eq!(align(32, 4), 32);
        assert_eq!(align(31, 1), 31);
        assert_eq!(align(0, 8), 0);
        assert_eq!(align(9, 8), 16);
    }

    #[test]
    fn padding() {
        let mut buf = vec![1u8, 2, 3];
        pad(&mut buf, 8);
        assert_eq!(buf, vec![1, 2, 3, 0, 0, 0, 0, 0]);
        assert!(padding_is_zero(&buf, 3, 8));
        assert!(!padding_is_zero(&[1, 7, 0, 0], 1, 4));
    }
}
