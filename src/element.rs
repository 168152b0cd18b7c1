//! Element kinds: the closed set of value holders a box's fields are built
//! from (`spec.md` §2 item 2, §4.2).
use crate::codec;
use crate::{ErrorKind, Result};

/// A single field value inside a `Box`.
///
/// Every variant knows its own `byte_length` and how to `write` itself into a
/// buffer at a given offset; most also know how to `read` themselves back.
/// This is a tagged variant (sum type) rather than the duck-typed element
/// objects the distilled source used, per `spec.md` §9 "Dynamic field
/// dispatch".
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Zero-filled padding of a fixed, configured width.
    Empty(usize),

    /// An ASCII string, written verbatim.
    CharArray(String),

    /// An unsigned 8-bit integer.
    UInt8(u64),

    /// A big-endian unsigned 16-bit integer.
    UInt16BE(u64),

    /// A big-endian unsigned 24-bit integer.
    UInt24BE(u64),

    /// A big-endian unsigned 32-bit integer.
    UInt32BE(u64),

    /// A big-endian unsigned 64-bit integer, carried as `high32, low32`.
    UInt64BE(u64),

    /// A sequence of unsigned 8-bit integers, one byte each.
    UInt8Array(Vec<u64>),

    /// A sequence of big-endian unsigned 16-bit integers.
    UInt16BEArray(Vec<u64>),

    /// A sequence of big-endian unsigned 32-bit integers.
    UInt32BEArray(Vec<u64>),

    /// An opaque blob, written verbatim. Encoder-only: `read` fails with
    /// `NotSupported`.
    ByteArray(Vec<u8>),

    /// The `avcC` parameter-set list encoding: a length-prefixed count byte
    /// followed by `u16BE len, bytes` per entry (`spec.md` §4.2).
    ParameterSetArray {
        /// High bits merged into the leading count byte (e.g. `0xE0` for the
        /// SPS list, `0x00` for the PPS list).
        size_mask: u8,
        /// The parameter sets themselves (each a raw NAL unit payload).
        sets: Vec<Vec<u8>>,
    },
}

impl Element {
    /// The number of bytes this element occupies on the wire.
    pub fn byte_length(&self) -> usize {
        match self {
            Element::Empty(n) => *n,
            Element::CharArray(s) => s.len(),
            Element::UInt8(_) => 1,
            Element::UInt16BE(_) => 2,
            Element::UInt24BE(_) => 3,
            Element::UInt32BE(_) => 4,
            Element::UInt64BE(_) => 8,
            Element::UInt8Array(v) => v.len(),
            Element::UInt16BEArray(v) => 2 * v.len(),
            Element::UInt32BEArray(v) => 4 * v.len(),
            Element::ByteArray(b) => b.len(),
            Element::ParameterSetArray { sets, .. } => {
                1 + sets.iter().map(|s| 2 + s.len()).sum::<usize>()
            }
        }
    }

    /// Writes this element's wire representation into `buf[offset..]`.
    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        match self {
            Element::Empty(n) => {
                track_assert!(offset + n <= buf.len(), ErrorKind::InsufficientBytes);
                for b in &mut buf[offset..offset + n] {
                    *b = 0;
                }
            }
            Element::CharArray(s) => {
                let bytes = s.as_bytes();
                track_assert!(
                    offset + bytes.len() <= buf.len(),
                    ErrorKind::InsufficientBytes
                );
                buf[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            Element::UInt8(v) => track!(codec::write_u8(buf, offset, *v))?,
            Element::UInt16BE(v) => track!(codec::write_u16be(buf, offset, *v))?,
            Element::UInt24BE(v) => track!(codec::write_u24be(buf, offset, *v))?,
            Element::UInt32BE(v) => track!(codec::write_u32be(buf, offset, *v))?,
            Element::UInt64BE(v) => track!(codec::write_u64be(buf, offset, *v))?,
            Element::UInt8Array(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    track!(codec::write_u8(buf, offset + i, *v))?;
                }
            }
            Element::UInt16BEArray(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    track!(codec::write_u16be(buf, offset + 2 * i, *v))?;
                }
            }
            Element::UInt32BEArray(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    track!(codec::write_u32be(buf, offset + 4 * i, *v))?;
                }
            }
            Element::ByteArray(bytes) => {
                track_assert!(
                    offset + bytes.len() <= buf.len(),
                    ErrorKind::InsufficientBytes
                );
                buf[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            Element::ParameterSetArray { size_mask, sets } => {
                track_assert!(sets.len() <= 0x1F, ErrorKind::ValueOutOfRange);
                track!(codec::write_u8(
                    buf,
                    offset,
                    u64::from(*size_mask) | sets.len() as u64
                ))?;
                let mut pos = offset + 1;
                for set in sets {
                    track!(codec::write_u16be(buf, pos, set.len() as u64))?;
                    pos += 2;
                    track_assert!(pos + set.len() <= buf.len(), ErrorKind::InsufficientBytes);
                    buf[pos..pos + set.len()].copy_from_slice(set);
                    pos += set.len();
                }
            }
        }
        Ok(())
    }

    /// Refreshes this element's value by reading it back from `buf[offset..]`.
    ///
    /// Not every variant supports this: `ByteArray` is encoder-only and fails
    /// with `NotSupported`; `Empty` and `ParameterSetArray` are no-ops
    /// (`spec.md` §4.2).
    pub fn read(&mut self, buf: &[u8], offset: usize) -> Result<()> {
        match self {
            Element::Empty(_) => {}
            Element::CharArray(s) => {
                let len = s.len();
                track_assert!(offset + len <= buf.len(), ErrorKind::InsufficientBytes);
                *s = codec::decode_ascii(&buf[offset..offset + len]);
            }
            Element::UInt8(v) => *v = u64::from(track!(codec::read_u8(buf, offset))?),
            Element::UInt16BE(v) => *v = u64::from(track!(codec::read_u16be(buf, offset))?),
            Element::UInt24BE(v) => *v = u64::from(track!(codec::read_u24be(buf, offset))?),
            Element::UInt32BE(v) => *v = u64::from(track!(codec::read_u32be(buf, offset))?),
            Element::UInt64BE(v) => *v = track!(codec::read_u64be(buf, offset))?,
            Element::UInt8Array(vs) => {
                for (i, v) in vs.iter_mut().enumerate() {
                    *v = u64::from(track!(codec::read_u8(buf, offset + i))?);
                }
            }
            Element::UInt16BEArray(vs) => {
                for (i, v) in vs.iter_mut().enumerate() {
                    *v = u64::from(track!(codec::read_u16be(buf, offset + 2 * i))?);
                }
            }
            Element::UInt32BEArray(vs) => {
                for (i, v) in vs.iter_mut().enumerate() {
                    *v = u64::from(track!(codec::read_u32be(buf, offset + 4 * i))?);
                }
            }
            Element::ByteArray(_) => track_panic!(ErrorKind::NotSupported),
            Element::ParameterSetArray { .. } => {}
        }
        Ok(())
    }

    /// Reads this element's value out as a plain integer, for callers (box
    /// construction helpers, track discovery) that need the scalar rather
    /// than the wire form. Fails on non-integer variants.
    pub fn as_u64(&self) -> Result<u64> {
        match *self {
            Element::UInt8(v)
            | Element::UInt16BE(v)
            | Element::UInt24BE(v)
            | Element::UInt32BE(v)
            | Element::UInt64BE(v) => Ok(v),
            _ => track_panic!(ErrorKind::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_zero_fills_without_mutating_offset_bookkeeping() {
        let mut buf = [0xFFu8; 4];
        Element::Empty(4).write(&mut buf, 0).unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);
    }

    #[test]
    fn byte_array_is_encoder_only() {
        let mut e = Element::ByteArray(vec![1, 2, 3]);
        let buf = [0u8; 3];
        assert!(e.read(&buf, 0).is_err());
    }

    #[test]
    fn parameter_set_array_byte_length_and_wire_form() {
        let sps: Vec<u8> = vec![
            0x67, 0x4D, 0x00, 0x29, 0xE2, 0x90, 0x0F, 0x00, 0x44, 0xFC, 0xB8, 0x0B, 0x70, 0x10,
            0x10, 0x1A, 0x41, 0xE2, 0x44, 0x54,
        ];
        let e = Element::ParameterSetArray {
            size_mask: 0xE0,
            sets: vec![sps.clone()],
        };
        assert_eq!(e.byte_length(), 1 + 2 + sps.len());

        let mut buf = vec![0u8; e.byte_length()];
        e.write(&mut buf, 0).unwrap();
        assert_eq!(buf[0], 0xE1);
        assert_eq!(&buf[1..3], &[0x00, 0x14]);
        assert_eq!(&buf[3..], &sps[..]);
    }

    #[test]
    fn u64_round_trips_across_the_52_bit_boundary() {
        let mut e = Element::UInt64BE(0x1_0000_0000);
        let mut buf = vec![0u8; 8];
        e.write(&mut buf, 0).unwrap();
        e = Element::UInt64BE(0);
        e.read(&buf, 0).unwrap();
        assert_eq!(e, Element::UInt64BE(4_294_967_296));
    }
}
