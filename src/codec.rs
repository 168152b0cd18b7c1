//! Endian-aware primitives over a caller-owned byte buffer.
//!
//! Every function here operates directly on a byte slice at a caller-supplied
//! offset; none of them allocate or seek a stream. This is the leaf layer the
//! `element` and `bx` modules are built on (see `spec.md` §4.1).
use byteorder::{BigEndian, ByteOrder};

use crate::{ErrorKind, Result};

/// Reads an unsigned 8-bit integer at `buf[off]`.
pub fn read_u8(buf: &[u8], off: usize) -> Result<u8> {
    track_assert!(off + 1 <= buf.len(), ErrorKind::InsufficientBytes);
    Ok(buf[off])
}

/// Reads a big-endian unsigned 16-bit integer at `buf[off..off+2]`.
pub fn read_u16be(buf: &[u8], off: usize) -> Result<u16> {
    track_assert!(off + 2 <= buf.len(), ErrorKind::InsufficientBytes);
    Ok(BigEndian::read_u16(&buf[off..off + 2]))
}

/// Reads a big-endian unsigned 24-bit integer at `buf[off..off+3]`.
pub fn read_u24be(buf: &[u8], off: usize) -> Result<u32> {
    track_assert!(off + 3 <= buf.len(), ErrorKind::InsufficientBytes);
    Ok(BigEndian::read_uint(&buf[off..off + 3], 3) as u32)
}

/// Reads a big-endian unsigned 32-bit integer at `buf[off..off+4]`.
pub fn read_u32be(buf: &[u8], off: usize) -> Result<u32> {
    track_assert!(off + 4 <= buf.len(), ErrorKind::InsufficientBytes);
    Ok(BigEndian::read_u32(&buf[off..off + 4]))
}

/// Reads a big-endian unsigned 64-bit integer at `buf[off..off+8]`, stored on
/// the wire as `high32, low32` (see `spec.md` §4.1).
pub fn read_u64be(buf: &[u8], off: usize) -> Result<u64> {
    track_assert!(off + 8 <= buf.len(), ErrorKind::InsufficientBytes);
    Ok(BigEndian::read_u64(&buf[off..off + 8]))
}

/// Writes an unsigned 8-bit integer at `buf[off]`.
pub fn write_u8(buf: &mut [u8], off: usize, v: u64) -> Result<()> {
    track_assert!(v < (1 << 8), ErrorKind::ValueOutOfRange);
    track_assert!(off + 1 <= buf.len(), ErrorKind::InsufficientBytes);
    buf[off] = v as u8;
    Ok(())
}

/// Writes a big-endian unsigned 16-bit integer at `buf[off..off+2]`.
pub fn write_u16be(buf: &mut [u8], off: usize, v: u64) -> Result<()> {
    track_assert!(v < (1 << 16), ErrorKind::ValueOutOfRange);
    track_assert!(off + 2 <= buf.len(), ErrorKind::InsufficientBytes);
    BigEndian::write_u16(&mut buf[off..off + 2], v as u16);
    Ok(())
}

/// Writes a big-endian unsigned 24-bit integer at `buf[off..off+3]`.
pub fn write_u24be(buf: &mut [u8], off: usize, v: u64) -> Result<()> {
    track_assert!(v < (1 << 24), ErrorKind::ValueOutOfRange);
    track_assert!(off + 3 <= buf.len(), ErrorKind::InsufficientBytes);
    BigEndian::write_uint(&mut buf[off..off + 3], v, 3);
    Ok(())
}

/// Writes a big-endian unsigned 32-bit integer at `buf[off..off+4]`.
pub fn write_u32be(buf: &mut [u8], off: usize, v: u64) -> Result<()> {
    track_assert!(v < (1u64 << 32), ErrorKind::ValueOutOfRange);
    track_assert!(off + 4 <= buf.len(), ErrorKind::InsufficientBytes);
    BigEndian::write_u32(&mut buf[off..off + 4], v as u32);
    Ok(())
}

/// Writes an unsigned 64-bit integer at `buf[off..off+8]` as `high32, low32`
/// (see `spec.md` §4.1 / §9 "u64 arithmetic").
pub fn write_u64be(buf: &mut [u8], off: usize, v: u64) -> Result<()> {
    track_assert!(off + 8 <= buf.len(), ErrorKind::InsufficientBytes);
    let high = (v >> 32) as u32;
    let low = (v & 0xFFFF_FFFF) as u32;
    BigEndian::write_u32(&mut buf[off..off + 4], high);
    BigEndian::write_u32(&mut buf[off + 4..off + 8], low);
    Ok(())
}

/// Interprets `bytes` as ASCII, each byte mapped to its own code point. No
/// UTF-8 validation is performed (`spec.md` §4.1).
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u24() {
        let mut buf = [0u8; 3];
        write_u24be(&mut buf, 0, 0xE1_0014).unwrap();
        assert_eq!(buf, [0xE1, 0x00, 0x14]);
        assert_eq!(read_u24be(&buf, 0).unwrap(), 0xE1_0014);
    }

    #[test]
    fn splits_u64_into_two_u32_halves() {
        let mut buf = [0u8; 8];
        write_u64be(&mut buf, 0, 0x1_0000_0000).unwrap();
        assert_eq!(buf, [0, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(read_u64be(&buf, 0).unwrap(), 4_294_967_296);
    }

    #[test]
    fn rejects_values_outside_declared_width() {
        let mut buf = [0u8; 2];
        assert!(write_u16be(&mut buf, 0, 1 << 16).is_err());
    }

    #[test]
    fn rejects_reads_past_buffer_end() {
        let buf = [0u8; 2];
        assert!(read_u32be(&buf, 0).is_err());
    }

    #[test]
    fn decodes_ascii_without_utf8_validation() {
        assert_eq!(decode_ascii(b"ftyp"), "ftyp");
        assert_eq!(decode_ascii(&[0xFF]), "\u{FF}");
    }
}
