//! Thin convenience layer over [`crate::bx`]: assembles the boxes named in
//! the box table into a complete initialization segment (`ftyp`+`moov`) or
//! media segment (`moof`+`mdat`) so a caller doesn't hand-assemble either
//! field by field every time. This introduces no new wire behavior.
use crate::bx::{Box, MediaTrack};
use crate::element::Element;
use crate::Result;

/// An `ftyp`+`moov` pair: the byte sequence a caller sends once, up front,
/// before any media segments.
#[derive(Debug)]
pub struct InitializationSegment {
    ftyp: Box,
    moov: Box,
}

impl InitializationSegment {
    /// Builds an initialization segment whose `moov` contains `tracks`
    /// (each already assembled as a `trak` container, plus an optional
    /// `mvex` for fragmented playback).
    pub fn new(moov_children: Vec<Box>) -> Result<Self> {
        let ftyp = track!(Box::new("ftyp", None))?;
        let moov = track!(Box::new_container("moov", None, moov_children))?;
        Ok(InitializationSegment { ftyp, moov })
    }

    /// Serializes `ftyp` immediately followed by `moov`.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buf = track!(self.ftyp.buffer())?;
        buf.extend(track!(self.moov.buffer())?);
        Ok(buf)
    }
}

/// A `moof`+`mdat` pair: one fragment of media.
#[derive(Debug)]
pub struct MediaSegment {
    moof: Box,
    mdat: Box,
}

impl MediaSegment {
    /// Builds a media segment from the track fragment's `traf` children and
    /// its raw sample bytes.
    pub fn new(sequence_number: u64, traf_children: Vec<Box>, sample_data: Vec<u8>) -> Result<Self> {
        let mut mfhd = track!(Box::new("mfhd", None))?;
        track!(mfhd.set("sequence_number", Element::UInt32BE(sequence_number)))?;

        let traf = track!(Box::new_container("traf", None, traf_children))?;
        let moof = track!(Box::new_container("moof", None, vec![mfhd, traf]))?;

        let mut mdat = track!(Box::new("mdat", None))?;
        track!(mdat.add("data", Element::ByteArray(sample_data)))?;

        Ok(MediaSegment { moof, mdat })
    }

    /// Serializes `moof` immediately followed by `mdat`.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buf = track!(self.moof.buffer())?;
        buf.extend(track!(self.mdat.buffer())?);
        Ok(buf)
    }
}

/// Parses a `moov` (or any other single box) byte sequence and returns the
/// media tracks discovered while walking it, without retaining the tree.
pub fn discover_tracks(buf: &[u8]) -> Result<Vec<MediaTrack>> {
    let (_tree, tracks) = track!(Box::parse(buf))?;
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_segment_begins_with_ftyp_then_moov() {
        let mut seg = InitializationSegment::new(vec![]).unwrap();
        let bytes = seg.to_bytes().unwrap();
        assert_eq!(&bytes[4..8], b"ftyp");
        let ftyp_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(&bytes[ftyp_len + 4..ftyp_len + 8], b"moov");
    }

    #[test]
    fn media_segment_begins_with_moof_then_mdat() {
        let traf_children = vec![
            Box::new("tfhd", None).unwrap(),
            Box::new("tfdt", None).unwrap(),
            Box::new("trun", None).unwrap(),
        ];
        let mut seg = MediaSegment::new(1, traf_children, vec![1, 2, 3, 4]).unwrap();
        let bytes = seg.to_bytes().unwrap();
        assert_eq!(&bytes[4..8], b"moof");
        let moof_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(&bytes[moof_len + 4..moof_len + 8], b"mdat");
    }
}
