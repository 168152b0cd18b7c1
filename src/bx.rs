//! `Box` and `Container` entities: construction, mutation, serialization,
//! parsing, and diagnostic formatting (`spec.md` §4.4–§4.6).
//!
//! Rust has no class inheritance, so `Container` is not a distinct type —
//! it is a `Box` whose schema entry marked it `is_container`, carrying zero
//! or more `box_i`-named child boxes alongside its own scalar fields
//! (`spec.md` §3: "Container — a Box whose fields include zero or more
//! child boxes").
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::codec;
use crate::element::Element;
use crate::schema::{self, BoxKind, FieldValue};
use crate::{ErrorKind, Result};

/// Header overrides merged over a schema entry's own `config` at
/// construction time (`spec.md` §4.3/§4.4).
pub type Config = HashMap<&'static str, FieldValue>;

/// Which kind of track a `Container::parse` discovery side effect found
/// (`spec.md` §2 item 6, §4.5).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A media track discovered while parsing (`spec.md` §4.5).
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub kind: TrackKind,
    pub codec: String,
}

#[derive(Debug, Clone)]
enum FieldSlot {
    Elem(Element),
    Child(Box),
}

impl FieldSlot {
    fn byte_length(&self) -> usize {
        match self {
            FieldSlot::Elem(e) => e.byte_length(),
            FieldSlot::Child(b) => b.byte_length(),
        }
    }
}

/// A box or container (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Box {
    box_type: String,
    is_container: bool,
    fields: IndexMap<String, FieldSlot>,
}

impl Box {
    /// Constructs a box of `box_type`, merging `config` over the schema's
    /// own default header overrides (`spec.md` §4.4).
    pub fn new(box_type: &str, config: Option<Config>) -> Result<Self> {
        let spec = match schema::lookup(box_type) {
            Some(spec) => spec,
            None => track_panic!(ErrorKind::UnknownBoxType, "{:?}", box_type),
        };

        let mut merged = spec.config.clone();
        if let Some(overrides) = config {
            merged.extend(overrides);
        }

        let mut fields = IndexMap::new();
        for field in &spec.body {
            track_assert!(
                !fields.contains_key(field.name),
                ErrorKind::DuplicateField,
                "{:?}",
                field.name
            );
            let value = merged.get(field.name).unwrap_or(&field.default);
            let elem = track!(value.instantiate(field.kind))?;
            fields.insert(field.name.to_string(), FieldSlot::Elem(elem));
        }

        log::trace!(
            "constructed box {:?} ({} fields, container={})",
            box_type,
            fields.len(),
            spec.is_container
        );

        Ok(Box {
            box_type: box_type.to_string(),
            is_container: spec.is_container,
            fields,
        })
    }

    /// Constructs a container and immediately appends `children` to it.
    pub fn new_container(box_type: &str, config: Option<Config>, children: Vec<Box>) -> Result<Self> {
        let mut b = track!(Self::new(box_type, config))?;
        track!(b.append(children))?;
        Ok(b)
    }

    /// This box's four-character type.
    pub fn box_type(&self) -> &str {
        &self.box_type
    }

    /// Whether this box carries child boxes.
    pub fn is_container(&self) -> bool {
        self.is_container
    }

    /// The sum of every contained element/child's byte length, header
    /// included (`spec.md` §3).
    pub fn byte_length(&self) -> usize {
        self.fields.values().map(FieldSlot::byte_length).sum()
    }

    /// Appends a new field after all existing ones. Fails with
    /// `DuplicateField` if `name` is already present.
    pub fn add(&mut self, name: &str, element: Element) -> Result<()> {
        track_assert!(
            !self.fields.contains_key(name),
            ErrorKind::DuplicateField,
            "{:?}",
            name
        );
        self.fields.insert(name.to_string(), FieldSlot::Elem(element));
        Ok(())
    }

    /// Appends child boxes under synthetic names `box_0`, `box_1`, ….
    pub fn append(&mut self, children: Vec<Box>) -> Result<&mut Self> {
        track_assert!(
            self.is_container,
            ErrorKind::Other,
            "{:?} is not a container",
            self.box_type
        );
        for child in children {
            let index = self
                .fields
                .values()
                .filter(|s| matches!(s, FieldSlot::Child(_)))
                .count();
            self.fields
                .insert(format!("box_{}", index), FieldSlot::Child(child));
        }
        Ok(self)
    }

    /// The byte offset of field `name`, computed from the byte lengths of
    /// every field preceding it in insertion order.
    pub fn offset(&self, name: &str) -> Result<usize> {
        let mut pos = 0;
        for (n, slot) in &self.fields {
            if n == name {
                return Ok(pos);
            }
            pos += slot.byte_length();
        }
        track_panic!(ErrorKind::UnknownField, "{:?}", name)
    }

    /// Borrows the element stored under `name`.
    pub fn get(&self, name: &str) -> Result<&Element> {
        match self.fields.get(name) {
            Some(FieldSlot::Elem(e)) => Ok(e),
            _ => track_panic!(ErrorKind::UnknownField, "{:?}", name),
        }
    }

    /// Borrows the child box stored under `name` (e.g. `"box_0"`).
    pub fn get_child(&self, name: &str) -> Result<&Box> {
        match self.fields.get(name) {
            Some(FieldSlot::Child(b)) => Ok(b),
            _ => track_panic!(ErrorKind::UnknownField, "{:?}", name),
        }
    }

    /// Every appended child box, in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &Box> {
        self.fields.values().filter_map(|s| match s {
            FieldSlot::Child(b) => Some(b),
            FieldSlot::Elem(_) => None,
        })
    }

    /// Replaces the element stored under `name` with a new value.
    pub fn set(&mut self, name: &str, element: Element) -> Result<()> {
        match self.fields.get_mut(name) {
            Some(slot @ FieldSlot::Elem(_)) => {
                *slot = FieldSlot::Elem(element);
                Ok(())
            }
            _ => track_panic!(ErrorKind::UnknownField, "{:?}", name),
        }
    }

    /// Allocates a zero-initialized buffer of `byte_length()` bytes and
    /// serializes into it.
    pub fn buffer(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.byte_length()];
        track!(self.copy(&mut buf, 0))?;
        Ok(buf)
    }

    /// Patches the `size` field to the current byte length, then writes
    /// every field (recursing into children) at `buf[offset..]`.
    pub fn copy(&mut self, buf: &mut [u8], offset: usize) -> Result<()> {
        if self.fields.contains_key("size") {
            let total = self.byte_length() as u64;
            track!(self.set("size", Element::UInt32BE(total)))?;
        }
        let mut pos = 0;
        for slot in self.fields.values_mut() {
            match slot {
                FieldSlot::Elem(e) => track!(e.write(buf, offset + pos))?,
                FieldSlot::Child(c) => track!(c.copy(buf, offset + pos))?,
            }
            pos += slot.byte_length();
        }
        Ok(())
    }

    /// Refreshes readable elements from `buf[offset..]`. Does not touch
    /// `byte_length`; variable-length bodies (`stsz`-style sample tables)
    /// are written by the producer via `add`, never parsed generically
    /// (`spec.md` §4.4, §9).
    pub fn load(&mut self, buf: &[u8], offset: usize) -> Result<()> {
        let mut pos = 0;
        for slot in self.fields.values_mut() {
            let len = slot.byte_length();
            if let FieldSlot::Elem(e) = slot {
                if !matches!(e, Element::ByteArray(_)) {
                    track!(e.read(buf, offset + pos))?;
                }
            }
            pos += len;
        }
        Ok(())
    }

    /// Overwrites the `"type"` field in place, used only by the parser's
    /// opaque fallback path (`spec.md` §4.5 step 2, third bullet).
    fn set_type(&mut self, box_type: &str) -> Result<()> {
        match self.fields.get_mut("type") {
            Some(FieldSlot::Elem(Element::CharArray(s))) => {
                *s = box_type.to_string();
                self.box_type = box_type.to_string();
                Ok(())
            }
            _ => track_panic!(ErrorKind::UnknownField, "type"),
        }
    }

    /// Parses a single box (recursing into children if it is a container)
    /// from the front of `buf`, returning it alongside any media tracks
    /// discovered along the way (`spec.md` §4.5).
    pub fn parse(buf: &[u8]) -> Result<(Box, Vec<MediaTrack>)> {
        let (bx, _consumed, tracks) = track!(Self::read_one(buf))?;
        Ok((bx, tracks))
    }

    fn read_one(buf: &[u8]) -> Result<(Box, usize, Vec<MediaTrack>)> {
        track_assert!(buf.len() >= 8, ErrorKind::MalformedSize);
        let size = track!(codec::read_u32be(buf, 0))? as usize;
        let box_type = codec::decode_ascii(&buf[4..8]);
        let spec = schema::lookup(&box_type);
        let min_size = match spec.map(|s| s.box_kind) {
            Some(BoxKind::Full) => 12,
            _ => 8,
        };
        track_assert!(size >= min_size, ErrorKind::MalformedSize, "{}", size);
        track_assert!(size <= buf.len(), ErrorKind::InsufficientBytes);
        let slice = &buf[..size];

        let (bx, tracks) = match spec {
            Some(spec) if spec.is_container => {
                log::debug!("parsing container box {:?} ({} bytes)", box_type, size);
                let mut b = track!(Self::new(&box_type, None))?;
                track!(b.load(slice, 0))?;
                warn_on_version_mismatch(&box_type, &b);
                let header_len = b.byte_length();
                let mut tracks = Vec::new();
                let mut rest = &slice[header_len..];
                while !rest.is_empty() {
                    let (child, consumed, mut child_tracks) = track!(Self::read_one(rest))?;
                    tracks.append(&mut child_tracks);
                    track!(b.append(vec![child]))?;
                    rest = &rest[consumed..];
                }
                (b, tracks)
            }
            Some(_) => {
                log::debug!("parsing leaf box {:?} ({} bytes)", box_type, size);
                let mut b = track!(Self::new(&box_type, None))?;
                track!(b.load(slice, 0))?;
                warn_on_version_mismatch(&box_type, &b);
                let tracks = track!(discover_tracks(&box_type, &b))?;
                (b, tracks)
            }
            None => {
                log::warn!("unrecognized box type {:?}; preserving opaquely", box_type);
                let mut b = track!(Self::new("....", None))?;
                track!(b.load(slice, 0))?;
                track!(b.set_type(&box_type))?;
                (b, Vec::new())
            }
        };
        Ok((bx, size, tracks))
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}[{}] ({})",
            "",
            self.box_type,
            self.byte_length(),
            indent = indent
        )?;
        for (name, slot) in &self.fields {
            match slot {
                FieldSlot::Elem(e) => writeln!(
                    f,
                    "{:indent$}{} = {} ({})",
                    "",
                    name,
                    format_element(e),
                    e.byte_length(),
                    indent = indent + 2
                )?,
                FieldSlot::Child(c) => c.write_indented(f, indent + 2)?,
            }
        }
        Ok(())
    }
}

/// Diagnostic formatting (`spec.md` §4.6). Not part of the wire format.
impl fmt::Display for Box {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn format_element(e: &Element) -> String {
    match e {
        Element::Empty(n) => format!("<{} zero bytes>", n),
        Element::CharArray(s) => s.clone(),
        Element::UInt8(v)
        | Element::UInt16BE(v)
        | Element::UInt24BE(v)
        | Element::UInt32BE(v)
        | Element::UInt64BE(v) => v.to_string(),
        Element::UInt8Array(vs) | Element::UInt16BEArray(vs) | Element::UInt32BEArray(vs) => {
            format!(
                "[{}]",
                vs.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
            )
        }
        Element::ByteArray(b) => format!("<{} bytes>", b.len()),
        Element::ParameterSetArray { sets, .. } => format!("<{} parameter sets>", sets.len()),
    }
}

/// Logs, but does not fail on, a `FullBox` version this parser wasn't
/// written against (`spec.md` §9 Open Question: "hardcoded to a single
/// FullBox version... preserve this behavior for compatibility but surface
/// a `VersionMismatch` warning path").
fn warn_on_version_mismatch(box_type: &str, b: &Box) {
    if let Ok(v) = b.get("version").and_then(Element::as_u64) {
        if v > 1 {
            log::warn!(
                "{:?} box carries FullBox version {}; this parser assumes version 0/1 semantics ({:?})",
                box_type,
                v,
                ErrorKind::VersionMismatch
            );
        }
    }
}

/// The `avcC`/`esds` track-discovery side effect (`spec.md` §4.5, §9 Open
/// Question: hardcoded to assume `esds` implies AAC and `avcC` implies
/// H.264 without validating descriptor versions).
fn discover_tracks(box_type: &str, b: &Box) -> Result<Vec<MediaTrack>> {
    match box_type {
        "avcC" => {
            let profile = track!(b.get("AVCProfileIndication"))?.as_u64()?;
            let compat = track!(b.get("profile_compatibility"))?.as_u64()?;
            let level = track!(b.get("AVCLevelIndication"))?.as_u64()?;
            Ok(vec![MediaTrack {
                kind: TrackKind::Video,
                codec: format!("avc1.{:02x}{:02x}{:02x}", profile, compat, level),
            }])
        }
        "esds" => {
            let asc = track!(b.get("audio_specific_config"))?.as_u64()?;
            let first_byte = (asc >> 8) & 0xFF;
            let object_type_indication = first_byte >> 3;
            Ok(vec![MediaTrack {
                kind: TrackKind::Audio,
                codec: format!("mp4a.40.{}", object_type_indication),
            }])
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftyp_fixture_matches_the_documented_wire_form() {
        let mut b = Box::new("ftyp", None).unwrap();
        let buf = b.buffer().unwrap();
        assert_eq!(
            buf,
            vec![
                0x00, 0x00, 0x00, 0x14, 0x66, 0x74, 0x79, 0x70, 0x69, 0x73, 0x6F, 0x6D, 0x00,
                0x00, 0x00, 0x00, 0x6D, 0x70, 0x34, 0x31,
            ]
        );
    }

    #[test]
    fn empty_moov_container_serializes_to_eight_bytes() {
        let mut b = Box::new_container("moov", None, vec![]).unwrap();
        assert_eq!(b.byte_length(), 8);
        assert_eq!(
            b.buffer().unwrap(),
            vec![0x00, 0x00, 0x00, 0x08, 0x6D, 0x6F, 0x6F, 0x76]
        );
    }

    #[test]
    fn tfhd_carries_its_documented_defaults() {
        let mut b = Box::new("tfhd", None).unwrap();
        assert_eq!(b.byte_length(), 20);
        let buf = b.buffer().unwrap();
        assert_eq!(&buf[8..12], &[0x00, 0x00, 0x00, 0x20]);
        assert_eq!(&buf[12..16], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(&buf[16..20], &[0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn tfdt_is_version_one_and_round_trips_base_media_decode_time() {
        let mut b = Box::new("tfdt", None).unwrap();
        assert_eq!(b.byte_length(), 20);
        b.set("baseMediaDecodeTime", Element::UInt64BE(0x1_0000_0000))
            .unwrap();
        let buf = b.buffer().unwrap();
        assert_eq!(buf[8], 0x01);

        let mut parsed = Box::new("tfdt", None).unwrap();
        parsed.load(&buf, 0).unwrap();
        assert_eq!(
            parsed.get("baseMediaDecodeTime").unwrap().as_u64().unwrap(),
            4_294_967_296
        );
    }

    #[test]
    fn avcc_parameter_sets_encode_per_the_documented_scenario() {
        let sps: Vec<u8> = vec![
            0x67, 0x4D, 0x00, 0x29, 0xE2, 0x90, 0x0F, 0x00, 0x44, 0xFC, 0xB8, 0x0B, 0x70, 0x10,
            0x10, 0x1A, 0x41, 0xE2, 0x44, 0x54,
        ];
        let pps: Vec<u8> = vec![0x68, 0xEE, 0x3C, 0x80];

        let mut config = Config::new();
        config.insert(
            "sequenceParameterSets",
            FieldValue::ParamSets(vec![sps.clone()]),
        );
        config.insert(
            "pictureParameterSets",
            FieldValue::ParamSets(vec![pps.clone()]),
        );
        let mut b = Box::new("avcC", Some(config)).unwrap();
        let buf = b.buffer().unwrap();

        let sps_off = b.offset("sequenceParameterSets").unwrap();
        assert_eq!(buf[sps_off], 0xE1);
        assert_eq!(&buf[sps_off + 1..sps_off + 3], &[0x00, 0x14]);
        assert_eq!(&buf[sps_off + 3..sps_off + 3 + sps.len()], &sps[..]);

        let pps_off = b.offset("pictureParameterSets").unwrap();
        assert_eq!(buf[pps_off], 0x01);
        assert_eq!(&buf[pps_off + 1..pps_off + 3], &[0x00, 0x04]);
        assert_eq!(&buf[pps_off + 3..pps_off + 3 + pps.len()], &pps[..]);
    }

    #[test]
    fn parse_discovers_video_and_audio_tracks_in_order() {
        let mut avcc_config = Config::new();
        avcc_config.insert("AVCProfileIndication", FieldValue::Int(0x4D));
        avcc_config.insert("profile_compatibility", FieldValue::Int(0x00));
        avcc_config.insert("AVCLevelIndication", FieldValue::Int(0x29));
        let mut avcc = Box::new("avcC", Some(avcc_config)).unwrap();

        let mut esds_config = Config::new();
        esds_config.insert("audio_specific_config", FieldValue::Int(0x1100));
        let mut esds = Box::new("esds", Some(esds_config)).unwrap();

        let avcc_buf = avcc.buffer().unwrap();
        let esds_buf = esds.buffer().unwrap();

        let mut avc1 = Box::new("avc1", None).unwrap();
        let mut avc1_bytes = avc1.buffer().unwrap();
        avc1_bytes.extend_from_slice(&avcc_buf);
        avc1_bytes[0..4].copy_from_slice(&(avc1_bytes.len() as u32).to_be_bytes());

        let mut mp4a = Box::new("mp4a", None).unwrap();
        let mut mp4a_bytes = mp4a.buffer().unwrap();
        mp4a_bytes.extend_from_slice(&esds_buf);
        mp4a_bytes[0..4].copy_from_slice(&(mp4a_bytes.len() as u32).to_be_bytes());

        let mut stsd = Box::new("stsd", None).unwrap();
        let stsd_header_len = stsd.byte_length();
        let mut moov_body = vec![0u8; stsd_header_len];
        stsd.copy(&mut moov_body, 0).unwrap();
        moov_body.extend_from_slice(&avc1_bytes);
        moov_body[0..4].copy_from_slice(&(moov_body.len() as u32).to_be_bytes());
        let mut stsd_buf = moov_body;

        let mut stsd2 = Box::new("stsd", None).unwrap();
        let stsd2_header_len = stsd2.byte_length();
        let mut moov_body2 = vec![0u8; stsd2_header_len];
        stsd2.copy(&mut moov_body2, 0).unwrap();
        moov_body2.extend_from_slice(&mp4a_bytes);
        moov_body2[0..4].copy_from_slice(&(moov_body2.len() as u32).to_be_bytes());
        let stsd2_buf = moov_body2;

        let mut moov = Box::new_container("moov", None, vec![]).unwrap();
        // two stsd-shaped boxes side by side stand in for stbl's sample
        // description table without building the whole stbl/minf/mdia tree.
        stsd_buf.extend_from_slice(&stsd2_buf);
        let size = moov.byte_length() + stsd_buf.len();
        let mut moov_buf = vec![0u8; size];
        moov.copy(&mut moov_buf, 0).unwrap();
        moov_buf[0..4].copy_from_slice(&(size as u32).to_be_bytes());
        moov_buf[moov.byte_length()..].copy_from_slice(&stsd_buf);

        let (_parsed, tracks) = Box::parse(&moov_buf).unwrap();
        assert_eq!(
            tracks,
            vec![
                MediaTrack {
                    kind: TrackKind::Video,
                    codec: "avc1.4d0029".to_string(),
                },
                MediaTrack {
                    kind: TrackKind::Audio,
                    codec: "mp4a.40.2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn truncated_fullbox_size_is_malformed_not_insufficient() {
        // a tfdt claiming size=10 is too small for even the FullBox header
        // (8 bytes of Box header + 4 bytes of version/flags = 12).
        let buf = [
            0x00, 0x00, 0x00, 0x0A, 0x74, 0x66, 0x64, 0x74, 0x00, 0x00,
        ];
        let err = Box::parse(&buf).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::MalformedSize);
    }

    #[test]
    fn stts_declares_only_its_fixed_preamble_and_is_not_opaque() {
        let mut b = Box::new("stts", None).unwrap();
        assert_eq!(b.byte_length(), 16);
        let buf = b.buffer().unwrap();
        let (parsed, _tracks) = Box::parse(&buf).unwrap();
        assert_eq!(parsed.box_type(), "stts");
    }
}
