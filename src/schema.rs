//! The static box-schema registry (`spec.md` §2 item 3, §4.3).
//!
//! This is read-only data, initialized once (`spec.md` §5: "the schema
//! registry is initialized once and read-only thereafter"), mirroring how
//! the rest of this corpus builds lazily-initialized lookup tables with
//! `once_cell::sync::Lazy` rather than hand-rolled `std::sync::Once` + raw
//! pointer juggling.
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::element::Element;
use crate::{ErrorKind, Result};

/// Which header, if any, a box's schema entry prepends to its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    /// No header at all. Used only by the synthetic `"file"` root.
    None,
    /// `size` (u32BE) + `type` (4 ASCII bytes).
    Basic,
    /// A basic header plus `version` (u8) + `flags` (u24BE).
    Full,
}

/// The element-kind tag a field's default/override value is instantiated
/// into. Unlike the distilled source's duck-typed elements, this is plain
/// data consulted by `Box::new` (`spec.md` §9 "Schema as data").
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Empty,
    CharArray,
    UInt8,
    UInt16BE,
    UInt24BE,
    UInt32BE,
    UInt64BE,
    UInt8Array,
    UInt16BEArray,
    UInt32BEArray,
    ByteArray,
    /// The `size_mask` that is OR-ed with the set count into the leading
    /// byte (`0xE0` for `avcC`'s SPS list, `0x00` for its PPS list).
    ParameterSetArray(u8),
}

/// A discriminated literal for a field's default (or caller-supplied
/// override) value — "heterogeneous type... uniformly represented" per
/// `spec.md` §9.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(u64),
    IntSeq(Vec<u64>),
    Bytes(Vec<u8>),
    Str(String),
    ParamSets(Vec<Vec<u8>>),
}

impl FieldValue {
    /// Instantiates the `Element` this value/kind pair describes.
    pub fn instantiate(&self, kind: ElementKind) -> Result<Element> {
        Ok(match (kind, self) {
            (ElementKind::Empty, FieldValue::Int(n)) => Element::Empty(*n as usize),
            (ElementKind::CharArray, FieldValue::Str(s)) => Element::CharArray(s.clone()),
            (ElementKind::UInt8, FieldValue::Int(v)) => Element::UInt8(*v),
            (ElementKind::UInt16BE, FieldValue::Int(v)) => Element::UInt16BE(*v),
            (ElementKind::UInt24BE, FieldValue::Int(v)) => Element::UInt24BE(*v),
            (ElementKind::UInt32BE, FieldValue::Int(v)) => Element::UInt32BE(*v),
            (ElementKind::UInt64BE, FieldValue::Int(v)) => Element::UInt64BE(*v),
            (ElementKind::UInt8Array, FieldValue::IntSeq(v)) => Element::UInt8Array(v.clone()),
            (ElementKind::UInt16BEArray, FieldValue::IntSeq(v)) => {
                Element::UInt16BEArray(v.clone())
            }
            (ElementKind::UInt32BEArray, FieldValue::IntSeq(v)) => {
                Element::UInt32BEArray(v.clone())
            }
            (ElementKind::ByteArray, FieldValue::Bytes(b)) => Element::ByteArray(b.clone()),
            (ElementKind::ParameterSetArray(mask), FieldValue::ParamSets(sets)) => {
                Element::ParameterSetArray {
                    size_mask: mask,
                    sets: sets.clone(),
                }
            }
            _ => track_panic!(
                ErrorKind::Other,
                "field value does not match its declared element kind"
            ),
        })
    }
}

/// One field declaration inside a `BoxSpec`'s header or body.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: ElementKind,
    pub default: FieldValue,
}

fn f(name: &'static str, kind: ElementKind, default: FieldValue) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        default,
    }
}

/// A registry entry: everything needed to construct a box of a given type.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct BoxSpec {
    pub box_kind: BoxKind,
    pub is_container: bool,
    pub body: Vec<FieldSpec>,
    /// Default header overrides (e.g. `tkhd.flags = 0x000003`).
    pub config: HashMap<&'static str, FieldValue>,
}

fn header_fields(kind: BoxKind, box_type: &str) -> Vec<FieldSpec> {
    match kind {
        BoxKind::None => Vec::new(),
        BoxKind::Basic => vec![
            f("size", ElementKind::UInt32BE, FieldValue::Int(0)),
            f(
                "type",
                ElementKind::CharArray,
                FieldValue::Str(box_type.to_string()),
            ),
        ],
        BoxKind::Full => {
            let mut v = header_fields(BoxKind::Basic, box_type);
            v.push(f("version", ElementKind::UInt8, FieldValue::Int(0)));
            v.push(f("flags", ElementKind::UInt24BE, FieldValue::Int(0)));
            v
        }
    }
}

macro_rules! unity_matrix {
    () => {
        FieldValue::IntSeq(vec![0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000])
    };
}

/// Builds the body-field list and header kind/config for one box type.
/// Mirrors the box table in `spec.md` §6.
fn spec_for(box_type: &str) -> Option<BoxSpec> {
    use ElementKind::*;
    use FieldValue::*;

    let mut config: HashMap<&'static str, FieldValue> = HashMap::new();

    let (box_kind, is_container, body): (BoxKind, bool, Vec<FieldSpec>) = match box_type {
        "file" => (BoxKind::None, true, vec![]),

        "ftyp" => (
            BoxKind::Basic,
            false,
            vec![
                f("major_brand", CharArray, Str("isom".into())),
                f("minor_version", UInt32BE, Int(0)),
                f("compatible_brands", UInt32BEArray, IntSeq(vec![0x6D703431])),
            ],
        ),

        "moov" => (BoxKind::Basic, true, vec![]),

        "mvhd" => (
            BoxKind::Full,
            false,
            vec![
                f("creation_time", UInt32BE, Int(0)),
                f("modification_time", UInt32BE, Int(0)),
                f("timescale", UInt32BE, Int(1000)),
                f("duration", UInt32BE, Int(0xFFFF_FFFF)),
                f("rate", UInt32BE, Int(0x0001_0000)),
                f("volume", UInt16BE, Int(0x0100)),
                f("reserved", Empty, Int(10)),
                f("matrix", UInt32BEArray, unity_matrix!()),
                f("pre_defined", Empty, Int(24)),
                f("next_track_ID", UInt32BE, Int(1)),
            ],
        ),

        "trak" => (BoxKind::Basic, true, vec![]),

        "tkhd" => {
            config.insert("flags", Int(0x0000_03));
            (
                BoxKind::Full,
                false,
                vec![
                    f("creation_time", UInt32BE, Int(0)),
                    f("modification_time", UInt32BE, Int(0)),
                    f("track_ID", UInt32BE, Int(1)),
                    f("reserved1", Empty, Int(4)),
                    f("duration", UInt32BE, Int(0)),
                    f("reserved2", Empty, Int(8)),
                    f("layer", UInt16BE, Int(0)),
                    f("alternate_group", UInt16BE, Int(0)),
                    f("volume", UInt16BE, Int(0)),
                    f("reserved3", Empty, Int(2)),
                    f("matrix", UInt32BEArray, unity_matrix!()),
                    f("width", UInt32BE, Int(0)),
                    f("height", UInt32BE, Int(0)),
                ],
            )
        }

        "mdia" => (BoxKind::Basic, true, vec![]),

        "mdhd" => (
            BoxKind::Full,
            false,
            vec![
                f("creation_time", UInt32BE, Int(0)),
                f("modification_time", UInt32BE, Int(0)),
                f("timescale", UInt32BE, Int(1000)),
                f("duration", UInt32BE, Int(0)),
                f("language", UInt16BE, Int(0x55C4)),
                f("pre_defined", UInt16BE, Int(0)),
            ],
        ),

        "hdlr" => (
            BoxKind::Full,
            false,
            vec![
                f("pre_defined", UInt32BE, Int(0)),
                f("handler_type", CharArray, Str("vide".into())),
                f("reserved", Empty, Int(12)),
                f("name", CharArray, Str("VideoHandler\0".into())),
            ],
        ),

        "minf" => (BoxKind::Basic, true, vec![]),

        "vmhd" => {
            config.insert("flags", Int(0x0000_01));
            (
                BoxKind::Full,
                false,
                vec![
                    f("graphicsmode", UInt16BE, Int(0)),
                    f("opcolor", UInt16BEArray, IntSeq(vec![0, 0, 0])),
                ],
            )
        }

        "smhd" => (
            BoxKind::Full,
            false,
            vec![
                f("balance", UInt16BE, Int(0)),
                f("reserved", Empty, Int(2)),
            ],
        ),

        "dinf" => (BoxKind::Basic, true, vec![]),

        "dref" => (
            BoxKind::Full,
            true,
            vec![f("entry_count", UInt32BE, Int(1))],
        ),

        "url " => {
            config.insert("flags", Int(0x0000_01));
            (BoxKind::Full, false, vec![])
        }

        "stbl" => (BoxKind::Basic, true, vec![]),

        "stsd" => (
            BoxKind::Full,
            true,
            vec![f("entry_count", UInt32BE, Int(1))],
        ),

        // Fixed preamble only; per-sample/per-chunk entries are appended by
        // the producer via `Box::add` (spec.md §9 Open Question).
        "stts" => (
            BoxKind::Full,
            false,
            vec![f("entry_count", UInt32BE, Int(0))],
        ),

        "stsc" => (
            BoxKind::Full,
            false,
            vec![f("entry_count", UInt32BE, Int(0))],
        ),

        "stsz" => (
            BoxKind::Full,
            false,
            vec![
                f("sample_size", UInt32BE, Int(0)),
                f("sample_count", UInt32BE, Int(0)),
            ],
        ),

        "stco" => (
            BoxKind::Full,
            false,
            vec![f("entry_count", UInt32BE, Int(0))],
        ),

        "stss" => (
            BoxKind::Full,
            false,
            vec![f("entry_count", UInt32BE, Int(0))],
        ),

        "avc1" => (
            BoxKind::Basic,
            true,
            vec![
                f("reserved1", Empty, Int(6)),
                f("data_reference_index", UInt16BE, Int(1)),
                f("pre_defined1", UInt16BE, Int(0)),
                f("reserved2", Empty, Int(2)),
                f("pre_defined2", UInt32BEArray, IntSeq(vec![0, 0, 0])),
                f("width", UInt16BE, Int(0)),
                f("height", UInt16BE, Int(0)),
                f("horizresolution", UInt32BE, Int(0x0048_0000)),
                f("vertresolution", UInt32BE, Int(0x0048_0000)),
                f("reserved3", Empty, Int(4)),
                f("frame_count", UInt16BE, Int(1)),
                f("compressorname", Empty, Int(32)),
                f("depth", UInt16BE, Int(0x0018)),
                f("pre_defined3", UInt16BE, Int(0xFFFF)),
            ],
        ),

        "avcC" => (
            BoxKind::Basic,
            false,
            vec![
                f("configurationVersion", UInt8, Int(1)),
                f("AVCProfileIndication", UInt8, Int(0)),
                f("profile_compatibility", UInt8, Int(0)),
                f("AVCLevelIndication", UInt8, Int(0)),
                f("lengthSizeMinusOne", UInt8, Int(0xFF)),
                f(
                    "sequenceParameterSets",
                    ParameterSetArray(0xE0),
                    ParamSets(vec![]),
                ),
                f(
                    "pictureParameterSets",
                    ParameterSetArray(0x00),
                    ParamSets(vec![]),
                ),
            ],
        ),

        "mp4a" => (
            BoxKind::Basic,
            true,
            vec![
                f("reserved1", Empty, Int(6)),
                f("data_reference_index", UInt16BE, Int(1)),
                f("reserved2", Empty, Int(8)),
                f("channelcount", UInt16BE, Int(2)),
                f("samplesize", UInt16BE, Int(16)),
                f("pre_defined", UInt16BE, Int(0)),
                f("reserved3", Empty, Int(2)),
                f("samplerate", UInt32BE, Int(0)),
            ],
        ),

        "esds" => (
            BoxKind::Full,
            false,
            vec![
                f("ES_descriptor_tag", UInt8, Int(3)),
                f("ES_descriptor_len", UInt8, Int(25)),
                f("ES_ID", UInt16BE, Int(0)),
                f("stream_priority", UInt8, Int(0)),
                f("decoder_config_descriptor_tag", UInt8, Int(4)),
                f("decoder_config_descriptor_len", UInt8, Int(17)),
                f("object_type_indication", UInt8, Int(0x40)),
                f("stream_type_flags", UInt8, Int((5 << 2) | 1)),
                f("buffer_size", UInt24BE, Int(0)),
                f("max_bitrate", UInt32BE, Int(0)),
                f("avg_bitrate", UInt32BE, Int(0)),
                f("decoder_specific_info_tag", UInt8, Int(5)),
                f("decoder_specific_info_len", UInt8, Int(2)),
                f("audio_specific_config", UInt16BE, Int(0)),
                f("sl_config_descriptor_tag", UInt8, Int(6)),
                f("sl_config_descriptor_len", UInt8, Int(1)),
                f("sl_value", UInt8, Int(2)),
            ],
        ),

        "mvex" => (BoxKind::Basic, true, vec![]),

        "mehd" => (
            BoxKind::Full,
            false,
            vec![f("fragment_duration", UInt32BE, Int(0))],
        ),

        "trex" => (
            BoxKind::Full,
            false,
            vec![
                f("track_ID", UInt32BE, Int(1)),
                f("default_sample_description_index", UInt32BE, Int(1)),
                f("default_sample_duration", UInt32BE, Int(0)),
                f("default_sample_size", UInt32BE, Int(0)),
                f("default_sample_flags", UInt32BE, Int(0)),
            ],
        ),

        "moof" => (BoxKind::Basic, true, vec![]),

        "mfhd" => (
            BoxKind::Full,
            false,
            vec![f("sequence_number", UInt32BE, Int(1))],
        ),

        "traf" => (BoxKind::Basic, true, vec![]),

        "tfhd" => {
            config.insert("flags", Int(0x0000_20));
            (
                BoxKind::Full,
                false,
                vec![
                    f("track_ID", UInt32BE, Int(1)),
                    f("default_sample_flags", UInt32BE, Int(0)),
                ],
            )
        }

        "tfdt" => {
            config.insert("version", Int(1));
            (
                BoxKind::Full,
                false,
                vec![f("baseMediaDecodeTime", UInt64BE, Int(0))],
            )
        }

        "trun" => {
            config.insert("flags", Int(0x00_0305));
            (
                BoxKind::Full,
                false,
                vec![
                    f("sample_count", UInt32BE, Int(1)),
                    f("data_offset", UInt32BE, Int(0)),
                    f("first_sample_flags", UInt32BE, Int(0)),
                    f("sample_duration", UInt32BE, Int(0)),
                    f("sample_size", UInt32BE, Int(0)),
                ],
            )
        }

        "mdat" => (BoxKind::Basic, false, vec![]),

        "edts" => (BoxKind::Basic, true, vec![]),

        "elst" => (
            BoxKind::Full,
            false,
            vec![
                f("entry_count", UInt32BE, Int(1)),
                f("segment_duration", UInt32BE, Int(0)),
                f("media_time", UInt32BE, Int(0xFFFF_FFFF)),
                f("media_rate_integer", UInt16BE, Int(1)),
                f("media_rate_fraction", UInt16BE, Int(0)),
            ],
        ),

        // Opaque fallback used only during parsing (spec.md §4.4 step 1,
        // §6 "sentinel").
        "...." => (BoxKind::Basic, false, vec![]),

        _ => return None,
    };

    let mut header = header_fields(box_kind, box_type);
    header.extend(body);

    Some(BoxSpec {
        box_kind,
        is_container,
        body: header,
        config,
    })
}

static REGISTRY: Lazy<HashMap<&'static str, BoxSpec>> = Lazy::new(|| {
    let types = [
        "file", "ftyp", "moov", "mvhd", "trak", "tkhd", "mdia", "mdhd", "hdlr", "minf", "vmhd",
        "smhd", "dinf", "dref", "url ", "stbl", "stsd", "stts", "stsc", "stsz", "stco", "stss",
        "avc1", "avcC", "mp4a", "esds", "mvex", "mehd", "trex", "moof", "mfhd", "traf", "tfhd",
        "tfdt", "trun", "mdat", "edts", "elst", "....",
    ];
    let mut m = HashMap::new();
    for t in &types {
        if let Some(spec) = spec_for(t) {
            m.insert(*t, spec);
        }
    }
    m
});

/// Looks up the schema entry for `box_type`, if recognized.
pub fn lookup(box_type: &str) -> Option<&'static BoxSpec> {
    REGISTRY.get(box_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_every_supported_type() {
        for t in [
            "ftyp", "moov", "mvhd", "trak", "tkhd", "mdia", "mdhd", "hdlr", "minf", "vmhd",
            "smhd", "dinf", "dref", "url ", "stbl", "stsd", "stts", "stsc", "stsz", "stco",
            "stss", "avc1", "avcC", "mp4a", "esds", "mvex", "mehd", "trex", "moof", "mfhd",
            "traf", "tfhd", "tfdt", "trun", "mdat", "edts", "elst",
        ] {
            assert!(lookup(t).is_some(), "missing schema for {}", t);
        }
    }

    #[test]
    fn unrecognized_type_is_absent() {
        assert!(lookup("zzzz").is_none());
    }

    #[test]
    fn tfhd_carries_its_default_flags_override() {
        let spec = lookup("tfhd").unwrap();
        assert_eq!(spec.config.get("flags"), Some(&FieldValue::Int(0x20)));
    }

    #[test]
    fn stsz_declares_only_its_fixed_preamble() {
        let spec = lookup("stsz").unwrap();
        let names: Vec<&str> = spec.body.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["size", "type", "version", "flags", "sample_size", "sample_count"]
        );
    }
}
