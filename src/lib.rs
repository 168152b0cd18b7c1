//! A declarative ISO Base Media File Format (ISO/IEC 14496-12) box library,
//! specialized for the fragmented MP4 subset used by Media Source
//! Extensions streaming: an initialization segment (`ftyp`+`moov`) followed
//! by a sequence of media segments (`moof`+`mdat` pairs).
//!
//! The core is a static box schema registry (`schema`), a closed set of
//! field value kinds (`element`), and the `Box`/`Container` entities
//! (`bx`) built on top of them for construction, serialization, and
//! parsing. `avc` and `aac` are sibling modules that turn raw H.264/AAC
//! stream data into the field values the box layer needs; `fmp4` is a thin
//! convenience layer that assembles whole segments.
//!
//! # References
//!
//! - [ISO BMFF Byte Stream Format (Fragmented MP4)][fmp4]
//! - [Media Source Extensions][MSE]
//!
//! [fmp4]: https://w3c.github.io/media-source/isobmff-byte-stream-format.html
//! [MSE]: http://www.w3.org/TR/media-source/
#![warn(missing_docs)]
#[macro_use]
extern crate trackable;

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e: ::std::io::Error| {
            use trackable::error::ErrorKindExt;
            track!(crate::Error::from(crate::ErrorKind::Other.cause(e)))
        })
    };
}

pub use error::{Error, ErrorKind};

pub mod aac;
pub mod avc;
pub mod bx;
pub mod codec;
pub mod element;
pub mod fmp4;
pub mod io;
pub mod schema;

mod error;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
