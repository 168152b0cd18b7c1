use trackable::error::{ErrorKind as TrackableErrorKind, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(TrackableError<ErrorKind>);

/// Possible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
    /// A box type absent from the schema registry was requested.
    UnknownBoxType,

    /// `get`/`set`/`offset` named a field that the box does not have.
    UnknownField,

    /// `add` (or schema instantiation) tried to insert a field name twice.
    DuplicateField,

    /// A read extended past the end of the supplied buffer.
    InsufficientBytes,

    /// A scalar value did not fit the declared bit width.
    ValueOutOfRange,

    /// A parsed `size` was smaller than the minimum box header.
    MalformedSize,

    /// An encoder-only element (e.g. `ByteArray`) was asked to read.
    NotSupported,

    /// A parsed `FullBox` carried a version the parser wasn't written
    /// against (e.g. an `mvhd`/`tkhd` version outside `{0, 1}`, or an
    /// `esds`/`avcC` whose leading descriptor tag doesn't match what
    /// discovery expects). Logged as a warning and not currently raised as
    /// a hard failure; reserved for callers that want to opt into strict
    /// version checking.
    VersionMismatch,

    /// Any other I/O or invariant failure.
    Other,
}
impl TrackableErrorKind for ErrorKind {}
