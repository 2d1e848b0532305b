//! Error and warning types that can be emitted from this library
//!
//! Parsing distinguishes two tiers. A [`Warning`] is attached to the parsed
//! [`crate::IsdFile`] and never stops the parse. An [`Error`] aborts the parse
//! and no ISD is returned, with the single exception of
//! [`Error::TruncatedDes`] which carries the DES records read before the
//! truncation point.

use std::collections::TryReserveError;
use std::path::PathBuf;

use derive_more::Display;
use miette::Diagnostic;
use thiserror::Error;

use crate::des::DesRecord;
use crate::tre::TreScope;
use crate::version::{NitfVersion, SegmentKind};

/// Broad category of an [`Error`]
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source file could not be opened or read
    #[display("file-io")]
    FileIo,

    /// The file buffer could not be allocated
    #[display("memory")]
    Memory,

    /// A field or length table contradicts the layout of the file
    #[display("malformed-structure")]
    MalformedRecord,

    /// A segment extends past the end of the file
    #[display("truncated")]
    Truncated,

    /// The file is not a NITF version this library understands
    #[display("unsupported-format")]
    UnsupportedFormat,
}

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// unable to read the source file
    #[error("unable to read {}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// unable to allocate the file buffer
    #[error("unable to allocate {requested} bytes for the file buffer")]
    Memory {
        requested: u64,
        #[source]
        cause: TryReserveError,
    },

    /// a field runs past the end of its buffer
    #[error("{name} ({width} bytes at offset {offset}) runs past the end of the data at byte {end}")]
    OutOfBounds {
        name: String,
        offset: usize,
        width: usize,
        end: usize,
    },

    /// a numeric field holds something other than ASCII digits
    #[error("{name} ({width} bytes at offset {offset}) holds {value:?}, which is not an unsigned decimal number")]
    InvalidNumber {
        name: String,
        offset: usize,
        width: usize,
        value: String,
    },

    /// an extension area is too short to hold its overflow field
    #[error("{field} at offset {offset} declares {length} bytes, too few for its overflow field")]
    InvalidExtensionLength {
        field: &'static str,
        offset: usize,
        length: usize,
    },

    /// a value does not fit the width of the field it is written to
    #[error("{name} value {value} does not fit in {width} digits")]
    FieldTooWide {
        name: String,
        value: usize,
        width: usize,
    },

    /// a tre payload is too long for the five digit length field
    #[error("tre {tag} payload of {length} bytes does not fit a five digit length")]
    TrePayloadTooLong { tag: String, length: usize },

    /// the header length field disagrees with the fields it covers
    #[error("header length field is {declared} but the header fields end at byte {parsed}")]
    HeaderLengthMismatch { declared: usize, parsed: usize },

    /// a segment kind was added that the target version has no table for
    #[error("{version} files have no {kind} segments")]
    UndeclaredSegment {
        kind: SegmentKind,
        version: NitfVersion,
    },

    /// a segment extends past the end of the file
    #[error("{kind} segment {index} needs {needed} bytes at offset {offset} but the file holds {available}")]
    TruncatedSegment {
        kind: SegmentKind,
        index: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// a DES extends past the end of the file
    #[error("DES {index} needs {needed} bytes at offset {offset} but the file holds {available}")]
    TruncatedDes {
        index: usize,
        offset: usize,
        needed: usize,
        available: usize,
        recovered: Vec<DesRecord>,
    },

    /// the file is not a supported NITF version
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IOError(_) | Error::FileRead { .. } => ErrorKind::FileIo,
            Error::Memory { .. } => ErrorKind::Memory,
            Error::OutOfBounds { .. }
            | Error::InvalidNumber { .. }
            | Error::InvalidExtensionLength { .. }
            | Error::TrePayloadTooLong { .. }
            | Error::FieldTooWide { .. }
            | Error::UndeclaredSegment { .. }
            | Error::HeaderLengthMismatch { .. } => ErrorKind::MalformedRecord,
            Error::TruncatedSegment { .. } | Error::TruncatedDes { .. } => ErrorKind::Truncated,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
        }
    }

    /// DES records that were fully read before a DES truncation
    pub fn recovered_des(&self) -> &[DesRecord] {
        match self {
            Error::TruncatedDes { recovered, .. } => recovered,
            _ => &[],
        }
    }
}

/// Non-fatal finding attached to a parsed [`crate::IsdFile`]
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Warning {
    /// the file does not start with the expected signature
    #[error("expected signature {expected} but found {found:?}")]
    #[diagnostic(severity(Warning))]
    SignatureMismatch { expected: &'static str, found: String },

    /// the file length field disagrees with the size of the file
    #[error("file length field is {declared} but the file holds {actual} bytes")]
    #[diagnostic(severity(Warning))]
    FileLengthMismatch { declared: u64, actual: u64 },

    /// the file is smaller than its own header
    ///
    /// Advisory. It is logged as soon as `HL` is read, but when the buffer
    /// being parsed is the whole file the header walk then fails with
    /// [`Error::OutOfBounds`] or [`Error::HeaderLengthMismatch`], and the
    /// warning goes no further than the log.
    #[error("file holds {actual} bytes, fewer than its {header_length} byte header")]
    #[diagnostic(severity(Warning))]
    ShortFile { header_length: usize, actual: u64 },

    /// the segment length tables do not add up to the file length
    #[error("segments end at byte {segments_end} but the file length field is {declared}")]
    #[diagnostic(severity(Warning))]
    SegmentLengthMismatch { declared: u64, segments_end: u64 },

    /// tre data that could not be framed as a record
    #[error("{scope} tre data leaves {remaining} unframed bytes at offset {offset}")]
    #[diagnostic(severity(Warning))]
    TrailingTreBytes {
        scope: TreScope,
        offset: usize,
        remaining: usize,
    },

    /// an image subheader walk did not end on its declared length
    #[error("image {index} subheader fields end at byte {parsed} of a {declared} byte subheader")]
    #[diagnostic(severity(Warning))]
    ImageHeaderLengthMismatch {
        index: usize,
        declared: usize,
        parsed: usize,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
