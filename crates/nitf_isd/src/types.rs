//! Image Support Data model
//!
//! An [`IsdFile`] owns everything read from one file. Records are built once
//! during the parse and are not mutated afterwards.

use std::path::{Path, PathBuf};

use bon::Builder;
use indexmap::IndexMap;

use crate::des::DesRecord;
use crate::error::{Error, Result, Warning};
use crate::field::Fields;
use crate::header;
use crate::image::ImageRecord;
use crate::tre::TreRecord;
use crate::version::{NitfVersion, SegmentKind};

/// Declared header and data length of one segment
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentLengths {
    pub header: usize,
    pub data: usize,
}

impl SegmentLengths {
    pub const fn new(header: usize, data: usize) -> Self {
        Self { header, data }
    }

    /// Bytes the segment occupies in the file
    pub const fn total(&self) -> usize {
        self.header.saturating_add(self.data)
    }
}

/// The segment length tables of the file header, one per kind, in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentTables(IndexMap<SegmentKind, Vec<SegmentLengths>>);

impl SegmentTables {
    pub(crate) fn insert(&mut self, kind: SegmentKind, lengths: Vec<SegmentLengths>) {
        self.0.insert(kind, lengths);
    }

    /// Lengths declared for one kind of segment
    pub fn get(&self, kind: SegmentKind) -> &[SegmentLengths] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentKind, &[SegmentLengths])> {
        self.0.iter().map(|(kind, lengths)| (*kind, lengths.as_slice()))
    }

    /// Bytes taken by every segment of the kinds matching `filter`
    pub fn total_where(&self, filter: impl Fn(SegmentKind) -> bool) -> usize {
        self.iter()
            .filter(|(kind, _)| filter(*kind))
            .flat_map(|(_, lengths)| lengths)
            .fold(0usize, |acc, entry| acc.saturating_add(entry.total()))
    }
}

/// Which image segments to materialise
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageSelection {
    #[default]
    All,
    /// Only the image at this zero-based position
    Index(usize),
}

impl ImageSelection {
    /// Map the `-1 = all` convention onto a selection
    pub fn from_raw(index: i64) -> Self {
        usize::try_from(index).map_or(ImageSelection::All, ImageSelection::Index)
    }

    pub fn selects(&self, index: usize) -> bool {
        match self {
            ImageSelection::All => true,
            ImageSelection::Index(selected) => *selected == index,
        }
    }
}

/// Options for how a file should be parsed
#[derive(Debug, Default, Clone, Copy, Builder)]
pub struct ParseOptions {
    /// Version to parse as. Detected from the signature when not set.
    pub version: Option<NitfVersion>,

    #[builder(default)]
    pub selection: ImageSelection,

    /// Log every header field at debug level while parsing
    #[builder(default)]
    pub trace_fields: bool,
}

/// Image Support Data extracted from one NITF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsdFile {
    pub(crate) version: NitfVersion,
    pub(crate) file_header: Vec<u8>,
    pub(crate) file_length: u64,
    pub(crate) header_length: usize,
    pub(crate) segments: SegmentTables,
    pub(crate) des_offset: usize,
    pub(crate) file_tres: Vec<TreRecord>,
    pub(crate) images: Vec<ImageRecord>,
    pub(crate) des_records: Vec<DesRecord>,
    pub(crate) warnings: Vec<Warning>,
}

impl IsdFile {
    pub fn version(&self) -> NitfVersion {
        self.version
    }

    /// `NITF2.0` or `NITF2.1`
    pub fn format_tag(&self) -> &'static str {
        self.version.format_tag()
    }

    /// Raw file header, `HL` bytes
    pub fn file_header(&self) -> &[u8] {
        &self.file_header
    }

    /// Declared file length `FL`
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Declared header length `HL`
    pub fn header_length(&self) -> usize {
        self.header_length
    }

    pub fn segments(&self) -> &SegmentTables {
        &self.segments
    }

    /// Byte offset of the first data extension segment
    pub fn des_offset(&self) -> usize {
        self.des_offset
    }

    pub fn file_tres(&self) -> &[TreRecord] {
        &self.file_tres
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn des_records(&self) -> &[DesRecord] {
        &self.des_records
    }

    /// Structural findings that did not stop the parse
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Every TRE in the file, file scope first
    pub fn all_tres(&self) -> impl Iterator<Item = &TreRecord> {
        self.file_tres
            .iter()
            .chain(self.images.iter().flat_map(|image| image.tres()))
    }

    /// File header fields by name
    pub fn header_fields(&self) -> Result<Fields> {
        header::fields(&self.file_header, self.version)
    }

    /// Subheader fields of the `position`th materialised image
    pub fn image_fields(&self, position: usize) -> Result<Option<Fields>> {
        self.images
            .get(position)
            .map(|image| image.fields(self.version))
            .transpose()
    }
}

/// Support data handed to sensor model plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isd {
    /// A file that is only known by name
    Filename(PathBuf),
    /// Raw bytes of unknown format
    ByteStream(Vec<u8>),
    Nitf(IsdFile),
}

impl Isd {
    /// Build NITF support data for `path`, falling back to a bare filename
    /// when the file is not a NITF version this library understands.
    pub fn from_path(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Isd> {
        let path = path.as_ref();
        match crate::read::parse_file(path, options) {
            Ok(file) => Ok(Isd::Nitf(file)),
            Err(Error::UnsupportedFormat(_)) => Ok(Isd::Filename(path.to_path_buf())),
            Err(err) => Err(err),
        }
    }

    /// Format name plugins dispatch on
    pub fn format(&self) -> &'static str {
        match self {
            Isd::Filename(_) => "FILENAME",
            Isd::ByteStream(_) => "BYTESTREAM",
            Isd::Nitf(file) => file.format_tag(),
        }
    }

    pub fn nitf(&self) -> Option<&IsdFile> {
        match self {
            Isd::Nitf(file) => Some(file),
            _ => None,
        }
    }
}
