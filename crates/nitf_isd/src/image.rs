//! Image subheader parsing
//!
//! After the version specific fixed fields (see [`crate::version`]) every
//! image subheader continues with the same conditional run:
//!
//! | Field     | Width   | Present when                                 |
//! |-----------|---------|----------------------------------------------|
//! | ICORDS    | 1       | always                                       |
//! | IGEOLO    | 60      | `ICORDS` is not the version's absent marker  |
//! | NICOM     | 1       | always                                       |
//! | ICOMn     | 80 each | `NICOM` times                                |
//! | IC        | 2       | always                                       |
//! | COMRAT    | 4       | `IC` is not `NC` or `NM`                     |
//! | NBANDS    | 1       | always                                       |
//! | XBANDS    | 5       | 2.1 only, when `NBANDS` is 0                 |
//! | band      | 13+     | per band, with optional look-up tables       |
//! | ISYNC..   | 40      | always                                       |
//! | UDIDL..   | 5+      | user defined TREs                            |
//! | IXSHDL..  | 5+      | extended subheader TREs                      |

use tracing::{debug, warn};

use crate::error::{Error, Result, Warning};
use crate::field::{FieldReader, FieldSpec, Fields, EXTENDED_IMAGE, USER_IMAGE};
use crate::tre::{segment_tres, TreRecord, TreScope};
use crate::types::{ImageSelection, SegmentLengths};
use crate::version::{Layout, NitfVersion, SegmentKind, DOWNGRADE_EVENT};

pub(crate) const GEOLO_WIDTH: usize = 60;
pub(crate) const COMMENT_WIDTH: usize = 80;

/// Fixed fields between the bands and the user defined data
pub(crate) const BLOCKING: &[FieldSpec] = &[
    FieldSpec::new("ISYNC", 1),
    FieldSpec::new("IMODE", 1),
    FieldSpec::new("NBPR", 4),
    FieldSpec::new("NBPC", 4),
    FieldSpec::new("NPPBH", 4),
    FieldSpec::new("NPPBV", 4),
    FieldSpec::new("NBPP", 2),
    FieldSpec::new("IDLVL", 3),
    FieldSpec::new("IALVL", 3),
    FieldSpec::new("ILOC", 10),
    FieldSpec::new("IMAG", 4),
];

/// Whether an `IC` value is followed by a `COMRAT` field
pub(crate) fn has_compression_rate(code: &[u8]) -> bool {
    !matches!(code, b"NC" | b"NM")
}

/// One image segment's subheader and the TREs it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    index: usize,
    offset: usize,
    data_length: usize,
    subheader: Vec<u8>,
    tres: Vec<TreRecord>,
}

impl ImageRecord {
    /// Zero-based position of the image among all image segments
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the subheader in the file
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Declared length of the pixel data that follows the subheader
    pub fn data_length(&self) -> usize {
        self.data_length
    }

    /// Raw subheader, embedded TRE data included
    pub fn subheader(&self) -> &[u8] {
        &self.subheader
    }

    pub fn tres(&self) -> &[TreRecord] {
        &self.tres
    }

    /// Subheader fields by name
    pub fn fields(&self, version: NitfVersion) -> Result<Fields> {
        let mut reader = FieldReader::with_base(&self.subheader, self.offset).recording(true);
        walk(&mut reader, version.layout())?;
        Ok(reader.into_fields().unwrap_or_default())
    }
}

/// Walk the subheader and return its concatenated `UDID` and `IXSHD` data
fn walk(reader: &mut FieldReader<'_>, layout: &Layout) -> Result<Vec<u8>> {
    reader.walk(layout.image_prefix)?;
    if let Some(downgrade) = &layout.image_downgrade {
        if reader.text(downgrade.field.name, downgrade.field.width)? == DOWNGRADE_EVENT {
            reader.text(downgrade.event.name, downgrade.event.width)?;
        }
    }
    reader.walk(layout.image_suffix)?;

    if reader.text("ICORDS", 1)? != [layout.icords_absent] {
        reader.text("IGEOLO", GEOLO_WIDTH)?;
    }

    let comments = reader.int("NICOM", 1)?;
    for n in 1..=comments {
        reader.text(&format!("ICOM{n}"), COMMENT_WIDTH)?;
    }

    if has_compression_rate(reader.text("IC", 2)?) {
        reader.text("COMRAT", 4)?;
    }

    let mut bands = reader.int("NBANDS", 1)?;
    if bands == 0 && layout.extended_bands {
        bands = reader.int("XBANDS", 5)?;
    }
    for n in 1..=bands {
        reader.text(&format!("IREPBAND{n}"), 2)?;
        reader.text(&format!("ISUBCAT{n}"), 6)?;
        reader.text(&format!("IFC{n}"), 1)?;
        reader.text(&format!("IMFLT{n}"), 3)?;
        let luts = reader.int(&format!("NLUTS{n}"), 1)?;
        if luts > 0 {
            let entries = reader.int(&format!("NELUT{n}"), 5)?;
            reader.skip(&format!("LUTD{n}"), luts * entries)?;
        }
    }

    reader.walk(BLOCKING)?;

    let mut blob = reader.extension(&USER_IMAGE)?.to_vec();
    blob.extend_from_slice(reader.extension(&EXTENDED_IMAGE)?);
    Ok(blob)
}

/// Parse the subheader of the image segment at `offset`
pub(crate) fn parse_image(
    buffer: &[u8],
    offset: usize,
    lengths: SegmentLengths,
    index: usize,
    version: NitfVersion,
    trace: bool,
    warnings: &mut Vec<Warning>,
) -> Result<ImageRecord> {
    let subheader = offset
        .checked_add(lengths.header)
        .and_then(|end| buffer.get(offset..end))
        .ok_or_else(|| Error::TruncatedSegment {
            kind: SegmentKind::Image,
            index,
            offset,
            needed: lengths.header,
            available: buffer.len().saturating_sub(offset),
        })?;

    let mut reader = FieldReader::with_base(subheader, offset).tracing(trace);
    let blob = walk(&mut reader, version.layout())?;

    if reader.position() != lengths.header {
        warn!(
            index,
            declared = lengths.header,
            parsed = reader.position(),
            "image subheader length mismatch"
        );
        warnings.push(Warning::ImageHeaderLengthMismatch {
            index,
            declared: lengths.header,
            parsed: reader.position(),
        });
    }

    let (tres, warning) = segment_tres(&blob, TreScope::Image(index));
    warnings.extend(warning);
    debug!(index, offset, tres = tres.len(), "image subheader");

    Ok(ImageRecord {
        index,
        offset,
        data_length: lengths.data,
        subheader: subheader.to_vec(),
        tres,
    })
}

/// Parse the selected image segments, the first starting at `offset`.
///
/// Offsets advance over every image segment whether it is selected or not.
pub(crate) fn parse_images(
    buffer: &[u8],
    offset: usize,
    lengths: &[SegmentLengths],
    selection: ImageSelection,
    version: NitfVersion,
    trace: bool,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<ImageRecord>> {
    let mut images = Vec::new();
    let mut cursor = offset;

    for (index, entry) in lengths.iter().enumerate() {
        if selection.selects(index) {
            images.push(parse_image(buffer, cursor, *entry, index, version, trace, warnings)?);
        }
        cursor = cursor.saturating_add(entry.total());
    }

    Ok(images)
}
