//! File header parsing
//!
//! The fixed fields are followed by `FL` (12 digits) and `HL` (6 digits), the
//! segment tables and two extension areas. Each segment table is a three digit
//! count followed by that many header and data length pairs:
//!
//! | Table         | Count  | Header length | Data length |
//! |---------------|--------|---------------|-------------|
//! | images        | NUMI   | LISHnnn 6     | LInnn 10    |
//! | graphics      | NUMS   | LSSHnnn 4     | LSnnn 6     |
//! | labels (2.0)  | NUML   | LLSHnnn 4     | LLnnn 3     |
//! | text          | NUMT   | LTSHnnn 4     | LTnnn 5     |
//! | DES           | NUMDES | LDSHnnn 4     | LDnnn 9     |
//! | reserved      | NUMRES | LRESHnnn 4    | LREnnn 7    |
//!
//! In 2.1 the label table is replaced by `NUMX`, a reserved three byte field
//! with no entries after it, whatever its value.

use tracing::{debug, warn};

use crate::error::{Error, Result, Warning};
use crate::field::{read_text, FieldReader, Fields, EXTENDED_HEADER, USER_HEADER};
use crate::tre::{segment_tres, TreRecord, TreScope};
use crate::types::{SegmentLengths, SegmentTables};
use crate::version::{HeaderTable, Layout, NitfVersion, SegmentKind, DOWNGRADE_EVENT};

pub(crate) const FILE_LENGTH_WIDTH: usize = 12;
pub(crate) const HEADER_LENGTH_WIDTH: usize = 6;
pub(crate) const COUNT_WIDTH: usize = 3;

/// `FL` and `HL`, which close the fixed part of the header
struct Lengths {
    file_length: u64,
    header_length: usize,
}

/// Segment tables and TRE data that follow `HL`
struct Tables {
    segments: SegmentTables,
    tre_data: Vec<u8>,
}

fn walk_lengths(reader: &mut FieldReader<'_>, layout: &Layout) -> Result<Lengths> {
    reader.walk(layout.file_prefix)?;
    if let Some(downgrade) = &layout.file_downgrade {
        if reader.text(downgrade.field.name, downgrade.field.width)? == DOWNGRADE_EVENT {
            reader.text(downgrade.event.name, downgrade.event.width)?;
        }
    }
    reader.walk(layout.file_suffix)?;

    Ok(Lengths {
        file_length: reader.int("FL", FILE_LENGTH_WIDTH)? as u64,
        header_length: reader.int("HL", HEADER_LENGTH_WIDTH)?,
    })
}

fn walk_tables(reader: &mut FieldReader<'_>, layout: &Layout) -> Result<Tables> {
    let mut segments = SegmentTables::default();
    for entry in &layout.header_tables {
        let table = match entry {
            HeaderTable::Segments(table) => table,
            HeaderTable::Spacer(spacer) => {
                reader.text(spacer.name, spacer.width)?;
                continue;
            }
        };

        let count = reader.int(table.count, COUNT_WIDTH)?;
        let mut lengths = Vec::with_capacity(count);
        for n in 1..=count {
            let header = reader.int(&format!("{}{n:03}", table.header), table.header_width)?;
            let data = reader.int(&format!("{}{n:03}", table.data), table.data_width)?;
            lengths.push(SegmentLengths::new(header, data));
        }
        segments.insert(table.kind, lengths);
    }

    let mut tre_data = reader.extension(&USER_HEADER)?.to_vec();
    tre_data.extend_from_slice(reader.extension(&EXTENDED_HEADER)?);

    Ok(Tables { segments, tre_data })
}

/// What the file header says about the rest of the file
#[derive(Debug)]
pub(crate) struct FileHeader {
    pub file_header: Vec<u8>,
    pub file_length: u64,
    pub header_length: usize,
    pub segments: SegmentTables,
    pub des_offset: usize,
    pub file_tres: Vec<TreRecord>,
}

/// Parse the file header at the start of `buffer`.
///
/// `file_size` is the size of the file on disk. Findings that do not stop
/// the parse are pushed onto `warnings`.
pub(crate) fn parse_file_header(
    buffer: &[u8],
    file_size: u64,
    version: NitfVersion,
    trace: bool,
    warnings: &mut Vec<Warning>,
) -> Result<FileHeader> {
    let signature = read_text(buffer, 0, version.signature().len())?;
    if signature != version.signature() {
        warn!(expected = version.format_tag(), "file signature does not match");
        warnings.push(Warning::SignatureMismatch {
            expected: version.format_tag(),
            found: String::from_utf8_lossy(signature).into_owned(),
        });
    }

    let layout = version.layout();
    let mut reader = FieldReader::new(buffer).tracing(trace);
    let Lengths {
        file_length,
        header_length,
    } = walk_lengths(&mut reader, layout)?;

    if file_length != file_size {
        warn!(declared = file_length, actual = file_size, "file length mismatch");
        warnings.push(Warning::FileLengthMismatch {
            declared: file_length,
            actual: file_size,
        });
    }

    if file_size < header_length as u64 {
        warn!(header_length, actual = file_size, "file is shorter than its header");
        warnings.push(Warning::ShortFile {
            header_length,
            actual: file_size,
        });
    }

    let Tables { segments, tre_data } = walk_tables(&mut reader, layout)?;

    if reader.position() != header_length {
        return Err(Error::HeaderLengthMismatch {
            declared: header_length,
            parsed: reader.position(),
        });
    }

    let des_offset = header_length.saturating_add(segments.total_where(SegmentKind::precedes_des));
    let segments_end = header_length.saturating_add(segments.total_where(|_| true)) as u64;
    if segments_end != file_length {
        warn!(
            declared = file_length,
            segments_end, "segment lengths do not add up to the file length"
        );
        warnings.push(Warning::SegmentLengthMismatch {
            declared: file_length,
            segments_end,
        });
    }

    let (file_tres, warning) = segment_tres(&tre_data, TreScope::File);
    warnings.extend(warning);

    debug!(
        file_length,
        header_length,
        des_offset,
        tres = file_tres.len(),
        "file header"
    );

    Ok(FileHeader {
        file_header: buffer[..header_length].to_vec(),
        file_length,
        header_length,
        segments,
        des_offset,
        file_tres,
    })
}

/// List every field of a raw file header
pub(crate) fn fields(file_header: &[u8], version: NitfVersion) -> Result<Fields> {
    let layout = version.layout();
    let mut reader = FieldReader::new(file_header).recording(true);
    walk_lengths(&mut reader, layout)?;
    walk_tables(&mut reader, layout)?;
    Ok(reader.into_fields().unwrap_or_default())
}
