//! Entry points for reading Image Support Data
//!

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, instrument};

use crate::des::extract_des;
use crate::error::{Error, Result};
use crate::header::parse_file_header;
use crate::image::parse_images;
use crate::types::{IsdFile, ParseOptions};
use crate::version::{NitfVersion, SegmentKind};

/// Read a whole file into an owned buffer.
///
/// The buffer is sized from the file metadata up front so an allocation
/// failure is reported instead of aborting.
pub fn fill_buffer(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let file_read = |cause| Error::FileRead {
        path: path.to_path_buf(),
        cause,
    };

    let mut file = File::open(path).map_err(file_read)?;
    let size = file.metadata().map_err(file_read)?.len();

    let mut buffer = Vec::new();
    let requested = usize::try_from(size).unwrap_or(usize::MAX);
    buffer
        .try_reserve_exact(requested)
        .map_err(|cause| Error::Memory {
            requested: size,
            cause,
        })?;
    file.read_to_end(&mut buffer).map_err(file_read)?;

    debug!(path = %path.display(), size = buffer.len(), "read file");
    Ok(buffer)
}

/// Parse the NITF file at `path`
///
/// ```no_run
/// use nitf_isd::{parse_file, ParseOptions};
///
/// fn list_tres(path: &str) -> nitf_isd::error::Result<()> {
///     let isd = parse_file(path, &ParseOptions::default())?;
///
///     for tre in isd.all_tres() {
///         println!("{} {}", tre.tag(), tre.length());
///     }
///
///     Ok(())
/// }
/// ```
#[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<IsdFile> {
    let buffer = fill_buffer(path)?;
    parse_bytes(&buffer, options)
}

/// Parse a NITF file already held in memory
#[instrument(skip_all, fields(size = buffer.len()), err)]
pub fn parse_bytes(buffer: &[u8], options: &ParseOptions) -> Result<IsdFile> {
    let version = match options.version {
        Some(version) => version,
        None => NitfVersion::detect(buffer).ok_or_else(|| {
            let found = buffer.get(..9).unwrap_or(buffer);
            Error::UnsupportedFormat(String::from_utf8_lossy(found).into_owned())
        })?,
    };
    debug!(%version, "parsing");

    let mut warnings = Vec::new();
    let header = parse_file_header(
        buffer,
        buffer.len() as u64,
        version,
        options.trace_fields,
        &mut warnings,
    )?;

    let images = parse_images(
        buffer,
        header.header_length,
        header.segments.get(SegmentKind::Image),
        options.selection,
        version,
        options.trace_fields,
        &mut warnings,
    )?;

    let des_records = extract_des(
        buffer,
        header.des_offset,
        header.segments.get(SegmentKind::DataExtension),
    )?;

    Ok(IsdFile {
        version,
        file_header: header.file_header,
        file_length: header.file_length,
        header_length: header.header_length,
        segments: header.segments,
        des_offset: header.des_offset,
        file_tres: header.file_tres,
        images,
        des_records,
        warnings,
    })
}
