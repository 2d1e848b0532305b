//! Types for writing minimal NITF files
//!
//! The writer fills every field it is not told about with a plausible default
//! and computes `FL`, `HL` and the segment length tables, so the files it
//! produces have exactly the layout the parser expects.

use std::io::Write;

use bon::Builder;
use indexmap::IndexMap;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::field::{
    ExtensionArea, FieldSpec, EXTENDED_HEADER, EXTENDED_IMAGE, USER_HEADER, USER_IMAGE,
};
use crate::header::{COUNT_WIDTH, FILE_LENGTH_WIDTH, HEADER_LENGTH_WIDTH};
use crate::image::{has_compression_rate, BLOCKING, COMMENT_WIDTH, GEOLO_WIDTH};
use crate::tre::{render_tres, TreRecord};
use crate::version::{Downgrade, HeaderTable, NitfVersion, SegmentKind, DOWNGRADE_EVENT};

/// Options for how the NITF file should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct WriterOptions {
    #[builder(default = NitfVersion::V21)]
    pub version: NitfVersion,

    /// Add a classification downgrade event to a 2.0 file header
    #[builder(default)]
    pub downgrade_event: bool,
}

/// An image segment to be written
#[derive(Debug, Clone, Builder)]
pub struct ImageSegment {
    /// TREs written to the user defined image data
    #[builder(default)]
    pub tres: Vec<TreRecord>,

    /// Image comments, at most nine
    #[builder(default)]
    pub comments: Vec<String>,

    /// Geographic corner coordinates, written with `ICORDS` of `G`
    pub coordinates: Option<String>,

    /// `IC` compression code
    #[builder(default = *b"NC")]
    pub compression: [u8; 2],

    /// Look-up tables of each band. All tables of a band share a length.
    #[builder(default = vec![Vec::new()])]
    pub bands: Vec<Vec<Vec<u8>>>,

    /// Add a classification downgrade event to a 2.0 subheader
    #[builder(default)]
    pub downgrade_event: bool,

    /// Pixel data
    #[builder(default)]
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct FieldWriter {
    out: Vec<u8>,
}

impl FieldWriter {
    /// Write `value` padded with spaces, or cut, to `width`
    fn text(&mut self, value: &[u8], width: usize) {
        let kept = value.len().min(width);
        self.out.extend_from_slice(&value[..kept]);
        self.out.resize(self.out.len() + width - kept, b' ');
    }

    fn int(&mut self, name: &str, value: usize, width: usize) -> Result<()> {
        let digits = format!("{value:0width$}");
        if digits.len() > width {
            return Err(Error::FieldTooWide {
                name: name.to_owned(),
                value,
                width,
            });
        }
        self.out.extend_from_slice(digits.as_bytes());
        Ok(())
    }

    fn fixed(&mut self, specs: &[FieldSpec], version: NitfVersion) {
        for spec in specs {
            self.text(default_value(spec.name, version), spec.width);
        }
    }

    fn downgrade(&mut self, downgrade: Option<&Downgrade>, event: bool) {
        if let Some(downgrade) = downgrade {
            if event {
                self.text(DOWNGRADE_EVENT, downgrade.field.width);
                self.text(b"", downgrade.event.width);
            } else {
                self.text(b"", downgrade.field.width);
            }
        }
    }

    fn extension(&mut self, area: &ExtensionArea, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return self.int(area.length, 0, 5);
        }
        self.int(area.length, data.len() + 3, 5)?;
        self.int(area.overflow, 0, 3)?;
        self.out.extend_from_slice(data);
        Ok(())
    }
}

fn default_value(name: &str, version: NitfVersion) -> &'static [u8] {
    match name {
        "FHDR" => b"NITF",
        "FVER" => &version.signature()[4..],
        "CLEVEL" => b"03",
        "STYPE" => b"BF01",
        "OSTAID" => b"NITFISD",
        "FDT" | "IDATIM" => b"20241016000000",
        "FSCLAS" | "ISCLAS" => b"U",
        "FSCOP" | "FSCPYS" => b"00000",
        "ENCRYP" => b"0",
        "IM" => b"IM",
        "NROWS" | "NCOLS" => b"00000001",
        "PVTYPE" => b"INT",
        "IREP" => b"MONO",
        "ABPP" | "NBPP" => b"08",
        "PJUST" => b"R",
        "ISYNC" => b"0",
        "IMODE" => b"B",
        "NBPR" | "NBPC" | "NPPBH" | "NPPBV" => b"0001",
        "IDLVL" => b"001",
        "IALVL" => b"000",
        "ILOC" => b"0000000000",
        "IMAG" => b"1.0",
        _ => b"",
    }
}

impl ImageSegment {
    /// Render the image subheader
    pub fn subheader(&self, version: NitfVersion) -> Result<Vec<u8>> {
        let layout = version.layout();
        let mut w = FieldWriter::default();

        w.fixed(layout.image_prefix, version);
        w.downgrade(layout.image_downgrade.as_ref(), self.downgrade_event);
        w.fixed(layout.image_suffix, version);

        match &self.coordinates {
            Some(coordinates) => {
                w.text(b"G", 1);
                w.text(coordinates.as_bytes(), GEOLO_WIDTH);
            }
            None => w.text(&[layout.icords_absent], 1),
        }

        w.int("NICOM", self.comments.len(), 1)?;
        for comment in &self.comments {
            w.text(comment.as_bytes(), COMMENT_WIDTH);
        }

        w.text(&self.compression, 2);
        if has_compression_rate(&self.compression) {
            w.text(b"1.50", 4);
        }

        if layout.extended_bands && (self.bands.is_empty() || self.bands.len() > 9) {
            w.int("NBANDS", 0, 1)?;
            w.int("XBANDS", self.bands.len(), 5)?;
        } else {
            w.int("NBANDS", self.bands.len(), 1)?;
        }
        for luts in &self.bands {
            w.text(b"M", 2);
            w.text(b"", 6);
            w.text(b"N", 1);
            w.text(b"", 3);
            w.int("NLUTS", luts.len(), 1)?;
            if let Some(first) = luts.first() {
                w.int("NELUT", first.len(), 5)?;
                for lut in luts {
                    w.text(lut, first.len());
                }
            }
        }

        w.fixed(BLOCKING, version);
        w.extension(&USER_IMAGE, &render_tres(&self.tres))?;
        w.extension(&EXTENDED_IMAGE, &[])?;

        Ok(w.out)
    }
}

/// NITF file generator
///
/// ```
/// # fn doit() -> nitf_isd::error::Result<()>
/// # {
/// use nitf_isd::tre::TreRecord;
/// use nitf_isd::write::{ImageSegment, NitfWriter, WriterOptions};
///
/// let mut nitf = NitfWriter::new(WriterOptions::builder().build());
///
/// nitf.add_image(
///     &ImageSegment::builder()
///         .tres(vec![TreRecord::new(*b"TEST  ", "hello")?])
///         .data(vec![0u8; 64])
///         .build(),
/// )?;
/// nitf.add_des(b"DEXML_DATA_CONTENT".to_vec(), b"<SICD/>".to_vec());
///
/// let bytes = nitf.to_bytes()?;
/// assert!(bytes.starts_with(b"NITF02.10"));
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NitfWriter {
    options: WriterOptions,
    file_tres: Vec<TreRecord>,
    segments: IndexMap<SegmentKind, Vec<(Vec<u8>, Vec<u8>)>>,
}

impl NitfWriter {
    pub fn new(options: WriterOptions) -> NitfWriter {
        NitfWriter {
            options,
            file_tres: Vec::new(),
            segments: IndexMap::new(),
        }
    }

    /// Add a TRE to the user defined header data
    pub fn add_file_tre(&mut self, tre: TreRecord) {
        self.file_tres.push(tre);
    }

    /// Add an image segment, rendering its subheader for the target version
    pub fn add_image(&mut self, image: &ImageSegment) -> Result<()> {
        let header = image.subheader(self.options.version)?;
        self.add_segment(SegmentKind::Image, header, image.data.clone());
        Ok(())
    }

    /// Add a data extension segment
    pub fn add_des(&mut self, header: Vec<u8>, data: Vec<u8>) {
        self.add_segment(SegmentKind::DataExtension, header, data);
    }

    /// Add a segment with an opaque subheader.
    ///
    /// Label segments only exist in 2.0 files. Rendering a 2.1 file that has
    /// any fails with [`Error::UndeclaredSegment`].
    pub fn add_segment(&mut self, kind: SegmentKind, header: Vec<u8>, data: Vec<u8>) {
        self.segments.entry(kind).or_default().push((header, data));
    }

    /// Render the complete file
    #[instrument(skip(self), err)]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let version = self.options.version;
        let layout = version.layout();

        if let Some(kind) = self.segments.keys().find(|kind| !layout.declares(**kind)) {
            return Err(Error::UndeclaredSegment {
                kind: *kind,
                version,
            });
        }

        let mut tables = FieldWriter::default();
        for entry in &layout.header_tables {
            let table = match entry {
                HeaderTable::Segments(table) => table,
                HeaderTable::Spacer(spacer) => {
                    tables.int(spacer.name, 0, spacer.width)?;
                    continue;
                }
            };
            let entries = self
                .segments
                .get(&table.kind)
                .map(Vec::as_slice)
                .unwrap_or_default();
            tables.int(table.count, entries.len(), COUNT_WIDTH)?;
            for (subheader, data) in entries {
                tables.int(table.header, subheader.len(), table.header_width)?;
                tables.int(table.data, data.len(), table.data_width)?;
            }
        }
        tables.extension(&USER_HEADER, &render_tres(&self.file_tres))?;
        tables.extension(&EXTENDED_HEADER, &[])?;

        let mut header = FieldWriter::default();
        header.fixed(layout.file_prefix, version);
        header.downgrade(layout.file_downgrade.as_ref(), self.options.downgrade_event);
        header.fixed(layout.file_suffix, version);

        let header_length =
            header.out.len() + FILE_LENGTH_WIDTH + HEADER_LENGTH_WIDTH + tables.out.len();
        let file_length = layout
            .segment_tables()
            .filter_map(|table| self.segments.get(&table.kind))
            .flatten()
            .fold(header_length, |acc, (subheader, data)| acc + subheader.len() + data.len());

        header.int("FL", file_length, FILE_LENGTH_WIDTH)?;
        header.int("HL", header_length, HEADER_LENGTH_WIDTH)?;

        let mut out = Vec::with_capacity(file_length);
        out.extend_from_slice(&header.out);
        out.extend_from_slice(&tables.out);
        for table in layout.segment_tables() {
            for (subheader, data) in self.segments.get(&table.kind).into_iter().flatten() {
                out.extend_from_slice(subheader);
                out.extend_from_slice(data);
            }
        }

        Ok(out)
    }

    /// Write the complete file to `writer`
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}
