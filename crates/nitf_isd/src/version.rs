//! Per-version layout of the NITF file header and image subheader
//!
//! NITF 2.0 and 2.1 share one parsing algorithm. What differs is captured in
//! a [`Layout`]: the fixed fields before the length fields, the optional
//! classification downgrade event, the image coordinate marker and the names
//! and widths of the header tables.

use derive_more::Display;

use crate::field::FieldSpec;

/// Classification downgrade value that adds a 40 byte downgrade event field
pub(crate) const DOWNGRADE_EVENT: &[u8] = b"999998";

/// NITF versions understood by this library
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NitfVersion {
    #[display("NITF2.0")]
    V20,
    #[display("NITF2.1")]
    V21,
}

impl NitfVersion {
    /// The nine byte `FHDR` + `FVER` signature that opens the file
    pub const fn signature(self) -> &'static [u8; 9] {
        match self {
            NitfVersion::V20 => b"NITF02.00",
            NitfVersion::V21 => b"NITF02.10",
        }
    }

    /// Format tag handed to sensor model plugins
    pub const fn format_tag(self) -> &'static str {
        match self {
            NitfVersion::V20 => "NITF2.0",
            NitfVersion::V21 => "NITF2.1",
        }
    }

    /// Detect the version from the leading signature
    pub fn detect(buffer: &[u8]) -> Option<Self> {
        [NitfVersion::V21, NitfVersion::V20]
            .into_iter()
            .find(|version| buffer.starts_with(version.signature()))
    }

    pub(crate) fn layout(self) -> &'static Layout {
        match self {
            NitfVersion::V20 => &V20,
            NitfVersion::V21 => &V21,
        }
    }
}

/// Kinds of segment declared by the file header length tables
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SegmentKind {
    #[display("image")]
    Image,
    #[display("graphic")]
    Graphic,
    /// Labels, 2.0 only
    #[display("label")]
    Label,
    #[display("text")]
    Text,
    #[display("data extension")]
    DataExtension,
    #[display("reserved extension")]
    ReservedExtension,
}

impl SegmentKind {
    /// Segments that lie between the file header and the first DES
    pub const fn precedes_des(self) -> bool {
        matches!(
            self,
            SegmentKind::Image | SegmentKind::Graphic | SegmentKind::Label | SegmentKind::Text
        )
    }
}

/// A segment count field followed by `count` header and data length pairs
#[derive(Debug)]
pub(crate) struct SegmentTable {
    pub kind: SegmentKind,
    pub count: &'static str,
    pub header: &'static str,
    pub header_width: usize,
    pub data: &'static str,
    pub data_width: usize,
}

impl SegmentTable {
    const fn new(
        kind: SegmentKind,
        count: &'static str,
        (header, header_width): (&'static str, usize),
        (data, data_width): (&'static str, usize),
    ) -> Self {
        Self {
            kind,
            count,
            header,
            header_width,
            data,
            data_width,
        }
    }
}

/// One entry in the run of tables after `HL`
#[derive(Debug)]
pub(crate) enum HeaderTable {
    Segments(SegmentTable),
    /// A reserved count field with no entries after it
    Spacer(FieldSpec),
}

impl HeaderTable {
    pub fn segments(&self) -> Option<&SegmentTable> {
        match self {
            HeaderTable::Segments(table) => Some(table),
            HeaderTable::Spacer(_) => None,
        }
    }
}

/// A classification downgrade field and the event field it can add
#[derive(Debug)]
pub(crate) struct Downgrade {
    pub field: FieldSpec,
    pub event: FieldSpec,
}

#[derive(Debug)]
pub(crate) struct Layout {
    /// Fields from `FHDR` up to the downgrade field
    pub file_prefix: &'static [FieldSpec],
    pub file_downgrade: Option<Downgrade>,
    /// Fields after the downgrade up to `FL`
    pub file_suffix: &'static [FieldSpec],
    /// Fields from `IM` up to the downgrade field
    pub image_prefix: &'static [FieldSpec],
    pub image_downgrade: Option<Downgrade>,
    /// Fields after the downgrade up to `ICORDS`
    pub image_suffix: &'static [FieldSpec],
    /// `ICORDS` value meaning no `IGEOLO` follows
    pub icords_absent: u8,
    /// Whether `NBANDS` of zero is followed by a five digit `XBANDS`
    pub extended_bands: bool,
    pub header_tables: [HeaderTable; 6],
}

impl Layout {
    /// Segment tables in file order, spacers left out
    pub fn segment_tables(&self) -> impl Iterator<Item = &SegmentTable> {
        self.header_tables.iter().filter_map(HeaderTable::segments)
    }

    pub fn declares(&self, kind: SegmentKind) -> bool {
        self.segment_tables().any(|table| table.kind == kind)
    }
}

const fn f(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, width)
}

const fn table(
    kind: SegmentKind,
    count: &'static str,
    header: (&'static str, usize),
    data: (&'static str, usize),
) -> HeaderTable {
    HeaderTable::Segments(SegmentTable::new(kind, count, header, data))
}

static V21: Layout = Layout {
    file_prefix: &[
        f("FHDR", 4),
        f("FVER", 5),
        f("CLEVEL", 2),
        f("STYPE", 4),
        f("OSTAID", 10),
        f("FDT", 14),
        f("FTITLE", 80),
        f("FSCLAS", 1),
        f("FSCLSY", 2),
        f("FSCODE", 11),
        f("FSCTLH", 2),
        f("FSREL", 20),
        f("FSDCTP", 2),
        f("FSDCDT", 8),
        f("FSDCXM", 4),
        f("FSDG", 1),
        f("FSDGDT", 8),
        f("FSCLTX", 43),
        f("FSCATP", 1),
        f("FSCAUT", 40),
        f("FSCRSN", 1),
        f("FSSRDT", 8),
        f("FSCTLN", 15),
    ],
    file_downgrade: None,
    file_suffix: &[
        f("FSCOP", 5),
        f("FSCPYS", 5),
        f("ENCRYP", 1),
        f("FBKGC", 3),
        f("ONAME", 24),
        f("OPHONE", 18),
    ],
    image_prefix: &[
        f("IM", 2),
        f("IID1", 10),
        f("IDATIM", 14),
        f("TGTID", 17),
        f("IID2", 80),
        f("ISCLAS", 1),
        f("ISCLSY", 2),
        f("ISCODE", 11),
        f("ISCTLH", 2),
        f("ISREL", 20),
        f("ISDCTP", 2),
        f("ISDCDT", 8),
        f("ISDCXM", 4),
        f("ISDG", 1),
        f("ISDGDT", 8),
        f("ISCLTX", 43),
        f("ISCATP", 1),
        f("ISCAUT", 40),
        f("ISCRSN", 1),
        f("ISSRDT", 8),
        f("ISCTLN", 15),
    ],
    image_downgrade: None,
    image_suffix: &[
        f("ENCRYP", 1),
        f("ISORCE", 42),
        f("NROWS", 8),
        f("NCOLS", 8),
        f("PVTYPE", 3),
        f("IREP", 8),
        f("ICAT", 8),
        f("ABPP", 2),
        f("PJUST", 1),
    ],
    icords_absent: b' ',
    extended_bands: true,
    header_tables: [
        table(SegmentKind::Image, "NUMI", ("LISH", 6), ("LI", 10)),
        table(SegmentKind::Graphic, "NUMS", ("LSSH", 4), ("LS", 6)),
        HeaderTable::Spacer(f("NUMX", 3)),
        table(SegmentKind::Text, "NUMT", ("LTSH", 4), ("LT", 5)),
        table(SegmentKind::DataExtension, "NUMDES", ("LDSH", 4), ("LD", 9)),
        table(SegmentKind::ReservedExtension, "NUMRES", ("LRESH", 4), ("LRE", 7)),
    ],
};

static V20: Layout = Layout {
    file_prefix: &[
        f("FHDR", 4),
        f("FVER", 5),
        f("CLEVEL", 2),
        f("STYPE", 4),
        f("OSTAID", 10),
        f("FDT", 14),
        f("FTITLE", 80),
        f("FSCLAS", 1),
        f("FSCODE", 40),
        f("FSCTLH", 40),
        f("FSREL", 40),
        f("FSCAUT", 20),
        f("FSCTLN", 20),
    ],
    file_downgrade: Some(Downgrade {
        field: f("FSDWNG", 6),
        event: f("FSDEVT", 40),
    }),
    file_suffix: &[
        f("FSCOP", 5),
        f("FSCPYS", 5),
        f("ENCRYP", 1),
        f("ONAME", 27),
        f("OPHONE", 18),
    ],
    image_prefix: &[
        f("IM", 2),
        f("IID", 10),
        f("IDATIM", 14),
        f("TGTID", 17),
        f("ITITLE", 80),
        f("ISCLAS", 1),
        f("ISCODE", 40),
        f("ISCTLH", 40),
        f("ISREL", 40),
        f("ISCAUT", 20),
        f("ISCTLN", 20),
    ],
    image_downgrade: Some(Downgrade {
        field: f("ISDWNG", 6),
        event: f("ISDEVT", 40),
    }),
    image_suffix: &[
        f("ENCRYP", 1),
        f("ISORCE", 42),
        f("NROWS", 8),
        f("NCOLS", 8),
        f("PVTYPE", 3),
        f("IREP", 8),
        f("ICAT", 8),
        f("ABPP", 2),
        f("PJUST", 1),
    ],
    icords_absent: b'N',
    extended_bands: false,
    header_tables: [
        table(SegmentKind::Image, "NUMI", ("LISH", 6), ("LI", 10)),
        table(SegmentKind::Graphic, "NUMS", ("LSSH", 4), ("LS", 6)),
        table(SegmentKind::Label, "NUML", ("LLSH", 4), ("LL", 3)),
        table(SegmentKind::Text, "NUMT", ("LTSH", 4), ("LT", 5)),
        table(SegmentKind::DataExtension, "NUMDES", ("LDSH", 4), ("LD", 9)),
        table(SegmentKind::ReservedExtension, "NUMRES", ("LRESH", 4), ("LRE", 7)),
    ],
};
