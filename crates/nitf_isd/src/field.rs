//! Fixed-width ASCII field access
//!
//! Every read of a header field, through [`read_text`], [`read_int`] or a
//! [`FieldReader`], checks `offset + width` against the end of the data in one
//! place before any byte is touched.

use derive_more::{Deref, IntoIterator};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};

/// Name and width of a fixed-width header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, width: usize) -> Self {
        Self { name, width }
    }
}

const OVERFLOW_WIDTH: usize = 3;

/// Field names of a length prefixed extension area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionArea {
    pub length: &'static str,
    pub overflow: &'static str,
    pub data: &'static str,
}

pub(crate) const USER_HEADER: ExtensionArea = ExtensionArea {
    length: "UDHDL",
    overflow: "UDHOFL",
    data: "UDHD",
};
pub(crate) const EXTENDED_HEADER: ExtensionArea = ExtensionArea {
    length: "XHDL",
    overflow: "XHDOFL",
    data: "XHD",
};
pub(crate) const USER_IMAGE: ExtensionArea = ExtensionArea {
    length: "UDIDL",
    overflow: "UDOFL",
    data: "UDID",
};
pub(crate) const EXTENDED_IMAGE: ExtensionArea = ExtensionArea {
    length: "IXSHDL",
    overflow: "IXSOFL",
    data: "IXSHD",
};

/// A header field as it was read from the file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    /// Byte offset of the field from the start of the file
    pub offset: usize,
    pub width: usize,
    /// Raw field text, padding included
    pub value: String,
}

/// Header fields by name, in the order they appear in the file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, IntoIterator)]
#[into_iterator(owned, ref)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fields(IndexMap<String, Field>);

impl Fields {
    /// Value of a field with its padding removed
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|field| field.value.trim())
    }
}

fn trim_spaces(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Interpret ASCII digits, optionally padded with spaces, as an unsigned number.
///
/// A blank field reads as zero. Returns `None` for anything else that is not
/// a decimal digit, or for values that do not fit in a `usize`.
pub fn parse_uint(bytes: &[u8]) -> Option<usize> {
    trim_spaces(bytes).iter().try_fold(0usize, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
    })
}

fn slice<'a>(
    buffer: &'a [u8],
    base: usize,
    name: &str,
    offset: usize,
    width: usize,
) -> Result<&'a [u8]> {
    offset
        .checked_add(width)
        .and_then(|end| buffer.get(offset..end))
        .ok_or_else(|| Error::OutOfBounds {
            name: name.to_owned(),
            offset: base + offset,
            width,
            end: base + buffer.len(),
        })
}

fn number(name: &str, offset: usize, bytes: &[u8]) -> Result<usize> {
    parse_uint(bytes).ok_or_else(|| Error::InvalidNumber {
        name: name.to_owned(),
        offset,
        width: bytes.len(),
        value: String::from_utf8_lossy(bytes).into_owned(),
    })
}

/// Read `width` raw bytes at `offset`
pub fn read_text(buffer: &[u8], offset: usize, width: usize) -> Result<&[u8]> {
    slice(buffer, 0, "field", offset, width)
}

/// Read `width` ASCII digits at `offset` as an unsigned number
pub fn read_int(buffer: &[u8], offset: usize, width: usize) -> Result<usize> {
    number("field", offset, read_text(buffer, offset, width)?)
}

/// Sequential cursor over a header.
///
/// The cursor can log each field as it is read and can record every named
/// field into [`Fields`], so a listing of the header comes from the same walk
/// that parses it.
#[derive(Debug)]
pub struct FieldReader<'a> {
    buffer: &'a [u8],
    base: usize,
    position: usize,
    trace: bool,
    fields: Option<Fields>,
}

impl<'a> FieldReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_base(buffer, 0)
    }

    /// A reader over `buffer`, which starts `base` bytes into the file
    pub fn with_base(buffer: &'a [u8], base: usize) -> Self {
        Self {
            buffer,
            base,
            position: 0,
            trace: false,
            fields: None,
        }
    }

    /// Log every field at debug level
    pub fn tracing(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Keep every named field for [`FieldReader::into_fields`]
    pub fn recording(mut self, record: bool) -> Self {
        self.fields = record.then(Fields::default);
        self
    }

    /// Cursor position relative to the start of the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Cursor position relative to the start of the file
    pub fn offset(&self) -> usize {
        self.base + self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Read a named field and advance past it
    pub fn text(&mut self, name: &str, width: usize) -> Result<&'a [u8]> {
        let bytes = slice(self.buffer, self.base, name, self.position, width)?;
        let offset = self.offset();
        self.position += width;

        if self.trace {
            debug!(offset, "{name} = {}", String::from_utf8_lossy(bytes));
        }

        if let Some(fields) = self.fields.as_mut() {
            fields.0.insert(
                name.to_owned(),
                Field {
                    offset,
                    width,
                    value: String::from_utf8_lossy(bytes).into_owned(),
                },
            );
        }

        Ok(bytes)
    }

    /// Read a named numeric field and advance past it
    pub fn int(&mut self, name: &str, width: usize) -> Result<usize> {
        let offset = self.offset();
        let bytes = self.text(name, width)?;
        number(name, offset, bytes)
    }

    /// Advance past `width` bytes that are not listed as a field
    pub fn skip(&mut self, name: &str, width: usize) -> Result<&'a [u8]> {
        let bytes = slice(self.buffer, self.base, name, self.position, width)?;
        self.position += width;
        Ok(bytes)
    }

    /// Read a run of fixed fields
    pub fn walk(&mut self, specs: &[FieldSpec]) -> Result<()> {
        for spec in specs {
            self.text(spec.name, spec.width)?;
        }
        Ok(())
    }

    /// Read a length prefixed extension area such as `UDHD` or `IXSHD`.
    ///
    /// A non-zero length covers a 3 byte overflow field plus the data. The
    /// overflow value points at a DES holding the rest of the data and is
    /// only logged.
    pub fn extension(&mut self, area: &ExtensionArea) -> Result<&'a [u8]> {
        let offset = self.offset();
        let length = self.int(area.length, 5)?;
        if length == 0 {
            return Ok(&[]);
        }
        if length < OVERFLOW_WIDTH {
            return Err(Error::InvalidExtensionLength {
                field: area.length,
                offset,
                length,
            });
        }

        let overflow = self.int(area.overflow, OVERFLOW_WIDTH)?;
        if overflow != 0 {
            debug!(field = area.overflow, overflow, "extension overflow not followed");
        }

        self.text(area.data, length - OVERFLOW_WIDTH)
    }

    pub fn into_fields(self) -> Option<Fields> {
        self.fields
    }
}
