//! Data Extension Segment extraction

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::SegmentLengths;

const DESID_START: usize = 2;
const DESID_END: usize = 27;

/// A data extension segment, subheader and data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesRecord {
    header: Vec<u8>,
    data: Vec<u8>,
}

impl DesRecord {
    pub fn new(header: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            header: header.into(),
            data: data.into(),
        }
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The `DESID` field of the subheader, trimmed
    ///
    /// Empty when the subheader is too short to hold one.
    pub fn type_id(&self) -> Cow<'_, str> {
        let end = self.header.len().min(DESID_END);
        let id = self.header.get(DESID_START..end).unwrap_or_default();
        match String::from_utf8_lossy(id) {
            Cow::Borrowed(text) => Cow::Borrowed(text.trim()),
            Cow::Owned(text) => Cow::Owned(text.trim().to_owned()),
        }
    }
}

/// Slice every DES out of `buffer`, starting at `offset`.
///
/// A DES that runs past the end of the buffer fails with
/// [`Error::TruncatedDes`], which keeps every record read before it.
pub fn extract_des(
    buffer: &[u8],
    offset: usize,
    lengths: &[SegmentLengths],
) -> Result<Vec<DesRecord>> {
    let mut records = Vec::with_capacity(lengths.len());
    let mut cursor = offset;

    for (index, entry) in lengths.iter().enumerate() {
        let needed = entry.header.saturating_add(entry.data);
        let end = cursor.saturating_add(needed);
        if end > buffer.len() {
            warn!(index, offset = cursor, needed, "data extension segment is truncated");
            return Err(Error::TruncatedDes {
                index,
                offset: cursor,
                needed,
                available: buffer.len().saturating_sub(cursor),
                recovered: records,
            });
        }

        let split = cursor + entry.header;
        let record = DesRecord::new(&buffer[cursor..split], &buffer[split..end]);
        debug!(index, offset = cursor, id = %record.type_id(), "data extension segment");
        records.push(record);
        cursor = end;
    }

    Ok(records)
}
