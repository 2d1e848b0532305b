//! Tagged Record Extension framing
//!
//! A TRE blob is a run of records packed back to back with no padding:
//!
//! | Offset | Field  | Description                                   |
//! |--------|--------|-----------------------------------------------|
//! | 0      | CETAG  | 6 bytes: record tag, space padded             |
//! | 6      | CEL    | 5 bytes: ASCII decimal length of the payload  |
//! | 11     | CEDATA | `CEL` bytes: payload                          |

use std::borrow::Cow;

use derive_more::Display;
use tracing::{trace, warn};
use winnow::combinator::seq;
use winnow::prelude::*;
use winnow::token::take;
use winnow::PResult;

use crate::error::{Error, Result, Warning};
use crate::field::parse_uint;

pub const TAG_WIDTH: usize = 6;
pub const LENGTH_WIDTH: usize = 5;
const MAX_PAYLOAD: usize = 99_999;

/// Where a TRE blob was found
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TreScope {
    #[display("file")]
    File,
    #[display("image {_0}")]
    Image(usize),
}

/// A single tagged record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreRecord {
    tag: [u8; TAG_WIDTH],
    payload: Vec<u8>,
}

impl TreRecord {
    /// Create a record, failing when the payload cannot be framed
    pub fn new(tag: [u8; TAG_WIDTH], payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::TrePayloadTooLong {
                tag: String::from_utf8_lossy(&tag).into_owned(),
                length: payload.len(),
            });
        }
        Ok(Self { tag, payload })
    }

    pub fn tag_bytes(&self) -> &[u8; TAG_WIDTH] {
        &self.tag
    }

    /// The tag as text, padding included
    pub fn tag(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.tag)
    }

    /// Payload byte count
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text with trailing NUL padding removed, for display only
    pub fn payload_text(&self) -> Cow<'_, str> {
        let end = self
            .payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.payload[..end])
    }

    /// Size of the framed record
    pub fn framed_len(&self) -> usize {
        TAG_WIDTH + LENGTH_WIDTH + self.payload.len()
    }

    /// Render the record back into its framed form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.framed_len());
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(format!("{:05}", self.payload.len()).as_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

struct TreFrame<'s> {
    tag: &'s [u8],
    length: usize,
    payload: &'s [u8],
}

fn tre_frame<'s>(s: &mut &'s [u8]) -> PResult<TreFrame<'s>> {
    seq!(TreFrame {
        tag: take(TAG_WIDTH),
        length: take(LENGTH_WIDTH).verify_map(parse_uint),
        payload: take(length),
    })
    .parse_next(s)
}

impl From<TreFrame<'_>> for TreRecord {
    fn from(frame: TreFrame<'_>) -> Self {
        let mut tag = [b' '; TAG_WIDTH];
        tag.copy_from_slice(frame.tag);
        debug_assert_eq!(frame.length, frame.payload.len());
        Self {
            tag,
            payload: frame.payload.to_vec(),
        }
    }
}

/// Split a TRE blob into records.
///
/// Data that cannot be framed stops the split. Every record read before that
/// point is still returned, together with a [`Warning::TrailingTreBytes`].
pub fn segment_tres(blob: &[u8], scope: TreScope) -> (Vec<TreRecord>, Option<Warning>) {
    let mut input = blob;
    let mut records = Vec::new();

    while !input.is_empty() {
        let offset = blob.len() - input.len();
        match tre_frame.parse_next(&mut input) {
            Ok(frame) => {
                trace!(%scope, offset, length = frame.length, "tre record");
                records.push(TreRecord::from(frame));
            }
            Err(_) => {
                let remaining = blob.len() - offset;
                warn!(%scope, offset, remaining, "tre data could not be framed");
                return (
                    records,
                    Some(Warning::TrailingTreBytes {
                        scope,
                        offset,
                        remaining,
                    }),
                );
            }
        }
    }

    (records, None)
}

/// Concatenate records back into one blob
pub fn render_tres<'a>(records: impl IntoIterator<Item = &'a TreRecord>) -> Vec<u8> {
    records.into_iter().flat_map(TreRecord::to_bytes).collect()
}
