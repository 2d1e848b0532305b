//! This library extracts **Image Support Data** (ISD) from NITF 2.0 and 2.1 files.
//!
//! # NITF Format Documentation
//!
//! The National Imagery Transmission Format packs a file header, a series of
//! segments and their subheaders into one file. Every header field is fixed
//! width ASCII. Numbers are zero padded decimal digits. The number of segments
//! of each kind, and the length of each, are only known once the file header
//! has been read.
//!
//! ISD is everything except the pixels: the file header, every image subheader,
//! the Tagged Record Extensions (TREs) embedded in both, and the Data Extension
//! Segments (DES).
//!
//! ## File Structure
//!
//! | Part                 | Description                                              |
//! |----------------------|----------------------------------------------------------|
//! | File header          | `HL` bytes: fixed fields, segment tables, file TREs      |
//! | Image segments       | `NUMI` x (subheader `LISH` + pixels `LI`)                |
//! | Graphic segments     | `NUMS` x (`LSSH` + `LS`)                                 |
//! | Label segments       | `NUML` x (`LLSH` + `LL`), 2.0 only                       |
//! | Text segments        | `NUMT` x (`LTSH` + `LT`)                                 |
//! | Data extensions      | `NUMDES` x (`LDSH` + `LD`)                               |
//! | Reserved extensions  | `NUMRES` x (`LRESH` + `LRE`)                             |
//!
//! ### File Header
//!
//! | Offset (bytes) | Field   | Description                                              |
//! |----------------|---------|----------------------------------------------------------|
//! | 0              | FHDR    | 4 bytes: `NITF`                                          |
//! | 4              | FVER    | 5 bytes: `02.00` or `02.10`                              |
//! | 280            | FSDWNG  | 6 bytes, 2.0 only: `999998` adds the 40 byte `FSDEVT`    |
//! | 342 (+40)      | FL      | 12 bytes: length of the whole file                       |
//! | 354 (+40)      | HL      | 6 bytes: length of the file header                       |
//! | 360 (+40)      | NUMI    | 3 bytes: first of the segment tables                     |
//!
//! In 2.1 the label table is replaced by `NUMX`, a reserved 3 byte field that
//! is skipped. The segment tables are followed by the user defined header data
//! (`UDHDL`, `UDHOFL`, `UDHD`) and the extended header data (`XHDL`, `XHDOFL`,
//! `XHD`), both of which hold TREs. The header must end exactly at `HL`.
//!
//! ### Image Subheader
//!
//! Up to `ICORDS` at offset 371 (411 for a 2.0 subheader with a downgrade
//! event) the image subheader is fixed. The rest depends on earlier fields,
//! see [`image`]. It ends with the user defined image data (`UDIDL`, `UDOFL`,
//! `UDID`) and the extended subheader data (`IXSHDL`, `IXSOFL`, `IXSHD`).
//!
//! ### TRE
//!
//! A 6 byte tag, a 5 digit length and that many bytes of payload, see [`tre`].
//!
//! ### Data Extension Segment
//!
//! The first DES starts after the file header, the images, graphics,
//! labels and text segments. Each DES is its subheader followed by its data.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.ntf`, `.nitf`
//! - **Encoding**: ASCII decimal for all numbers
//! - **Versions**: NITF 2.0 (`NITF02.00`) and NITF 2.1 (`NITF02.10`)
//!

pub mod des;
pub mod error;
pub mod field;
pub(crate) mod header;
pub mod image;
pub mod read;
#[cfg(feature = "serde")]
mod serde;
pub mod tre;
pub mod types;
pub mod version;
pub mod write;

pub use error::{Error, ErrorKind, Warning};
pub use read::{parse_bytes, parse_file};
pub use types::{ImageSelection, Isd, IsdFile, ParseOptions};
pub use version::NitfVersion;
pub use write::NitfWriter;
