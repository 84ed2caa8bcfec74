//! EXIF metadata model and codec.
//!
//! - [`MetadataBlock`]: the decoded metadata: segments of tagged fields
//! - [`decode`]: raw EXIF (TIFF) bytes → [`MetadataBlock`]
//! - [`encode`]: [`MetadataBlock`] → raw EXIF bytes, validating each field
//!   against the [`tags`] registry
//!
//! The raw bytes are what JPEG stores after the `Exif\0\0` prefix of its APP1
//! segment, and what PNG and WebP store in their `eXIf`/`EXIF` chunks.

mod block;
mod reader;
pub mod tags;
mod writer;

pub use block::{ByteOrder, FieldType, Fields, MetadataBlock, Rational, SRational, Segment, Value};
pub use reader::decode;
pub use writer::encode;
