use std::collections::HashSet;

use super::block::{ByteOrder, FieldType, MetadataBlock, Rational, SRational, Segment, Value};
use super::tags::{
    TAG_EXIF_IFD, TAG_GPS_IFD, TAG_INTEROP_IFD, TAG_THUMBNAIL_LENGTH, TAG_THUMBNAIL_OFFSET,
};
use crate::error::{Error, Result};

const TIFF_MAGIC: u16 = 42;
const ENTRY_SIZE: usize = 12;

/// One decoded IFD: its fields in file order and the next-IFD offset.
struct Ifd {
    fields: Vec<(u16, Value)>,
    next: u32,
}

/// Bounds-checked view over the TIFF bytes.
struct TiffReader<'a> {
    data: &'a [u8],
    order: ByteOrder,
    visited: HashSet<usize>,
}

impl<'a> TiffReader<'a> {
    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::decode("offset overflow"))?;
        self.data.get(offset..end).ok_or_else(|| {
            Error::decode(format!(
                "range {offset}..{end} outside of {} byte block",
                self.data.len()
            ))
        })
    }

    fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(self.order.u16(self.slice(offset, 2)?))
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        Ok(self.order.u32(self.slice(offset, 4)?))
    }

    fn read_ifd(&mut self, offset: usize, segment: Segment) -> Result<Ifd> {
        if !self.visited.insert(offset) {
            return Err(Error::decode(format!(
                "{segment} IFD at offset {offset} was already read (pointer cycle)"
            )));
        }

        let count = usize::from(self.u16_at(offset)?);
        let entries = self.slice(offset + 2, count * ENTRY_SIZE)?;
        let next = self.u32_at(offset + 2 + count * ENTRY_SIZE)?;

        let mut fields = Vec::with_capacity(count);
        for entry in entries.chunks_exact(ENTRY_SIZE) {
            let tag = self.order.u16(&entry[0..2]);
            let type_code = self.order.u16(&entry[2..4]);
            let count = self.order.u32(&entry[4..8]) as usize;

            let Some(field_type) = FieldType::from_code(type_code) else {
                log::warn!("Skipping {segment} tag {tag:#06x}: unknown field type {type_code}");
                continue;
            };

            let size = field_type
                .size()
                .checked_mul(count)
                .ok_or_else(|| Error::decode(format!("{segment} tag {tag:#06x}: count overflow")))?;
            let raw = if size <= 4 {
                &entry[8..8 + size]
            } else {
                let value_offset = self.order.u32(&entry[8..12]) as usize;
                self.slice(value_offset, size).map_err(|e| {
                    Error::decode(format!("{segment} tag {tag:#06x}: {e}"))
                })?
            };

            if fields.iter().any(|(seen, _)| *seen == tag) {
                log::warn!("Skipping duplicate {segment} tag {tag:#06x}");
                continue;
            }
            fields.push((tag, decode_value(field_type, raw, self.order)));
        }

        log::debug!("Read {segment} IFD at {offset}: {} fields", fields.len());
        Ok(Ifd { fields, next })
    }
}

fn decode_value(field_type: FieldType, raw: &[u8], order: ByteOrder) -> Value {
    match field_type {
        FieldType::Byte => Value::Byte(raw.to_vec()),
        FieldType::Ascii => Value::Ascii(raw.to_vec()),
        FieldType::Short => Value::Short(raw.chunks_exact(2).map(|c| order.u16(c)).collect()),
        FieldType::Long => Value::Long(raw.chunks_exact(4).map(|c| order.u32(c)).collect()),
        FieldType::Rational => Value::Rational(
            raw.chunks_exact(8)
                .map(|c| Rational::new(order.u32(&c[..4]), order.u32(&c[4..])))
                .collect(),
        ),
        FieldType::SByte => Value::SByte(raw.iter().map(|&b| b as i8).collect()),
        FieldType::Undefined => Value::Undefined(raw.to_vec()),
        FieldType::SShort => {
            Value::SShort(raw.chunks_exact(2).map(|c| order.u16(c) as i16).collect())
        }
        FieldType::SLong => {
            Value::SLong(raw.chunks_exact(4).map(|c| order.u32(c) as i32).collect())
        }
        FieldType::SRational => Value::SRational(
            raw.chunks_exact(8)
                .map(|c| SRational::new(order.u32(&c[..4]) as i32, order.u32(&c[4..]) as i32))
                .collect(),
        ),
        FieldType::Float => Value::Float(
            raw.chunks_exact(4)
                .map(|c| f32::from_bits(order.u32(c)))
                .collect(),
        ),
        FieldType::Double => Value::Double(
            raw.chunks_exact(8)
                .map(|c| f64::from_bits(order.u64(c)))
                .collect(),
        ),
    }
}

/// Extract a sub-IFD offset from a pointer field. Zero means "absent".
fn pointer(segment: Segment, tag: u16, value: &Value) -> Result<Option<usize>> {
    match value.as_u32() {
        Some(0) => Ok(None),
        Some(offset) => Ok(Some(offset as usize)),
        None => Err(Error::decode(format!(
            "{segment} pointer tag {tag:#06x} is not a single SHORT/LONG"
        ))),
    }
}

/// Decode raw EXIF bytes (a TIFF structure starting with `II*\0` or `MM\0*`)
/// into a [`MetadataBlock`].
pub fn decode(data: &[u8]) -> Result<MetadataBlock> {
    if data.len() < 8 {
        return Err(Error::decode("TIFF header too short"));
    }
    let order = match &data[0..2] {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return Err(Error::decode("invalid TIFF byte order marker")),
    };

    let mut reader = TiffReader {
        data,
        order,
        visited: HashSet::new(),
    };
    if reader.u16_at(2)? != TIFF_MAGIC {
        return Err(Error::decode("invalid TIFF magic number"));
    }

    let mut block = MetadataBlock::new(order);
    let ifd0_offset = reader.u32_at(4)? as usize;
    let ifd0 = reader.read_ifd(ifd0_offset, Segment::Primary)?;

    let mut exif_offset = None;
    let mut gps_offset = None;
    for (tag, value) in ifd0.fields {
        match tag {
            TAG_EXIF_IFD => exif_offset = pointer(Segment::Primary, tag, &value)?,
            TAG_GPS_IFD => gps_offset = pointer(Segment::Primary, tag, &value)?,
            _ => {
                block.insert(Segment::Primary, tag, value);
            }
        }
    }

    let mut interop_offset = None;
    if let Some(offset) = exif_offset {
        for (tag, value) in reader.read_ifd(offset, Segment::Exif)?.fields {
            if tag == TAG_INTEROP_IFD {
                interop_offset = pointer(Segment::Exif, tag, &value)?;
            } else {
                block.insert(Segment::Exif, tag, value);
            }
        }
    }

    if let Some(offset) = gps_offset {
        for (tag, value) in reader.read_ifd(offset, Segment::Gps)?.fields {
            block.insert(Segment::Gps, tag, value);
        }
    }

    if let Some(offset) = interop_offset {
        for (tag, value) in reader.read_ifd(offset, Segment::Interop)?.fields {
            block.insert(Segment::Interop, tag, value);
        }
    }

    if ifd0.next != 0 {
        let ifd1 = reader.read_ifd(ifd0.next as usize, Segment::Thumbnail)?;
        let mut thumb_offset = None;
        let mut thumb_length = None;
        for (tag, value) in ifd1.fields {
            match tag {
                TAG_THUMBNAIL_OFFSET => thumb_offset = value.as_u32(),
                TAG_THUMBNAIL_LENGTH => thumb_length = value.as_u32(),
                _ => {
                    block.insert(Segment::Thumbnail, tag, value);
                }
            }
        }

        match (thumb_offset, thumb_length) {
            (Some(offset), Some(length)) => {
                match reader.slice(offset as usize, length as usize) {
                    Ok(bytes) => block.set_thumbnail(Some(bytes.to_vec())),
                    Err(e) => log::warn!("Dropping thumbnail: {e}"),
                }
            }
            (None, None) => {}
            _ => log::warn!("Dropping thumbnail: offset or length tag missing"),
        }
    }

    Ok(block)
}
