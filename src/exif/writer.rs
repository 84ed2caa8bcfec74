use super::block::{ByteOrder, FieldType, Fields, MetadataBlock, Segment, Value};
use super::tags::{
    self, TAG_EXIF_IFD, TAG_GPS_IFD, TAG_INTEROP_IFD, TAG_THUMBNAIL_LENGTH, TAG_THUMBNAIL_OFFSET,
};
use crate::error::{Error, Result};

const TIFF_HEADER_SIZE: usize = 8;
const ENTRY_SIZE: usize = 12;

/// An IFD entry with its value already serialized in the target byte order.
struct RawEntry {
    tag: u16,
    field_type: FieldType,
    count: u32,
    data: Vec<u8>,
}

/// One IFD ready for layout. Pointer entries hold a placeholder until
/// [`IfdPlan::set_long`] patches in the final offset.
struct IfdPlan {
    entries: Vec<RawEntry>,
    next: u32,
}

fn padded(len: usize) -> usize {
    len + (len & 1)
}

impl IfdPlan {
    fn from_fields(segment: Segment, fields: Option<&Fields>, order: ByteOrder) -> Result<Self> {
        let mut entries = Vec::new();
        for (&tag, value) in fields.into_iter().flatten() {
            tags::check(segment, tag, value)?;
            entries.push(encode_value(tag, value, order)?);
        }
        Ok(Self { entries, next: 0 })
    }

    fn push_long(&mut self, tag: u16) {
        self.entries.push(RawEntry {
            tag,
            field_type: FieldType::Long,
            count: 1,
            data: vec![0; 4],
        });
    }

    fn set_long(&mut self, tag: u16, value: u32, order: ByteOrder) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == tag) {
            entry.data.clear();
            order.put_u32(&mut entry.data, value);
        }
    }

    /// Bytes taken by the directory plus its out-of-line values.
    fn size(&self) -> usize {
        let values: usize = self
            .entries
            .iter()
            .filter(|e| e.data.len() > 4)
            .map(|e| padded(e.data.len()))
            .sum();
        2 + self.entries.len() * ENTRY_SIZE + 4 + values
    }

    fn entry_count(&self) -> Result<u16> {
        u16::try_from(self.entries.len()).map_err(|_| Error::MetadataTooLarge {
            size: self.size(),
            max: usize::from(u16::MAX) * ENTRY_SIZE,
        })
    }

    fn write(mut self, out: &mut Vec<u8>, order: ByteOrder) -> Result<()> {
        let count = self.entry_count()?;
        self.entries.sort_by_key(|e| e.tag);

        let start = out.len();
        let mut value_offset = start + 2 + self.entries.len() * ENTRY_SIZE + 4;
        order.put_u16(out, count);

        for entry in &self.entries {
            order.put_u16(out, entry.tag);
            order.put_u16(out, entry.field_type.code());
            order.put_u32(out, entry.count);
            if entry.data.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..entry.data.len()].copy_from_slice(&entry.data);
                out.extend_from_slice(&inline);
            } else {
                order.put_u32(out, value_offset as u32);
                value_offset += padded(entry.data.len());
            }
        }
        order.put_u32(out, self.next);

        for entry in self.entries.iter().filter(|e| e.data.len() > 4) {
            out.extend_from_slice(&entry.data);
            if entry.data.len() & 1 == 1 {
                out.push(0);
            }
        }
        debug_assert_eq!(out.len(), value_offset);
        Ok(())
    }
}

fn encode_value(tag: u16, value: &Value, order: ByteOrder) -> Result<RawEntry> {
    let mut data = Vec::new();
    let count = match value {
        Value::Byte(v) | Value::Undefined(v) | Value::Ascii(v) => {
            data.extend_from_slice(v);
            v.len()
        }
        Value::Short(v) => {
            v.iter().for_each(|&x| order.put_u16(&mut data, x));
            v.len()
        }
        Value::Long(v) => {
            v.iter().for_each(|&x| order.put_u32(&mut data, x));
            v.len()
        }
        Value::Rational(v) => {
            for r in v {
                order.put_u32(&mut data, r.num);
                order.put_u32(&mut data, r.den);
            }
            v.len()
        }
        Value::SByte(v) => {
            data.extend(v.iter().map(|&x| x as u8));
            v.len()
        }
        Value::SShort(v) => {
            v.iter().for_each(|&x| order.put_u16(&mut data, x as u16));
            v.len()
        }
        Value::SLong(v) => {
            v.iter().for_each(|&x| order.put_u32(&mut data, x as u32));
            v.len()
        }
        Value::SRational(v) => {
            for r in v {
                order.put_u32(&mut data, r.num as u32);
                order.put_u32(&mut data, r.den as u32);
            }
            v.len()
        }
        Value::Float(v) => {
            v.iter().for_each(|&x| order.put_u32(&mut data, x.to_bits()));
            v.len()
        }
        Value::Double(v) => {
            v.iter().for_each(|&x| order.put_u64(&mut data, x.to_bits()));
            v.len()
        }
    };

    let count = u32::try_from(count).map_err(|_| Error::MetadataTooLarge {
        size: data.len(),
        max: u32::MAX as usize,
    })?;
    Ok(RawEntry {
        tag,
        field_type: value.field_type(),
        count,
        data,
    })
}

/// Encode a [`MetadataBlock`] as raw EXIF bytes (a complete TIFF structure).
///
/// Every field is validated against the tag registry first, so a type
/// mismatch fails with [`Error::UnsupportedFieldType`] before any bytes are
/// produced. An empty block encodes to a header plus an empty IFD0.
///
/// Layout: header, IFD0, Exif IFD, GPS IFD, Interop IFD, IFD1, thumbnail.
/// Sub-IFDs are only written when they have fields (the Exif IFD is also
/// written when only Interop has fields, to carry the pointer).
pub fn encode(block: &MetadataBlock) -> Result<Vec<u8>> {
    let order = block.byte_order;

    let has_interop = block.has_segment(Segment::Interop);
    let has_exif = block.has_segment(Segment::Exif) || has_interop;
    let has_gps = block.has_segment(Segment::Gps);
    let thumbnail = block.thumbnail();
    let has_ifd1 = block.has_segment(Segment::Thumbnail) || thumbnail.is_some();

    let plan = |segment: Segment| IfdPlan::from_fields(segment, block.segment(segment), order);

    let mut ifd0 = plan(Segment::Primary)?;
    if has_exif {
        ifd0.push_long(TAG_EXIF_IFD);
    }
    if has_gps {
        ifd0.push_long(TAG_GPS_IFD);
    }

    let mut exif = if has_exif {
        let mut exif = plan(Segment::Exif)?;
        if has_interop {
            exif.push_long(TAG_INTEROP_IFD);
        }
        Some(exif)
    } else {
        None
    };
    let gps = if has_gps { Some(plan(Segment::Gps)?) } else { None };
    let interop = if has_interop { Some(plan(Segment::Interop)?) } else { None };
    let mut ifd1 = if has_ifd1 {
        let mut ifd1 = plan(Segment::Thumbnail)?;
        if thumbnail.is_some() {
            ifd1.push_long(TAG_THUMBNAIL_OFFSET);
            ifd1.push_long(TAG_THUMBNAIL_LENGTH);
        }
        Some(ifd1)
    } else {
        None
    };

    // Lay out every directory, then patch the offsets in.
    let mut cursor = TIFF_HEADER_SIZE + ifd0.size();
    let mut place = |ifd: Option<&IfdPlan>| {
        ifd.map(|ifd| {
            let at = cursor;
            cursor += ifd.size();
            at
        })
    };
    let exif_at = place(exif.as_ref());
    let gps_at = place(gps.as_ref());
    let interop_at = place(interop.as_ref());
    let ifd1_at = place(ifd1.as_ref());
    let thumbnail_at = cursor;
    let total = cursor + thumbnail.map_or(0, <[u8]>::len);

    let offset = |at: usize| {
        u32::try_from(at).map_err(|_| Error::MetadataTooLarge {
            size: total,
            max: u32::MAX as usize,
        })
    };
    offset(total)?;

    if let Some(at) = exif_at {
        ifd0.set_long(TAG_EXIF_IFD, offset(at)?, order);
    }
    if let Some(at) = gps_at {
        ifd0.set_long(TAG_GPS_IFD, offset(at)?, order);
    }
    if let (Some(exif), Some(at)) = (exif.as_mut(), interop_at) {
        exif.set_long(TAG_INTEROP_IFD, offset(at)?, order);
    }
    if let Some(at) = ifd1_at {
        ifd0.next = offset(at)?;
    }
    if let (Some(ifd1), Some(data)) = (ifd1.as_mut(), thumbnail) {
        ifd1.set_long(TAG_THUMBNAIL_OFFSET, offset(thumbnail_at)?, order);
        ifd1.set_long(TAG_THUMBNAIL_LENGTH, offset(data.len())?, order);
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(order.marker());
    order.put_u16(&mut out, 42);
    order.put_u32(&mut out, TIFF_HEADER_SIZE as u32);

    ifd0.write(&mut out, order)?;
    for ifd in [exif, gps, interop, ifd1].into_iter().flatten() {
        ifd.write(&mut out, order)?;
    }
    if let Some(data) = thumbnail {
        out.extend_from_slice(data);
    }
    debug_assert_eq!(out.len(), total);

    log::debug!(
        "Encoded {} fields into {} bytes of EXIF",
        block.field_count(),
        out.len()
    );
    Ok(out)
}
