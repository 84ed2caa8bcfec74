//! Well-known EXIF tags and the field types they accept.
//!
//! Only the commonly written tags are listed. Tags missing from the tables
//! accept any field type.

use super::block::{FieldType, Segment, Value};
use crate::error::{Error, Result};

// Structural tags: offsets the codec computes, never stored as fields.
pub const TAG_EXIF_IFD: u16 = 0x8769;
pub const TAG_GPS_IFD: u16 = 0x8825;
pub const TAG_INTEROP_IFD: u16 = 0xA005;
pub const TAG_THUMBNAIL_OFFSET: u16 = 0x0201;
pub const TAG_THUMBNAIL_LENGTH: u16 = 0x0202;

/// Registry entry for one tag.
#[derive(Debug)]
pub struct TagInfo {
    pub tag: u16,
    pub name: &'static str,
    pub formats: &'static [FieldType],
}

const fn t(tag: u16, name: &'static str, formats: &'static [FieldType]) -> TagInfo {
    TagInfo { tag, name, formats }
}

const BYTE: &[FieldType] = &[FieldType::Byte];
const ASCII: &[FieldType] = &[FieldType::Ascii];
const SHORT: &[FieldType] = &[FieldType::Short];
const LONG: &[FieldType] = &[FieldType::Long];
const SHORT_OR_LONG: &[FieldType] = &[FieldType::Short, FieldType::Long];
const RATIONAL: &[FieldType] = &[FieldType::Rational];
const SRATIONAL: &[FieldType] = &[FieldType::SRational];
const UNDEFINED: &[FieldType] = &[FieldType::Undefined];

/// IFD0, Exif sub-IFD, and IFD1 share one tag namespace.
static IMAGE_TAGS: &[TagInfo] = &[
    t(0x00FE, "NewSubfileType", LONG),
    t(0x0100, "ImageWidth", SHORT_OR_LONG),
    t(0x0101, "ImageLength", SHORT_OR_LONG),
    t(0x0102, "BitsPerSample", SHORT),
    t(0x0103, "Compression", SHORT),
    t(0x0106, "PhotometricInterpretation", SHORT),
    t(0x010E, "ImageDescription", ASCII),
    t(0x010F, "Make", ASCII),
    t(0x0110, "Model", ASCII),
    t(0x0111, "StripOffsets", SHORT_OR_LONG),
    t(0x0112, "Orientation", SHORT),
    t(0x0115, "SamplesPerPixel", SHORT),
    t(0x0116, "RowsPerStrip", SHORT_OR_LONG),
    t(0x0117, "StripByteCounts", SHORT_OR_LONG),
    t(0x011A, "XResolution", RATIONAL),
    t(0x011B, "YResolution", RATIONAL),
    t(0x011C, "PlanarConfiguration", SHORT),
    t(0x0128, "ResolutionUnit", SHORT),
    t(0x0131, "Software", ASCII),
    t(0x0132, "DateTime", ASCII),
    t(0x013B, "Artist", ASCII),
    t(0x013E, "WhitePoint", RATIONAL),
    t(0x013F, "PrimaryChromaticities", RATIONAL),
    t(TAG_THUMBNAIL_OFFSET, "JPEGInterchangeFormat", LONG),
    t(TAG_THUMBNAIL_LENGTH, "JPEGInterchangeFormatLength", LONG),
    t(0x0211, "YCbCrCoefficients", RATIONAL),
    t(0x0213, "YCbCrPositioning", SHORT),
    t(0x0214, "ReferenceBlackWhite", RATIONAL),
    t(0x8298, "Copyright", ASCII),
    t(0x829A, "ExposureTime", RATIONAL),
    t(0x829D, "FNumber", RATIONAL),
    t(TAG_EXIF_IFD, "ExifTag", LONG),
    t(0x8822, "ExposureProgram", SHORT),
    t(TAG_GPS_IFD, "GPSTag", LONG),
    t(0x8827, "ISOSpeedRatings", SHORT),
    t(0x9000, "ExifVersion", UNDEFINED),
    t(0x9003, "DateTimeOriginal", ASCII),
    t(0x9004, "DateTimeDigitized", ASCII),
    t(0x9010, "OffsetTime", ASCII),
    t(0x9011, "OffsetTimeOriginal", ASCII),
    t(0x9012, "OffsetTimeDigitized", ASCII),
    t(0x9101, "ComponentsConfiguration", UNDEFINED),
    t(0x9102, "CompressedBitsPerPixel", RATIONAL),
    t(0x9201, "ShutterSpeedValue", SRATIONAL),
    t(0x9202, "ApertureValue", RATIONAL),
    t(0x9203, "BrightnessValue", SRATIONAL),
    t(0x9204, "ExposureBiasValue", SRATIONAL),
    t(0x9205, "MaxApertureValue", RATIONAL),
    t(0x9206, "SubjectDistance", RATIONAL),
    t(0x9207, "MeteringMode", SHORT),
    t(0x9208, "LightSource", SHORT),
    t(0x9209, "Flash", SHORT),
    t(0x920A, "FocalLength", RATIONAL),
    t(0x927C, "MakerNote", UNDEFINED),
    t(0x9286, "UserComment", UNDEFINED),
    t(0x9290, "SubSecTime", ASCII),
    t(0x9291, "SubSecTimeOriginal", ASCII),
    t(0x9292, "SubSecTimeDigitized", ASCII),
    t(0x9C9B, "XPTitle", BYTE),
    t(0x9C9C, "XPComment", BYTE),
    t(0x9C9D, "XPAuthor", BYTE),
    t(0x9C9E, "XPKeywords", BYTE),
    t(0x9C9F, "XPSubject", BYTE),
    t(0xA000, "FlashpixVersion", UNDEFINED),
    t(0xA001, "ColorSpace", SHORT),
    t(0xA002, "PixelXDimension", SHORT_OR_LONG),
    t(0xA003, "PixelYDimension", SHORT_OR_LONG),
    t(0xA004, "RelatedSoundFile", ASCII),
    t(TAG_INTEROP_IFD, "InteroperabilityTag", LONG),
    t(0xA20E, "FocalPlaneXResolution", RATIONAL),
    t(0xA20F, "FocalPlaneYResolution", RATIONAL),
    t(0xA210, "FocalPlaneResolutionUnit", SHORT),
    t(0xA217, "SensingMethod", SHORT),
    t(0xA300, "FileSource", UNDEFINED),
    t(0xA301, "SceneType", UNDEFINED),
    t(0xA401, "CustomRendered", SHORT),
    t(0xA402, "ExposureMode", SHORT),
    t(0xA403, "WhiteBalance", SHORT),
    t(0xA404, "DigitalZoomRatio", RATIONAL),
    t(0xA405, "FocalLengthIn35mmFilm", SHORT),
    t(0xA406, "SceneCaptureType", SHORT),
    t(0xA408, "Contrast", SHORT),
    t(0xA409, "Saturation", SHORT),
    t(0xA40A, "Sharpness", SHORT),
    t(0xA420, "ImageUniqueID", ASCII),
    t(0xA430, "CameraOwnerName", ASCII),
    t(0xA431, "BodySerialNumber", ASCII),
    t(0xA432, "LensSpecification", RATIONAL),
    t(0xA433, "LensMake", ASCII),
    t(0xA434, "LensModel", ASCII),
    t(0xA435, "LensSerialNumber", ASCII),
];

static GPS_TAGS: &[TagInfo] = &[
    t(0x0000, "GPSVersionID", BYTE),
    t(0x0001, "GPSLatitudeRef", ASCII),
    t(0x0002, "GPSLatitude", RATIONAL),
    t(0x0003, "GPSLongitudeRef", ASCII),
    t(0x0004, "GPSLongitude", RATIONAL),
    t(0x0005, "GPSAltitudeRef", BYTE),
    t(0x0006, "GPSAltitude", RATIONAL),
    t(0x0007, "GPSTimeStamp", RATIONAL),
    t(0x0008, "GPSSatellites", ASCII),
    t(0x0009, "GPSStatus", ASCII),
    t(0x000A, "GPSMeasureMode", ASCII),
    t(0x000B, "GPSDOP", RATIONAL),
    t(0x000C, "GPSSpeedRef", ASCII),
    t(0x000D, "GPSSpeed", RATIONAL),
    t(0x0010, "GPSImgDirectionRef", ASCII),
    t(0x0011, "GPSImgDirection", RATIONAL),
    t(0x0012, "GPSMapDatum", ASCII),
    t(0x001B, "GPSProcessingMethod", UNDEFINED),
    t(0x001D, "GPSDateStamp", ASCII),
];

static INTEROP_TAGS: &[TagInfo] = &[
    t(0x0001, "InteroperabilityIndex", ASCII),
    t(0x0002, "InteroperabilityVersion", UNDEFINED),
    t(0x1000, "RelatedImageFileFormat", ASCII),
    t(0x1001, "RelatedImageWidth", SHORT_OR_LONG),
    t(0x1002, "RelatedImageLength", SHORT_OR_LONG),
];

fn table(segment: Segment) -> &'static [TagInfo] {
    match segment {
        Segment::Primary | Segment::Exif | Segment::Thumbnail => IMAGE_TAGS,
        Segment::Gps => GPS_TAGS,
        Segment::Interop => INTEROP_TAGS,
    }
}

pub fn lookup(segment: Segment, tag: u16) -> Option<&'static TagInfo> {
    table(segment).iter().find(|info| info.tag == tag)
}

/// Display name for a tag, or its hex id when unknown.
pub fn tag_name(segment: Segment, tag: u16) -> String {
    match lookup(segment, tag) {
        Some(info) => info.name.to_string(),
        None => format!("{tag:#06x}"),
    }
}

/// True for tags whose value is an offset the codec owns in this segment.
pub fn is_structural(segment: Segment, tag: u16) -> bool {
    matches!(
        (segment, tag),
        (Segment::Primary, TAG_EXIF_IFD | TAG_GPS_IFD)
            | (Segment::Exif, TAG_INTEROP_IFD)
            | (Segment::Thumbnail, TAG_THUMBNAIL_OFFSET | TAG_THUMBNAIL_LENGTH)
    )
}

/// Parse a field tag from a decimal number, a `0x` hex number, or a tag name
/// (case-insensitive). Names resolve against image tags first, then GPS, then
/// interoperability tags.
pub fn parse_tag(s: &str) -> Option<u16> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u16::from_str_radix(hex, 16).ok();
    }
    if let Ok(n) = s.parse::<u16>() {
        return Some(n);
    }
    IMAGE_TAGS
        .iter()
        .chain(GPS_TAGS)
        .chain(INTEROP_TAGS)
        .find(|info| info.name.eq_ignore_ascii_case(s))
        .map(|info| info.tag)
}

/// Check that `value` has a type `tag` accepts in `segment`.
pub fn check(segment: Segment, tag: u16, value: &Value) -> Result<()> {
    let found = value.field_type();
    if is_structural(segment, tag) {
        return Err(Error::UnsupportedFieldType {
            segment,
            tag,
            expected: "no value (offset is computed when encoding)".to_string(),
            found: found.name(),
        });
    }
    if let Some(info) = lookup(segment, tag) {
        if !info.formats.contains(&found) {
            let expected = info
                .formats
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(Error::UnsupportedFieldType {
                segment,
                tag,
                expected,
                found: found.name(),
            });
        }
    }
    Ok(())
}
