use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Byte order of the TIFF structure carrying the EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// `MM` (Motorola)
    #[default]
    Big,
    /// `II` (Intel)
    Little,
}

impl ByteOrder {
    pub(crate) fn marker(self) -> &'static [u8; 2] {
        match self {
            Self::Big => b"MM",
            Self::Little => b"II",
        }
    }

    pub(crate) fn u16(self, b: &[u8]) -> u16 {
        let b = [b[0], b[1]];
        match self {
            Self::Big => u16::from_be_bytes(b),
            Self::Little => u16::from_le_bytes(b),
        }
    }

    pub(crate) fn u32(self, b: &[u8]) -> u32 {
        let b = [b[0], b[1], b[2], b[3]];
        match self {
            Self::Big => u32::from_be_bytes(b),
            Self::Little => u32::from_le_bytes(b),
        }
    }

    pub(crate) fn u64(self, b: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&b[..8]);
        match self {
            Self::Big => u64::from_be_bytes(buf),
            Self::Little => u64::from_le_bytes(buf),
        }
    }

    pub(crate) fn put_u16(self, out: &mut Vec<u8>, v: u16) {
        match self {
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    pub(crate) fn put_u32(self, out: &mut Vec<u8>, v: u32) {
        match self {
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    pub(crate) fn put_u64(self, out: &mut Vec<u8>, v: u64) {
        match self {
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// A named group of EXIF fields, stored in its own IFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Segment {
    /// IFD0, the primary image.
    Primary,
    /// Exif sub-IFD (capture settings).
    Exif,
    /// GPS sub-IFD.
    Gps,
    /// Interoperability sub-IFD.
    Interop,
    /// IFD1, the embedded thumbnail.
    Thumbnail,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Primary,
        Segment::Exif,
        Segment::Gps,
        Segment::Interop,
        Segment::Thumbnail,
    ];
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "Primary",
            Self::Exif => "Exif",
            Self::Gps => "GPS",
            Self::Interop => "Interop",
            Self::Thumbnail => "Thumbnail",
        })
    }
}

/// TIFF field types (TIFF 6.0 §2, Exif 2.3 §4.6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
}

impl FieldType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => Self::Byte,
            2 => Self::Ascii,
            3 => Self::Short,
            4 => Self::Long,
            5 => Self::Rational,
            6 => Self::SByte,
            7 => Self::Undefined,
            8 => Self::SShort,
            9 => Self::SLong,
            10 => Self::SRational,
            11 => Self::Float,
            12 => Self::Double,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Size in bytes of a single component.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::Ascii | Self::SByte | Self::Undefined => 1,
            Self::Short | Self::SShort => 2,
            Self::Long | Self::SLong | Self::Float => 4,
            Self::Rational | Self::SRational | Self::Double => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Ascii => "ASCII",
            Self::Short => "SHORT",
            Self::Long => "LONG",
            Self::Rational => "RATIONAL",
            Self::SByte => "SBYTE",
            Self::Undefined => "UNDEFINED",
            Self::SShort => "SSHORT",
            Self::SLong => "SLONG",
            Self::SRational => "SRATIONAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
        }
    }
}

/// Unsigned rational (numerator / denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Signed rational (numerator / denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SRational {
    pub num: i32,
    pub den: i32,
}

impl SRational {
    pub fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }
}

impl fmt::Display for SRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// A single field value.
///
/// Variants follow the TIFF field types so a decoded value re-encodes to the
/// same bytes. `Ascii` keeps the stored bytes as they are, terminating NUL
/// included, since real files carry Latin-1 and other non-UTF-8 text.
/// In terms of kinds: `Ascii` is text, `Rational`/`SRational`
/// are rationals, `Byte`/`Undefined` are byte sequences, and the remaining
/// integer and float variants are numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Byte(Vec<u8>),
    Ascii(#[serde(serialize_with = "serialize_ascii")] Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<Rational>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<SRational>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Byte(_) => FieldType::Byte,
            Self::Ascii(_) => FieldType::Ascii,
            Self::Short(_) => FieldType::Short,
            Self::Long(_) => FieldType::Long,
            Self::Rational(_) => FieldType::Rational,
            Self::SByte(_) => FieldType::SByte,
            Self::Undefined(_) => FieldType::Undefined,
            Self::SShort(_) => FieldType::SShort,
            Self::SLong(_) => FieldType::SLong,
            Self::SRational(_) => FieldType::SRational,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
        }
    }

    /// Single unsigned integer value, if this is a one-element SHORT or LONG.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Short(v) if v.len() == 1 => Some(u32::from(v[0])),
            Self::Long(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// ASCII text without its terminating NULs, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(bytes) => std::str::from_utf8(trim_nul(bytes)).ok(),
            _ => None,
        }
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

fn ascii_text(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(trim_nul(bytes))
}

fn serialize_ascii<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ascii_text(bytes))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        let mut bytes = s.into_bytes();
        bytes.push(0);
        Value::Ascii(bytes)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::Ascii(bytes) => f.write_str(&ascii_text(bytes)),
            Self::Byte(b) | Self::Undefined(b) => {
                if b.len() > 16 {
                    write!(f, "({} bytes)", b.len())
                } else {
                    for (i, byte) in b.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{byte:02x}")?;
                    }
                    Ok(())
                }
            }
            Self::Short(v) => list(f, v),
            Self::Long(v) => list(f, v),
            Self::Rational(v) => list(f, v),
            Self::SByte(v) => list(f, v),
            Self::SShort(v) => list(f, v),
            Self::SLong(v) => list(f, v),
            Self::SRational(v) => list(f, v),
            Self::Float(v) => list(f, v),
            Self::Double(v) => list(f, v),
        }
    }
}

pub type Fields = BTreeMap<u16, Value>;

/// The decoded EXIF metadata of one image.
///
/// Segments never hold empty field maps: removing the last field of a segment
/// drops the segment, so two blocks with the same fields compare equal.
/// Sub-IFD pointers and thumbnail offsets are not stored as fields; the codec
/// derives them when encoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetadataBlock {
    pub byte_order: ByteOrder,
    segments: BTreeMap<Segment, Fields>,
    #[serde(skip)]
    thumbnail: Option<Vec<u8>>,
}

impl MetadataBlock {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }

    pub fn get(&self, segment: Segment, tag: u16) -> Option<&Value> {
        self.segments.get(&segment)?.get(&tag)
    }

    pub fn insert(&mut self, segment: Segment, tag: u16, value: impl Into<Value>) -> Option<Value> {
        self.segments
            .entry(segment)
            .or_default()
            .insert(tag, value.into())
    }

    pub fn remove(&mut self, segment: Segment, tag: u16) -> Option<Value> {
        let fields = self.segments.get_mut(&segment)?;
        let removed = fields.remove(&tag);
        if fields.is_empty() {
            self.segments.remove(&segment);
        }
        removed
    }

    /// Remove `tag` from every segment that has it. Returns how many fields
    /// were removed; zero is not an error.
    pub fn remove_everywhere(&mut self, tag: u16) -> usize {
        Segment::ALL
            .iter()
            .filter(|&&segment| self.remove(segment, tag).is_some())
            .count()
    }

    pub fn segment(&self, segment: Segment) -> Option<&Fields> {
        self.segments.get(&segment)
    }

    /// Non-empty segments in IFD order.
    pub fn segments(&self) -> impl Iterator<Item = (Segment, &Fields)> {
        self.segments.iter().map(|(s, f)| (*s, f))
    }

    pub fn has_segment(&self, segment: Segment) -> bool {
        self.segments.contains_key(&segment)
    }

    pub fn field_count(&self) -> usize {
        self.segments.values().map(BTreeMap::len).sum()
    }

    /// True when the block holds no fields and no thumbnail.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.thumbnail.is_none()
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, data: Option<Vec<u8>>) {
        self.thumbnail = data;
    }
}
