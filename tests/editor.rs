use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use exif_edit::container::ImageFile;
use exif_edit::editor::{EditorOptions, MetadataEditor};
use exif_edit::exif::{self, MetadataBlock, Rational, Segment, Value};
use exif_edit::Error;

const MAKE: u16 = 0x010F;
const MODEL: u16 = 0x0110;
const DATE_TIME: u16 = 0x0132;

fn encode(format: image::ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_fn(24, 12, |x, y| image::Rgb([x as u8 * 10, y as u8 * 20, 7]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

/// A JPEG with a comment segment, so edits have a neighbour to preserve.
fn commented_jpeg() -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(encode(image::ImageFormat::Jpeg))).unwrap();
    let comment = JpegSegment::new_with_contents(0xFE, Bytes::from_static(b"keep me"));
    jpeg.segments_mut().insert(1, comment);
    jpeg.encoder().bytes().to_vec()
}

fn fixtures() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("photo.jpg", commented_jpeg()),
        ("photo.png", encode(image::ImageFormat::Png)),
    ]
}

fn sample_block() -> MetadataBlock {
    let mut block = MetadataBlock::default();
    block.insert(Segment::Primary, MAKE, "Canon");
    block.insert(Segment::Primary, MODEL, "EOS R");
    block.insert(Segment::Primary, 0x011A, Value::Rational(vec![Rational::new(300, 1)]));
    block.insert(Segment::Exif, 0x9003, "2024:01:01 10:00:00");
    block.insert(Segment::Exif, 0x8827, Value::Short(vec![800]));
    block.insert(Segment::Gps, 0x0001, "N");
    block.insert(Segment::Thumbnail, 0x0103, Value::Short(vec![6]));
    block.set_thumbnail(Some(vec![0xFF, 0xD8, 0xFF, 0xD9]));
    block
}

fn write(dir: &Path, name: &str, bytes: &[u8], block: Option<&MetadataBlock>) -> PathBuf {
    let path = dir.join(name);
    let mut image = ImageFile::from_bytes(&path, Bytes::copy_from_slice(bytes)).unwrap();
    if let Some(block) = block {
        image.set_metadata(block).unwrap();
    }
    std::fs::write(&path, image.into_bytes()).unwrap();
    path
}

/// Raw little-endian TIFF with an empty Make, Model "EOS" and a Latin-1
/// Artist, laid out the way the encoder lays it out.
const LATIN1_TIFF: &[u8] = &[
    b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, //
    0x03, 0x00, //
    0x0F, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x10, 0x01, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00, b'E', b'O', b'S', 0x00, //
    0x3B, 0x01, 0x02, 0x00, 0x05, 0x00, 0x00, 0x00, 0x32, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, //
    b'J', b'o', b's', 0xE9, 0x00, 0x00,
];
const ARTIST: u16 = 0x013B;

fn write_raw(dir: &Path, name: &str, bytes: &[u8], tiff: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut image = ImageFile::from_bytes(&path, Bytes::copy_from_slice(bytes)).unwrap();
    image.set_raw_exif(tiff.to_vec()).unwrap();
    std::fs::write(&path, image.into_bytes()).unwrap();
    path
}

fn raw_exif(path: &Path) -> Vec<u8> {
    ImageFile::open(path).unwrap().raw_exif().unwrap().to_vec()
}

fn payload(path: &Path) -> Bytes {
    ImageFile::open(path).unwrap().payload().unwrap()
}

#[test]
fn clone_copies_every_field() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let source = write(dir.path(), &format!("src-{name}"), &bytes, Some(&sample_block()));
        let mut other = MetadataBlock::default();
        other.insert(Segment::Primary, DATE_TIME, "1999:12:31 23:59:59");
        let target = write(dir.path(), name, &bytes, Some(&other));
        let before = payload(&target);

        let editor = MetadataEditor::default();
        editor.clone_metadata(&source, &target).unwrap();

        assert_eq!(editor.read(&target).unwrap(), Some(sample_block()), "{name}");
        assert_eq!(payload(&target), before, "{name}");
    }
}

#[test]
fn clone_across_formats() {
    let dir = TempDir::new().unwrap();
    let jpg = write(dir.path(), "a.jpg", &commented_jpeg(), Some(&sample_block()));
    let png = write(dir.path(), "b.png", &encode(image::ImageFormat::Png), None);

    let editor = MetadataEditor::default();
    editor.clone_metadata(&jpg, &png).unwrap();
    assert_eq!(editor.read(&png).unwrap(), Some(sample_block()));
}

#[test]
fn clear_leaves_empty_block_and_payload() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), name, &bytes, Some(&sample_block()));
        let before = payload(&path);

        let editor = MetadataEditor::default();
        let outcome = editor.clear(&path).unwrap();
        assert!(outcome.written);

        let image = ImageFile::open(&path).unwrap();
        let raw = image.raw_exif().unwrap();
        assert_eq!(&raw[..], exif::encode(&MetadataBlock::default()).unwrap().as_slice());
        assert!(image.metadata().unwrap().unwrap().is_empty(), "{name}");
        assert_eq!(image.payload().unwrap(), before, "{name}");
    }
}

#[test]
fn clear_on_image_without_metadata() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), name, &bytes, None);
        MetadataEditor::default().clear(&path).unwrap();
        let block = MetadataEditor::default().read(&path).unwrap();
        assert_eq!(block, Some(MetadataBlock::default()), "{name}");
    }
}

#[test]
fn remove_field_touches_only_that_tag() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), name, &bytes, Some(&sample_block()));
        let before = payload(&path);

        let editor = MetadataEditor::default();
        let outcome = editor.remove_field(&path, MODEL).unwrap();
        assert_eq!(outcome.fields_removed, 1);

        let mut expected = sample_block();
        expected.remove(Segment::Primary, MODEL);
        assert_eq!(editor.read(&path).unwrap(), Some(expected), "{name}");
        assert_eq!(payload(&path), before, "{name}");
    }
}

#[test]
fn remove_missing_field_keeps_file_bytes() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), name, &bytes, Some(&sample_block()));
        let before = std::fs::read(&path).unwrap();

        let outcome = MetadataEditor::default().remove_field(&path, 0xA434).unwrap();
        assert_eq!(outcome.fields_removed, 0);
        assert!(!outcome.written);
        assert_eq!(std::fs::read(&path).unwrap(), before, "{name}");
    }
}

#[test]
fn jpeg_comment_segment_survives_edits() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "photo.jpg", &commented_jpeg(), Some(&sample_block()));

    let editor = MetadataEditor::default();
    editor.remove_field(&path, MAKE).unwrap();
    editor.clear(&path).unwrap();

    let jpeg = Jpeg::from_bytes(Bytes::from(std::fs::read(&path).unwrap())).unwrap();
    let comment = jpeg.segments().iter().find(|s| s.marker() == 0xFE).unwrap();
    assert_eq!(&comment.contents()[..], b"keep me");
    assert!(jpeg.exif().is_some());
}

#[test]
fn undecodable_metadata_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jpg");
    let mut jpeg = Jpeg::from_bytes(Bytes::from(encode(image::ImageFormat::Jpeg))).unwrap();
    jpeg.set_exif(Some(Bytes::from_static(b"not a tiff header")));
    std::fs::write(&path, jpeg.encoder().bytes()).unwrap();

    let editor = MetadataEditor::default();
    assert!(matches!(editor.read(&path), Err(Error::MetadataDecodeError(_))));
    assert!(matches!(editor.remove_field(&path, MAKE), Err(Error::MetadataDecodeError(_))));

    // clear does not need to understand the old block
    editor.clear(&path).unwrap();
    assert!(editor.read(&path).unwrap().unwrap().is_empty());
}

#[test]
fn simple_webp_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.webp");
    // Minimal lossless WebP without a VP8X header
    let mut riff = b"RIFF\x1a\0\0\0WEBPVP8L\x0d\0\0\0".to_vec();
    riff.extend_from_slice(&[0x2f, 0, 0, 0, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88, 0x88, 0xfe, 0x07, 0]);
    std::fs::write(&path, &riff).unwrap();
    let before = std::fs::read(&path).unwrap();

    let err = MetadataEditor::default().clear(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn dry_run_and_backup_together() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "photo.jpg", &commented_jpeg(), Some(&sample_block()));

    let dry = MetadataEditor::new(EditorOptions {
        dry_run: true,
        backup_originals: true,
        ..EditorOptions::default()
    });
    let outcome = dry.clear(&path).unwrap();
    assert!(!outcome.written);
    assert!(outcome.backup_path.is_none());
    assert!(!dir.path().join("photo.jpg.bak").exists());
}

#[test]
fn latin1_text_survives_unrelated_edits() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let path = write_raw(dir.path(), name, &bytes, LATIN1_TIFF);
        let editor = MetadataEditor::default();

        editor.remove_field(&path, MODEL).unwrap();
        let block = editor.read(&path).unwrap().unwrap();
        assert_eq!(block.get(Segment::Primary, ARTIST), Some(&Value::Ascii(b"Jos\xe9\0".to_vec())));
        assert_eq!(block.get(Segment::Primary, MAKE), Some(&Value::Ascii(Vec::new())));
        assert!(raw_exif(&path).windows(5).any(|w| w == b"Jos\xe9\0"), "{name}");
    }
}

#[test]
fn clone_copies_raw_block_byte_for_byte() {
    for (name, bytes) in fixtures() {
        let dir = TempDir::new().unwrap();
        let source = write_raw(dir.path(), &format!("src-{name}"), &bytes, LATIN1_TIFF);
        let target = write(dir.path(), name, &bytes, Some(&sample_block()));

        MetadataEditor::default().clone_metadata(&source, &target).unwrap();
        assert_eq!(raw_exif(&target), LATIN1_TIFF, "{name}");
    }
}
