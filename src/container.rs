//! Access to the metadata region of an image container.
//!
//! `img-parts` does the container work: it splits a file into segments or
//! chunks and lets us swap the EXIF payload without touching anything else.
//! The pixel payload is never decoded.

use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, DynImage, ImageEXIF};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::exif::{self, MetadataBlock};
use crate::pipeline::ImageKind;

/// Largest EXIF payload a JPEG APP1 segment can carry:
/// 65535 - 2 (length field) - 6 (`Exif\0\0`).
pub const JPEG_MAX_EXIF_LEN: usize = 65527;

const EXIF_PREFIX: &[u8] = b"Exif\0\0";
const APP1: u8 = 0xE1;

/// An image file opened for metadata editing.
pub struct ImageFile {
    path: PathBuf,
    kind: ImageKind,
    source: Bytes,
    image: DynImage,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("len", &self.source.len())
            .finish()
    }
}

/// Fail with [`Error::FileNotFound`] unless `path` is an existing file.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

impl ImageFile {
    /// Read and parse the container at `path`. The format is detected from
    /// the file contents, not the extension.
    pub fn open(path: &Path) -> Result<Self> {
        ensure_exists(path)?;
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(path, Bytes::from(bytes))
    }

    pub fn from_bytes(path: &Path, source: Bytes) -> Result<Self> {
        let image = parse(path, source.clone())?;
        let kind = match &image {
            DynImage::Jpeg(_) => ImageKind::Jpeg,
            DynImage::Png(_) => ImageKind::Png,
            DynImage::WebP(_) => ImageKind::WebP,
        };
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            source,
            image,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Raw EXIF (TIFF) bytes currently in the metadata region, if any.
    pub fn raw_exif(&self) -> Option<Bytes> {
        self.image.exif().filter(|b| !b.is_empty())
    }

    /// Decode the metadata region. `Ok(None)` when the file has none.
    pub fn metadata(&self) -> Result<Option<MetadataBlock>> {
        self.raw_exif().map(|raw| exif::decode(&raw)).transpose()
    }

    /// Replace the metadata region with `tiff` (raw EXIF bytes).
    pub fn set_raw_exif(&mut self, tiff: Vec<u8>) -> Result<()> {
        match &mut self.image {
            DynImage::Jpeg(jpeg) => {
                if tiff.len() > JPEG_MAX_EXIF_LEN {
                    return Err(Error::MetadataTooLarge {
                        size: tiff.len(),
                        max: JPEG_MAX_EXIF_LEN,
                    });
                }
                let original_pos = find_exif_segment_pos(jpeg);
                jpeg.set_exif(Some(Bytes::from(tiff)));
                restore_exif_position(jpeg, original_pos);
            }
            DynImage::WebP(webp) => {
                // Simple (VP8/VP8L) WebP files have no VP8X header to flag
                // the EXIF chunk, so readers would ignore it.
                if !has_vp8x(&self.source) {
                    return Err(Error::UnsupportedFormat(self.path.clone()));
                }
                webp.set_exif(Some(Bytes::from(tiff)));
            }
            DynImage::Png(png) => png.set_exif(Some(Bytes::from(tiff))),
        }
        Ok(())
    }

    /// Encode `block` and store it as the metadata region.
    pub fn set_metadata(&mut self, block: &MetadataBlock) -> Result<()> {
        let tiff = exif::encode(block)?;
        self.set_raw_exif(tiff)
    }

    /// The container bytes with the metadata region stripped: everything an
    /// edit must leave untouched.
    pub fn payload(&self) -> Result<Bytes> {
        let mut image = parse(&self.path, self.source.clone())?;
        image.set_exif(None);
        Ok(image.encoder().bytes())
    }

    /// Serialize the container with its current metadata region.
    pub fn into_bytes(self) -> Bytes {
        self.image.encoder().bytes()
    }

    /// Overwrite the file on disk.
    pub fn save(self) -> Result<()> {
        let path = self.path.clone();
        let bytes = self.into_bytes();
        std::fs::write(&path, &bytes).map_err(|e| Error::io(&path, e))?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

fn parse(path: &Path, bytes: Bytes) -> Result<DynImage> {
    match DynImage::from_bytes(bytes) {
        Ok(Some(image)) => Ok(image),
        Ok(None) => Err(Error::UnsupportedFormat(path.to_path_buf())),
        Err(e) => Err(Error::InvalidImage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

fn has_vp8x(bytes: &[u8]) -> bool {
    bytes.get(12..16) == Some(b"VP8X")
}

/// Find the position of the EXIF APP1 segment in a JPEG.
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == APP1 && s.contents().starts_with(EXIF_PREFIX))
}

/// `set_exif` re-inserts the segment at a fixed index, which can land after
/// XMP. Move it back to where the old one was (or right after APP0) so EXIF
/// stays the first APP1.
fn restore_exif_position(jpeg: &mut Jpeg, original_pos: Option<usize>) {
    let Some(new_pos) = find_exif_segment_pos(jpeg) else {
        return;
    };
    let target_pos = original_pos.unwrap_or(1);
    if target_pos < new_pos {
        let segments = jpeg.segments_mut();
        let seg = segments.remove(new_pos);
        segments.insert(target_pos, seg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::Segment;
    use crate::test_utils::{jpeg_bytes, png_bytes, write_image};
    use tempfile::TempDir;

    #[test]
    fn open_missing_file() {
        let err = ImageFile::open(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn open_non_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            ImageFile::open(&path),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn detects_kind_from_contents() {
        let dir = TempDir::new().unwrap();
        // PNG bytes behind a .jpg extension
        let path = dir.path().join("misnamed.jpg");
        std::fs::write(&path, png_bytes()).unwrap();
        assert_eq!(ImageFile::open(&path).unwrap().kind(), ImageKind::Png);
    }

    #[test]
    fn fresh_image_has_no_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "plain.jpg", &jpeg_bytes(), None);
        let image = ImageFile::open(&path).unwrap();
        assert_eq!(image.kind(), ImageKind::Jpeg);
        assert!(image.metadata().unwrap().is_none());
    }

    #[test]
    fn set_metadata_keeps_payload() {
        for (name, bytes) in [("a.jpg", jpeg_bytes()), ("a.png", png_bytes())] {
            let dir = TempDir::new().unwrap();
            let path = write_image(dir.path(), name, &bytes, None);
            let mut image = ImageFile::open(&path).unwrap();
            let before = image.payload().unwrap();

            let mut block = MetadataBlock::default();
            block.insert(Segment::Primary, 0x010F, "Canon");
            image.set_metadata(&block).unwrap();
            image.save().unwrap();

            let reopened = ImageFile::open(&path).unwrap();
            assert_eq!(reopened.metadata().unwrap(), Some(block), "{name}");
            assert_eq!(reopened.payload().unwrap(), before, "{name}");
        }
    }

    #[test]
    fn jpeg_rejects_oversized_block() {
        let mut image = ImageFile::from_bytes(Path::new("big.jpg"), Bytes::from(jpeg_bytes())).unwrap();
        let err = image.set_raw_exif(vec![0; JPEG_MAX_EXIF_LEN + 1]).unwrap_err();
        assert!(matches!(err, Error::MetadataTooLarge { max: JPEG_MAX_EXIF_LEN, .. }));
    }

    #[test]
    fn vp8x_detection() {
        assert!(has_vp8x(b"RIFF\x10\0\0\0WEBPVP8X"));
        assert!(!has_vp8x(b"RIFF\x10\0\0\0WEBPVP8L"));
        assert!(!has_vp8x(b"RIFF"));
    }
}
