//! Fixture images for unit tests.

use img_parts::Bytes;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::container::ImageFile;
use crate::exif::MetadataBlock;

fn encode(format: image::ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_fn(16, 16, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut out, format)
        .expect("encode fixture image");
    out.into_inner()
}

/// A small JPEG without any metadata.
pub fn jpeg_bytes() -> Vec<u8> {
    encode(image::ImageFormat::Jpeg)
}

/// A small PNG without any metadata.
pub fn png_bytes() -> Vec<u8> {
    encode(image::ImageFormat::Png)
}

/// Write `bytes` to `dir/name`, embedding `block` first when given.
pub fn write_image(dir: &Path, name: &str, bytes: &[u8], block: Option<&MetadataBlock>) -> PathBuf {
    let path = dir.join(name);
    let data = match block {
        Some(block) => {
            let mut image = ImageFile::from_bytes(&path, Bytes::copy_from_slice(bytes))
                .expect("parse fixture image");
            image.set_metadata(block).expect("embed fixture metadata");
            image.into_bytes().to_vec()
        }
        None => bytes.to_vec(),
    };
    std::fs::write(&path, data).expect("write fixture image");
    path
}
