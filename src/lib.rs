//! # exif-edit
//!
//! Edit the EXIF metadata of JPEG, PNG and WebP images in place: copy the
//! metadata of one image onto another, clear it, or remove a single field.
//! The image payload is never decoded or re-encoded.
//!
//! ## Quick Start
//!
//! [`MetadataEditor`] performs one read-modify-write per call:
//!
//! ```rust,no_run
//! use exif_edit::editor::{EditorOptions, MetadataEditor};
//! use exif_edit::exif::{tags, Segment};
//! use std::path::Path;
//!
//! fn main() -> exif_edit::Result<()> {
//!     let editor = MetadataEditor::new(EditorOptions::default());
//!
//!     // Give b.jpg the metadata of a.jpg
//!     editor.clone_metadata(Path::new("a.jpg"), Path::new("b.jpg"))?;
//!
//!     // Drop the camera model, by name or by number
//!     let model = tags::parse_tag("Model").unwrap_or(0x0110);
//!     let outcome = editor.remove_field(Path::new("b.jpg"), model)?;
//!     println!("Removed {} field(s)", outcome.fields_removed);
//!
//!     // Inspect what is left
//!     if let Some(block) = editor.read(Path::new("b.jpg"))? {
//!         println!("Make: {:?}", block.get(Segment::Primary, 0x010F));
//!     }
//!
//!     // Strip everything from a.jpg
//!     editor.clear(Path::new("a.jpg"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Usage
//!
//! The pipeline module walks files and directories and applies one
//! [`pipeline::Action`] to each image, collecting per-file results:
//!
//! ```rust,no_run
//! use exif_edit::config::Config;
//! use exif_edit::pipeline::{collect_images, process_image, Action};
//! use exif_edit::MetadataEditor;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let editor = MetadataEditor::new(config.editor_options());
//!
//!     for path in collect_images(&[PathBuf::from("./photos")]) {
//!         let result = process_image(&path, &Action::Clear, &editor);
//!         if let Some(ref err) = result.error {
//!             eprintln!("Error processing {}: {err}", path.display());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Metadata region |
//! |--------|-----------------|
//! | JPEG (`.jpg`, `.jpeg`) | APP1 `Exif\0\0` segment, at most 65527 bytes |
//! | PNG (`.png`) | `eXIf` chunk |
//! | WebP (`.webp`) | `EXIF` chunk (extended VP8X files only) |
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`container`]: Locating and replacing the metadata region of a file
//! - [`editor`]: Clone, clear and remove-field operations
//! - [`error`]: Error type shared by the library
//! - [`exif`]: Metadata model, tag registry and TIFF codec
//! - [`pipeline`]: Image collection, format detection and batch processing

pub mod config;
pub mod container;
pub mod editor;
pub mod error;
pub mod exif;
pub mod pipeline;

#[cfg(test)]
mod test_utils;

pub use editor::MetadataEditor;
pub use error::{Error, Result};
