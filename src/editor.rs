//! Read-modify-write operations on an image's EXIF block.
//!
//! Every operation follows the same flow: open the container, decode the
//! metadata region, change the [`MetadataBlock`] in memory, encode it and
//! overwrite the file. The image payload is carried over untouched.
//!
//! ```rust,no_run
//! use exif_edit::editor::{EditorOptions, MetadataEditor};
//! use std::path::Path;
//!
//! let editor = MetadataEditor::new(EditorOptions::default());
//! editor.clone_metadata(Path::new("a.jpg"), Path::new("b.jpg"))?;
//! editor.remove_field(Path::new("b.jpg"), 0x0110)?; // Model
//! editor.clear(Path::new("a.jpg"))?;
//! # Ok::<(), exif_edit::Error>(())
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::container::{ImageFile, ensure_exists};
use crate::error::{Error, Result};
use crate::exif::{ByteOrder, MetadataBlock};
use crate::pipeline::backup_file;

/// Behavior switches shared by all operations.
#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    /// Do everything except overwrite the file.
    pub dry_run: bool,
    /// Copy `name.ext` to `name.ext.bak` before the first overwrite.
    pub backup_originals: bool,
    /// Byte order for blocks created from scratch (`clear`).
    pub byte_order: ByteOrder,
}

/// What an operation did to one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditOutcome {
    /// Fields removed by `remove_field` (one per segment that had the tag).
    pub fields_removed: usize,
    /// Whether the file was overwritten. False for dry runs and no-ops.
    pub written: bool,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataEditor {
    options: EditorOptions,
}

impl MetadataEditor {
    pub fn new(options: EditorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Decode the metadata of `path`. `Ok(None)` if it carries none.
    pub fn read(&self, path: &Path) -> Result<Option<MetadataBlock>> {
        ImageFile::open(path)?.metadata()
    }

    /// Copy the metadata block of `source` into `target`, replacing whatever
    /// `target` had. Both files must exist before anything is read.
    pub fn clone_metadata(&self, source: &Path, target: &Path) -> Result<EditOutcome> {
        ensure_exists(source)?;
        ensure_exists(target)?;

        let block = ImageFile::open(source)?.metadata()?.ok_or_else(|| {
            Error::decode(format!("{} has no EXIF block", source.display()))
        })?;
        log::debug!(
            "Cloning {} fields from {} to {}",
            block.field_count(),
            source.display(),
            target.display()
        );

        let image = ImageFile::open(target)?;
        self.commit(image, &block, 0)
    }

    /// Replace the metadata of `path` with an empty, well-formed block.
    /// Clearing twice leaves the file in the same state as clearing once.
    pub fn clear(&self, path: &Path) -> Result<EditOutcome> {
        let image = ImageFile::open(path)?;
        let empty = MetadataBlock::new(self.options.byte_order);
        self.commit(image, &empty, 0)
    }

    /// Remove `tag` from every segment that has it. A missing tag (or a file
    /// without metadata) is a no-op and the file is left as is.
    pub fn remove_field(&self, path: &Path, tag: u16) -> Result<EditOutcome> {
        let image = ImageFile::open(path)?;
        let Some(mut block) = image.metadata()? else {
            log::debug!("{} has no EXIF block, nothing to remove", path.display());
            return Ok(EditOutcome::default());
        };

        let removed = block.remove_everywhere(tag);
        if removed == 0 {
            log::debug!("Tag {tag:#06x} not present in {}", path.display());
            return Ok(EditOutcome::default());
        }
        self.commit(image, &block, removed)
    }

    fn commit(
        &self,
        mut image: ImageFile,
        block: &MetadataBlock,
        fields_removed: usize,
    ) -> Result<EditOutcome> {
        // Encoding validates the block, so a bad field fails before any write.
        image.set_metadata(block)?;

        let mut outcome = EditOutcome {
            fields_removed,
            ..EditOutcome::default()
        };
        if self.options.dry_run {
            log::info!("Dry run: {} not modified", image.path().display());
            return Ok(outcome);
        }

        if self.options.backup_originals {
            outcome.backup_path = Some(backup_file(image.path())?);
        }
        image.save()?;
        outcome.written = true;
        Ok(outcome)
    }
}
