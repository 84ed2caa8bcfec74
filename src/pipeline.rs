use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::editor::{EditOutcome, MetadataEditor};
use crate::error::{Error, Result};
use crate::exif::MetadataBlock;

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// The container format of an image file.
///
/// Each format keeps its EXIF block in a different place:
/// - **JPEG** in an APP1 segment prefixed with `Exif\0\0` (at most 64 KB)
/// - **PNG** in an `eXIf` chunk
/// - **WebP** in an `EXIF` chunk of an extended (VP8X) file
///
/// Use [`ImageKind::from_path`] to guess the format from a file extension.
/// Files are always parsed by content when opened, so a misnamed file still
/// gets edited correctly.
///
/// # Example
///
/// ```rust
/// use exif_edit::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("photo.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::from_path(Path::new("photo.heic")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
        }
    }
}

/// What to do with each image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "arg", rename_all = "snake_case")]
pub enum Action {
    /// Decode and report the metadata without changing the file.
    Show,
    /// Replace the metadata with an empty block.
    Clear,
    /// Remove one tag from every segment.
    RemoveField(u16),
    /// Copy the metadata of the given file.
    CloneFrom(PathBuf),
}

/// The result of applying an [`Action`] to a single image.
///
/// `metadata` holds the block read back from the file after the action. A
/// dry run leaves the file alone, so it then holds the original block.
/// Errors are captured per file so a batch keeps going.
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub action: Action,
    pub outcome: Option<EditOutcome>,
    pub metadata: Option<MetadataBlock>,
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image extensions
/// are included.
///
/// # Example
///
/// ```rust,no_run
/// use exif_edit::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Copy `photo.jpg` to `photo.jpg.bak`. An existing backup is kept, so it
/// always holds the file as it was before the first edit.
pub(crate) fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Apply `action` to one image.
///
/// Never fails: errors end up in [`ProcessResult::error`] so the caller can
/// report them next to the successful files.
///
/// # Example
///
/// ```rust,no_run
/// use exif_edit::editor::MetadataEditor;
/// use exif_edit::pipeline::{Action, process_image};
/// use std::path::Path;
///
/// let editor = MetadataEditor::default();
/// let result = process_image(Path::new("photo.jpg"), &Action::RemoveField(0x0110), &editor);
/// match result.error {
///     Some(e) => eprintln!("failed: {e}"),
///     None => println!("removed {} fields", result.outcome.map_or(0, |o| o.fields_removed)),
/// }
/// ```
pub fn process_image(path: &Path, action: &Action, editor: &MetadataEditor) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        action: action.clone(),
        outcome: None,
        metadata: None,
        error: None,
    };

    let outcome = match action {
        Action::Show => Ok(None),
        Action::Clear => editor.clear(path).map(Some),
        Action::RemoveField(tag) => editor.remove_field(path, *tag).map(Some),
        Action::CloneFrom(source) => editor.clone_metadata(source, path).map(Some),
    };

    match outcome {
        Ok(outcome) => result.outcome = outcome,
        Err(e) => {
            log::warn!("{}: {e}", path.display());
            result.error = Some(e.to_string());
            return result;
        }
    }

    // A dry run leaves the file as it was, so report what was read.
    match editor.read(path) {
        Ok(metadata) => result.metadata = metadata,
        Err(e) => result.error = Some(format!("Failed to read EXIF: {e}")),
    }

    result
}
