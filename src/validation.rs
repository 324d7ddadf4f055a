//! Path validation.
//!
//! Sources are checked before any decoder is opened: the path must exist,
//! be a regular file and carry one of the supported video extensions.
//!
//! # Example
//!
//! ```no_run
//! use frame_compare::validation;
//!
//! match validation::validate_path("clip.mkv") {
//!     Ok(()) => println!("ok"),
//!     Err(error) => println!("{error}"),
//! }
//! ```

use std::path::Path;

use crate::error::FrameCompareError;

/// Supported file extensions, lower case, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "mp4v", "mpg4", "mov", "qt", "avi", "wmv", "flv", "mpeg", "m1v", "m2v", "mpa",
    "mpe", "mpg", "m4v", "3gp", "ts", "webm",
];

/// MIME types corresponding to the supported containers.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "video/x-matroska",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/mpeg",
    "video/x-m4v",
    "video/3gpp",
    "video/mp2t",
    "video/webm",
];

/// File-dialog filter strings, e.g. `"Video files (*.mkv *.mp4 ...)"`.
pub fn file_filters() -> Vec<String> {
    let patterns = SUPPORTED_EXTENSIONS
        .iter()
        .map(|extension| format!("*.{extension}"))
        .collect::<Vec<_>>()
        .join(" ");
    vec![format!("Video files ({patterns})"), "All files (*)".to_string()]
}

/// Whether `path` has a supported extension. Case-insensitive.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(extension))
        })
}

/// Check that `path` names an existing regular file with a supported extension.
///
/// # Errors
///
/// Returns [`FrameCompareError::UnsupportedPath`] describing the first
/// failed check, or [`FrameCompareError::IoError`] if the file metadata
/// cannot be read for another reason.
pub fn validate_path<P: AsRef<Path>>(path: P) -> Result<(), FrameCompareError> {
    let path = path.as_ref();
    let unsupported = |reason: &str| FrameCompareError::UnsupportedPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(unsupported("file does not exist"));
        }
        Err(error) => return Err(error.into()),
    };

    if !metadata.is_file() {
        return Err(unsupported("not a regular file"));
    }
    if !has_supported_extension(path) {
        return Err(unsupported("unsupported file extension"));
    }
    Ok(())
}

/// Boolean form of [`validate_path`].
pub fn is_acceptable_path<P: AsRef<Path>>(path: P) -> bool {
    validate_path(path).is_ok()
}
