//! Path validation integration tests.

use std::fs;
use std::path::Path;

use frame_compare::FrameCompareError;
use frame_compare::validation::{
    SUPPORTED_EXTENSIONS, file_filters, has_supported_extension, is_acceptable_path, validate_path,
};

fn reason(result: Result<(), FrameCompareError>) -> String {
    match result {
        Err(FrameCompareError::UnsupportedPath { reason, .. }) => reason,
        other => panic!("expected UnsupportedPath, got {other:?}"),
    }
}

#[test]
fn extension_check_ignores_case() {
    assert!(has_supported_extension(Path::new("clip.mkv")));
    assert!(has_supported_extension(Path::new("CLIP.MP4")));
    assert!(has_supported_extension(Path::new("dir.with.dots/clip.WebM")));
    assert!(!has_supported_extension(Path::new("notes.txt")));
    assert!(!has_supported_extension(Path::new("mkv")));
    assert!(!has_supported_extension(Path::new("clip.")));
}

#[test]
fn existing_video_file_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encode.M2V");
    fs::write(&path, b"").unwrap();
    assert!(validate_path(&path).is_ok());
    assert!(is_acceptable_path(&path));
}

#[test]
fn missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.mp4");
    assert_eq!(reason(validate_path(&path)), "file does not exist");
    assert!(!is_acceptable_path(&path));
}

#[test]
fn directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("looks_like.mkv");
    fs::create_dir(&path).unwrap();
    assert_eq!(reason(validate_path(&path)), "not a regular file");
}

#[test]
fn wrong_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subtitles.srt");
    fs::write(&path, b"").unwrap();
    let error = validate_path(&path).unwrap_err();
    assert!(error.to_string().contains("subtitles.srt"));
    assert_eq!(reason(Err(error)), "unsupported file extension");
}

#[test]
fn file_filters_list_every_extension() {
    let filters = file_filters();
    assert_eq!(filters.len(), 2);
    assert!(filters[0].starts_with("Video files ("));
    for extension in SUPPORTED_EXTENSIONS {
        assert!(filters[0].contains(&format!("*.{extension}")), "{extension}");
    }
    assert_eq!(filters[1], "All files (*)");
}
