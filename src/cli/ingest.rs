//! Directory ingestion: turns files on disk into media records.
//!
//! This is caller-side glue, not engine territory: the engine takes
//! whatever records it is handed. Capture timestamps come from EXIF
//! `DateTimeOriginal` where available, since burst ordering is only as
//! good as the timestamps; filesystem mtime is the fallback.

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use photo_triage::core::{MediaContent, MediaKind, MediaRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm"];

/// Records plus the bookkeeping the CLI needs to display them
pub struct IngestResult {
    pub records: Vec<MediaRecord>,
    /// Record id -> full path, for pretty output
    pub paths: HashMap<Uuid, PathBuf>,
    /// Files that could not be stat'd, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Map a file extension to a media kind, or None for non-media files
fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// EXIF DateTimeOriginal, when the file carries one
fn exif_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(&file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;

    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    if let Value::Ascii(ref vec) = field.value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        // EXIF date format: "YYYY:MM:DD HH:MM:SS"
        let naive = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S").ok()?;
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

/// Best available capture timestamp for a file
fn capture_timestamp(path: &Path, kind: MediaKind, metadata: &std::fs::Metadata) -> DateTime<Utc> {
    if kind == MediaKind::Image {
        if let Some(taken) = exif_timestamp(path) {
            return taken;
        }
    }
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::SystemTime::UNIX_EPOCH))
}

/// Walk `paths` and build a record per media file found.
///
/// Hidden files and directories are skipped. Unreadable files are
/// recorded in `skipped` and do not stop the walk.
pub fn ingest(paths: &[PathBuf]) -> IngestResult {
    let mut records = Vec::new();
    let mut path_index = HashMap::new();
    let mut skipped = Vec::new();

    for root in paths {
        for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
            let hidden = e
                .file_name()
                .to_str()
                .map(|n| n.starts_with('.') && e.depth() > 0)
                .unwrap_or(false);
            !hidden
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    skipped.push((path, e.to_string()));
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(kind) = media_kind(path) else {
                continue;
            };

            let metadata = match std::fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    skipped.push((path.to_path_buf(), e.to_string()));
                    continue;
                }
            };

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let timestamp = capture_timestamp(path, kind, &metadata);

            let record = MediaRecord::new(
                kind,
                filename,
                metadata.len(),
                timestamp,
                MediaContent::Path(path.to_path_buf()),
            );
            path_index.insert(record.id, path.to_path_buf());
            records.push(record);
        }
    }

    IngestResult {
        records,
        paths: path_index,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn picks_up_images_and_videos_only() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "photo.jpg", &[0xFF, 0xD8, 0xFF, 0xE0]);
        touch(&dir, "clip.mp4", &[0x00, 0x00, 0x00, 0x18]);
        touch(&dir, "notes.txt", b"not media");

        let result = ingest(&[dir.path().to_path_buf()]);

        assert_eq!(result.records.len(), 2);
        let kinds: Vec<_> = result.records.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&MediaKind::Image));
        assert!(kinds.contains(&MediaKind::Video));
    }

    #[test]
    fn records_carry_size_and_path_index() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "photo.png", &[0x89, 0x50, 0x4E, 0x47, 0x0D]);

        let result = ingest(&[dir.path().to_path_buf()]);

        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.size_bytes, 5);
        assert_eq!(record.filename, "photo.png");
        assert!(result.paths[&record.id].ends_with("photo.png"));
    }

    #[test]
    fn hidden_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "visible.jpg", &[0xFF, 0xD8]);
        touch(&dir, ".hidden.jpg", &[0xFF, 0xD8]);

        let result = ingest(&[dir.path().to_path_buf()]);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].filename, "visible.jpg");
    }

    #[test]
    fn nested_directories_are_walked() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir, "root.jpg", &[0xFF, 0xD8]);
        let nested = dir.path().join("sub").join("nested.jpg");
        File::create(&nested)
            .unwrap()
            .write_all(&[0xFF, 0xD8])
            .unwrap();

        let result = ingest(&[dir.path().to_path_buf()]);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "PHOTO.JPG", &[0xFF, 0xD8]);

        let result = ingest(&[dir.path().to_path_buf()]);
        assert_eq!(result.records.len(), 1);
    }
}
