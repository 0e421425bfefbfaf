//! Project archive transport and extraction
//!
//! Projects travel as base64-encoded zip files. Extraction confines every entry to
//! the destination directory: entries with absolute paths or `..` components are
//! skipped, never written.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ignore::WalkBuilder;
use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid zip archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ArchiveError {
    fn io(path: &Path, source: io::Error) -> Self {
        ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
}

pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(payload.trim())
}

pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Extracts on the blocking pool so the request task stays responsive.
pub async fn extract(bytes: Vec<u8>, destination: PathBuf) -> Result<ExtractSummary, ArchiveError> {
    tokio::task::spawn_blocking(move || extract_to(&bytes, &destination)).await?
}

/// Unpacks `bytes` into `destination`, overwriting files that already exist.
pub fn extract_to(bytes: &[u8], destination: &Path) -> Result<ExtractSummary, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!("Skipping archive entry outside the workspace: {}", entry.name());
            summary.skipped += 1;
            continue;
        };
        let out_path = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| ArchiveError::io(&out_path, e))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }

        let mut out_file = File::create(&out_path).map_err(|e| ArchiveError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out_file).map_err(|e| ArchiveError::io(&out_path, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().filter(|mode| mode & 0o777 != 0) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| ArchiveError::io(&out_path, e))?;
        }

        summary.files += 1;
    }

    debug!(
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped,
        "Archive extracted to {}",
        destination.display()
    );
    Ok(summary)
}

/// Zips the contents of `root` (not `root` itself) into memory.
pub fn pack_directory(root: &Path) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry
            .map_err(|e| ArchiveError::io(root, io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        let path = entry.path();

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = archive_name(relative);

        if entry.file_type().map_or(false, |ft| ft.is_dir()) {
            writer.add_directory(name, options)?;
            continue;
        }

        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(path)
                .map_err(|e| ArchiveError::io(path, e))?
                .permissions()
                .mode();
            options.unix_permissions(mode & 0o7777)
        };

        writer.start_file(name, options)?;
        let contents = fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
        writer.write_all(&contents).map_err(|e| ArchiveError::io(path, e))?;
    }

    Ok(writer.finish()?.into_inner())
}

fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
