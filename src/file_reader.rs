//! Batch file reading.
//!
//! Every requested path yields one or more [`FileResult`]s. Problems with a
//! single file (too large, binary, unreadable) are recorded on that file's
//! result and never abort the batch.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
const UNKNOWN_MIME_TYPE: &str = "unknown";
const SNIFF_LEN: u64 = 8 * 1024;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    pub size: u64,
    pub modified: String,
    pub mime_type: String,
    pub is_binary: bool,
}

impl FileMetadata {
    /// Stand-in metadata for a path that could not be inspected
    pub fn placeholder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            modified: format_timestamp(SystemTime::now()),
            mime_type: UNKNOWN_MIME_TYPE.to_string(),
            is_binary: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub metadata: FileMetadata,
    pub content: Option<String>,
    pub error: Option<String>,
}

impl FileResult {
    fn content(metadata: FileMetadata, content: String) -> Self {
        Self {
            metadata,
            content: Some(content),
            error: None,
        }
    }

    fn skipped(metadata: FileMetadata, reason: ReadSkip) -> Self {
        Self {
            metadata,
            content: None,
            error: Some(reason.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Why a file produced no content
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadSkip {
    #[error("File exceeds maximum size limit of {limit_mb:.2}MB")]
    SizeExceeded { limit_mb: f64 },
    #[error("Binary file skipped (set include_binary=true to read)")]
    BinarySkipped,
    #[error("File contains non-UTF-8 characters")]
    NonUtf8,
    #[error("Path not found: {0}")]
    NotFound(String),
    #[error("Error reading file: {0}")]
    ReadFailed(String),
    #[error("Error processing path: {0}")]
    ProcessingFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOptions {
    pub max_size_bytes: u64,
    pub include_binary: bool,
    pub recursive: bool,
}

impl ReadOptions {
    /// Options with the size cap given in (possibly fractional) megabytes
    pub fn from_megabytes(max_size_mb: f64, include_binary: bool, recursive: bool) -> Self {
        Self {
            max_size_bytes: (max_size_mb.max(0.0) * BYTES_PER_MB) as u64,
            include_binary,
            recursive,
        }
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::from_megabytes(1.0, false, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Success,
    PartialSuccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadReport {
    pub status: ReadStatus,
    pub files: Vec<FileResult>,
    pub errors: Option<Vec<String>>,
    pub file_count: usize,
    pub success_count: usize,
}

/// Read every path in `paths`, resolving relative ones against `base_dir`
pub fn read_many(paths: &[String], options: &ReadOptions, base_dir: &Path) -> ReadReport {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for raw in paths {
        let path = crate::paths::resolve(base_dir, raw);

        if path.is_dir() {
            match walk_directory(&path, options) {
                Ok(dir_files) => files.extend(dir_files),
                Err(e) => {
                    errors.push(format!("Error processing path '{}': {}", raw, e));
                    files.push(FileResult::skipped(
                        FileMetadata::placeholder(raw.as_str()),
                        ReadSkip::ProcessingFailed(e.to_string()),
                    ));
                }
            }
        } else if path.is_file() {
            files.push(read_file(&path, options));
        } else {
            let reason = ReadSkip::NotFound(raw.clone());
            errors.push(reason.to_string());
            files.push(FileResult::skipped(FileMetadata::placeholder(raw.as_str()), reason));
        }
    }

    let file_count = files.len();
    let success_count = files.iter().filter(|f| f.is_success()).count();
    debug!(
        "Read {} paths: {} files, {} without errors",
        paths.len(),
        file_count,
        success_count
    );

    ReadReport {
        status: if errors.is_empty() {
            ReadStatus::Success
        } else {
            ReadStatus::PartialSuccess
        },
        files,
        errors: if errors.is_empty() { None } else { Some(errors) },
        file_count,
        success_count,
    }
}

/// Read every file under `dir`, descending only when `options.recursive`
fn walk_directory(dir: &Path, options: &ReadOptions) -> std::io::Result<Vec<FileResult>> {
    let mut results = Vec::new();

    if options.recursive {
        for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
            match entry {
                Ok(entry) if !entry.file_type().is_dir() && entry.path().is_file() => {
                    results.push(read_file(entry.path(), options));
                }
                Ok(_) => {}
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => warn!("Skipping entry under {}: {}", dir.display(), e),
            }
        }
    } else {
        let mut children: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        children.sort();
        for child in children {
            results.push(read_file(&child, options));
        }
    }

    Ok(results)
}

/// Read one file, applying the size and binary policies
pub fn read_file(path: &Path, options: &ReadOptions) -> FileResult {
    let metadata = match file_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            return FileResult::skipped(
                FileMetadata::placeholder(path.to_string_lossy()),
                ReadSkip::ReadFailed(e.to_string()),
            );
        }
    };

    if metadata.size > options.max_size_bytes {
        return FileResult::skipped(
            metadata,
            ReadSkip::SizeExceeded {
                limit_mb: options.max_size_bytes as f64 / BYTES_PER_MB,
            },
        );
    }

    if metadata.is_binary && !options.include_binary {
        return FileResult::skipped(metadata, ReadSkip::BinarySkipped);
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return FileResult::skipped(metadata, ReadSkip::ReadFailed(e.to_string())),
    };

    match String::from_utf8(bytes) {
        Ok(text) => FileResult::content(metadata, text),
        Err(invalid) if options.include_binary => {
            let encoded = STANDARD.encode(invalid.as_bytes());
            FileResult::content(metadata, format!("[BASE64 ENCODED BINARY DATA: {}]", encoded))
        }
        Err(_) => FileResult::skipped(metadata, ReadSkip::NonUtf8),
    }
}

/// Size, mtime and detected MIME type of a file
pub fn file_metadata(path: &Path) -> std::io::Result<FileMetadata> {
    let stat = fs::metadata(path)?;
    let mime_type = detect_mime_type(path);
    let is_binary = !is_text_mime(&mime_type);

    Ok(FileMetadata {
        path: path.to_string_lossy().to_string(),
        size: stat.len(),
        modified: format_timestamp(stat.modified()?),
        mime_type,
        is_binary,
    })
}

/// MIME type from the extension, falling back to a look at the first bytes
pub fn detect_mime_type(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }
    if looks_like_text(path) {
        "text/plain".to_string()
    } else {
        DEFAULT_MIME_TYPE.to_string()
    }
}

fn looks_like_text(path: &Path) -> bool {
    let mut head = Vec::new();
    let read = fs::File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut head));
    if read.is_err() || head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(&head) {
        Ok(_) => true,
        // a multi-byte character cut off at the sniff boundary
        Err(e) => e.error_len().is_none(),
    }
}

pub fn is_text_mime(mime_type: &str) -> bool {
    mime_type.starts_with("text/") || mime_type.starts_with("application/json")
}

pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339_opts(SecondsFormat::Micros, false)
}
