//! Single-target file operations: write/append one file, delete one path.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::file_reader::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "a")]
    Append,
}

impl WriteMode {
    pub fn operation(&self) -> &'static str {
        match self {
            WriteMode::Write => "write",
            WriteMode::Append => "append",
        }
    }
}

/// Arguments of a single file write
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default = "default_true")]
    pub create_dirs: bool,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub overwrite_protection: bool,
    #[serde(default)]
    pub binary: bool,
}

fn default_true() -> bool {
    true
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteSuccess {
    pub message: String,
    pub path: String,
    pub size: u64,
    pub modified: String,
    pub operation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteErrorType {
    DirectoryCreationFailed,
    #[serde(rename = "overwrite_protection")]
    OverwriteProtected,
    BinaryWriteFailed,
    WriteFailed,
}

#[derive(Error, Debug, Clone, Serialize)]
#[error("{message}")]
pub struct WriteFailure {
    pub message: String,
    pub path: String,
    pub error_type: WriteErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl WriteFailure {
    fn new(error_type: WriteErrorType, message: String, path: impl Into<String>) -> Self {
        Self {
            message,
            path: path.into(),
            error_type,
            error_details: None,
        }
    }

    fn write_failed(cause: impl ToString, path: impl Into<String>) -> Self {
        let cause = cause.to_string();
        Self {
            message: format!("Failed to write file: {}", cause),
            path: path.into(),
            error_type: WriteErrorType::WriteFailed,
            error_details: Some(cause),
        }
    }
}

/// Tool-facing shape of a write outcome
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteResponse {
    Success(WriteSuccess),
    Error(WriteFailure),
}

impl From<Result<WriteSuccess, WriteFailure>> for WriteResponse {
    fn from(result: Result<WriteSuccess, WriteFailure>) -> Self {
        match result {
            Ok(success) => WriteResponse::Success(success),
            Err(failure) => WriteResponse::Error(failure),
        }
    }
}

/// Write or append `request.content` to one file
pub async fn write_file(request: &WriteRequest, base_dir: &Path) -> Result<WriteSuccess, WriteFailure> {
    let path = crate::paths::resolve(base_dir, &request.path);
    let display_path = path.to_string_lossy().to_string();

    if request.create_dirs {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                WriteFailure::new(
                    WriteErrorType::DirectoryCreationFailed,
                    format!("Failed to create directories: {}", e),
                    request.path.as_str(),
                )
            })?;
        }
    }

    if request.overwrite_protection
        && request.mode == WriteMode::Write
        && fs::try_exists(&path).await.unwrap_or(false)
    {
        return Err(WriteFailure::new(
            WriteErrorType::OverwriteProtected,
            "File already exists and overwrite_protection is enabled".to_string(),
            display_path,
        ));
    }

    if request.binary {
        let binary_failure = |cause: String| {
            WriteFailure::new(
                WriteErrorType::BinaryWriteFailed,
                format!("Failed to decode or write binary data: {}", cause),
                display_path.as_str(),
            )
        };
        // line breaks in wrapped base64 are not payload
        let compact: String = request
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| binary_failure(e.to_string()))?;
        write_bytes(&path, &bytes, request.mode)
            .await
            .map_err(|e| binary_failure(e.to_string()))?;
    } else {
        let bytes = encode_text(&request.content, &request.encoding)
            .map_err(|e| WriteFailure::write_failed(e, request.path.as_str()))?;
        write_bytes(&path, &bytes, request.mode)
            .await
            .map_err(|e| WriteFailure::write_failed(e, request.path.as_str()))?;
    }

    let metadata = fs::metadata(&path)
        .await
        .map_err(|e| WriteFailure::write_failed(e, request.path.as_str()))?;
    let modified = metadata
        .modified()
        .map_err(|e| WriteFailure::write_failed(e, request.path.as_str()))?;

    let verb = match request.mode {
        WriteMode::Write => "written to",
        WriteMode::Append => "appended to",
    };
    info!("File {} {} ({} bytes)", verb, display_path, metadata.len());

    Ok(WriteSuccess {
        message: format!("File {} {}", verb, display_path),
        path: display_path,
        size: metadata.len(),
        modified: format_timestamp(modified),
        operation: request.mode.operation().to_string(),
    })
}

async fn write_bytes(path: &Path, bytes: &[u8], mode: WriteMode) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Write => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await
}

/// Encode text for the named encoding
pub fn encode_text(content: &str, encoding: &str) -> Result<Vec<u8>, String> {
    let normalized = encoding.trim().to_ascii_lowercase().replace('_', "-");
    match normalized.as_str() {
        "utf-8" | "utf8" => Ok(content.as_bytes().to_vec()),
        "ascii" | "us-ascii" => {
            if content.is_ascii() {
                Ok(content.as_bytes().to_vec())
            } else {
                Err("'ascii' codec can't encode non-ASCII characters".to_string())
            }
        }
        "latin-1" | "latin1" | "iso-8859-1" => content
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .map_err(|_| format!("'latin-1' codec can't encode character {:?}", c))
            })
            .collect(),
        _ => Err(format!("unknown encoding: {}", encoding)),
    }
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("The path {0} does not exist.")]
    NotFound(String),
    #[error("Failed to delete '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedKind {
    File,
    Directory,
}

/// Remove a file, or a directory with everything under it.
///
/// Symlinks are removed as links and never followed.
pub async fn delete_path(raw: &str, base_dir: &Path) -> Result<(PathBuf, DeletedKind), DeleteError> {
    let path = crate::paths::resolve(base_dir, raw);
    let io_error = |source| DeleteError::Io {
        path: path.clone(),
        source,
    };

    let metadata = match fs::symlink_metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(DeleteError::NotFound(raw.to_string())),
        Err(e) => return Err(io_error(e)),
    };

    let kind = if metadata.is_dir() {
        fs::remove_dir_all(&path).await.map_err(io_error)?;
        DeletedKind::Directory
    } else {
        fs::remove_file(&path).await.map_err(io_error)?;
        DeletedKind::File
    };

    info!("Deleted {:?}: {}", kind, path.display());
    Ok((path, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn request(path: &str, content: &str) -> WriteRequest {
        serde_json::from_value(json!({ "path": path, "content": content })).unwrap()
    }

    #[tokio::test]
    async fn test_write_creates_dirs_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        let success = write_file(&request("nested/dir/out.txt", "hello"), temp_dir.path())
            .await
            .unwrap();

        let target = temp_dir.path().join("nested/dir/out.txt");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
        assert_eq!(success.size, 5);
        assert_eq!(success.operation, "write");
        assert_eq!(success.path, target.to_string_lossy());
        assert!(success.message.starts_with("File written to"));
    }

    #[tokio::test]
    async fn test_append_mode() {
        let temp_dir = TempDir::new().unwrap();
        write_file(&request("log.txt", "one\n"), temp_dir.path()).await.unwrap();

        let mut append = request("log.txt", "two\n");
        append.mode = WriteMode::Append;
        let success = write_file(&append, temp_dir.path()).await.unwrap();

        assert_eq!(success.operation, "append");
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("log.txt")).unwrap(),
            "one\ntwo\n"
        );
    }

    #[tokio::test]
    async fn test_overwrite_protection_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("keep.txt");
        std::fs::write(&target, "original").unwrap();
        let before = std::fs::metadata(&target).unwrap().modified().unwrap();

        let mut protected = request("keep.txt", "replacement");
        protected.overwrite_protection = true;
        let failure = write_file(&protected, temp_dir.path()).await.unwrap_err();

        assert_eq!(failure.error_type, WriteErrorType::OverwriteProtected);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "original");
        assert_eq!(std::fs::metadata(&target).unwrap().modified().unwrap(), before);

        // appending is not an overwrite
        protected.mode = WriteMode::Append;
        assert!(write_file(&protected, temp_dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_binary_write() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = [0u8, 1, 2, 254, 255];
        let mut binary = request("data.bin", &STANDARD.encode(bytes));
        binary.binary = true;
        write_file(&binary, temp_dir.path()).await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("data.bin")).unwrap(), bytes);

        binary.content = "not base64!!".to_string();
        let failure = write_file(&binary, temp_dir.path()).await.unwrap_err();
        assert_eq!(failure.error_type, WriteErrorType::BinaryWriteFailed);
    }

    #[tokio::test]
    async fn test_binary_write_accepts_wrapped_base64() {
        let temp_dir = TempDir::new().unwrap();
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = STANDARD.encode(&bytes);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");

        let mut binary = request("wrapped.bin", &format!("{}\n", wrapped));
        binary.binary = true;
        let success = write_file(&binary, temp_dir.path()).await.unwrap();

        assert_eq!(success.size, 256);
        assert_eq!(std::fs::read(temp_dir.path().join("wrapped.bin")).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_missing_parent_without_create_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let mut no_dirs = request("absent/out.txt", "x");
        no_dirs.create_dirs = false;
        let failure = write_file(&no_dirs, temp_dir.path()).await.unwrap_err();
        assert_eq!(failure.error_type, WriteErrorType::WriteFailed);
        assert!(failure.error_details.is_some());
    }

    #[test]
    fn test_response_shape() {
        let failure = WriteFailure::new(
            WriteErrorType::OverwriteProtected,
            "exists".to_string(),
            "/tmp/x",
        );
        let value = serde_json::to_value(WriteResponse::Error(failure)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_type"], "overwrite_protection");
        assert!(value.get("error_details").is_none());
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("é", "UTF-8").unwrap(), "é".as_bytes());
        assert_eq!(encode_text("é", "latin_1").unwrap(), vec![0xE9]);
        assert!(encode_text("é", "ascii").is_err());
        assert!(encode_text("x", "klingon").is_err());
    }

    #[tokio::test]
    async fn test_delete_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("tree/inner")).unwrap();
        std::fs::write(temp_dir.path().join("tree/inner/a.txt"), "a").unwrap();
        std::fs::write(temp_dir.path().join("single.txt"), "s").unwrap();

        let (_, kind) = delete_path("single.txt", temp_dir.path()).await.unwrap();
        assert_eq!(kind, DeletedKind::File);
        let (_, kind) = delete_path("tree", temp_dir.path()).await.unwrap();
        assert_eq!(kind, DeletedKind::Directory);

        assert!(!temp_dir.path().join("single.txt").exists());
        assert!(!temp_dir.path().join("tree").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("bystander.txt"), "b").unwrap();

        let err = delete_path("ghost", temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, DeleteError::NotFound(_)));
        assert_eq!(err.to_string(), "The path ghost does not exist.");
        assert!(temp_dir.path().join("bystander.txt").exists());
    }
}
