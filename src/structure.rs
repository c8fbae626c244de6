//! Project structure model.
//!
//! A [`ProjectNode`] describes a directory tree to scaffold: string leaves are
//! file contents, objects are directories. [`materialize`] writes such a tree
//! to disk and [`enumerate`] reads an existing directory back into the
//! [`StructureEntry`] shape, with files marked by [`FILE_SENTINEL`].

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Marker used for files in an enumerated structure
pub const FILE_SENTINEL: &str = "file";

pub type StructureMap = BTreeMap<String, StructureEntry>;

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Invalid structure at '{location}': {reason}")]
    Validation { location: String, reason: String },
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StructureError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A file (its text content) or a directory of named children
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub enum ProjectNode {
    File(String),
    Directory(BTreeMap<String, ProjectNode>),
}

impl ProjectNode {
    /// Build a tree from a nested JSON description, validating every level
    pub fn from_value(value: &Value) -> Result<Self, StructureError> {
        Self::parse(value, "")
    }

    fn parse(value: &Value, location: &str) -> Result<Self, StructureError> {
        match value {
            Value::String(content) => {
                if content.trim().is_empty() {
                    return Err(StructureError::Validation {
                        location: display_location(location),
                        reason: "File content cannot be empty".to_string(),
                    });
                }
                Ok(ProjectNode::File(content.clone()))
            }
            Value::Object(entries) => {
                let mut children = BTreeMap::new();
                for (name, child) in entries {
                    let child_location = if location.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", location, name)
                    };
                    validate_name(name, &child_location)?;
                    children.insert(name.clone(), Self::parse(child, &child_location)?);
                }
                Ok(ProjectNode::Directory(children))
            }
            other => Err(StructureError::Validation {
                location: display_location(location),
                reason: format!(
                    "expected file content (string) or directory (object), found {}",
                    json_type_name(other)
                ),
            }),
        }
    }

    /// The shape [`enumerate`] would report for this tree once written
    pub fn shape(&self) -> StructureEntry {
        match self {
            ProjectNode::File(_) => StructureEntry::File,
            ProjectNode::Directory(children) => StructureEntry::Directory(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.shape()))
                    .collect(),
            ),
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            ProjectNode::File(_) => 1,
            ProjectNode::Directory(children) => children.values().map(|c| c.file_count()).sum(),
        }
    }
}

impl TryFrom<Value> for ProjectNode {
    type Error = StructureError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn validate_name(name: &str, location: &str) -> Result<(), StructureError> {
    let reason = if name.is_empty() {
        "entry name cannot be empty"
    } else if name == "." || name == ".." {
        "entry name cannot be '.' or '..'"
    } else if name.contains('/') || name.contains('\\') {
        "entry name cannot contain path separators"
    } else {
        return Ok(());
    };

    Err(StructureError::Validation {
        location: location.to_string(),
        reason: reason.to_string(),
    })
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "<root>".to_string()
    } else {
        location.to_string()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Write `node` to disk at `base_path`, returning the number of files written.
///
/// Not transactional: on error, whatever was already written stays in place.
pub fn materialize(base_path: &Path, node: &ProjectNode) -> Result<usize, StructureError> {
    match node {
        ProjectNode::File(content) => {
            if let Some(parent) = base_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| StructureError::io("create directory", parent, e))?;
            }
            fs::write(base_path, content)
                .map_err(|e| StructureError::io("write file", base_path, e))?;
            debug!("Wrote {} ({} bytes)", base_path.display(), content.len());
            Ok(1)
        }
        ProjectNode::Directory(children) => {
            fs::create_dir_all(base_path)
                .map_err(|e| StructureError::io("create directory", base_path, e))?;
            let mut written = 0;
            for (name, child) in children {
                written += materialize(&base_path.join(name), child)?;
            }
            Ok(written)
        }
    }
}

/// An enumerated directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureEntry {
    File,
    Directory(StructureMap),
}

impl Serialize for StructureEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StructureEntry::File => serializer.serialize_str(FILE_SENTINEL),
            StructureEntry::Directory(children) => children.serialize(serializer),
        }
    }
}

/// Describe the tree under `root`.
///
/// Directories whose name starts with `.` are neither listed nor descended
/// into; hidden files are listed. Symlinks to directories are reported as
/// empty directories and never followed. Only a failure to read `root`
/// itself is an error, unreadable entries further down are skipped.
pub fn enumerate(root: &Path) -> Result<StructureMap, StructureError> {
    fs::read_dir(root).map_err(|e| StructureError::io("read directory", root, e))?;

    let mut map = StructureMap::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(is_directory(entry) && is_hidden(entry)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                // a directory that listed but could not be opened
                if let Some(relative) = e.path().and_then(|p| p.strip_prefix(root).ok()) {
                    remove_at(&mut map, relative);
                }
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let kind = if is_directory(&entry) {
            StructureEntry::Directory(StructureMap::new())
        } else {
            StructureEntry::File
        };
        insert_at(&mut map, relative, kind);
    }

    Ok(map)
}

/// Directory, or symlink resolving to one
fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn insert_at(map: &mut StructureMap, relative: &Path, kind: StructureEntry) {
    let Some(name) = relative.file_name() else {
        return;
    };
    let parent = relative.parent().unwrap_or(Path::new(""));
    if let Some(children) = children_at(map, parent) {
        children.insert(name.to_string_lossy().to_string(), kind);
    }
}

fn remove_at(map: &mut StructureMap, relative: &Path) {
    let Some(name) = relative.file_name() else {
        return;
    };
    let parent = relative.parent().unwrap_or(Path::new(""));
    if let Some(children) = children_at(map, parent) {
        children.remove(&*name.to_string_lossy());
    }
}

fn children_at<'a>(map: &'a mut StructureMap, relative: &Path) -> Option<&'a mut StructureMap> {
    let mut current = map;
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        match current.get_mut(&*name) {
            Some(StructureEntry::Directory(children)) => current = children,
            _ => return None,
        }
    }
    Some(current)
}

/// Nest `map` under each segment of the path the caller asked for.
///
/// `src/app` with contents `{main.rs}` becomes `{src: {app: {main.rs}}}`.
/// Root and drive prefixes carry no name and are dropped.
pub fn nest_under_segments(requested: &Path, map: StructureMap) -> StructureMap {
    let mut segments: Vec<String> = requested
        .components()
        .filter_map(|component| match component {
            Component::CurDir => Some(".".to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();

    let Some(last) = segments.pop() else {
        return map;
    };

    let mut nested = StructureMap::from([(last, StructureEntry::Directory(map))]);
    while let Some(segment) = segments.pop() {
        nested = StructureMap::from([(segment, StructureEntry::Directory(nested))]);
    }
    nested
}
