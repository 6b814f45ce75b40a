use crate::models::Document;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Read a markdown file and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write content to a markdown file
pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(notes_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Load a markdown file as a block document.
///
/// A missing file opens as a fresh document with one empty text block, so
/// a new page can be started from a path that does not exist yet.
pub fn load_document(relative_path: &RelativePath, notes_root: &Path) -> Result<Document, IoError> {
    match read_file(relative_path, notes_root) {
        Ok(text) => {
            let document = Document::from_markdown(&text);
            log::debug!("loaded {} blocks from {relative_path}", document.len());
            Ok(document)
        }
        Err(IoError::NotFound(path)) => {
            log::debug!("{} does not exist yet, starting empty", path.display());
            Ok(Document::new())
        }
        Err(e) => Err(e),
    }
}

/// Write a document's markdown form, with a trailing newline
pub fn save_document(
    relative_path: &RelativePath,
    notes_root: &Path,
    document: &Document,
) -> Result<(), IoError> {
    let mut text = document.to_markdown();
    if !text.is_empty() {
        text.push('\n');
    }
    write_file(relative_path, notes_root, &text)
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}
