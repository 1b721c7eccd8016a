use crate::document::Document;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Read a markdown file and return its content
pub fn read_file(path: &Path) -> Result<String, IoError> {
    String::from_utf8(read_bytes(path)?).map_err(|_| IoError::InvalidUtf8(path.to_path_buf()))
}

/// Write content to a markdown file
pub fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Load a file into a new document.
pub fn load_document(path: &Path) -> Result<Document, IoError> {
    let bytes = read_bytes(path)?;
    let document =
        Document::from_bytes(&bytes).map_err(|_| IoError::InvalidUtf8(path.to_path_buf()))?;
    log::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(document)
}

/// Save a document's exact bytes.
pub fn save_document(path: &Path, document: &Document) -> Result<(), IoError> {
    write_file(path, document.to_bytes())?;
    log::info!("Saved {} at version {}", path.display(), document.version());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContentProvider;
    use crate::span::Span;
    use tempfile::TempDir;

    #[test]
    fn test_read_file_success() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.md");
        fs::write(&path, "# Test Content\n\nParagraph").unwrap();

        let content = read_file(&path).unwrap();
        assert_eq!(content, "# Test Content\n\nParagraph");
    }

    #[test]
    fn test_read_file_not_found() {
        let dir = TempDir::new().unwrap();
        let result = read_file(&dir.path().join("nonexistent.md"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_file_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        fs::write(&path, [0xFF, 0xFE, 0xFD]).unwrap();
        assert!(matches!(read_file(&path), Err(IoError::InvalidUtf8(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder/subfolder/new_file.md");

        write_file(&path, "# New File in Nested Folder").unwrap();

        assert_eq!(read_file(&path).unwrap(), "# New File in Nested Folder");
        assert!(dir.path().join("folder").join("subfolder").is_dir());
    }

    #[test]
    fn test_load_document_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        fs::write(&path, [b'o', b'k', 0xFF]).unwrap();
        assert!(matches!(load_document(&path), Err(IoError::InvalidUtf8(_))));
    }

    #[test]
    fn test_save_round_trips_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "Hello BBBB world\r\n").unwrap();

        let mut doc = load_document(&path).unwrap();
        doc.write(Span::new(6, 10), "[[BBBB]]").unwrap();
        save_document(&path, &doc).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Hello [[BBBB]] world\r\n");
    }
}
