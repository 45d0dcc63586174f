//! Append-only storage writer
//!
//! - Every record holds a complete document
//! - No in-place updates; later records supersede earlier ones
//! - With `sync_writes`, a write is not acknowledged until fsync completes
//! - A failed write is truncated away; if truncation fails too, the writer
//!   refuses further writes

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::DocumentRecord;

/// Location of the document file under a data directory.
pub fn storage_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join("documents.dat")
}

/// Storage writer that maintains the documents.dat file.
pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    /// Byte offset where the next record lands
    current_offset: u64,
    sync_writes: bool,
    /// Set when a failed write could not be rolled back
    poisoned: bool,
}

impl StorageWriter {
    /// Opens or creates the storage file at the specified data directory.
    ///
    /// Creates `<data_dir>/data/documents.dat` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `MINE_STORAGE_WRITE_FAILED` if the file cannot be created or opened.
    pub fn open(data_dir: &Path, sync_writes: bool) -> StorageResult<Self> {
        let storage_path = storage_path(data_dir);
        let data_subdir = data_dir.join("data");

        if !data_subdir.exists() {
            fs::create_dir_all(&data_subdir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create data directory: {}", data_subdir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&storage_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open storage file: {}", storage_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path,
            file,
            current_offset,
            sync_writes,
            poisoned: false,
        })
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the current file offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a document record.
    ///
    /// Returns the byte offset where the record was written. On failure the
    /// file is truncated back to that offset.
    ///
    /// # Errors
    ///
    /// Returns `MINE_STORAGE_WRITE_FAILED` if write or fsync fails, or if an
    /// earlier failed write could not be rolled back.
    pub fn write(&mut self, record: &DocumentRecord) -> StorageResult<u64> {
        if self.poisoned {
            return Err(StorageError::write_failed(
                format!("Writer refused document: {}/{}", record.collection, record.document_id),
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("torn bytes after offset {} were not rolled back", self.current_offset),
                ),
            ));
        }

        let serialized = record.serialize();
        let offset = self.current_offset;

        if let Err(e) = self.file.write_all(&serialized) {
            self.rollback(offset);
            return Err(StorageError::write_failed(
                format!("Failed to write document: {}/{}", record.collection, record.document_id),
                e,
            ));
        }

        if self.sync_writes {
            if let Err(e) = self.file.sync_all() {
                self.rollback(offset);
                return Err(StorageError::write_failed(
                    format!(
                        "fsync failed after writing document: {}/{}",
                        record.collection, record.document_id
                    ),
                    e,
                ));
            }
        }

        self.current_offset += serialized.len() as u64;
        Ok(offset)
    }

    /// Truncates the file back to `offset`, dropping a partial record.
    fn rollback(&mut self, offset: u64) {
        let truncated = self.file.set_len(offset).and_then(|_| {
            if self.sync_writes {
                self.file.sync_all()
            } else {
                Ok(())
            }
        });
        if truncated.is_err() {
            self.poisoned = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageReader;
    use tempfile::TempDir;

    fn record(id: &str, body: &str) -> DocumentRecord {
        DocumentRecord::new("people", id, body.as_bytes().to_vec())
    }

    #[test]
    fn test_writer_creates_directories() {
        let temp = TempDir::new().unwrap();
        let writer = StorageWriter::open(temp.path(), true).unwrap();
        assert!(temp.path().join("data").is_dir());
        assert_eq!(writer.path(), storage_path(temp.path()));
        assert_eq!(writer.current_offset(), 0);
    }

    #[test]
    fn test_write_and_read_back() {
        let temp = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp.path(), true).unwrap();

        let first = record("a", r#"{"name":"A"}"#);
        let second = record("b", r#"{"name":"B"}"#);
        let offset_a = writer.write(&first).unwrap();
        let offset_b = writer.write(&second).unwrap();

        assert_eq!(offset_a, 0);
        assert_eq!(offset_b, first.serialize().len() as u64);

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_reopen_appends() {
        let temp = TempDir::new().unwrap();
        let first = record("a", "{}");
        {
            let mut writer = StorageWriter::open(temp.path(), false).unwrap();
            writer.write(&first).unwrap();
        }

        let mut writer = StorageWriter::open(temp.path(), false).unwrap();
        assert_eq!(writer.current_offset(), first.serialize().len() as u64);
        writer.write(&record("b", "{}")).unwrap();

        let mut reader = StorageReader::open_from_data_dir(temp.path()).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_rollback_drops_torn_bytes() {
        let temp = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp.path(), true).unwrap();
        let first = record("a", r#"{"name":"A"}"#);
        writer.write(&first).unwrap();

        // Simulate a write that landed half a record before failing
        let torn = record("b", r#"{"name":"B"}"#).serialize();
        let mut other = OpenOptions::new().append(true).open(writer.path()).unwrap();
        other.write_all(&torn[..torn.len() / 2]).unwrap();

        writer.rollback(writer.current_offset());
        assert!(!writer.poisoned);
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), writer.current_offset());

        let second = record("c", r#"{"name":"C"}"#);
        writer.write(&second).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_poisoned_writer_refuses_writes() {
        let temp = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp.path(), false).unwrap();
        writer.poisoned = true;

        let err = writer.write(&record("a", "{}")).unwrap_err();
        assert_eq!(err.code().code(), "MINE_STORAGE_WRITE_FAILED");
        assert_eq!(writer.current_offset(), 0);
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), 0);
    }
}
