//! Storage reader with strict corruption detection
//!
//! - Every read validates checksum
//! - A truncated or corrupt record aborts the scan
//! - Replay keeps the latest record per (collection, document id)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{DocumentRecord, MIN_RECORD_SIZE};
use super::writer::storage_path;

/// Storage reader for sequential scans.
pub struct StorageReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens the storage file for reading.
    pub fn open(storage_path: &Path) -> StorageResult<Self> {
        let file = File::open(storage_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open storage file: {}", storage_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Opens storage from data directory.
    pub fn open_from_data_dir(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&storage_path(data_dir))
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next record from storage.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` if end of file
    /// - `Err(MINE_DATA_CORRUPTION)` if the record is truncated or its checksum fails
    pub fn read_next(&mut self) -> StorageResult<Option<DocumentRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        let min_size = MIN_RECORD_SIZE as u64;

        if remaining < min_size {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated storage: {} bytes remaining, minimum record size is {}",
                    remaining, min_size
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < min_size {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);

        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, bytes_consumed) = DocumentRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += bytes_consumed as u64;

        Ok(Some(record))
    }

    /// Reads all records from storage, in file order.
    pub fn read_all(&mut self) -> StorageResult<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Reads the current version of every document.
    ///
    /// The latest record for each (collection, document id) wins; documents
    /// are returned in order of first appearance.
    pub fn replay(&mut self) -> StorageResult<Vec<DocumentRecord>> {
        let mut latest: Vec<DocumentRecord> = Vec::new();
        let mut positions: HashMap<(String, String), usize> = HashMap::new();

        while let Some(record) = self.read_next()? {
            let key = (record.collection.clone(), record.document_id.clone());
            match positions.get(&key) {
                Some(&pos) => latest[pos] = record,
                None => {
                    positions.insert(key, latest.len());
                    latest.push(record);
                }
            }
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageWriter;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(collection: &str, id: &str, body: &str) -> DocumentRecord {
        DocumentRecord::new(collection, id, body.as_bytes().to_vec())
    }

    fn write_all(dir: &Path, records: &[DocumentRecord]) {
        let mut writer = StorageWriter::open(dir, true).unwrap();
        for r in records {
            writer.write(r).unwrap();
        }
    }

    #[test]
    fn test_read_empty_file() {
        let temp = TempDir::new().unwrap();
        write_all(temp.path(), &[]);
        let mut reader = StorageReader::open_from_data_dir(temp.path()).unwrap();
        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.replay().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = StorageReader::open_from_data_dir(temp.path()).err().unwrap();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_replay_latest_wins() {
        let temp = TempDir::new().unwrap();
        write_all(
            temp.path(),
            &[
                record("commit", "c1", r#"{"branches":["main"]}"#),
                record("people", "p1", r#"{"name":"A"}"#),
                record("commit", "c1", r#"{"branches":["main","dev"]}"#),
            ],
        );

        let mut reader = StorageReader::open_from_data_dir(temp.path()).unwrap();
        let docs = reader.replay().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].document_id, "c1");
        assert_eq!(docs[0].body, br#"{"branches":["main","dev"]}"#.to_vec());
        assert_eq!(docs[1].collection, "people");
    }

    #[test]
    fn test_same_id_in_different_collections_kept() {
        let temp = TempDir::new().unwrap();
        write_all(temp.path(), &[record("commit", "x", "{}"), record("tag", "x", "{}")]);
        let mut reader = StorageReader::open_from_data_dir(temp.path()).unwrap();
        assert_eq!(reader.replay().unwrap().len(), 2);
    }

    #[test]
    fn test_corruption_detected() {
        let temp = TempDir::new().unwrap();
        write_all(temp.path(), &[record("people", "p1", r#"{"name":"Ada"}"#)]);

        let path = storage_path(temp.path());
        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let err = reader.read_next().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.details(), Some("byte_offset: 0"));
    }

    #[test]
    fn test_trailing_garbage_is_corruption() {
        let temp = TempDir::new().unwrap();
        write_all(temp.path(), &[record("people", "p1", "{}")]);

        let path = storage_path(temp.path());
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        assert!(reader.read_next().unwrap_err().is_fatal());
    }
}
