//! # Stored ZIP Archives
//!
//! Builds uncompressed ("stored") ZIP archives from an ordered list of named
//! byte payloads. The output uses the minimal "version needed = 2.0" profile:
//! no compression, no data descriptors, no extra fields, zeroed timestamps and
//! raw filename bytes (the UTF-8 flag is never set).
//!
//! ## Layout
//!
//! ```text
//! [local header 0][name 0][data 0] ... [local header n][name n][data n]
//! [central entry 0] ... [central entry n]
//! [end of central directory]
//! ```
//!
//! Each central entry records the byte offset of its local header, and the
//! end record records where the central directory starts. Both are running
//! totals of the bytes emitted so far.
//!
//! ## Example
//!
//! ```
//! use carousel::archive::ArchiveWriter;
//!
//! let mut writer = ArchiveWriter::new();
//! writer.add_stored("slide-1.png", b"\x89PNG...")?;
//! let bytes = writer.finish()?;
//! assert_eq!(&bytes[..4], b"PK\x03\x04");
//! # Ok::<(), carousel::archive::ArchiveError>(())
//! ```

pub mod crc;

use std::collections::HashSet;
use thiserror::Error;

pub use crc::crc32;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIGNATURE: u32 = 0x0605_4b50;

/// "2.0" in the ZIP version encoding.
const VERSION: u16 = 20;
const METHOD_STORED: u16 = 0;

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const END_RECORD_LEN: usize = 22;

/// Errors from archive assembly. Every variant is raised before any byte of
/// the offending entry is written, so a returned archive is always complete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("entry name is {0} bytes, the limit is 65535")]
    NameTooLong(usize),

    #[error("entry name is empty")]
    EmptyName,

    #[error("duplicate entry name '{0}'")]
    DuplicateEntry(String),

    #[error("archive holds more than 65535 entries")]
    TooManyEntries,

    #[error("entry '{name}' is {len} bytes, which does not fit a 32-bit ZIP")]
    EntryTooLarge { name: String, len: usize },

    #[error("archive exceeds 4 GiB, which does not fit a 32-bit ZIP")]
    ArchiveTooLarge,
}

/// A named payload destined for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ExportedFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Fields shared by a local header and its central directory mirror.
#[derive(Debug, Clone)]
struct EntryRecord {
    name: Vec<u8>,
    crc32: u32,
    size: u32,
    local_header_offset: u32,
}

/// Incremental stored-ZIP writer.
///
/// Entries are appended to an in-memory buffer as they are added; the
/// central directory is written by [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    buffer: Vec<u8>,
    entries: Vec<EntryRecord>,
    names: HashSet<String>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one stored entry.
    pub fn add_stored(&mut self, name: &str, data: &[u8]) -> Result<(), ArchiveError> {
        let name_bytes = name.as_bytes();
        if name_bytes.is_empty() {
            return Err(ArchiveError::EmptyName);
        }
        if name_bytes.len() > u16::MAX as usize {
            return Err(ArchiveError::NameTooLong(name_bytes.len()));
        }
        if self.entries.len() >= u16::MAX as usize {
            return Err(ArchiveError::TooManyEntries);
        }
        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }
        let size = u32::try_from(data.len()).map_err(|_| ArchiveError::EntryTooLarge {
            name: name.to_string(),
            len: data.len(),
        })?;
        let offset = u32::try_from(self.buffer.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;

        // The next local header offset must still fit in 32 bits.
        let projected = self.buffer.len() as u64
            + (LOCAL_HEADER_LEN + name_bytes.len()) as u64
            + data.len() as u64;
        if projected > u32::MAX as u64 {
            return Err(ArchiveError::ArchiveTooLarge);
        }

        let record = EntryRecord {
            name: name_bytes.to_vec(),
            crc32: crc32(data),
            size,
            local_header_offset: offset,
        };

        self.buffer
            .reserve(LOCAL_HEADER_LEN + name_bytes.len() + data.len());
        write_local_header(&mut self.buffer, &record);
        self.buffer.extend_from_slice(&record.name);
        self.buffer.extend_from_slice(data);

        self.names.insert(name.to_string());
        self.entries.push(record);
        Ok(())
    }

    /// Write the central directory and end record, returning the archive.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let Self {
            mut buffer,
            entries,
            ..
        } = self;

        let central_dir_offset =
            u32::try_from(buffer.len()).map_err(|_| ArchiveError::ArchiveTooLarge)?;

        let central_dir_len: usize = entries
            .iter()
            .map(|e| CENTRAL_HEADER_LEN + e.name.len())
            .sum();
        let total = buffer.len() as u64 + central_dir_len as u64 + END_RECORD_LEN as u64;
        if total > u32::MAX as u64 {
            return Err(ArchiveError::ArchiveTooLarge);
        }

        buffer.reserve(central_dir_len + END_RECORD_LEN);
        for entry in &entries {
            write_central_header(&mut buffer, entry);
        }

        let count = entries.len() as u16;
        put_u32(&mut buffer, END_OF_CENTRAL_DIR_SIGNATURE);
        put_u16(&mut buffer, 0); // this disk
        put_u16(&mut buffer, 0); // disk holding the central directory
        put_u16(&mut buffer, count); // entries on this disk
        put_u16(&mut buffer, count); // entries total
        put_u32(&mut buffer, central_dir_len as u32);
        put_u32(&mut buffer, central_dir_offset);
        put_u16(&mut buffer, 0); // comment length

        Ok(buffer)
    }
}

/// Build a complete stored ZIP from an ordered list of files.
///
/// Entries appear in the archive in input order.
pub fn build_archive(files: &[ExportedFile]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ArchiveWriter::new();
    for file in files {
        writer.add_stored(&file.filename, &file.data)?;
    }
    writer.finish()
}

/// Exact size of the archive [`build_archive`] produces for `files`.
pub fn expected_archive_len(files: &[ExportedFile]) -> usize {
    files
        .iter()
        .map(|f| LOCAL_HEADER_LEN + CENTRAL_HEADER_LEN + 2 * f.filename.len() + f.data.len())
        .sum::<usize>()
        + END_RECORD_LEN
}

fn write_local_header(out: &mut Vec<u8>, entry: &EntryRecord) {
    put_u32(out, LOCAL_HEADER_SIGNATURE);
    put_u16(out, VERSION); // version needed to extract
    put_u16(out, 0); // general purpose flags
    put_u16(out, METHOD_STORED);
    put_u16(out, 0); // mod time
    put_u16(out, 0); // mod date
    put_u32(out, entry.crc32);
    put_u32(out, entry.size); // compressed
    put_u32(out, entry.size); // uncompressed
    put_u16(out, entry.name.len() as u16);
    put_u16(out, 0); // extra field length
}

fn write_central_header(out: &mut Vec<u8>, entry: &EntryRecord) {
    put_u32(out, CENTRAL_HEADER_SIGNATURE);
    put_u16(out, VERSION); // version made by
    put_u16(out, VERSION); // version needed to extract
    put_u16(out, 0); // general purpose flags
    put_u16(out, METHOD_STORED);
    put_u16(out, 0); // mod time
    put_u16(out, 0); // mod date
    put_u32(out, entry.crc32);
    put_u32(out, entry.size); // compressed
    put_u32(out, entry.size); // uncompressed
    put_u16(out, entry.name.len() as u16);
    put_u16(out, 0); // extra field length
    put_u16(out, 0); // comment length
    put_u16(out, 0); // disk number start
    put_u16(out, 0); // internal attributes
    put_u32(out, 0); // external attributes
    put_u32(out, entry.local_header_offset);
    out.extend_from_slice(&entry.name);
}

#[inline]
fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn u16_at(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    fn sample_files() -> Vec<ExportedFile> {
        vec![
            ExportedFile::new("slide-1.png", vec![1, 2, 3, 4, 5]),
            ExportedFile::new("slide-2.png", (0..300u32).map(|i| i as u8).collect()),
            ExportedFile::new("slide-3.png", Vec::new()),
        ]
    }

    #[test]
    fn test_empty_archive_is_just_end_record() {
        let bytes = build_archive(&[]).unwrap();
        assert_eq!(bytes.len(), END_RECORD_LEN);
        assert_eq!(u32_at(&bytes, 0), END_OF_CENTRAL_DIR_SIGNATURE);
        assert_eq!(u16_at(&bytes, 8), 0);
        assert_eq!(u32_at(&bytes, 16), 0);
    }

    #[test]
    fn test_local_header_fields() {
        let data = b"hello".to_vec();
        let bytes = build_archive(&[ExportedFile::new("a.png", data.clone())]).unwrap();

        assert_eq!(u32_at(&bytes, 0), LOCAL_HEADER_SIGNATURE);
        assert_eq!(u16_at(&bytes, 4), 20);
        assert_eq!(u16_at(&bytes, 6), 0);
        assert_eq!(u16_at(&bytes, 8), 0);
        assert_eq!(u16_at(&bytes, 10), 0);
        assert_eq!(u16_at(&bytes, 12), 0);
        assert_eq!(u32_at(&bytes, 14), crc32(&data));
        assert_eq!(u32_at(&bytes, 18), 5);
        assert_eq!(u32_at(&bytes, 22), 5);
        assert_eq!(u16_at(&bytes, 26), 5);
        assert_eq!(u16_at(&bytes, 28), 0);
        assert_eq!(&bytes[30..35], b"a.png");
        assert_eq!(&bytes[35..40], b"hello");
    }

    #[test]
    fn test_offsets_are_running_totals() {
        let files = sample_files();
        let bytes = build_archive(&files).unwrap();
        assert_eq!(bytes.len(), expected_archive_len(&files));

        let end = bytes.len() - END_RECORD_LEN;
        assert_eq!(u32_at(&bytes, end), END_OF_CENTRAL_DIR_SIGNATURE);
        assert_eq!(u16_at(&bytes, end + 8), 3);
        assert_eq!(u16_at(&bytes, end + 10), 3);

        let cd_size = u32_at(&bytes, end + 12) as usize;
        let cd_offset = u32_at(&bytes, end + 16) as usize;
        let locals: usize = files
            .iter()
            .map(|f| LOCAL_HEADER_LEN + f.filename.len() + f.data.len())
            .sum();
        assert_eq!(cd_offset, locals);
        assert_eq!(cd_offset + cd_size, end);

        // Walk the central directory and check each offset points at a local header
        let mut pos = cd_offset;
        let mut expected_offset = 0usize;
        for file in &files {
            assert_eq!(u32_at(&bytes, pos), CENTRAL_HEADER_SIGNATURE);
            let name_len = u16_at(&bytes, pos + 28) as usize;
            let local = u32_at(&bytes, pos + 42) as usize;
            assert_eq!(local, expected_offset);
            assert_eq!(u32_at(&bytes, local), LOCAL_HEADER_SIGNATURE);
            assert_eq!(u32_at(&bytes, pos + 16), crc32(&file.data));
            assert_eq!(&bytes[pos + 46..pos + 46 + name_len], file.filename.as_bytes());
            expected_offset += LOCAL_HEADER_LEN + file.filename.len() + file.data.len();
            pos += CENTRAL_HEADER_LEN + name_len;
        }
        assert_eq!(pos, end);
    }

    #[test]
    fn test_entries_keep_input_order() {
        let files = sample_files();
        let bytes = build_archive(&files).unwrap();
        let mut pos = 0;
        for file in &files {
            let name_len = u16_at(&bytes, pos + 26) as usize;
            assert_eq!(&bytes[pos + 30..pos + 30 + name_len], file.filename.as_bytes());
            pos += LOCAL_HEADER_LEN + name_len + u32_at(&bytes, pos + 18) as usize;
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let files = vec![
            ExportedFile::new("slide-1.png", vec![1]),
            ExportedFile::new("slide-1.png", vec![2]),
        ];
        assert_eq!(
            build_archive(&files),
            Err(ArchiveError::DuplicateEntry("slide-1.png".into()))
        );
    }

    #[test]
    fn test_empty_and_oversized_names_rejected() {
        assert_eq!(
            build_archive(&[ExportedFile::new("", vec![1])]),
            Err(ArchiveError::EmptyName)
        );
        let long = "x".repeat(70_000);
        assert_eq!(
            build_archive(&[ExportedFile::new(long, vec![1])]),
            Err(ArchiveError::NameTooLong(70_000))
        );
    }

    #[test]
    fn test_non_ascii_names_are_raw_bytes() {
        let bytes = build_archive(&[ExportedFile::new("diapositive-é.png", vec![9])]).unwrap();
        // General purpose flags stay zero even for non-ASCII names
        assert_eq!(u16_at(&bytes, 6), 0);
        assert_eq!(u16_at(&bytes, 26) as usize, "diapositive-é.png".len());
    }

    #[test]
    fn test_writer_len_tracks_entries() {
        let mut writer = ArchiveWriter::new();
        assert!(writer.is_empty());
        writer.add_stored("a", b"1").unwrap();
        writer.add_stored("b", b"2").unwrap();
        assert_eq!(writer.len(), 2);
        // A rejected entry leaves the writer untouched
        assert!(writer.add_stored("a", b"3").is_err());
        assert_eq!(writer.len(), 2);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), 2 * (30 + 46 + 2 + 1) + 22);
    }
}
