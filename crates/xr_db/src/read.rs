//! Types for reading db archives
//!

use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Seek, SeekFrom},
    sync::Arc,
};

use binrw::BinRead;
use tracing::warn;

use crate::{
    chunk::{scan_chunks, unpack_chunk, Chunk},
    error::{CodecError, Error, FileNotFoundError, Result},
    lzhuf,
    types::{ChunkKind, DbVersion, Record1114, Record2215, Record2945, Record2947},
};

/// CRC-32 of decoded file bytes, the flavor stored by 2945-era and later archives.
pub fn checksum(bytes: &[u8]) -> u32 {
    crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(bytes)
}

/// Lowercased, `/`-separated form of an archive path, used as the lookup key.
///
/// Archive records store `\`-separated paths with inconsistent casing; comparisons are
/// case-insensitive while display keeps the recorded casing.
pub fn normalize_path(name: &str) -> String {
    name.replace('\\', "/")
        .trim_matches('/')
        .to_ascii_lowercase()
}

fn display_path(name: &str) -> String {
    name.replace('\\', "/").trim_matches('/').to_string()
}

/// Whether an entry is a file or a folder
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Carries bytes in the DATA chunk
    File,
    /// Structural node only, no bytes
    Directory,
}

/// One logical filesystem node of an archive
#[derive(Debug, Clone)]
pub struct DbEntry {
    /// Path with `/` separators, recorded casing
    pub name: Box<str>,

    /// Raw record name bytes. To be used when the name was incorrectly decoded.
    pub name_raw: Box<[u8]>,

    /// File or folder
    pub kind: EntryKind,

    /// Absolute offset of the stored bytes, `0` for folders
    pub offset: u64,

    /// Size once decoded
    pub size_real: u64,

    /// Size as stored
    pub size_compressed: u64,

    /// CRC-32 of the decoded bytes; 1114/2215 records carry none
    pub crc32: Option<u32>,
}

impl DbEntry {
    /// Whether this entry carries bytes.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    version: DbVersion,
    data_chunk: Chunk,
    header_chunk: Chunk,
    entries: IndexMap<Box<str>, DbEntry>,
}

/// DB archive reader
///
/// ```no_run
/// use std::fs::File;
/// use xr_db::{DbArchive, DbVersion};
///
/// fn list_db_contents(path: &str) -> xr_db::error::Result<()> {
///     let file = File::open(path)?;
///     let db = DbArchive::new(file, DbVersion::V2947Ru)?;
///
///     for name in db.file_names() {
///         println!("{name}");
///     }
///
///     Ok(())
/// }
/// ```
pub struct DbArchive<R> {
    reader: R,
    shared: Arc<Shared>,
}

impl<R> Debug for DbArchive<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DbArchive(version={}, entries={})",
            self.shared.version,
            self.shared.entries.len()
        )
    }
}

impl<R> DbArchive<R> {
    /// Format version supplied at open time.
    pub fn version(&self) -> DbVersion {
        self.shared.version
    }

    /// The bulk data chunk.
    pub fn data_chunk(&self) -> &Chunk {
        &self.shared.data_chunk
    }

    /// The directory index chunk.
    pub fn header_chunk(&self) -> &Chunk {
        &self.shared.header_chunk
    }

    /// Number of entries (files and folders) contained in this archive.
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    /// Whether this archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total size of the files in the archive, if it can be known. Doesn't include folders or
    /// metadata.
    pub fn decompressed_size(&self) -> Option<u128> {
        let mut total = 0u128;
        for entry in self.shared.entries.values().filter(|e| e.is_file()) {
            total = total.checked_add(u128::from(entry.size_real))?;
        }
        Some(total)
    }

    /// Returns an iterator over every entry, files and folders alike.
    pub fn entries(&self) -> impl Iterator<Item = &DbEntry> {
        self.shared.entries.values()
    }

    /// Returns an iterator over the file entries.
    pub fn files(&self) -> impl Iterator<Item = &DbEntry> {
        self.shared.entries.values().filter(|e| e.is_file())
    }

    /// Returns an iterator over all the file names in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files().map(|e| e.name.as_ref())
    }

    /// Look up an entry by path, case-insensitively and with either separator.
    pub fn by_name(&self, name: &str) -> Option<&DbEntry> {
        self.shared.entries.get(normalize_path(name).as_str())
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> DbArchive<R> {
    /// Read a db archive collecting the entries it contains.
    pub fn new(mut reader: R, version: DbVersion) -> Result<DbArchive<R>> {
        let shared = Self::get_metadata(&mut reader, version)?;
        Ok(DbArchive {
            reader,
            shared: shared.into(),
        })
    }

    /// Read and decode a file's bytes.
    ///
    /// A stored checksum that does not match is logged and otherwise ignored; archives are
    /// historical artifacts and some ship with stale checksums. Use
    /// [`DbArchive::verify_file`] when a mismatch must fail.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let (bytes, mismatch) = self.read_and_check(name)?;
        if let Some((stored, computed)) = mismatch {
            warn!(name, stored, computed, "checksum mismatch, using bytes anyway");
        }
        Ok(bytes)
    }

    /// Read a file and fail on a checksum mismatch.
    pub fn verify_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let (bytes, mismatch) = self.read_and_check(name)?;
        if let Some((stored, computed)) = mismatch {
            return Err(Error::ChecksumMismatch {
                name: name.to_owned(),
                stored,
                computed,
            });
        }
        Ok(bytes)
    }

    fn read_and_check(&mut self, name: &str) -> Result<(Vec<u8>, Option<(u32, u32)>)> {
        let shared = Arc::clone(&self.shared);
        let entry = shared
            .entries
            .get(normalize_path(name).as_str())
            .ok_or_else(|| FileNotFoundError::Name(name.to_owned()))?;
        if !entry.is_file() {
            return Err(FileNotFoundError::NotAFile(name.to_owned()).into());
        }

        let data = &shared.data_chunk;
        let end = entry.offset + entry.size_compressed;
        if entry.offset < data.offset || end > data.offset + data.size {
            return Err(Error::MalformedContainer);
        }

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut raw = vec![0u8; entry.size_compressed as usize];
        self.reader.read_exact(&mut raw)?;

        let bytes = if entry.size_compressed == entry.size_real {
            raw
        } else {
            let decoded = lzhuf::decode(&raw)?;
            if decoded.len() as u64 != entry.size_real {
                return Err(CodecError::Corrupt.into());
            }
            decoded
        };

        let mismatch = entry.crc32.and_then(|stored| {
            let computed = checksum(&bytes);
            (computed != stored).then_some((stored, computed))
        });
        Ok((bytes, mismatch))
    }

    fn get_metadata(reader: &mut R, version: DbVersion) -> Result<Shared> {
        let mut data_chunk = None;
        let mut header_chunk = None;
        for chunk in scan_chunks(reader)? {
            let chunk = chunk?;
            match chunk.kind {
                ChunkKind::Data => {
                    if data_chunk.replace(chunk).is_some() {
                        return Err(Error::MalformedContainer);
                    }
                }
                ChunkKind::Header => {
                    if header_chunk.replace(chunk).is_some() {
                        return Err(Error::MalformedContainer);
                    }
                }
                _ => {}
            }
        }
        let (data_chunk, header_chunk) = match (data_chunk, header_chunk) {
            (Some(data), Some(header)) => (data, header),
            _ => return Err(Error::MalformedContainer),
        };

        let mut entries = IndexMap::new();
        if header_chunk.size == 0 {
            warn!("found header chunk but it has zero size");
        } else {
            let buff = unpack_chunk(reader, &header_chunk, version)?;
            let mut cursor = Cursor::new(buff.as_slice());
            while (cursor.position() as usize) < buff.len() {
                let entry = Self::read_record(&mut cursor, version)?;
                entries.insert(normalize_path(&entry.name).into_boxed_str(), entry);
            }
        }
        Self::synthesize_ancestors(&mut entries);

        Ok(Shared {
            version,
            data_chunk,
            header_chunk,
            entries,
        })
    }

    fn read_record(cursor: &mut Cursor<&[u8]>, version: DbVersion) -> Result<DbEntry> {
        let (name_raw, offset, size_real, size_compressed, crc32) = match version {
            DbVersion::V1114 => {
                let name = read_name(cursor)?;
                let record = Record1114::read(cursor)?;
                (name, record.offset, record.size_real, record.size_compressed, None)
            }
            DbVersion::V2215 => {
                let name = read_name(cursor)?;
                let record = Record2215::read(cursor)?;
                (name, record.offset, record.size_real, record.size_compressed, None)
            }
            DbVersion::V2945 => {
                let name = read_name(cursor)?;
                let record = Record2945::read(cursor)?;
                (
                    name,
                    record.offset,
                    record.size_real,
                    record.size_compressed,
                    Some(record.crc),
                )
            }
            DbVersion::V2947Ru | DbVersion::V2947Ww | DbVersion::Xdb => {
                let head = Record2947::read(cursor)?;
                let name_len = usize::from(head.name_size)
                    .checked_sub(16)
                    .ok_or(Error::MalformedContainer)?;
                let mut name = vec![0u8; name_len];
                cursor.read_exact(&mut name)?;
                let offset = cursor.read_u32::<LittleEndian>()?;
                (name, offset, head.size_real, head.size_compressed, Some(head.crc))
            }
        };

        let name = display_path(&String::from_utf8_lossy(&name_raw));
        let kind = if offset == 0 {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Ok(DbEntry {
            name: name.into(),
            name_raw: name_raw.into(),
            kind,
            offset: u64::from(offset),
            size_real: u64::from(size_real),
            size_compressed: u64::from(size_compressed),
            crc32,
        })
    }

    /// Insert a folder entry for every ancestor that has no record of its own, keeping the
    /// tree connected from the root to every file.
    fn synthesize_ancestors(entries: &mut IndexMap<Box<str>, DbEntry>) {
        let names: Vec<String> = entries.values().map(|e| e.name.to_string()).collect();
        for name in names {
            for (i, ch) in name.char_indices() {
                if ch != '/' {
                    continue;
                }
                let ancestor = &name[..i];
                let key = ancestor.to_ascii_lowercase();
                if ancestor.is_empty() || entries.contains_key(key.as_str()) {
                    continue;
                }
                entries.insert(
                    key.into_boxed_str(),
                    DbEntry {
                        name: ancestor.into(),
                        name_raw: ancestor.as_bytes().into(),
                        kind: EntryKind::Directory,
                        offset: 0,
                        size_real: 0,
                        size_compressed: 0,
                        crc32: None,
                    },
                );
            }
        }
    }
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let mut name_raw: Vec<u8> = Vec::new();
    loop {
        let char = cursor.read_u8()?;
        if char == b'\0' {
            break;
        }
        name_raw.push(char);
    }
    Ok(name_raw)
}
