//! Chunk-level access to an archive file.
//!
//! An archive is a flat run of `(type, size, payload)` records. Scanning walks the heads
//! without touching payloads; payload reads are positioned and all-or-nothing.

use std::io::{Read, Seek, SeekFrom};

use binrw::BinRead;

use crate::error::{Error, Result};
use crate::lzhuf;
use crate::scrambler::Scrambler;
use crate::types::{ChunkHead, ChunkKind, DbVersion, CHUNK_COMPRESSED};

/// One typed, offset-addressed region of an archive
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the chunk table, starting at 0
    pub index: u32,

    /// Decoded chunk kind
    pub kind: ChunkKind,

    /// Absolute offset of the payload (past the eight byte head)
    pub offset: u64,

    /// Payload size in bytes
    pub size: u64,

    /// Whether the payload is packed (scrambled and/or compressed)
    pub compressed: bool,
}

/// Lazy iterator over the chunk table.
///
/// Restart by calling [`scan_chunks`] again; the iterator stops after the first error.
pub struct Chunks<'a, R: Read + Seek> {
    reader: &'a mut R,
    pos: u64,
    end: u64,
    index: u32,
    failed: bool,
}

impl<R: Read + Seek> Iterator for Chunks<'_, R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.end {
            return None;
        }
        if self.pos + 8 > self.end {
            self.failed = true;
            return Some(Err(Error::MalformedContainer));
        }
        if let Err(e) = self.reader.seek(SeekFrom::Start(self.pos)) {
            self.failed = true;
            return Some(Err(e.into()));
        }
        let head = match ChunkHead::read(&mut *self.reader) {
            Ok(head) => head,
            Err(e) => {
                self.failed = true;
                return Some(Err(e.into()));
            }
        };
        let offset = self.pos + 8;
        if offset + u64::from(head.size) > self.end {
            self.failed = true;
            return Some(Err(Error::MalformedContainer));
        }
        let chunk = Chunk {
            index: self.index,
            kind: ChunkKind::from(head.ty),
            offset,
            size: u64::from(head.size),
            compressed: head.ty & CHUNK_COMPRESSED != 0,
        };
        self.index += 1;
        self.pos = offset + chunk.size;
        Some(Ok(chunk))
    }
}

/// Walk the chunk table from the start of the file.
pub fn scan_chunks<R: Read + Seek>(reader: &mut R) -> Result<Chunks<'_, R>> {
    let end = reader.seek(SeekFrom::End(0))?;
    Ok(Chunks {
        reader,
        pos: 0,
        end,
        index: 0,
        failed: false,
    })
}

/// Read a chunk's raw payload bytes.
pub fn read_chunk<R: Read + Seek>(reader: &mut R, chunk: &Chunk) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(chunk.offset))?;
    let mut buff = vec![0u8; chunk.size as usize];
    reader.read_exact(&mut buff)?;
    Ok(buff)
}

/// Read a chunk's payload, descrambling and decoding packed payloads per the version rules.
pub fn unpack_chunk<R: Read + Seek>(
    reader: &mut R,
    chunk: &Chunk,
    version: DbVersion,
) -> Result<Vec<u8>> {
    let buff = read_chunk(reader, chunk)?;
    if !chunk.compressed {
        return Ok(buff);
    }
    let buff = match version.scrambler_key() {
        Some(key) => Scrambler::new(key).descramble(&buff),
        None => buff,
    };
    Ok(lzhuf::decode(&buff)?)
}
