//! This library handles reading the packed **gamedata** archives used by the *X-Ray* engine.
//!
//! # DB Archive Format Documentation
//!
//! This crate provides utilities to read and extract data from the **.db**/**.xdb** archive
//! family used by the S.T.A.L.K.E.R. games. Several incompatible revisions of the format exist;
//! the engine build selects the revision, so archives carry no self-describing version marker
//! (`.xrp`, `.xp?` and `.xdb?` extensions imply one, plain `.db?` files do not).
//!
//! ## File Structure
//!
//! An archive is a flat sequence of chunks. Each chunk starts with an eight byte head:
//!
//! | Offset (bytes) | Field         | Description                                               |
//! |----------------|---------------|-----------------------------------------------------------|
//! | 0x0000         | Type          | 4 bytes: chunk id, bit 31 set when the payload is packed  |
//! | 0x0004         | Size          | 4 bytes: payload size in bytes                            |
//! | 0x0008         | Payload       | `Size` bytes of chunk data                                |
//!
//! Known chunk ids:
//!
//! - `0x0000`: **DATA** — the bulk blob holding every file's bytes back to back.
//! - `0x0001`: **HEADER** — the directory index: one record per file or folder.
//! - `0x029a`: **USERDATA** — free-form metadata written by some tools; ignored here.
//!
//! A well-formed archive contains exactly one DATA and one HEADER chunk.
//!
//! ### Header Chunk
//!
//! The HEADER payload is usually packed: scrambled with a version-keyed substitution transform
//! (2947 builds only) and then compressed with the LZ+adaptive-Huffman block codec. The decoded
//! payload is a dense run of records whose layout depends on the format version:
//!
//! | Version          | Record layout (little-endian)                                          |
//! |------------------|------------------------------------------------------------------------|
//! | 1114             | name `cstr`, real size `u32`, offset `u32`, packed size `u32`           |
//! | 2215             | name `cstr`, offset `u32`, real size `u32`, packed size `u32`           |
//! | 2945             | name `cstr`, crc `u32`, offset `u32`, real size `u32`, packed size `u32`|
//! | 2947ru/2947ww/xdb| name len `u16`, real size `u32`, packed size `u32`, crc `u32`, name bytes (`len - 16`), offset `u32` |
//!
//! A record with offset `0` describes a folder; any other offset is an absolute file offset
//! into the DATA chunk payload. A file whose packed size equals its real size is stored raw,
//! anything else goes through the block codec. Path separators inside records are `\`.
//!
//! ### Block Codec
//!
//! Compressed payloads use the classic LZSS scheme over a 4096 byte ring window with
//! adaptive-Huffman coded literal/length symbols. The stream starts with a `u32` little-endian
//! field declaring the decoded size. See [`lzhuf`].
//!
//! ### Scrambling
//!
//! 2947-era builds additionally obscure packed header payloads with a reversible, non
//! cryptographic byte substitution keyed by a linear-congruential stream. The RU and WW
//! releases use different key schedules. See [`scrambler`].
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.db0`..`.dbd`, `.xdb0`.., `.xrp`, `.xp1`..
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Text encoding**: file names and text payloads are Windows-1251

pub mod chunk;
pub mod error;
pub mod lzhuf;
pub mod read;
pub mod scrambler;
pub mod types;

pub use chunk::{scan_chunks, Chunk};
pub use read::{DbArchive, DbEntry, EntryKind};
pub use types::{ChunkKind, DbVersion};
