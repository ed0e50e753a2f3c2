//! # Layered gamedata filesystem
//!
//! The X-Ray engine spreads its assets over a run of archives (`gamedata.db0` ..
//! `gamedata.dbd`) patched over each other: a later archive may ship a newer copy of a path an
//! earlier one already carries, and a loose `gamedata` directory on disk outranks them all.
//! This crate composes opened [`xr_db::DbArchive`] handles plus an optional overlay directory
//! into one logical tree and answers the questions the rest of the toolset asks of it:
//!
//! - which layer holds the authoritative copy of a path ([`LayeredFs::resolve`]),
//! - what paths exist, merged or per layer ([`LayeredFs::list`], [`LayeredFs::count`]),
//! - the authoritative bytes of a path ([`LayeredFs::read`]),
//! - materializing matching paths to disk with OS-correct text conversion
//!   ([`LayeredFs::extract`]),
//! - unified diffs against a real directory tree ([`LayeredFs::diff`]).
//!
//! Archive text is Windows-1251 with `\r\n` line endings; extraction and diffing convert to
//! UTF-8 and the host line separator unless raw bytes are requested.
//!
//! A [`LayeredFs`] is built up from archives in discovery order (ascending file name sort),
//! then sealed; once sealed the layer set is immutable and queries are the only operations.

pub mod diff;
pub mod error;
pub mod extract;
pub mod fs;
pub mod pattern;
pub mod text;

pub use diff::{DiffOutcome, DiffStatus, FileDiff};
pub use extract::{ExtractFailure, ExtractOptions, ExtractReport};
pub use fs::{LayerId, LayeredFs, ListMode, ListRow, Resolved};
pub use pattern::GlobPattern;
pub use text::TextEncoding;
