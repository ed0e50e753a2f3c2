use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::PathBuf};
use xr_db::error::Error;
use xr_db::{scan_chunks, DbArchive, DbVersion};

#[derive(Args)]
pub struct InfoArgs {
    /// An input archive file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Archive format version; detected from the extension when omitted
    #[arg(short = 't', long = "format", value_name = "VER")]
    version: Option<String>,

    /// Also print the directory records as a table
    #[arg(long, default_value_t = false)]
    entries: bool,

    /// Also verify every file against its stored checksum
    #[arg(long, default_value_t = false)]
    check: bool,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let version = DbVersion::detect(&self.file, self.version.as_deref())?;

        let mut chunk_reader = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;
        for chunk in scan_chunks(&mut chunk_reader)? {
            let chunk = chunk?;
            println!(
                "{:>2} {:<12} offset={:<12} size={:<12} {}",
                chunk.index,
                chunk.kind.to_string(),
                chunk.offset,
                chunk.size,
                if chunk.compressed { "compressed" } else { "" },
            );
        }

        if !self.entries && !self.check {
            return Ok(());
        }

        let mut db = DbArchive::new(chunk_reader, version)?;

        if self.entries {
            println!("Type Offset     Packed       CRC        Size         Name");
            for entry in db.entries() {
                let crc = entry
                    .crc32
                    .map(|crc| format!("0x{crc:08x}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} 0x{:08x} {:>12} {:<10} {:>12} {}",
                    if entry.is_file() { "F" } else { "D" },
                    entry.offset,
                    entry.size_compressed,
                    crc,
                    entry.size_real,
                    entry.name,
                );
            }
        }

        if self.check {
            let names: Vec<String> = db.file_names().map(str::to_owned).collect();
            let mut mismatches = 0u64;
            for name in &names {
                match db.verify_file(name) {
                    Ok(_) => {}
                    Err(e @ Error::ChecksumMismatch { .. }) => {
                        mismatches += 1;
                        println!("{e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            println!("checked={} mismatched={mismatches}", names.len());
        }

        Ok(())
    }
}
