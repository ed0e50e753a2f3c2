use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::error;
use xr_db::DbVersion;
use xr_vfs::{DiffStatus, TextEncoding};

use super::{build_layered_fs, discover_archives, path_filter};

#[derive(Args)]
pub struct DiffArgs {
    /// Archive files as a glob, e.g. "gamedata.db*"
    #[arg(short, long, value_name = "GLOB")]
    file: String,

    /// Archive format version; detected from the extension when omitted
    #[arg(short = 't', long = "format", value_name = "VER")]
    version: Option<String>,

    /// Filter logical paths with shell wildcards: *, ?
    #[arg(short = 'g', long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Loose-file directory that outranks every archive
    #[arg(long, value_name = "DIR")]
    overlay: Option<PathBuf>,

    /// The on-disk gamedata tree to compare against
    #[arg(short = 'd', long, value_name = "DIR")]
    gamedata: PathBuf,

    /// Compare stored bytes without encoding conversion
    #[arg(long, default_value_t = false)]
    raw: bool,
}

impl DiffArgs {
    pub fn handle(&self) -> Result<()> {
        let paths = discover_archives(&self.file)?;
        let version = DbVersion::detect(&paths[0], self.version.as_deref())?;
        let mut layered = build_layered_fs(&paths, version, self.overlay.as_deref())?;
        let pattern = path_filter(self.filter.as_deref())?;

        let encoding = if self.raw {
            TextEncoding::Raw
        } else {
            TextEncoding::Utf8
        };
        let outcome = layered.diff(&pattern, &self.gamedata, encoding)?;

        for file in &outcome.files {
            match file.status {
                DiffStatus::Modified => {
                    if let Some(unified) = &file.unified {
                        print_unified(unified);
                    }
                }
                DiffStatus::OsMissing => {
                    println!("os missing: {}", file.path);
                }
                DiffStatus::Unchanged => {}
            }
        }
        for failure in &outcome.failures {
            error!("failed {}: {}", failure.path, failure.reason);
        }
        println!("{}", outcome.summary());

        Ok(())
    }
}

fn print_unified(unified: &str) {
    for line in unified.lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}
