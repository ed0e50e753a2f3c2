use clap::Args;
use miette::Result;
use std::path::PathBuf;
use tracing::error;
use xr_db::DbVersion;
use xr_vfs::{ExtractOptions, TextEncoding};

use super::{build_layered_fs, discover_archives, path_filter};

#[derive(Args)]
pub struct ExtractArgs {
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

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting files under the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Keep text files exactly as stored, no encoding or line-ending conversion
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Resolve and decode everything but write nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl ExtractArgs {
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
        let options = ExtractOptions {
            overwrite: self.overwrite,
            encoding,
            dry_run: self.dry_run,
        };

        let report = layered.extract(&pattern, &self.directory, &options)?;
        for failure in &report.failures {
            error!("failed {}: {}", failure.path, failure.reason);
        }
        println!("{}", report.summary(encoding));

        Ok(())
    }
}
