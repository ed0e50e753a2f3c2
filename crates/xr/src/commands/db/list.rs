use clap::Args;
use itertools::Itertools;
use miette::Result;
use std::path::PathBuf;
use xr_db::DbVersion;
use xr_vfs::{ListMode, ListRow, LayeredFs};

use super::{build_layered_fs, discover_archives, path_filter};

#[derive(Args)]
pub struct ListArgs {
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

    /// Show one row per (path, archive) pair, grouped by archive
    #[arg(short, long)]
    split: bool,

    /// Number the rows and align the columns
    #[arg(short, long)]
    number: bool,

    /// Print the layer before the path
    #[arg(short, long)]
    reverse: bool,

    /// Print the number of matching paths only
    #[arg(short, long)]
    count: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let paths = discover_archives(&self.file)?;
        let version = DbVersion::detect(&paths[0], self.version.as_deref())?;
        let layered = build_layered_fs(&paths, version, self.overlay.as_deref())?;
        let pattern = path_filter(self.filter.as_deref())?;

        if self.split {
            self.print_split(&layered, layered.list(&pattern, ListMode::PerLayer));
        } else if self.count {
            println!("{}", layered.count(&pattern));
        } else {
            self.print_merged(&layered, layered.list(&pattern, ListMode::Merged));
        }

        Ok(())
    }

    fn print_merged(&self, layered: &LayeredFs, rows: Vec<ListRow>) {
        let width = rows.iter().map(|r| r.path.len()).max().unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            let layer = layered.layer_name(row.layer);
            if self.number {
                if self.reverse {
                    println!("{:>5} {layer} {}", i + 1, row.path);
                } else {
                    println!("{:>5} {:<width$} {layer}", i + 1, row.path);
                }
            } else if self.reverse {
                println!("{layer} {}", row.path);
            } else {
                println!("{} {layer}", row.path);
            }
        }
    }

    fn print_split(&self, layered: &LayeredFs, rows: Vec<ListRow>) {
        for (layer, group) in &rows.iter().chunk_by(|row| row.layer) {
            if self.count {
                println!("{} {}", layered.layer_name(layer), group.count());
            } else {
                println!("{}", layered.layer_name(layer));
                for (i, row) in group.enumerate() {
                    if self.number {
                        println!("\t{:>5} {}", i + 1, row.path);
                    } else {
                        println!("\t{}", row.path);
                    }
                }
            }
        }
    }
}
