pub mod db;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle gamedata db archives
    Db {
        #[command(subcommand)]
        command: db::DbCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Db { command } => command.handle(),
        }
    }
}
