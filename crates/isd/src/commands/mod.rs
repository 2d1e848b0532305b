pub mod nitf;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Inspect NITF files
    Nitf {
        #[command(subcommand)]
        command: nitf::NitfCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Nitf { command } => command.handle(),
        }
    }
}
