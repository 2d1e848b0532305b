use miette::Report;
use nitf_isd::Warning;

pub mod dump;
pub mod extract;
pub mod scan;
pub mod tre;

#[derive(clap::Subcommand)]
pub enum NitfCommands {
    /// Print the header fields, TREs and DES of a NITF file
    Dump(dump::DumpArgs),
    /// List every TRE in a NITF file
    Tre(tre::TreArgs),
    /// Write each DES of a NITF file into a directory
    Extract(extract::ExtractArgs),
    /// Parse every NITF file below a directory
    Scan(scan::ScanArgs),
}

impl NitfCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            NitfCommands::Dump(dump) => dump.handle(),
            NitfCommands::Tre(tre) => tre.handle(),
            NitfCommands::Extract(extract) => extract.handle(),
            NitfCommands::Scan(scan) => scan.handle(),
        }
    }
}

/// Render parse warnings as diagnostics on stderr
pub(crate) fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("{:?}", Report::new(warning.clone()));
    }
}
