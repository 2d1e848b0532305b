use clap::Args;
use miette::{miette, Report, Result};
use nitf_isd::{parse_file, ParseOptions};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use super::report_warnings;

#[derive(Args)]
pub struct ScanArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,
}

fn is_nitf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            ext.eq_ignore_ascii_case("ntf") || ext.eq_ignore_ascii_case("nitf")
        })
}

impl ScanArgs {
    pub fn handle(&self) -> Result<()> {
        let files = WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir() && is_nitf(e.path()))
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(miette!("no nitf files in {}", self.directory.display()));
        }

        let mut failed = 0;
        for file in &files {
            match parse_file(file.path(), &ParseOptions::default()) {
                Ok(isd) if isd.warnings().is_empty() => {
                    println!("{} {} {}", "ok".green(), isd.format_tag(), file.path().display());
                }
                Ok(isd) => {
                    println!(
                        "{} {} {} ({} warnings)",
                        "warn".yellow(),
                        isd.format_tag(),
                        file.path().display(),
                        isd.warnings().len()
                    );
                    report_warnings(isd.warnings());
                }
                Err(err) => {
                    failed += 1;
                    println!("{} [{}] {}", "error".red(), err.kind(), file.path().display());
                    eprintln!("{:?}", Report::new(err));
                }
            }
        }

        info!("scanned {} files, {failed} failed", files.len());

        if failed > 0 {
            return Err(miette!("{failed} of {} files failed to parse", files.len()));
        }

        Ok(())
    }
}
