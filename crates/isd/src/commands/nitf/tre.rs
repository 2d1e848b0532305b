use clap::Args;
use itertools::Itertools;
use miette::{Context, Result};
use nitf_isd::tre::{TreRecord, TreScope};
use nitf_isd::{parse_file, ParseOptions};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use super::report_warnings;

#[derive(Args)]
pub struct TreArgs {
    /// An input NITF file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Number of payload characters to show
    #[arg(long, default_value_t = 40)]
    preview: usize,
}

impl TreArgs {
    fn preview(&self, tre: &TreRecord) -> String {
        tre.payload_text()
            .chars()
            .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '.' })
            .take(self.preview)
            .join("")
    }

    pub fn handle(&self) -> Result<()> {
        let isd = parse_file(&self.file, &ParseOptions::default())
            .context(format!("path: {}", &self.file.display()))?;
        report_warnings(isd.warnings());

        let scoped = isd
            .file_tres()
            .iter()
            .map(|tre| (TreScope::File, tre))
            .chain(isd.images().iter().flat_map(|image| {
                let scope = TreScope::Image(image.index());
                image.tres().iter().map(move |tre| (scope, tre))
            }));

        for (scope, tre) in scoped {
            println!(
                "{:<9} {} {:>5}  {}",
                scope.to_string(),
                tre.tag().cyan(),
                tre.length(),
                self.preview(tre).dimmed()
            );
        }

        Ok(())
    }
}
