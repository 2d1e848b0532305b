use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nitf_isd::{parse_file, ParseOptions};
use std::{fs::File, io::Write, path::Path, path::PathBuf};
use tracing::info;

use super::report_warnings;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input NITF file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        info!("writing {}", path.display());

        let mut out = if !self.overwrite {
            File::create_new(path)
                .into_diagnostic()
                .context(format!("creating {}", path.display()))?
        } else {
            File::create(path)
                .into_diagnostic()
                .context(format!("creating {}", path.display()))?
        };

        out.write_all(bytes)
            .into_diagnostic()
            .context(format!("writing {}", path.display()))
    }

    pub fn handle(&self) -> Result<()> {
        let isd = parse_file(&self.file, &ParseOptions::default())
            .context(format!("path: {}", &self.file.display()))?;
        report_warnings(isd.warnings());

        std::fs::create_dir_all(&self.directory)
            .into_diagnostic()
            .context(format!("creating {}", &self.directory.display()))?;

        for (index, des) in isd.des_records().iter().enumerate() {
            let stem = match des.type_id() {
                id if id.is_empty() => format!("des_{index:03}"),
                id => format!("des_{index:03}_{}", id.replace(['/', '\\'], "_")),
            };

            self.write(&self.directory.join(format!("{stem}.header")), des.header())?;
            self.write(&self.directory.join(format!("{stem}.data")), des.data())?;
        }

        Ok(())
    }
}
