use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nitf_isd::field::Fields;
use nitf_isd::tre::TreRecord;
use nitf_isd::{parse_file, ImageSelection, IsdFile, ParseOptions};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use super::report_warnings;

#[derive(Args)]
pub struct DumpArgs {
    /// An input NITF file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Only read the image at this index
    #[arg(short, long, value_name = "INDEX")]
    image: Option<usize>,

    /// Print the support data as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log every field as it is read
    #[arg(long, default_value_t = false)]
    trace_fields: bool,
}

fn print_fields(fields: &Fields) {
    for (name, field) in fields.iter() {
        println!(
            "  {:<10} {:>8} {:>4}  {}",
            name.bold(),
            field.offset,
            field.width,
            field.value.trim_end()
        );
    }
}

fn print_tres(tres: &[TreRecord]) {
    for tre in tres {
        println!("  {} {:>5}", tre.tag().cyan(), tre.length());
    }
}

impl DumpArgs {
    fn print(&self, isd: &IsdFile) -> Result<()> {
        println!("{} {}", isd.format_tag().green(), self.file.display());

        println!("file header ({} bytes)", isd.header_length());
        print_fields(&isd.header_fields()?);

        if !isd.file_tres().is_empty() {
            println!("file tres");
            print_tres(isd.file_tres());
        }

        for (position, image) in isd.images().iter().enumerate() {
            println!(
                "image {} at {} ({} byte subheader, {} byte data)",
                image.index(),
                image.offset(),
                image.subheader().len(),
                image.data_length()
            );
            if let Some(fields) = isd.image_fields(position)? {
                print_fields(&fields);
            }
            if !image.tres().is_empty() {
                println!("image {} tres", image.index());
                print_tres(image.tres());
            }
        }

        for (index, des) in isd.des_records().iter().enumerate() {
            println!(
                "des {index} {} ({} byte header, {} byte data)",
                des.type_id().yellow(),
                des.header().len(),
                des.data().len()
            );
        }

        Ok(())
    }

    pub fn handle(&self) -> Result<()> {
        let options = ParseOptions::builder()
            .selection(self.image.map_or(ImageSelection::All, ImageSelection::Index))
            .trace_fields(self.trace_fields)
            .build();

        let isd = parse_file(&self.file, &options)
            .context(format!("path: {}", &self.file.display()))?;
        report_warnings(isd.warnings());

        if self.json {
            let json = serde_json::to_string_pretty(&isd).into_diagnostic()?;
            println!("{json}");
            return Ok(());
        }

        self.print(&isd)
    }
}
