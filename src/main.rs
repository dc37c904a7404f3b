use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use image_converter_rust::app::{
    Choice, CompressorMsg, ConverterMsg, DirectoryServices, Msg, Runtime, SelectedFile, FOOTER,
};
use image_converter_rust::config::Settings;
use image_converter_rust::format::TargetFormat;

/// Convert, export to PDF, or compress a single image
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = FOOTER)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory the results are written to
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode the image to one or more formats
    Convert {
        /// Input image
        input: PathBuf,

        /// Target format(s): jpeg, jpg, png, webp, svg
        #[arg(long = "to", required = true, num_args = 1.., value_parser = parse_format)]
        targets: Vec<TargetFormat>,
    },
    /// Place the image on a one-page PDF (converted_image.pdf)
    Pdf {
        /// Input image
        input: PathBuf,
    },
    /// Recompress the image at a lower quality
    Compress {
        /// Input image
        input: PathBuf,

        /// Quality from 0.1 to 1.0
        #[arg(long, default_value_t = 0.8)]
        quality: f32,
    },
}

fn parse_format(s: &str) -> Result<TargetFormat, String> {
    s.parse().map_err(|e: image_converter_rust::ConvertError| e.to_string())
}

fn open(input: &Path) -> Result<SelectedFile> {
    SelectedFile::open(input).with_context(|| format!("Failed to read {:?}", input))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Nothing is previewed on a terminal, so results are revealed at once.
    let mut settings = Settings::default().with_reveal_delay(Duration::ZERO);
    if let Command::Compress { quality, .. } = &args.command {
        settings = settings.with_default_quality(*quality);
    }
    let mut runtime = Runtime::new(settings, DirectoryServices::new(args.out_dir.clone()));
    let start = Instant::now();

    let original_size = match args.command {
        Command::Convert { input, targets } => {
            let file = open(&input)?;
            let size = file.size();
            println!("Converting {:?} to {}", input, join(&targets));
            runtime.dispatch(Msg::Choose(Choice::Convert));
            runtime.dispatch(Msg::Converter(ConverterMsg::Upload(file)));
            runtime.dispatch(Msg::Converter(ConverterMsg::ConvertAll(targets)));
            size
        }
        Command::Pdf { input } => {
            let file = open(&input)?;
            let size = file.size();
            println!("Exporting {:?} to PDF", input);
            runtime.dispatch(Msg::Choose(Choice::Convert));
            runtime.dispatch(Msg::Converter(ConverterMsg::Upload(file)));
            runtime.dispatch(Msg::Converter(ConverterMsg::ExportPdf));
            size
        }
        Command::Compress { input, quality } => {
            let file = open(&input)?;
            let size = file.size();
            println!("Compressing {:?} at quality {:.1}", input, quality);
            runtime.dispatch(Msg::Choose(Choice::Compress));
            runtime.dispatch(Msg::Compressor(CompressorMsg::Upload(file)));
            runtime.dispatch(Msg::Compressor(CompressorMsg::Compress));
            runtime.advance(Duration::ZERO);
            runtime.dispatch(Msg::Compressor(CompressorMsg::DownloadCompressed));
            size
        }
    };

    let saved = runtime.services().saved();
    if saved.is_empty() {
        bail!("Nothing was written to {:?}", args.out_dir);
    }

    println!("Done in {:.2?}", start.elapsed());
    println!("Original size: {:.2} KB", original_size as f64 / 1024.0);
    for path in saved {
        let size = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {:?}", path))?
            .len();
        println!("{:<14} {:.2} KB", format!("{}:", file_label(path)), size as f64 / 1024.0);
    }

    Ok(())
}

fn join(targets: &[TargetFormat]) -> String {
    targets
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
