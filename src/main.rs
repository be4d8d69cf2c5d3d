//! # makefont CLI
//!
//! Usage:
//!   makefont -a Helvetica.afm -f Helvetica.pfb -e cp1252
//!   makefont -u DejaVuSans.ufm -f DejaVuSans.ttf -o fonts
//!   makefont -i DejaVuSans.ttf --format json

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, ValueEnum};

use makefont::config::{CompileOptions, MetricsSource, Outline, OutputFormat};
use makefont::descriptor::FontKind;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile font metrics into descriptors for PDF generation", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["afm", "ufm", "immediate"])))]
struct Cli {
    /// AFM metrics file (8-bit fonts)
    #[arg(short, long, value_name = "AFM_FILE")]
    afm: Option<PathBuf>,

    /// UFM metrics file (Unicode fonts)
    #[arg(short, long, value_name = "UFM_FILE")]
    ufm: Option<PathBuf>,

    /// TrueType/OpenType file read directly
    #[arg(short, long, value_name = "FONT_FILE")]
    immediate: Option<PathBuf>,

    /// Font program to embed (.ttf, .otf, .pfb)
    #[arg(short, long, value_name = "FONT_FILE", conflicts_with = "immediate")]
    font: Option<PathBuf>,

    /// Encoding map name for AFM fonts, e.g. cp1252
    #[arg(short, long, value_name = "NAME", conflicts_with_all = ["ufm", "immediate"])]
    enc: Option<String>,

    /// Patch map applied on top of the encoding
    #[arg(short, long, value_name = "NAME", requires = "enc")]
    patch: Option<String>,

    /// Font type assumed when the font file does not tell
    #[arg(short = 't', long = "type", value_enum, default_value_t = FontType::Ttf)]
    font_type: FontType,

    /// VOLT layout table embedded in the descriptor
    #[arg(short, long, value_name = "XML_FILE", conflicts_with_all = ["afm", "immediate"])]
    volt: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Directory holding the .map encoding files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    maps: PathBuf,

    /// Descriptor format
    #[arg(long, value_enum, default_value_t = Format::Xml)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FontType {
    Ttf,
    Otf,
    T1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xml,
    Json,
}

impl Cli {
    fn into_options(self) -> CompileOptions {
        let source = if let Some(metrics) = self.afm {
            MetricsSource::Afm {
                metrics,
                font: self.font,
                encoding: self.enc,
                patch: self.patch,
                kind: match self.font_type {
                    FontType::T1 => FontKind::Type1,
                    FontType::Ttf | FontType::Otf => FontKind::TrueType,
                },
            }
        } else if let Some(metrics) = self.ufm {
            MetricsSource::Ufm {
                metrics,
                font: self.font,
                outline: match self.font_type {
                    FontType::Otf => Outline::Cff,
                    FontType::Ttf | FontType::T1 => Outline::TrueType,
                },
                layout_table: self.volt,
            }
        } else {
            // the argument group guarantees one source
            MetricsSource::Immediate {
                font: self.immediate.unwrap_or_default(),
            }
        };

        let mut options = CompileOptions::new(source);
        options.output_dir = self.output;
        options.map_dir = self.maps;
        options.format = match self.format {
            Format::Xml => OutputFormat::Xml,
            Format::Json => OutputFormat::Json,
        };
        options
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Cli::parse().into_options();
    match makefont::compile(&options) {
        Ok(report) => {
            log::info!(
                "Compiled '{}' ({}): {} file(s), {} warning(s)",
                report.descriptor.name,
                report.descriptor.kind.type_name(),
                report.outputs.len(),
                report.diagnostics.len()
            );
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}
