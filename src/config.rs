//! # Compile Options
//!
//! What to compile and where to put the results. The CLI builds one of these
//! from its arguments; library callers construct it directly.

use std::path::{Path, PathBuf};

use crate::descriptor::FontKind;
use crate::error::{Diagnostic, Diagnostics};

/// Where the metrics come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsSource {
    /// An 8-bit AFM file, optionally remapped through an encoding.
    Afm {
        metrics: PathBuf,
        font: Option<PathBuf>,
        /// Encoding map name, e.g. `cp1252`. `None` compiles a symbolic font.
        encoding: Option<String>,
        /// Patch map name applied on top of the encoding.
        patch: Option<String>,
        /// Kind assumed when the font file extension is not recognized.
        kind: FontKind,
    },
    /// A Unicode UFM file.
    Ufm {
        metrics: PathBuf,
        font: Option<PathBuf>,
        /// Outline type assumed when no font file is given.
        outline: Outline,
        /// Layout-table document embedded in the descriptor.
        layout_table: Option<PathBuf>,
    },
    /// A TrueType/OpenType file read directly.
    Immediate { font: PathBuf },
}

/// Outline format of a Unicode font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outline {
    #[default]
    TrueType,
    Cff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xml,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xml => "xml",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub source: MetricsSource,
    pub output_dir: PathBuf,
    /// Directory holding the `.map` encoding resources.
    pub map_dir: PathBuf,
    pub format: OutputFormat,
}

impl CompileOptions {
    pub fn new(source: MetricsSource) -> Self {
        Self {
            source,
            output_dir: PathBuf::from("."),
            map_dir: PathBuf::from("."),
            format: OutputFormat::default(),
        }
    }

    /// The directory artifacts go to. A missing directory falls back to the
    /// working directory with a diagnostic.
    pub fn resolve_output_dir(&self, diagnostics: &mut Diagnostics) -> PathBuf {
        if self.output_dir.as_os_str().is_empty() || self.output_dir.is_dir() {
            return self.output_dir.clone();
        }
        diagnostics.push(Diagnostic::MissingOutputDir(self.output_dir.clone()));
        PathBuf::from(".")
    }

    /// Base name shared by every artifact of this run: the font file stem
    /// when a font file is involved, the metrics file stem otherwise.
    pub fn base_name(&self) -> String {
        let path: &Path = match &self.source {
            MetricsSource::Afm { metrics, font, .. } => font.as_deref().unwrap_or(metrics),
            MetricsSource::Ufm { metrics, .. } => metrics,
            MetricsSource::Immediate { font } => font,
        };
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
