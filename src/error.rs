//! Structured error types for the font metrics compiler.
//!
//! Two tiers: [`MakeFontError`] aborts a compilation run (unreadable inputs,
//! output failures), while [`Diagnostic`] records anomalies the pipeline
//! recovers from locally and keeps going.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;

/// The unified error type returned by all public compile functions.
#[derive(Debug, thiserror::Error)]
pub enum MakeFontError {
    /// An encoding map, metrics file or font file could not be opened.
    #[error("Unable to read '{}': {source}", path.display())]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A binary font file is not in the expected format.
    #[error("Invalid font file: {0}")]
    InvalidFontFile(String),
    /// Writing an output artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The descriptor document could not be produced.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MakeFontError {
    pub(crate) fn not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MakeFontError::ResourceNotFound {
            path: path.into(),
            source,
        }
    }
}

/// A recoverable anomaly met while compiling a font.
///
/// Every diagnostic is logged at `warn` level when it is recorded and is
/// returned to the caller in the compile report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// A glyph name from the metrics file is not present in the active encoding.
    UndefinedGlyph(String),
    /// A code of the encoding never received a width and got the default.
    MissingWidth { code: u32, glyph: String },
    /// The font file failed inspection or segment extraction; embedding skipped.
    InvalidFontFile(String),
    /// The font license (OS/2 fsType) forbids embedding.
    EmbeddingNotAllowed,
    /// No font file was supplied, so nothing can be embedded.
    NoFontFile,
    /// The patch encoding could not be loaded; the base encoding is used as is.
    PatchUnavailable(String),
    /// The font file extension did not identify the font type.
    UnrecognizedExtension { extension: String, assumed: String },
    /// The output directory does not exist; the working directory is used.
    MissingOutputDir(PathBuf),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UndefinedGlyph(name) => write!(f, "character '{}' is undefined", name),
            Diagnostic::MissingWidth { code, glyph } => {
                write!(f, "character '{}' (code {}) is missing", glyph, code)
            }
            Diagnostic::InvalidFontFile(msg) => {
                write!(f, "{}, font embedding not possible", msg)
            }
            Diagnostic::EmbeddingNotAllowed => write!(f, "font license does not allow embedding"),
            Diagnostic::NoFontFile => write!(f, "font file name missing, font embedding not possible"),
            Diagnostic::PatchUnavailable(name) => write!(f, "unable to read patch file '{}'", name),
            Diagnostic::UnrecognizedExtension { extension, assumed } => write!(
                f,
                "unrecognized font file extension ({}), {} font assumed",
                extension, assumed
            ),
            Diagnostic::MissingOutputDir(dir) => write!(
                f,
                "output directory doesn't exist: {}, using the current directory",
                dir.display()
            ),
        }
    }
}

/// Collects diagnostics for one compilation run, logging each as it arrives.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
