//! # makefont
//!
//! A font metrics compiler for PDF generators.
//!
//! A PDF writer that wants to use a font needs its metrics (widths, ascent,
//! bounding box, flags), the font program it may embed, and for Unicode fonts
//! a mapping from character codes to glyphs. This crate compiles those once,
//! ahead of time, from Adobe metrics files or from the binary font itself,
//! into a descriptor document plus zlib-compressed side files.
//!
//! ## Architecture
//!
//! ```text
//! AFM / UFM text          binary font (TTF/OTF/PFB)
//!       ↓                          ↓
//!   [encoding] ── maps       [sfnt]  — embedding permission, CFF range
//!       ↓                          ↓
//!   [metrics]  — parse       [type1] — segment extraction
//!       ↓                          ↓
//!       └────────→ [package] ←─────┘   — .z / .ctg.z artifacts
//!                      ↓
//!                [descriptor] — XML / JSON document
//! ```
//!
//! Immediate mode skips the metrics files: [`immediate`] reads everything
//! from the font with `ttf-parser`.

pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod immediate;
pub mod metrics;
pub mod package;
pub mod search;
pub mod sfnt;
pub mod type1;

use std::fs;
use std::path::{Path, PathBuf};

use config::{CompileOptions, MetricsSource, Outline, OutputFormat};
use descriptor::{FontDescriptor, FontKind};
use encoding::{EncodingMap, EncodingPatch};
use error::{Diagnostic, Diagnostics, MakeFontError};
use immediate::LoadedFont;
use metrics::{afm, ufm};
use package::EmbeddedProgram;
use sfnt::EmbeddingPermission;

/// What a compilation run produced.
#[derive(Debug)]
pub struct CompileReport {
    pub descriptor: FontDescriptor,
    /// Recoverable anomalies, in the order they were met.
    pub diagnostics: Vec<Diagnostic>,
    /// Every file written, descriptor last.
    pub outputs: Vec<PathBuf>,
}

/// Compile one font.
///
/// Only unreadable inputs and output failures abort; everything else ends up
/// in [`CompileReport::diagnostics`].
pub fn compile(options: &CompileOptions) -> Result<CompileReport, MakeFontError> {
    let mut diagnostics = Diagnostics::new();
    let mut run = Run {
        out_dir: options.resolve_output_dir(&mut diagnostics),
        base: options.base_name(),
        outputs: Vec::new(),
        diagnostics,
    };

    let descriptor = match &options.source {
        MetricsSource::Afm {
            metrics,
            font,
            encoding,
            patch,
            kind,
        } => run.compile_afm(
            metrics,
            font.as_deref(),
            encoding.as_deref(),
            patch.as_deref(),
            *kind,
            &options.map_dir,
        )?,
        MetricsSource::Ufm {
            metrics,
            font,
            outline,
            layout_table,
        } => run.compile_ufm(metrics, font.as_deref(), *outline, layout_table.as_deref())?,
        MetricsSource::Immediate { font } => run.compile_immediate(font)?,
    };

    let document = match options.format {
        OutputFormat::Xml => descriptor.to_xml()?,
        OutputFormat::Json => descriptor.to_json()?,
    };
    run.write(options.format.extension(), &document)?;
    log::info!("Font definition file generated ({}.{})", run.base, options.format.extension());

    Ok(CompileReport {
        descriptor,
        diagnostics: run.diagnostics.into_vec(),
        outputs: run.outputs,
    })
}

/// State of one compilation run.
struct Run {
    out_dir: PathBuf,
    base: String,
    outputs: Vec<PathBuf>,
    diagnostics: Diagnostics,
}

impl Run {
    fn compile_afm(
        &mut self,
        metrics_path: &Path,
        font_path: Option<&Path>,
        encoding_name: Option<&str>,
        patch_name: Option<&str>,
        requested: FontKind,
        map_dir: &Path,
    ) -> Result<FontDescriptor, MakeFontError> {
        let kind = match font_path {
            Some(path) => self.kind_from_extension(path, requested),
            None => requested,
        };

        let encoding = match encoding_name {
            Some(name) => {
                let mut map = EncodingMap::load(name, map_dir)?;
                if let Some(patch) = patch_name {
                    match EncodingPatch::load(patch, map_dir) {
                        Ok(p) => map.overlay(&p),
                        Err(_) => self.diagnostics.push(Diagnostic::PatchUnavailable(patch.to_string())),
                    }
                }
                Some(map)
            }
            None => None,
        };

        let text = read_text(metrics_path)?;
        let font_data = font_path.map(read_bytes).transpose()?;

        let reference = EncodingMap::reference(map_dir);
        let metrics = afm::parse(&text, encoding, &reference);
        log::info!("Parsed '{}': {} widths", metrics.font_name, metrics.widths.len());
        self.diagnostics.extend(metrics.diagnostics);

        let mut descriptor = FontDescriptor::new(kind, metrics.font_name, metrics.description);
        descriptor.encoding = encoding_name.unwrap_or_default().to_string();
        descriptor.diffs = metrics.diffs;
        descriptor.widths = metrics.widths;
        descriptor.glyphs = metrics.glyphs;
        descriptor.subsetting = metrics.has_glyph_numbers;

        let Some(data) = font_data else {
            self.diagnostics.push(Diagnostic::NoFontFile);
            return Ok(descriptor);
        };

        let program = match kind {
            FontKind::Type1 => EmbeddedProgram::type1(&data),
            _ => match self.inspect(&data) {
                Some(permission) if permission.embedding_allowed => Ok(EmbeddedProgram::whole_file(&data)),
                Some(_) => {
                    self.diagnostics.push(Diagnostic::EmbeddingNotAllowed);
                    return Ok(descriptor);
                }
                None => return Ok(descriptor),
            },
        };
        match program {
            Ok(program) => self.embed(&mut descriptor, program)?,
            Err(e) => self.diagnostics.push(invalid_font(e)),
        }
        Ok(descriptor)
    }

    fn compile_ufm(
        &mut self,
        metrics_path: &Path,
        font_path: Option<&Path>,
        outline: Outline,
        layout_table: Option<&Path>,
    ) -> Result<FontDescriptor, MakeFontError> {
        let font_data = font_path.map(read_bytes).transpose()?;
        let permission = match &font_data {
            Some(data) => self.inspect(data),
            None => None,
        };
        let cff = match (&font_data, &permission) {
            (Some(_), Some(permission)) => permission.is_cff(),
            (Some(_), None) => false,
            (None, _) => outline == Outline::Cff,
        };

        let text = read_text(metrics_path)?;
        let layout = layout_table.and_then(descriptor::read_layout_table);
        let metrics = ufm::parse(&text, cff, layout.is_some());
        log::info!("Parsed '{}': {} widths", metrics.font_name, metrics.widths.len());

        let kind = if cff {
            FontKind::OpenTypeUnicode
        } else {
            FontKind::TrueTypeUnicode
        };
        let mut descriptor = FontDescriptor::new(kind, metrics.font_name, metrics.description);
        descriptor.widths = metrics.widths;
        descriptor.glyphs = metrics.glyphs;
        descriptor.subsetting = cff;
        descriptor.layout_table = layout;

        let Some(data) = font_data else {
            self.diagnostics.push(Diagnostic::NoFontFile);
            return Ok(descriptor);
        };
        let Some(permission) = permission else {
            return Ok(descriptor);
        };
        if !permission.embedding_allowed {
            self.diagnostics.push(Diagnostic::EmbeddingNotAllowed);
            return Ok(descriptor);
        }

        let program = match permission.cff.filter(|_| cff) {
            Some(range) => EmbeddedProgram::cff_table(&data, range),
            None => Ok(EmbeddedProgram::whole_file(&data)),
        };
        match program {
            Ok(program) => {
                self.embed(&mut descriptor, program)?;
                let mapping = if cff {
                    package::compress(package::to_unicode_cmap(&metrics.glyph_list).as_bytes())
                } else {
                    metrics.cid_to_gid.compressed()
                };
                self.write_ctg(&mut descriptor, &mapping)?;
            }
            Err(e) => self.diagnostics.push(invalid_font(e)),
        }
        Ok(descriptor)
    }

    fn compile_immediate(&mut self, font_path: &Path) -> Result<FontDescriptor, MakeFontError> {
        let data = read_bytes(font_path)?;
        let font = LoadedFont::parse(&data)?;
        log::info!("Loaded '{}': {} widths", font.name, font.widths.len());
        let mut descriptor = font.descriptor();

        let Some(permission) = self.inspect(&data) else {
            return Ok(descriptor);
        };
        if !permission.embedding_allowed {
            self.diagnostics.push(Diagnostic::EmbeddingNotAllowed);
            return Ok(descriptor);
        }

        let program = match permission.cff.filter(|_| font.cff) {
            Some(range) => EmbeddedProgram::cff_table(&data, range),
            None => Ok(EmbeddedProgram::whole_file(&data)),
        };
        match program {
            Ok(program) => {
                self.embed(&mut descriptor, program)?;
                self.write_ctg(&mut descriptor, &package::compress(&font.unicode_mapping()))?;
            }
            Err(e) => self.diagnostics.push(invalid_font(e)),
        }
        Ok(descriptor)
    }

    /// Inspect an sfnt container. An invalid one is diagnosed and permits nothing.
    fn inspect(&mut self, data: &[u8]) -> Option<EmbeddingPermission> {
        match sfnt::inspect(data) {
            Ok(permission) => Some(permission),
            Err(e) => {
                self.diagnostics.push(invalid_font(e));
                None
            }
        }
    }

    fn kind_from_extension(&mut self, path: &Path, requested: FontKind) -> FontKind {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "ttf" => FontKind::TrueType,
            "pfb" => FontKind::Type1,
            _ => {
                self.diagnostics.push(Diagnostic::UnrecognizedExtension {
                    extension,
                    assumed: requested.type_name().to_string(),
                });
                requested
            }
        }
    }

    fn embed(&mut self, descriptor: &mut FontDescriptor, program: EmbeddedProgram) -> Result<(), MakeFontError> {
        let name = self.write("z", &program.compressed)?;
        log::info!("Font file compressed ({})", name);
        descriptor.font_file = name;
        descriptor.size1 = program.size1;
        descriptor.size2 = program.size2;
        Ok(())
    }

    fn write_ctg(&mut self, descriptor: &mut FontDescriptor, compressed: &[u8]) -> Result<(), MakeFontError> {
        let name = self.write("ctg.z", compressed)?;
        log::info!("CIDToGIDMap created and compressed ({})", name);
        descriptor.ctg_file = name;
        Ok(())
    }

    /// Write `<base>.<suffix>` to the output directory, returning the file name.
    fn write(&mut self, suffix: &str, bytes: &[u8]) -> Result<String, MakeFontError> {
        let name = format!("{}.{}", self.base, suffix);
        let path = self.out_dir.join(&name);
        fs::write(&path, bytes)?;
        self.outputs.push(path);
        Ok(name)
    }
}

fn read_text(path: &Path) -> Result<String, MakeFontError> {
    let bytes = read_bytes(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, MakeFontError> {
    fs::read(path).map_err(|e| MakeFontError::not_found(path, e))
}

fn invalid_font(e: MakeFontError) -> Diagnostic {
    match e {
        MakeFontError::InvalidFontFile(msg) => Diagnostic::InvalidFontFile(msg),
        other => Diagnostic::InvalidFontFile(other.to_string()),
    }
}
