//! # AFM Parser
//!
//! Builds 8-bit width and glyph tables from Adobe Font Metrics text.
//!
//! Without an encoding the font is treated as symbolic and every `C` record
//! lands on its native code. With an encoding, each record is routed to the
//! code(s) whose glyph name it carries, so the same AFM can be compiled for
//! several code pages.

use super::{
    flags, split_record, Char2GlyphMap, CharMetric, DescriptionBuilder, FontDescription,
    GlyphWidthMap, WIDTH_UNSET,
};
use crate::encoding::EncodingMap;
use crate::error::{Diagnostic, Diagnostics};

/// Deprecated or vendor glyph names and the canonical names encodings use
/// for them. When a font calls a glyph by the left-hand name, encoding slots
/// holding the right-hand name are renamed to match the font.
pub const GLYPH_NAME_FIXUPS: &[(&str, &str)] = &[
    ("Edot", "Edotaccent"),
    ("edot", "edotaccent"),
    ("Idot", "Idotaccent"),
    ("Zdot", "Zdotaccent"),
    ("zdot", "zdotaccent"),
    ("Odblacute", "Ohungarumlaut"),
    ("odblacute", "ohungarumlaut"),
    ("Udblacute", "Uhungarumlaut"),
    ("udblacute", "uhungarumlaut"),
    ("Gcedilla", "Gcommaaccent"),
    ("gcedilla", "gcommaaccent"),
    ("Kcedilla", "Kcommaaccent"),
    ("kcedilla", "kcommaaccent"),
    ("Lcedilla", "Lcommaaccent"),
    ("lcedilla", "lcommaaccent"),
    ("Ncedilla", "Ncommaaccent"),
    ("ncedilla", "ncommaaccent"),
    ("Rcedilla", "Rcommaaccent"),
    ("rcedilla", "rcommaaccent"),
    ("Scedilla", "Scommaaccent"),
    ("scedilla", "scommaaccent"),
    ("Tcedilla", "Tcommaaccent"),
    ("tcedilla", "tcommaaccent"),
    ("Dslash", "Dcroat"),
    ("dslash", "dcroat"),
    ("Dmacron", "Dcroat"),
    ("dmacron", "dcroat"),
    ("combininggraveaccent", "gravecomb"),
    ("combininghookabove", "hookabovecomb"),
    ("combiningtildeaccent", "tildecomb"),
    ("combiningacuteaccent", "acutecomb"),
    ("combiningdotbelow", "dotbelowcomb"),
    ("dongsign", "dong"),
];

/// Canonical name for a font-specific glyph name, if it is a known variant.
pub fn canonical_glyph_name(name: &str) -> Option<&'static str> {
    GLYPH_NAME_FIXUPS
        .iter()
        .find(|(variant, _)| *variant == name)
        .map(|(_, canonical)| *canonical)
}

/// Result of parsing an AFM file.
#[derive(Debug)]
pub struct AfmMetrics {
    pub font_name: String,
    pub description: FontDescription,
    pub widths: GlyphWidthMap,
    pub glyphs: Char2GlyphMap,
    /// True once any record carried a `G` glyph index.
    pub has_glyph_numbers: bool,
    /// Differences against the reference encoding; `None` for symbolic fonts.
    pub diffs: Option<String>,
    /// The encoding after glyph-name fixups.
    pub encoding: Option<EncodingMap>,
    pub diagnostics: Diagnostics,
}

/// Parse AFM text.
///
/// `encoding` selects encoded mode; `reference` is the encoding differences
/// are computed against.
pub fn parse(text: &str, encoding: Option<EncodingMap>, reference: &EncodingMap) -> AfmMetrics {
    let mut state = AfmState::new(encoding);
    for line in text.lines() {
        let Some((keyword, rest)) = split_record(line) else {
            continue;
        };
        if keyword == "C" {
            state.char_record(CharMetric::parse(rest.iter().copied()));
        } else {
            state.builder.global_record(keyword, rest[0], &rest[1..]);
        }
    }
    state.finish(reference)
}

struct AfmState {
    builder: DescriptionBuilder,
    encoding: Option<EncodingMap>,
    widths: GlyphWidthMap,
    glyphs: Char2GlyphMap,
    has_glyph_numbers: bool,
    inc_width: i32,
    inc_glyph: u32,
    diagnostics: Diagnostics,
}

impl AfmState {
    fn new(encoding: Option<EncodingMap>) -> Self {
        let mut widths = GlyphWidthMap::new();
        let mut glyphs = Char2GlyphMap::new();
        if encoding.is_some() {
            for code in 0..=255u32 {
                widths.insert(code, WIDTH_UNSET);
                glyphs.insert(code, 0);
            }
        }
        Self {
            builder: DescriptionBuilder::new(),
            encoding,
            widths,
            glyphs,
            has_glyph_numbers: false,
            inc_width: -1,
            inc_glyph: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    fn char_record(&mut self, mut metric: CharMetric) {
        if metric.glyph.is_some() {
            self.has_glyph_numbers = true;
        }
        if metric.name().ends_with("20AC") {
            metric.name = Some("Euro".to_string());
        }
        let name = metric.name().to_string();
        let glyph = metric.glyph.unwrap_or(0);

        if name == "increment" {
            self.inc_width = metric.width;
            if self.has_glyph_numbers {
                self.inc_glyph = glyph;
            }
        }

        match self.encoding.as_mut() {
            None => {
                // Symbolic font: built-in encoding, unencoded glyphs dropped.
                if let Ok(code) = u32::try_from(metric.code) {
                    self.widths.insert(code, metric.width);
                    if self.has_glyph_numbers {
                        self.glyphs.insert(code, glyph);
                    }
                }
                self.builder.observe_box(
                    metric.code == 'X' as i64,
                    metric.code == 'x' as i64,
                    metric.box_top,
                );
            }
            Some(encoding) => {
                if let Some(canonical) = canonical_glyph_name(&name) {
                    let slots: Vec<u8> = encoding.codes_of(canonical).collect();
                    for code in slots {
                        encoding.set(code, &name);
                    }
                }
                let codes: Vec<u8> = encoding.codes_of(&name).collect();
                if codes.is_empty() {
                    self.diagnostics.push(Diagnostic::UndefinedGlyph(name.clone()));
                }
                for code in codes {
                    self.widths.insert(code as u32, metric.width);
                    if self.has_glyph_numbers {
                        self.glyphs.insert(code as u32, glyph);
                    }
                }
                self.builder.observe_box(name == "X", name == "x", metric.box_top);
            }
        }
        self.builder.observe_notdef(&name, metric.width);
    }

    fn finish(mut self, reference: &EncodingMap) -> AfmMetrics {
        let missing_width = self.builder.desc.missing_width;

        if let Some(encoding) = &self.encoding {
            for code in 0..=255u8 {
                let slot = code as u32;
                if self.widths.get(&slot) != Some(&WIDTH_UNSET) {
                    continue;
                }
                let name = encoding.glyph(code);
                if name == "Delta" && self.inc_width >= 0 {
                    self.widths.insert(slot, self.inc_width);
                    if self.has_glyph_numbers {
                        self.glyphs.insert(slot, self.inc_glyph);
                    }
                } else {
                    self.widths.insert(slot, missing_width);
                    if self.has_glyph_numbers {
                        self.glyphs.insert(slot, 0);
                    }
                    self.diagnostics.push(Diagnostic::MissingWidth {
                        code: slot,
                        glyph: name.to_string(),
                    });
                }
            }
            self.builder.add_flags(flags::NON_SYMBOLIC);
        } else {
            self.builder.add_flags(flags::SYMBOLIC);
        }

        let diffs = self
            .encoding
            .as_ref()
            .map(|encoding| differences(encoding, reference));
        let (font_name, description) = self.builder.finish();
        if !self.has_glyph_numbers {
            self.glyphs.clear();
        }

        AfmMetrics {
            font_name,
            description,
            widths: self.widths,
            glyphs: self.glyphs,
            has_glyph_numbers: self.has_glyph_numbers,
            diffs,
            encoding: self.encoding,
            diagnostics: self.diagnostics,
        }
    }
}

/// PDF `/Differences` body for codes 32..=255 of `encoding` relative to
/// `reference`. A run of consecutive codes shares one leading code number.
pub fn differences(encoding: &EncodingMap, reference: &EncodingMap) -> String {
    let mut diffs = String::new();
    let mut last: Option<u8> = None;
    for code in 32..=255u8 {
        let glyph = encoding.glyph(code);
        if glyph == reference.glyph(code) {
            continue;
        }
        if last.map_or(true, |l| l as u16 + 1 != code as u16) {
            diffs.push_str(&format!("{} ", code));
        }
        last = Some(code);
        diffs.push('/');
        diffs.push_str(glyph);
        diffs.push(' ');
    }
    diffs
}
