//! # Font Metrics Parsing
//!
//! AFM and UFM files share one line-oriented grammar: a keyword followed by
//! whitespace-separated parameters. Global records (`FontName`, `Ascender`,
//! `FontBBox`, ...) feed a [`FontDescription`]; character records (`C` in
//! AFM, `U` in UFM) carry `;`-terminated sub-records:
//!
//! ```text
//! C 65 ; WX 667 ; N A ; B 14 0 654 718 ;
//! U 8364 ; WX 556 ; N Euro ; G 102 ;
//! ```
//!
//! This module owns the shared pieces; [`afm`] and [`ufm`] differ only in how
//! a character record is keyed.

pub mod afm;
pub mod ufm;

use std::collections::BTreeMap;

use serde::Serialize;

/// Character code → advance width (1/1000 em).
pub type GlyphWidthMap = BTreeMap<u32, i32>;

/// Character code → glyph index in the font program.
pub type Char2GlyphMap = BTreeMap<u32, u32>;

/// Width marker for codes that have not been assigned yet.
pub const WIDTH_UNSET: i32 = 0xFFFF;

/// PDF font descriptor flag bits.
pub mod flags {
    pub const FIXED_PITCH: i32 = 1 << 0;
    pub const SYMBOLIC: i32 = 1 << 2;
    pub const NON_SYMBOLIC: i32 = 1 << 5;
    pub const ITALIC: i32 = 1 << 6;
}

/// Scalar typographic metrics of a font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontDescription {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub x_height: i32,
    pub flags: i32,
    pub font_bbox: String,
    pub italic_angle: i32,
    pub stem_v: i32,
    pub missing_width: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            ascent: 1000,
            descent: -200,
            cap_height: 0,
            x_height: 0,
            flags: 0,
            font_bbox: String::new(),
            italic_angle: 0,
            stem_v: 70,
            missing_width: 600,
            underline_position: -100,
            underline_thickness: 50,
        }
    }
}

/// One parsed character record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharMetric {
    /// Code from the record head; -1 for unencoded glyphs.
    pub code: i64,
    /// `WX` value, -1 when absent.
    pub width: i32,
    pub name: Option<String>,
    pub glyph: Option<u32>,
    /// Top edge of the `B` bounding box.
    pub box_top: Option<i32>,
}

impl CharMetric {
    /// Parse the tokens following the record keyword, e.g.
    /// `["65", ";", "WX", "667", ";", "N", "A", ";"]`.
    pub fn parse<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokens = tokens.into_iter();
        let mut metric = CharMetric {
            code: tokens.next().map_or(-1, parse_long),
            width: -1,
            ..Default::default()
        };
        let _semicolon = tokens.next();

        while let Some(token) = tokens.next() {
            match token {
                "WX" => {
                    metric.width = tokens.next().map_or(-1, parse_int);
                    let _ = tokens.next();
                }
                "N" => {
                    metric.name = tokens.next().map(str::to_string);
                    let _ = tokens.next();
                }
                "G" => {
                    metric.glyph = tokens.next().and_then(|t| t.parse().ok());
                    let _ = tokens.next();
                }
                "B" => {
                    let _llx = tokens.next();
                    let _lly = tokens.next();
                    let _urx = tokens.next();
                    metric.box_top = tokens.next().map(parse_int);
                    let _ = tokens.next();
                }
                ";" => {}
                _ => {
                    for t in tokens.by_ref() {
                        if t == ";" {
                            break;
                        }
                    }
                }
            }
        }
        metric
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Accumulates the global records of a metrics file into a
/// [`FontDescription`], tracking which fields were set explicitly.
#[derive(Debug, Default)]
pub(crate) struct DescriptionBuilder {
    pub desc: FontDescription,
    pub font_name: String,
    flags: i32,
    has_cap_height: bool,
    has_x_cap_height: bool,
    has_x_height: bool,
    has_font_bbox: bool,
    has_stem_v: bool,
    has_missing_width: bool,
}

impl DescriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a global record. Returns `false` for unrecognized keywords.
    pub fn global_record(&mut self, keyword: &str, param: &str, rest: &[&str]) -> bool {
        match keyword {
            "FontName" => self.font_name = param.to_string(),
            "Weight" => {
                let weight = param.to_lowercase();
                if !self.has_stem_v && (weight == "black" || weight == "bold") {
                    self.desc.stem_v = 120;
                }
            }
            "ItalicAngle" => {
                let angle = param.parse::<f64>().unwrap_or(0.0) as i32;
                self.desc.italic_angle = angle;
                if angle > 0 {
                    self.flags |= flags::ITALIC;
                }
            }
            "Ascender" => self.desc.ascent = parse_int(param),
            "Descender" => self.desc.descent = parse_int(param),
            "UnderlineThickness" => self.desc.underline_thickness = parse_int(param),
            "UnderlinePosition" => self.desc.underline_position = parse_int(param),
            "IsFixedPitch" => {
                if param == "true" {
                    self.flags |= flags::FIXED_PITCH;
                }
            }
            "FontBBox" => {
                self.has_font_bbox = true;
                let mut parts = vec![param];
                parts.extend(rest.iter().take(3).copied());
                self.desc.font_bbox = format!("[{}]", parts.join(" "));
            }
            "CapHeight" => {
                self.has_cap_height = true;
                self.desc.cap_height = parse_int(param);
            }
            "StdVW" => {
                self.has_stem_v = true;
                self.desc.stem_v = parse_int(param);
            }
            _ => return false,
        }
        true
    }

    /// Derive cap-height or x-height from the bounding box of `X` / `x`
    /// unless an earlier record already set them.
    pub fn observe_box(&mut self, is_cap_x: bool, is_small_x: bool, box_top: Option<i32>) {
        let Some(top) = box_top else { return };
        if is_cap_x && !self.has_cap_height && !self.has_x_cap_height {
            self.has_x_cap_height = true;
            self.desc.cap_height = top;
        }
        if is_small_x && !self.has_x_height {
            self.has_x_height = true;
            self.desc.x_height = top;
        }
    }

    /// The first `.notdef` record defines the missing width.
    pub fn observe_notdef(&mut self, name: &str, width: i32) {
        if !self.has_missing_width && name == ".notdef" {
            self.has_missing_width = true;
            self.desc.missing_width = width;
        }
    }

    pub fn add_flags(&mut self, bits: i32) {
        self.flags |= bits;
    }

    /// Apply the fallbacks for fields the file never provided.
    pub fn finish(mut self) -> (String, FontDescription) {
        self.desc.flags = self.flags;
        if !self.has_cap_height && !self.has_x_cap_height {
            self.desc.cap_height = self.desc.ascent;
        }
        if !self.has_font_bbox {
            self.desc.font_bbox = format!(
                "[0 {} 1000 {}]",
                self.desc.descent - 100,
                self.desc.ascent + 100
            );
        }
        (self.font_name, self.desc)
    }
}

/// Split a line into its keyword and the remaining tokens.
/// Lines with fewer than two tokens carry no record.
pub(crate) fn split_record(line: &str) -> Option<(&str, Vec<&str>)> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }
    Some((keyword, rest))
}

fn parse_long(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

fn parse_int(s: &str) -> i32 {
    s.parse()
        .or_else(|_| s.parse::<f64>().map(|v| v as i32))
        .unwrap_or(0)
}
