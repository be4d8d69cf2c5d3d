//! # Immediate Mode
//!
//! Builds a Unicode descriptor straight from a TrueType/OpenType file,
//! without an intermediate metrics file. `ttf-parser` supplies the tables;
//! values are scaled to 1000 units per em like the AFM/UFM metrics.

use ttf_parser::{name_id, Face, GlyphId, Tag};

use crate::descriptor::{FontDescriptor, FontKind};
use crate::error::MakeFontError;
use crate::metrics::{flags, Char2GlyphMap, FontDescription, GlyphWidthMap};
use crate::package::{CidToGidMap, GlyphListEntry};

const CFF_TAG: &[u8; 4] = b"CFF ";

/// Metrics and character tables loaded from a binary font.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub name: String,
    pub description: FontDescription,
    /// Unicode code point → advance width (1/1000 em).
    pub widths: GlyphWidthMap,
    /// Unicode code point → glyph index.
    pub glyphs: Char2GlyphMap,
    /// Outlines are stored in a `CFF ` table.
    pub cff: bool,
}

impl LoadedFont {
    /// Parse a TrueType or OpenType font.
    pub fn parse(data: &[u8]) -> Result<Self, MakeFontError> {
        let face = Face::parse(data, 0)
            .map_err(|e| MakeFontError::InvalidFontFile(format!("cannot load font: {}", e)))?;
        let upem = face.units_per_em();
        let scale = |v: i32| -> i32 {
            if upem == 0 {
                v
            } else {
                (v as f64 * 1000.0 / upem as f64).round() as i32
            }
        };

        let name = font_name(&face);

        let mut bits = flags::NON_SYMBOLIC;
        if face.is_monospaced() {
            bits |= flags::FIXED_PITCH;
        }
        if face.is_italic() {
            bits |= flags::ITALIC;
        }

        let ascent = scale(face.ascender() as i32);
        let bbox = face.global_bounding_box();
        let underline = face.underline_metrics();
        let description = FontDescription {
            ascent,
            descent: scale(face.descender() as i32),
            cap_height: face.capital_height().map_or(ascent, |v| scale(v as i32)),
            x_height: face.x_height().map_or(0, |v| scale(v as i32)),
            flags: bits,
            font_bbox: format!(
                "[{} {} {} {}]",
                scale(bbox.x_min as i32),
                scale(bbox.y_min as i32),
                scale(bbox.x_max as i32),
                scale(bbox.y_max as i32)
            ),
            italic_angle: face.italic_angle().round() as i32,
            stem_v: if face.is_bold() { 120 } else { 70 },
            missing_width: scale(face.glyph_hor_advance(GlyphId(0)).unwrap_or(0) as i32),
            underline_position: underline.map_or(-100, |m| scale(m.position as i32)),
            underline_thickness: underline.map_or(50, |m| scale(m.thickness as i32)),
        };

        let mut widths = GlyphWidthMap::new();
        let mut glyphs = Char2GlyphMap::new();
        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                widths.insert(code, scale(advance as i32));
                glyphs.insert(code, glyph_id.0 as u32);
            }
        }

        let cff = face.raw_face().table(Tag::from_bytes(CFF_TAG)).is_some();
        log::debug!(
            "Loaded '{}': {} glyphs mapped, {} units/em, cff={}",
            name,
            glyphs.len(),
            upem,
            cff
        );

        Ok(Self {
            name,
            description,
            widths,
            glyphs,
            cff,
        })
    }

    pub fn kind(&self) -> FontKind {
        if self.cff {
            FontKind::OpenTypeUnicode
        } else {
            FontKind::TrueTypeUnicode
        }
    }

    /// The Unicode mapping resource written as `<base>.ctg.z`: a CID→GID map
    /// for TrueType outlines, a ToUnicode CMap for CFF outlines.
    pub fn unicode_mapping(&self) -> Vec<u8> {
        if self.cff {
            let mut list: Vec<GlyphListEntry> = self
                .glyphs
                .iter()
                .map(|(&unicode, &gid)| GlyphListEntry { gid, unicode })
                .collect();
            list.sort_by_key(|e| e.gid);
            crate::package::to_unicode_cmap(&list).into_bytes()
        } else {
            let mut map = CidToGidMap::new();
            for (&code, &gid) in &self.glyphs {
                map.set(code, gid);
            }
            map.as_bytes().to_vec()
        }
    }

    /// A descriptor without file references; the caller fills those in.
    pub fn descriptor(&self) -> FontDescriptor {
        let mut d = FontDescriptor::new(self.kind(), self.name.clone(), self.description.clone());
        d.widths = self.widths.clone();
        d.glyphs = self.glyphs.clone();
        d.subsetting = self.cff;
        d
    }
}

/// PostScript name, falling back to the full name.
fn font_name(face: &Face) -> String {
    let lookup = |id: u16| {
        face.names()
            .into_iter()
            .filter(|n| n.name_id == id)
            .find_map(|n| n.to_string())
    };
    lookup(name_id::POST_SCRIPT_NAME)
        .or_else(|| lookup(name_id::FULL_NAME))
        .map(|n| n.replace(' ', ""))
        .unwrap_or_default()
}
