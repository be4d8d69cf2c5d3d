//! # UFM Parser
//!
//! Unicode Font Metrics use the AFM grammar with `U` records whose code is a
//! Unicode scalar value. No encoding indirection is involved: the code in the
//! record is the key, and the glyph index in `G` feeds the CID→GID map.

use super::{flags, split_record, Char2GlyphMap, CharMetric, DescriptionBuilder, FontDescription, GlyphWidthMap};
use crate::package::{CidToGidMap, GlyphListEntry};

/// First private-use code handed to unencoded glyphs of a layout table.
pub const PRIVATE_USE_BASE: u32 = 0xE000;

/// Result of parsing a UFM file.
#[derive(Debug)]
pub struct UfmMetrics {
    pub font_name: String,
    pub description: FontDescription,
    pub widths: GlyphWidthMap,
    pub glyphs: Char2GlyphMap,
    pub cid_to_gid: CidToGidMap,
    /// (glyph, unicode) pairs ordered by glyph index; filled for CFF fonts only.
    pub glyph_list: Vec<GlyphListEntry>,
}

/// Parse UFM text.
///
/// `cff` selects whether the glyph list for a ToUnicode map is collected.
/// With `layout_table` set, unencoded glyphs (`U -1`) with a glyph index are
/// kept under synthetic private-use codes instead of being dropped.
pub fn parse(text: &str, cff: bool, layout_table: bool) -> UfmMetrics {
    let mut builder = DescriptionBuilder::new();
    let mut widths = GlyphWidthMap::new();
    let mut glyphs = Char2GlyphMap::new();
    let mut cid_to_gid = CidToGidMap::new();
    let mut glyph_list = Vec::new();
    let mut next_private = PRIVATE_USE_BASE;

    for line in text.lines() {
        let Some((keyword, rest)) = split_record(line) else {
            continue;
        };
        if keyword != "U" {
            builder.global_record(keyword, rest[0], &rest[1..]);
            continue;
        }

        let metric = CharMetric::parse(rest.iter().copied());
        let glyph = metric.glyph.unwrap_or(0);
        let code = match u32::try_from(metric.code) {
            Ok(code) => Some(code),
            Err(_) if metric.code == -1 && layout_table && glyph > 0 => {
                let code = next_private;
                next_private += 1;
                Some(code)
            }
            Err(_) => None,
        };

        if let Some(code) = code {
            builder.observe_box(code == 'X' as u32, code == 'x' as u32, metric.box_top);
            widths.insert(code, metric.width);
            glyphs.insert(code, glyph);
            cid_to_gid.set(code, glyph);
            if cff {
                glyph_list.push(GlyphListEntry { gid: glyph, unicode: code });
            }
        } else {
            log::debug!("Dropping unencoded glyph '{}'", metric.name());
        }
        builder.observe_notdef(metric.name(), metric.width);
    }

    builder.add_flags(flags::NON_SYMBOLIC);
    glyph_list.sort_by_key(|e: &GlyphListEntry| e.gid);
    let (font_name, description) = builder.finish();

    UfmMetrics {
        font_name,
        description,
        widths,
        glyphs,
        cid_to_gid,
        glyph_list,
    }
}
