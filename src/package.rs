//! # Font Program Packaging
//!
//! Assembles the bytes a PDF writer embeds for a font and compresses them
//! with zlib, plus the two auxiliary resources Unicode fonts need:
//!
//! - a CID→GID map: 65536 big-endian `u16` slots, slot `n` holding the glyph
//!   index for code `n` (TrueType outlines)
//! - a ToUnicode CMap mapping glyph indices back to Unicode (CFF outlines)

use std::fmt::Write as FmtWrite; // for write! on String

use miniz_oxide::deflate::compress_to_vec_zlib;
use serde::Serialize;

use crate::error::MakeFontError;
use crate::sfnt::CffRange;
use crate::type1;

const COMPRESSION_LEVEL: u8 = 6;

/// Size of a CID→GID map in bytes (two bytes per 16-bit code).
pub const CID_TO_GID_SIZE: usize = 2 * 0x10000;

/// A compressed font program ready to be written as `<base>.z`.
#[derive(Debug, Clone)]
pub struct EmbeddedProgram {
    pub compressed: Vec<u8>,
    /// Uncompressed length of the (first) segment.
    pub size1: usize,
    /// Uncompressed length of the Type1 binary segment.
    pub size2: Option<usize>,
}

impl EmbeddedProgram {
    /// The whole font file.
    pub fn whole_file(data: &[u8]) -> Self {
        Self {
            compressed: compress(data),
            size1: data.len(),
            size2: None,
        }
    }

    /// Just the `CFF ` table of an OpenType font.
    pub fn cff_table(data: &[u8], range: CffRange) -> Result<Self, MakeFontError> {
        let table = range
            .offset
            .checked_add(range.length)
            .and_then(|end| data.get(range.offset..end))
            .ok_or_else(|| {
                MakeFontError::InvalidFontFile(format!(
                    "CFF table ({} bytes at {}) lies outside the font file",
                    range.length, range.offset
                ))
            })?;
        Ok(Self {
            compressed: compress(table),
            size1: table.len(),
            size2: None,
        })
    }

    /// The clear-text and binary segments of a Type1 (PFB/PFA) program.
    pub fn type1(data: &[u8]) -> Result<Self, MakeFontError> {
        let segments = type1::extract(data)?;
        let mut joined = Vec::with_capacity(segments.clear_text.len() + segments.binary.len());
        joined.extend_from_slice(segments.clear_text);
        joined.extend_from_slice(segments.binary);
        Ok(Self {
            compressed: compress(&joined),
            size1: segments.clear_text.len(),
            size2: Some(segments.binary.len()),
        })
    }
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}

// ─── CID to GID Map ─────────────────────────────────────────────

/// Dense map from 16-bit character code to glyph index.
#[derive(Clone, PartialEq, Eq)]
pub struct CidToGidMap {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for CidToGidMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes.chunks(2).filter(|s| *s != [0u8, 0]).count();
        f.debug_struct("CidToGidMap").field("used", &used).finish()
    }
}

impl Default for CidToGidMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CidToGidMap {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; CID_TO_GID_SIZE],
        }
    }

    /// Set the slot for `code`. Codes outside [0, 0xFFFF) are ignored and
    /// glyph indices are truncated to 16 bits.
    pub fn set(&mut self, code: u32, gid: u32) {
        if code >= 0xFFFF {
            return;
        }
        let at = 2 * code as usize;
        self.bytes[at] = ((gid >> 8) & 0xFF) as u8;
        self.bytes[at + 1] = (gid & 0xFF) as u8;
    }

    pub fn get(&self, code: u32) -> u16 {
        if code >= 0xFFFF {
            return 0;
        }
        let at = 2 * code as usize;
        u16::from_be_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn compressed(&self) -> Vec<u8> {
        compress(&self.bytes)
    }
}

// ─── ToUnicode CMap ─────────────────────────────────────────────

/// One glyph of a CFF font with the Unicode value it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphListEntry {
    pub gid: u32,
    pub unicode: u32,
}

/// Build a ToUnicode CMap from glyph entries already ordered by glyph index.
pub fn to_unicode_cmap(glyphs: &[GlyphListEntry]) -> String {
    let mut cmap = String::new();
    let _ = writeln!(cmap, "/CIDInit /ProcSet findresource begin");
    let _ = writeln!(cmap, "12 dict begin");
    let _ = writeln!(cmap, "begincmap");
    let _ = writeln!(cmap, "/CIDSystemInfo");
    let _ = writeln!(cmap, "<< /Registry (Adobe)");
    let _ = writeln!(cmap, "/Ordering (UCS)");
    let _ = writeln!(cmap, "/Supplement 0");
    let _ = writeln!(cmap, ">> def");
    let _ = writeln!(cmap, "/CMapName /Adobe-Identity-UCS def");
    let _ = writeln!(cmap, "/CMapType 2 def");
    let _ = writeln!(cmap, "1 begincodespacerange");
    let _ = writeln!(cmap, "<0000><FFFF>");
    let _ = writeln!(cmap, "endcodespacerange");

    // At most 100 entries per bfrange block
    for chunk in glyphs.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfrange", chunk.len());
        for entry in chunk {
            let _ = writeln!(
                cmap,
                "<{:04x}><{:04x}><{:04x}>",
                entry.gid, entry.gid, entry.unicode
            );
        }
        let _ = writeln!(cmap, "endbfrange");
    }

    let _ = writeln!(cmap, "endcmap");
    let _ = writeln!(cmap, "CMapName currentdict /CMap defineresource pop");
    let _ = writeln!(cmap, "end end");
    cmap
}
