//! # TrueType Container Inspection
//!
//! Reads just enough of an sfnt container (TrueType or CFF-flavoured
//! OpenType) to decide whether the font license allows embedding and
//! subsetting, and where an embedded `CFF ` table lives.
//!
//! ## Layout
//!
//! ```text
//! 0   sfntVersion    u32   0x00010000 or 'OTTO'
//! 4   numTables      u16
//! 6   searchRange, entrySelector, rangeShift (skipped)
//! 12  table records  16 bytes each: tag, checksum, offset, length
//! ```
//!
//! The OS/2 `fsType` field sits 8 bytes into the OS/2 table.

use serde::Serialize;

use crate::error::MakeFontError;

const SFNT_TRUETYPE: u32 = 0x0001_0000;
const SFNT_OPENTYPE_CFF: u32 = 0x4F54_544F;

const FS_RESTRICTED: u16 = 0x0002;
const FS_PREVIEW_PRINT: u16 = 0x0004;
const FS_EDITABLE: u16 = 0x0008;
const FS_NO_SUBSETTING: u16 = 0x0100;
const FS_BITMAP_ONLY: u16 = 0x0200;

/// Byte range of a `CFF ` table inside the font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CffRange {
    pub offset: usize,
    pub length: usize,
}

/// License information derived once per font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbeddingPermission {
    pub embedding_allowed: bool,
    pub subsetting_allowed: bool,
    pub cff: Option<CffRange>,
}

impl EmbeddingPermission {
    /// Nothing allowed, no CFF table. Used whenever inspection fails.
    pub fn denied() -> Self {
        Self {
            embedding_allowed: false,
            subsetting_allowed: false,
            cff: None,
        }
    }

    /// Decode the OS/2 `fsType` bits.
    ///
    /// Restricted-license embedding is refused unless the preview & print or
    /// editable bit relaxes it; bitmap-only embedding refuses outline
    /// embedding regardless.
    pub fn from_fs_type(fs_type: u16) -> Self {
        let restricted = fs_type & FS_RESTRICTED != 0;
        let preview = fs_type & FS_PREVIEW_PRINT != 0;
        let editable = fs_type & FS_EDITABLE != 0;
        let no_subsetting = fs_type & FS_NO_SUBSETTING != 0;
        let bitmap_only = fs_type & FS_BITMAP_ONLY != 0;
        Self {
            embedding_allowed: !(restricted && !preview && !editable) && !bitmap_only,
            subsetting_allowed: !no_subsetting,
            cff: None,
        }
    }

    pub fn is_cff(&self) -> bool {
        self.cff.is_some_and(|c| c.offset > 0)
    }
}

/// Inspect an in-memory font file.
pub fn inspect(data: &[u8]) -> Result<EmbeddingPermission, MakeFontError> {
    let signature = read_u32(data, 0)?;
    if signature != SFNT_TRUETYPE && signature != SFNT_OPENTYPE_CFF {
        return Err(MakeFontError::InvalidFontFile(format!(
            "unknown sfnt signature 0x{:08X}",
            signature
        )));
    }

    let num_tables = read_u16(data, 4)? as usize;
    let mut os2_offset = None;
    let mut cff = None;
    for i in 0..num_tables {
        let record = 12 + i * 16;
        let tag = data
            .get(record..record + 4)
            .ok_or_else(|| truncated("table directory"))?;
        match tag {
            b"OS/2" => os2_offset = Some(read_u32(data, record + 8)? as usize),
            b"CFF " => {
                cff = Some(CffRange {
                    offset: read_u32(data, record + 8)? as usize,
                    length: read_u32(data, record + 12)? as usize,
                })
            }
            _ => {}
        }
    }

    let Some(os2_offset) = os2_offset else {
        log::debug!("No OS/2 table, embedding not permitted");
        return Ok(EmbeddingPermission { cff, ..EmbeddingPermission::denied() });
    };

    let fs_type = read_u16(data, os2_offset + 8)?;
    log::debug!("OS/2 fsType = 0x{:04X}", fs_type);
    Ok(EmbeddingPermission {
        cff,
        ..EmbeddingPermission::from_fs_type(fs_type)
    })
}

fn truncated(what: &str) -> MakeFontError {
    MakeFontError::InvalidFontFile(format!("truncated {}", what))
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn read_u16(data: &[u8], offset: usize) -> Result<u16, MakeFontError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| truncated("font header"))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, MakeFontError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| truncated("font header"))
}
