//! # Encoding Maps
//!
//! An encoding map names, for every 8-bit character code, the glyph that code
//! selects. Maps are read from `<name>.map` resources with one entry per line:
//!
//! ```text
//! !41 U+0041 A
//! !80 U+20AC Euro
//! ```
//!
//! The hexadecimal code follows the `!` marker, the third token is the glyph
//! name. Codes the resource never mentions read as `.notdef`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MakeFontError;

/// Glyph name of the undefined glyph.
pub const NOTDEF: &str = ".notdef";

/// A complete 256-entry code → glyph name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingMap {
    names: Vec<String>,
}

/// The explicit entries of a patch resource, applied on top of a base map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingPatch {
    entries: BTreeMap<u8, String>,
}

impl EncodingMap {
    /// Load the map named `name` from `dir`.
    pub fn load(name: &str, dir: &Path) -> Result<Self, MakeFontError> {
        let entries = read_entries(name, dir)?;
        Ok(Self::from_entries(entries))
    }

    /// Parse map text. Lines without the `!` marker are ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_entries(parse_entries(text))
    }

    fn from_entries(entries: BTreeMap<u8, String>) -> Self {
        let mut names = vec![NOTDEF.to_string(); 256];
        for (code, name) in entries {
            names[code as usize] = name;
        }
        Self { names }
    }

    /// The Windows-1252 glyph names, compiled in.
    pub fn cp1252() -> Self {
        let mut names = vec![NOTDEF.to_string(); 256];
        for (i, name) in CP1252_GLYPHS.iter().enumerate() {
            names[0x20 + i] = (*name).to_string();
        }
        Self { names }
    }

    /// The reference encoding differences are computed against: `cp1252.map`
    /// from `dir` when present, the compiled-in table otherwise.
    pub fn reference(dir: &Path) -> Self {
        match Self::load("cp1252", dir) {
            Ok(map) => map,
            Err(e) => {
                log::debug!("{}; using built-in cp1252 reference", e);
                Self::cp1252()
            }
        }
    }

    /// Override the entries the patch names; everything else is kept.
    pub fn overlay(&mut self, patch: &EncodingPatch) {
        for (&code, name) in &patch.entries {
            self.names[code as usize] = name.clone();
        }
    }

    pub fn glyph(&self, code: u8) -> &str {
        &self.names[code as usize]
    }

    pub fn set(&mut self, code: u8, name: &str) {
        self.names[code as usize] = name.to_string();
    }

    /// All codes mapped to `glyph`, ascending.
    pub fn codes_of<'a>(&'a self, glyph: &'a str) -> impl Iterator<Item = u8> + 'a {
        self.iter()
            .filter(move |(_, name)| *name == glyph)
            .map(|(code, _)| code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(code, name)| (code as u8, name.as_str()))
    }
}

impl EncodingPatch {
    pub fn load(name: &str, dir: &Path) -> Result<Self, MakeFontError> {
        Ok(Self {
            entries: read_entries(name, dir)?,
        })
    }

    pub fn parse(text: &str) -> Self {
        Self {
            entries: parse_entries(text),
        }
    }
}

/// Path of the map resource for an encoding name.
pub fn map_path(name: &str, dir: &Path) -> PathBuf {
    let lower = name.to_lowercase();
    if lower.ends_with(".map") {
        dir.join(lower)
    } else {
        dir.join(format!("{}.map", lower))
    }
}

fn read_entries(name: &str, dir: &Path) -> Result<BTreeMap<u8, String>, MakeFontError> {
    let path = map_path(name, dir);
    let text = fs::read_to_string(&path).map_err(|e| MakeFontError::not_found(&path, e))?;
    let entries = parse_entries(&text);
    log::debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

fn parse_entries(text: &str) -> BTreeMap<u8, String> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(code) = tokens.next().and_then(|t| t.strip_prefix('!')) else {
            continue;
        };
        let _unicode = tokens.next();
        let Some(glyph) = tokens.next() else {
            continue;
        };
        match u32::from_str_radix(code, 16) {
            Ok(code) if code <= 0xFF => {
                entries.insert(code as u8, glyph.to_string());
            }
            _ => log::debug!("Skipping map entry '{}'", line.trim()),
        }
    }
    entries
}

/// Glyph names of Windows-1252 for codes 0x20..=0xFF.
const CP1252_GLYPHS: [&str; 224] = [
    // 0x20
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
    // 0x30
    "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question",
    // 0x40
    "at", "A", "B", "C", "D", "E", "F", "G",
    "H", "I", "J", "K", "L", "M", "N", "O",
    // 0x50
    "P", "Q", "R", "S", "T", "U", "V", "W",
    "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum", "underscore",
    // 0x60
    "grave", "a", "b", "c", "d", "e", "f", "g",
    "h", "i", "j", "k", "l", "m", "n", "o",
    // 0x70
    "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde", ".notdef",
    // 0x80
    "Euro", ".notdef", "quotesinglbase", "florin", "quotedblbase", "ellipsis", "dagger", "daggerdbl",
    "circumflex", "perthousand", "Scaron", "guilsinglleft", "OE", ".notdef", "Zcaron", ".notdef",
    // 0x90
    ".notdef", "quoteleft", "quoteright", "quotedblleft", "quotedblright", "bullet", "endash", "emdash",
    "tilde", "trademark", "scaron", "guilsinglright", "oe", ".notdef", "zcaron", "Ydieresis",
    // 0xA0
    "space", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "hyphen", "registered", "macron",
    // 0xB0
    "degree", "plusminus", "twosuperior", "threesuperior", "acute", "mu", "paragraph", "periodcentered",
    "cedilla", "onesuperior", "ordmasculine", "guillemotright", "onequarter", "onehalf", "threequarters", "questiondown",
    // 0xC0
    "Agrave", "Aacute", "Acircumflex", "Atilde", "Adieresis", "Aring", "AE", "Ccedilla",
    "Egrave", "Eacute", "Ecircumflex", "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis",
    // 0xD0
    "Eth", "Ntilde", "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply",
    "Oslash", "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls",
    // 0xE0
    "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla",
    "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex", "idieresis",
    // 0xF0
    "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde", "odieresis", "divide",
    "oslash", "ugrave", "uacute", "ucircumflex", "udieresis", "yacute", "thorn", "ydieresis",
];
