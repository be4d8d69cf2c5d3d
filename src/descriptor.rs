//! # Font Descriptor
//!
//! The compiled result for one font and its serialization. The XML document
//! looks like:
//!
//! ```text
//! <wxpdfdoc-font-metrics type="TrueTypeUnicode">
//!   <font-name>DejaVuSans</font-name>
//!   <encoding></encoding>
//!   <description> ascent, descent, cap-height, flags, ... </description>
//!   <diff>128 /Euro </diff>                       (AFM fonts only)
//!   <file name="dejavusans.z" ctg="dejavusans.ctg.z" originalsize="720012"/>
//!   <widths subsetting="enabled">
//!     <char id="65" gn="36" width="684"/>
//!   </widths>
//!   <volt> ... </volt>                            (optional layout table)
//! </wxpdfdoc-font-metrics>
//! ```

use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;

use crate::error::MakeFontError;
use crate::metrics::{Char2GlyphMap, FontDescription, GlyphWidthMap};

const ROOT_ELEMENT: &str = "wxpdfdoc-font-metrics";
const LAYOUT_ROOT: &str = "volt";

/// The closed set of font kinds a descriptor can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontKind {
    /// 8-bit TrueType font compiled from AFM.
    TrueType,
    /// 8-bit Type1 font compiled from AFM.
    Type1,
    /// Unicode font with TrueType outlines (CID→GID map).
    TrueTypeUnicode,
    /// Unicode font with CFF outlines (ToUnicode map).
    OpenTypeUnicode,
}

impl FontKind {
    /// The type tag written to the descriptor.
    pub fn type_name(&self) -> &'static str {
        match self {
            FontKind::TrueType => "TrueType",
            FontKind::Type1 => "Type1",
            FontKind::TrueTypeUnicode => "TrueTypeUnicode",
            FontKind::OpenTypeUnicode => "OpenTypeUnicode",
        }
    }
}

/// Everything a PDF writer needs to use a font.
#[derive(Debug, Clone, Serialize)]
pub struct FontDescriptor {
    pub kind: FontKind,
    pub name: String,
    pub encoding: String,
    pub description: FontDescription,
    /// Differences string; AFM fonts only.
    pub diffs: Option<String>,
    /// Compressed font program file name, empty when not embedded.
    pub font_file: String,
    /// Compressed CID→GID / ToUnicode file name, empty when not written.
    pub ctg_file: String,
    pub size1: usize,
    pub size2: Option<usize>,
    pub widths: GlyphWidthMap,
    pub glyphs: Char2GlyphMap,
    /// Emit glyph indices next to widths.
    pub subsetting: bool,
    /// Raw layout-table document embedded under the root.
    #[serde(skip)]
    pub layout_table: Option<String>,
}

impl FontDescriptor {
    pub fn new(kind: FontKind, name: String, description: FontDescription) -> Self {
        Self {
            kind,
            name,
            encoding: String::new(),
            description,
            diffs: None,
            font_file: String::new(),
            ctg_file: String::new(),
            size1: 0,
            size2: None,
            widths: GlyphWidthMap::new(),
            glyphs: Char2GlyphMap::new(),
            subsetting: false,
            layout_table: None,
        }
    }

    /// Serialize as an XML document.
    pub fn to_xml(&self) -> Result<Vec<u8>, MakeFontError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute(("type", self.kind.type_name()));
        writer.write_event(Event::Start(root))?;

        write_text_element(&mut writer, "font-name", &self.name)?;
        write_text_element(&mut writer, "encoding", &self.encoding)?;

        let d = &self.description;
        writer.write_event(Event::Start(BytesStart::new("description")))?;
        write_text_element(&mut writer, "ascent", &d.ascent.to_string())?;
        write_text_element(&mut writer, "descent", &d.descent.to_string())?;
        write_text_element(&mut writer, "cap-height", &d.cap_height.to_string())?;
        write_text_element(&mut writer, "flags", &d.flags.to_string())?;
        write_text_element(&mut writer, "font-bbox", &d.font_bbox)?;
        write_text_element(&mut writer, "italic-angle", &d.italic_angle.to_string())?;
        write_text_element(&mut writer, "stem-v", &d.stem_v.to_string())?;
        write_text_element(&mut writer, "missing-width", &d.missing_width.to_string())?;
        write_text_element(&mut writer, "x-height", &d.x_height.to_string())?;
        write_text_element(&mut writer, "underline-position", &d.underline_position.to_string())?;
        write_text_element(&mut writer, "underline-thickness", &d.underline_thickness.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("description")))?;

        if let Some(diffs) = &self.diffs {
            write_text_element(&mut writer, "diff", diffs)?;
        }

        writer.write_event(Event::Empty(self.file_element()))?;

        let mut widths = BytesStart::new("widths");
        if self.subsetting {
            widths.push_attribute(("subsetting", "enabled"));
        }
        writer.write_event(Event::Start(widths))?;
        for (&code, &width) in &self.widths {
            let mut ch = BytesStart::new("char");
            ch.push_attribute(("id", code.to_string().as_str()));
            if self.subsetting {
                let gn = self.glyphs.get(&code).copied().unwrap_or(0);
                ch.push_attribute(("gn", gn.to_string().as_str()));
            }
            ch.push_attribute(("width", width.to_string().as_str()));
            writer.write_event(Event::Empty(ch))?;
        }
        writer.write_event(Event::End(BytesEnd::new("widths")))?;

        if let Some(layout) = self.layout_table.as_deref().and_then(layout_table_events) {
            for event in layout {
                writer.write_event(event)?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, MakeFontError> {
        let mut out = serde_json::to_vec_pretty(self)?;
        let _ = writeln!(out);
        Ok(out)
    }

    /// The `<file>` element; its attributes depend on the font kind.
    fn file_element(&self) -> BytesStart<'static> {
        let mut file = BytesStart::new("file");
        file.push_attribute(("name", self.font_file.as_str()));
        match self.kind {
            FontKind::TrueTypeUnicode | FontKind::OpenTypeUnicode => {
                file.push_attribute(("ctg", self.ctg_file.as_str()));
                file.push_attribute(("originalsize", self.size1.to_string().as_str()));
            }
            FontKind::TrueType => {
                file.push_attribute(("originalsize", self.size1.to_string().as_str()));
            }
            FontKind::Type1 => {
                file.push_attribute(("size1", self.size1.to_string().as_str()));
                if let Some(size2) = self.size2 {
                    file.push_attribute(("size2", size2.to_string().as_str()));
                }
            }
        }
        file
    }
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), MakeFontError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Read a layout-table document.
///
/// Unreadable files and documents that are not a single well-formed `<volt>`
/// element yield `None`, so a rejected table never activates private-use codes.
pub fn read_layout_table(path: &Path) -> Option<String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Layout table {} not readable: {}", path.display(), e);
            return None;
        }
    };
    if layout_table_events(&text).is_none() {
        log::debug!("Layout table {} is not a well-formed <volt> document", path.display());
        return None;
    }
    Some(text)
}

/// Parse a layout-table document into the events of its root element.
///
/// Returns `None` unless the document is well-formed and its root element is
/// `<volt>`.
fn layout_table_events(text: &str) -> Option<Vec<Event<'static>>> {
    let mut reader = Reader::from_str(text);

    let mut events = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                log::debug!("Ignoring malformed layout table: {}", e);
                return None;
            }
        };
        let keep = match &event {
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) if depth == 0 => false,
            Event::Text(t) if depth == 0 => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                false
            }
            Event::Start(e) | Event::Empty(e) if depth == 0 => {
                if seen_root || e.name().as_ref() != LAYOUT_ROOT.as_bytes() {
                    return None;
                }
                seen_root = true;
                true
            }
            _ if depth == 0 => return None,
            _ => true,
        };
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.checked_sub(1)?,
            _ => {}
        }
        if keep {
            events.push(event.into_owned());
        }
    }

    if seen_root && depth == 0 {
        Some(events)
    } else {
        None
    }
}
