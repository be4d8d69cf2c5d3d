//! Integration tests for the makefont compilation pipeline.
//!
//! These tests run `compile` end to end on synthetic inputs written to a
//! temporary directory. They verify:
//! - AFM compilation with and without an encoding
//! - Font program embedding for TrueType and Type1 files
//! - License and format checks degrading to diagnostics
//! - UFM compilation with CID→GID maps and ToUnicode CMaps
//! - Layout-table pass-through and JSON output
//! - Immediate mode over a hand-built TrueType font

use std::fs;
use std::path::{Path, PathBuf};

use miniz_oxide::inflate::decompress_to_vec_zlib;
use tempfile::TempDir;

use makefont::config::{CompileOptions, MetricsSource, Outline, OutputFormat};
use makefont::descriptor::FontKind;
use makefont::error::{Diagnostic, MakeFontError};
use makefont::{compile, CompileReport};

// ─── Helpers ────────────────────────────────────────────────────

const TEST_AFM: &str = "\
StartFontMetrics 4.1
FontName Test-Regular
Ascender 718
Descender -207
StartCharMetrics 1
C 1 ; WX 600 ; N A ;
EndCharMetrics
EndFontMetrics
";

const TEST_UFM: &str = "\
StartFontMetrics 4.1
FontName TestUnicode
Ascender 928
Descender -236
StartCharMetrics 3
U 32 ; WX 318 ; N space ; G 3 ;
U 65 ; WX 684 ; N A ; G 36 ;
U 8364 ; WX 636 ; N Euro ; G 1200 ;
U -1 ; WX 500 ; N a.alt ; G 1300 ;
EndCharMetrics
EndFontMetrics
";

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn options(dir: &TempDir, source: MetricsSource) -> CompileOptions {
    let mut options = CompileOptions::new(source);
    options.output_dir = dir.path().to_path_buf();
    options.map_dir = dir.path().to_path_buf();
    options
}

fn afm_source(metrics: PathBuf, font: Option<PathBuf>, encoding: Option<&str>) -> MetricsSource {
    MetricsSource::Afm {
        metrics,
        font,
        encoding: encoding.map(str::to_string),
        patch: None,
        kind: FontKind::TrueType,
    }
}

fn ufm_source(metrics: PathBuf, font: Option<PathBuf>, layout_table: Option<PathBuf>) -> MetricsSource {
    MetricsSource::Ufm {
        metrics,
        font,
        outline: Outline::TrueType,
        layout_table,
    }
}

/// A minimal sfnt container holding the given tables.
fn build_sfnt(signature: &[u8; 4], tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = signature.to_vec();
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);
    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
    }
    out
}

fn os2(fs_type: u16) -> Vec<u8> {
    let mut table = vec![0u8; 16];
    table[8..10].copy_from_slice(&fs_type.to_be_bytes());
    table
}

/// A loadable TrueType font: 2000 units/em, two glyphs, 'A' mapped to glyph 1.
fn build_truetype(fs_type: u16) -> Vec<u8> {
    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head[18..20].copy_from_slice(&2000u16.to_be_bytes());

    let mut hhea = vec![0u8; 36];
    hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea[4..6].copy_from_slice(&1600i16.to_be_bytes());
    hhea[6..8].copy_from_slice(&(-400i16).to_be_bytes());
    hhea[34..36].copy_from_slice(&2u16.to_be_bytes());

    let mut maxp = 0x0000_5000u32.to_be_bytes().to_vec();
    maxp.extend_from_slice(&2u16.to_be_bytes());

    // format 4, one segment: 'A' + delta -> glyph 1
    let mut cmap = Vec::new();
    for v in [0u16, 1, 3, 1, 0, 12] {
        cmap.extend_from_slice(&v.to_be_bytes());
    }
    for v in [4u16, 24, 0, 2, 2, 0, 0, 65, 0, 65, (-64i16) as u16, 0] {
        cmap.extend_from_slice(&v.to_be_bytes());
    }

    let mut hmtx = Vec::new();
    for advance in [500u16, 1200] {
        hmtx.extend_from_slice(&advance.to_be_bytes());
        hmtx.extend_from_slice(&0i16.to_be_bytes());
    }

    let mut os2 = os2(fs_type);
    os2.resize(78, 0);

    // table records must be sorted by tag
    build_sfnt(
        &[0, 1, 0, 0],
        &[
            (b"OS/2", os2),
            (b"cmap", cmap),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"maxp", maxp),
        ],
    )
}

fn build_pfb(clear: &[u8], binary: &[u8]) -> Vec<u8> {
    let header = |kind: u8, len: usize| {
        let mut h = vec![128u8, kind];
        h.extend_from_slice(&(len as u32).to_le_bytes());
        h
    };
    let trailer = [b"0".repeat(512), b"cleartomark\n".to_vec()].concat();
    let mut out = header(1, clear.len());
    out.extend_from_slice(clear);
    out.extend(header(2, binary.len()));
    out.extend_from_slice(binary);
    out.extend(header(1, trailer.len()));
    out.extend_from_slice(&trailer);
    out.extend_from_slice(&[128, 3]);
    out
}

fn read_xml(report: &CompileReport) -> String {
    let descriptor = report.outputs.last().unwrap();
    fs::read_to_string(descriptor).unwrap()
}

fn inflate(path: &Path) -> Vec<u8> {
    decompress_to_vec_zlib(&fs::read(path).unwrap()).unwrap()
}

// ─── AFM ────────────────────────────────────────────────────────

#[test]
fn test_afm_with_encoding_fills_every_code() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test.map", b"!41 U+0041 A\n");
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let report = compile(&options(&dir, afm_source(afm, None, Some("test")))).unwrap();

    let d = &report.descriptor;
    assert_eq!(d.name, "Test-Regular");
    assert_eq!(d.encoding, "test");
    assert_eq!(d.widths.len(), 256);
    assert_eq!(d.widths[&65], 600);
    assert!(d.widths.values().all(|&w| w == 600));
    assert!(report.diagnostics.contains(&Diagnostic::NoFontFile));
    assert!(report.diagnostics.contains(&Diagnostic::MissingWidth {
        code: 66,
        glyph: ".notdef".to_string()
    }));

    assert_eq!(report.outputs, vec![dir.path().join("Test.xml")]);
    let xml = read_xml(&report);
    assert!(xml.contains(r#"<wxpdfdoc-font-metrics type="TrueType">"#));
    assert!(xml.contains(r#"<char id="65" width="600"/>"#));
    assert!(xml.contains("<diff>"));
    assert!(xml.contains(r#"<file name="" originalsize="0"/>"#));
}

#[test]
fn test_afm_symbolic_without_encoding() {
    let dir = TempDir::new().unwrap();
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let report = compile(&options(&dir, afm_source(afm, None, None))).unwrap();

    let d = &report.descriptor;
    assert_eq!(d.widths.len(), 1);
    assert_eq!(d.widths[&1], 600);
    assert_eq!(d.description.flags, 4);
    assert!(d.diffs.is_none());
    assert!(!read_xml(&report).contains("<diff"));
}

#[test]
fn test_afm_type1_program_embedded() {
    let dir = TempDir::new().unwrap();
    let clear = b"%!PS-AdobeFont-1.0: Test\ncurrentfile eexec\r";
    let binary = [0xD9u8, 0xD6, 0x6F, 0x63, 0x3B, 0x84];
    let pfb = write(dir.path(), "Test.pfb", &build_pfb(clear, &binary));
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let report = compile(&options(&dir, afm_source(afm, Some(pfb), None))).unwrap();

    let d = &report.descriptor;
    assert_eq!(d.kind, FontKind::Type1);
    assert_eq!(d.font_file, "Test.z");
    assert_eq!(d.size1, clear.len());
    assert_eq!(d.size2, Some(binary.len()));
    assert!(report.diagnostics.is_empty());

    let program = inflate(&dir.path().join("Test.z"));
    assert_eq!(program, [&clear[..], &binary[..]].concat());

    let xml = read_xml(&report);
    let expected = format!(r#"<file name="Test.z" size1="{}" size2="{}"/>"#, clear.len(), binary.len());
    assert!(xml.contains(&expected));
}

#[test]
fn test_afm_invalid_type1_degrades() {
    let dir = TempDir::new().unwrap();
    let pfb = write(dir.path(), "Broken.pfb", b"no segments here");
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let report = compile(&options(&dir, afm_source(afm, Some(pfb), None))).unwrap();

    assert!(matches!(report.diagnostics[0], Diagnostic::InvalidFontFile(_)));
    assert!(report.descriptor.font_file.is_empty());
    assert!(!dir.path().join("Broken.z").exists());
    assert!(dir.path().join("Broken.xml").exists());
}

#[test]
fn test_afm_truetype_embedding_follows_license() {
    let dir = TempDir::new().unwrap();
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    // restricted license, nothing relaxing it
    let denied = write(dir.path(), "Denied.ttf", &build_sfnt(&[0, 1, 0, 0], &[(b"OS/2", os2(0x0002))]));
    let report = compile(&options(&dir, afm_source(afm.clone(), Some(denied), None))).unwrap();
    assert_eq!(report.diagnostics, vec![Diagnostic::EmbeddingNotAllowed]);
    assert!(!dir.path().join("Denied.z").exists());

    // restricted but preview & print
    let font = build_sfnt(&[0, 1, 0, 0], &[(b"OS/2", os2(0x0006))]);
    let allowed = write(dir.path(), "Allowed.ttf", &font);
    let report = compile(&options(&dir, afm_source(afm, Some(allowed), None))).unwrap();
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.descriptor.size1, font.len());
    assert_eq!(inflate(&dir.path().join("Allowed.z")), font);
}

#[test]
fn test_afm_unrecognized_extension_uses_requested_kind() {
    let dir = TempDir::new().unwrap();
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());
    let font = write(dir.path(), "Test.otf", &build_sfnt(b"OTTO", &[(b"OS/2", os2(0))]));

    let report = compile(&options(&dir, afm_source(afm, Some(font), None))).unwrap();

    assert_eq!(report.descriptor.kind, FontKind::TrueType);
    assert_eq!(
        report.diagnostics[0],
        Diagnostic::UnrecognizedExtension {
            extension: "otf".to_string(),
            assumed: "TrueType".to_string()
        }
    );
    assert_eq!(report.descriptor.font_file, "Test.z");
}

#[test]
fn test_afm_patch_overrides_encoding() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.map", b"!41 U+0041 B\n!42 U+0042 B\n");
    write(dir.path(), "fix.map", b"!41 U+0041 A\n");
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let mut source = afm_source(afm, None, Some("base"));
    if let MetricsSource::Afm { patch, .. } = &mut source {
        *patch = Some("fix".to_string());
    }
    let report = compile(&options(&dir, source)).unwrap();

    assert!(!report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::MissingWidth { code: 65, .. })));
    assert!(report.diagnostics.contains(&Diagnostic::MissingWidth {
        code: 66,
        glyph: "B".to_string()
    }));
}

#[test]
fn test_afm_missing_patch_is_a_warning() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test.map", b"!41 U+0041 A\n");
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let mut source = afm_source(afm, None, Some("test"));
    if let MetricsSource::Afm { patch, .. } = &mut source {
        *patch = Some("nope".to_string());
    }
    let report = compile(&options(&dir, source)).unwrap();

    assert_eq!(report.diagnostics[0], Diagnostic::PatchUnavailable("nope".to_string()));
    assert_eq!(report.descriptor.widths[&65], 600);
}

#[test]
fn test_missing_inputs_abort() {
    let dir = TempDir::new().unwrap();
    let afm = write(dir.path(), "Test.afm", TEST_AFM.as_bytes());

    let missing_metrics = afm_source(dir.path().join("Nope.afm"), None, None);
    let err = compile(&options(&dir, missing_metrics)).unwrap_err();
    assert!(matches!(err, MakeFontError::ResourceNotFound { .. }));

    let missing_map = afm_source(afm.clone(), None, Some("nope"));
    let err = compile(&options(&dir, missing_map)).unwrap_err();
    assert!(matches!(err, MakeFontError::ResourceNotFound { .. }));

    let missing_font = afm_source(afm, Some(dir.path().join("Nope.ttf")), None);
    let err = compile(&options(&dir, missing_font)).unwrap_err();
    assert!(matches!(err, MakeFontError::ResourceNotFound { .. }));
    assert!(!dir.path().join("Nope.xml").exists());
}

// ─── UFM ────────────────────────────────────────────────────────

#[test]
fn test_ufm_truetype_writes_cid_to_gid_map() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let font = build_sfnt(&[0, 1, 0, 0], &[(b"OS/2", os2(0))]);
    let ttf = write(dir.path(), "TestUnicode.ttf", &font);

    let report = compile(&options(&dir, ufm_source(ufm, Some(ttf), None))).unwrap();

    let d = &report.descriptor;
    assert_eq!(d.kind, FontKind::TrueTypeUnicode);
    assert_eq!(d.widths.len(), 3);
    assert_eq!(d.font_file, "TestUnicode.z");
    assert_eq!(d.ctg_file, "TestUnicode.ctg.z");
    assert_eq!(inflate(&dir.path().join("TestUnicode.z")), font);

    let map = inflate(&dir.path().join("TestUnicode.ctg.z"));
    assert_eq!(map.len(), 131072);
    assert_eq!(&map[2 * 65..2 * 65 + 2], &[0, 36]);
    assert_eq!(&map[2 * 8364..2 * 8364 + 2], &[0x04, 0xB0]);

    let xml = read_xml(&report);
    let expected = format!(
        r#"<file name="TestUnicode.z" ctg="TestUnicode.ctg.z" originalsize="{}"/>"#,
        font.len()
    );
    assert!(xml.contains(&expected));
    assert!(xml.contains(r#"<char id="65" width="684"/>"#));
}

#[test]
fn test_ufm_cff_writes_to_unicode_cmap() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let cff_table = b"\x01\x00\x04\x02 pretend CFF data".to_vec();
    let font = build_sfnt(b"OTTO", &[(b"CFF ", cff_table.clone()), (b"OS/2", os2(0))]);
    let otf = write(dir.path(), "TestUnicode.otf", &font);

    let report = compile(&options(&dir, ufm_source(ufm, Some(otf), None))).unwrap();

    let d = &report.descriptor;
    assert_eq!(d.kind, FontKind::OpenTypeUnicode);
    assert_eq!(d.size1, cff_table.len());
    assert_eq!(inflate(&dir.path().join("TestUnicode.z")), cff_table);

    let cmap = String::from_utf8(inflate(&dir.path().join("TestUnicode.ctg.z"))).unwrap();
    assert!(cmap.contains("3 beginbfrange\n<0003><0003><0020>\n<0024><0024><0041>\n<04b0><04b0><20ac>\nendbfrange"));

    let xml = read_xml(&report);
    assert!(xml.contains(r#"<wxpdfdoc-font-metrics type="OpenTypeUnicode">"#));
    assert!(xml.contains(r#"<widths subsetting="enabled">"#));
    assert!(xml.contains(r#"<char id="65" gn="36" width="684"/>"#));
}

#[test]
fn test_ufm_without_font_file() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let source = MetricsSource::Ufm {
        metrics: ufm,
        font: None,
        outline: Outline::Cff,
        layout_table: None,
    };

    let report = compile(&options(&dir, source)).unwrap();

    assert_eq!(report.descriptor.kind, FontKind::OpenTypeUnicode);
    assert_eq!(report.diagnostics, vec![Diagnostic::NoFontFile]);
    assert_eq!(report.outputs, vec![dir.path().join("TestUnicode.xml")]);
}

#[test]
fn test_ufm_layout_table_embedded() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let volt = write(
        dir.path(),
        "TestUnicode.vtp",
        br#"<?xml version="1.0"?>
<volt>
  <ruleset>
    <rule repeat="false" match="0627 0644" replace="FEFB"/>
  </ruleset>
</volt>
"#,
    );

    let report = compile(&options(&dir, ufm_source(ufm, None, Some(volt)))).unwrap();

    // the unencoded glyph is kept under a private-use code
    assert_eq!(report.descriptor.widths[&0xE000], 500);
    let xml = read_xml(&report);
    assert!(xml.contains("<volt>"));
    assert!(xml.contains(r#"<rule repeat="false" match="0627 0644" replace="FEFB"/>"#));
}

#[test]
fn test_ufm_malformed_layout_table_omitted() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let volt = write(dir.path(), "Bad.vtp", b"<volt><ruleset></volt>");

    let report = compile(&options(&dir, ufm_source(ufm.clone(), None, Some(volt)))).unwrap();
    assert!(!read_xml(&report).contains("<volt"));
    // a rejected table does not activate private-use codes
    assert!(!report.descriptor.widths.contains_key(&0xE000));

    let missing = dir.path().join("Missing.vtp");
    let report = compile(&options(&dir, ufm_source(ufm, None, Some(missing)))).unwrap();
    assert!(!read_xml(&report).contains("<volt"));
    assert!(!report.descriptor.widths.contains_key(&0xE000));
}

// ─── Output ─────────────────────────────────────────────────────

#[test]
fn test_json_descriptor() {
    let dir = TempDir::new().unwrap();
    let ufm = write(dir.path(), "TestUnicode.ufm", TEST_UFM.as_bytes());
    let mut opts = options(&dir, ufm_source(ufm, None, None));
    opts.format = OutputFormat::Json;

    let report = compile(&opts).unwrap();

    assert_eq!(report.outputs, vec![dir.path().join("TestUnicode.json")]);
    let json: serde_json::Value = serde_json::from_slice(&fs::read(&report.outputs[0]).unwrap()).unwrap();
    assert_eq!(json["kind"], "TrueTypeUnicode");
    assert_eq!(json["name"], "TestUnicode");
    assert_eq!(json["widths"]["8364"], 636);
}

#[test]
fn test_immediate_truetype_font() {
    let dir = TempDir::new().unwrap();
    let font = build_truetype(0);
    let path = write(dir.path(), "Mini.ttf", &font);

    let report = compile(&options(&dir, MetricsSource::Immediate { font: path })).unwrap();

    let d = &report.descriptor;
    assert!(report.diagnostics.is_empty());
    assert_eq!(d.kind, FontKind::TrueTypeUnicode);
    assert_eq!(d.widths.len(), 1);
    assert_eq!(d.widths[&65], 600);
    assert_eq!(d.glyphs[&65], 1);
    assert_eq!(d.description.ascent, 800);
    assert_eq!(d.description.descent, -200);
    assert_eq!(d.description.missing_width, 250);
    assert_eq!(d.font_file, "Mini.z");
    assert_eq!(d.ctg_file, "Mini.ctg.z");
    assert_eq!(inflate(&dir.path().join("Mini.z")), font);

    let map = inflate(&dir.path().join("Mini.ctg.z"));
    assert_eq!(map.len(), 131072);
    assert_eq!(&map[2 * 65..2 * 65 + 2], &[0, 1]);
    assert_eq!(&map[2 * 66..2 * 66 + 2], &[0, 0]);

    assert!(read_xml(&report).contains(r#"<char id="65" width="600"/>"#));
}

#[test]
fn test_immediate_embedding_follows_license() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Restricted.ttf", &build_truetype(0x0002));

    let report = compile(&options(&dir, MetricsSource::Immediate { font: path })).unwrap();

    assert_eq!(report.diagnostics, vec![Diagnostic::EmbeddingNotAllowed]);
    assert_eq!(report.descriptor.widths[&65], 600);
    assert!(report.descriptor.font_file.is_empty());
    assert!(!dir.path().join("Restricted.z").exists());
    assert!(!dir.path().join("Restricted.ctg.z").exists());
}

#[test]
fn test_immediate_rejects_non_font() {
    let dir = TempDir::new().unwrap();
    let font = write(dir.path(), "Garbage.ttf", b"this is not a font");

    let err = compile(&options(&dir, MetricsSource::Immediate { font })).unwrap_err();

    assert!(matches!(err, MakeFontError::InvalidFontFile(_)));
    assert!(!dir.path().join("Garbage.xml").exists());
}
