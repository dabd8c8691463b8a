//! PDF text extraction module
//!
//! Extracts text content from PDF payloads using lopdf. Every text-showing
//! operator in a page's content stream contributes one fragment; fragments
//! are joined with a space and pages with a newline.
//!
//! Strings are decoded through the font selected by the last `Tf`: simple
//! fonts via their base encoding, Identity-encoded composite fonts via their
//! ToUnicode CMap.

use crate::errors::IngestionError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// TJ displacement (thousandths of text space) treated as a word gap
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Encoding assumed when a font declares none
const DEFAULT_ENCODING: &str = "StandardEncoding";

/// Largest bfrange expanded from a ToUnicode CMap
const MAX_CMAP_RANGE: u32 = 0xFFFF;

/// Extract text content from an in-memory PDF
pub fn extract_document_text(bytes: &[u8]) -> Result<String, IngestionError> {
    let doc = Document::load_mem(bytes).map_err(|e| IngestionError::DocumentParse {
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();

    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut page_texts = Vec::with_capacity(pages.len());
    for (page_num, page_id) in pages {
        let fragments =
            extract_page_fragments(&doc, page_id).map_err(|e| IngestionError::DocumentParse {
                message: format!("Failed to read page {}: {}", page_num, e),
            })?;
        page_texts.push(fragments.join(" "));
    }

    let text = page_texts.join("\n");

    if text.trim().is_empty() {
        warn!("No text content extracted from PDF");
    }

    debug!(text_len = text.len(), "Text extraction complete");

    Ok(text)
}

/// Collect the text fragments of a single page, in content stream order
fn extract_page_fragments(doc: &Document, page_id: ObjectId) -> Result<Vec<String>, String> {
    let data = page_content(doc, page_id).map_err(|e| e.to_string())?;
    let content = Content::decode(&data).map_err(|e| e.to_string())?;

    check_operations(&content.operations, &data)?;

    let decoders: BTreeMap<Vec<u8>, TextDecoder> = doc
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| {
            let decoder = TextDecoder::for_font(doc, &name, font);
            (name, decoder)
        })
        .collect();
    let fallback = TextDecoder::Simple(DEFAULT_ENCODING.to_string());
    let mut current = &fallback;

    let mut fragments = Vec::new();
    for op in &content.operations {
        if op.operator == "Tf" {
            if let Some(Ok(name)) = op.operands.first().map(Object::as_name) {
                current = decoders.get(name).unwrap_or_else(|| {
                    warn!(font = %String::from_utf8_lossy(name), "Unknown font selected");
                    &fallback
                });
            }
            continue;
        }

        if let Some(fragment) = fragment_from_operation(op, current) {
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }
    }

    Ok(fragments)
}

/// Reject streams the content parser gave up on: bytes with no operators,
/// or text objects left unbalanced by a truncated parse
fn check_operations(operations: &[Operation], data: &[u8]) -> Result<(), String> {
    if operations.is_empty() && data.iter().any(|b| !b.is_ascii_whitespace()) {
        return Err(format!(
            "content stream of {} bytes has no readable operators",
            data.len()
        ));
    }

    let mut in_text = false;
    for op in operations {
        match op.operator.as_str() {
            "BT" if in_text => return Err("nested BT operator".to_string()),
            "BT" => in_text = true,
            "ET" if !in_text => return Err("ET operator outside a text object".to_string()),
            "ET" => in_text = false,
            _ => {}
        }
    }
    if in_text {
        return Err("content stream ends inside a text object".to_string());
    }

    Ok(())
}

/// Concatenated content streams of a page. A `Contents` entry that names a
/// missing object is an error; a page without `Contents` is blank.
fn page_content(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<u8>> {
    let page = doc.get_dictionary(page_id)?;
    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    let stream_ids = match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => reference_list(items)?,
            _ => vec![*id],
        },
        Object::Array(items) => reference_list(items)?,
        _ => return Err(lopdf::Error::Type),
    };

    let mut data = Vec::new();
    for id in stream_ids {
        let stream = doc.get_object(id)?.as_stream()?;
        let has_filters = stream.filters().map(|f| !f.is_empty()).unwrap_or(false);
        if has_filters {
            data.extend(stream.decompressed_content()?);
        } else {
            data.extend_from_slice(&stream.content);
        }
        data.push(b'\n');
    }

    Ok(data)
}

fn reference_list(items: &[Object]) -> lopdf::Result<Vec<ObjectId>> {
    items.iter().map(Object::as_reference).collect()
}

/// Extract text from a PDF text-showing operator: Tj, ', ", TJ
fn fragment_from_operation(op: &Operation, decoder: &TextDecoder) -> Option<String> {
    match op.operator.as_str() {
        "Tj" | "'" => op.operands.first().and_then(|o| string_operand(o, decoder)),
        // aw ac string "
        "\"" => op.operands.get(2).and_then(|o| string_operand(o, decoder)),
        "TJ" => match op.operands.first() {
            Some(Object::Array(items)) => Some(join_tj_array(items, decoder)),
            _ => None,
        },
        _ => None,
    }
}

/// Join the strings of a TJ array, turning large negative kerns into spaces
fn join_tj_array(items: &[Object], decoder: &TextDecoder) -> String {
    let mut result = String::new();

    for item in items {
        if let Some(text) = string_operand(item, decoder) {
            result.push_str(&text);
        } else if let Ok(displacement) = item.as_float() {
            if displacement < -TJ_SPACE_THRESHOLD && !result.is_empty() && !result.ends_with(' ') {
                result.push(' ');
            }
        }
    }

    result
}

fn string_operand(object: &Object, decoder: &TextDecoder) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decoder.decode(bytes)),
        _ => None,
    }
}

/// How the string operands shown with a font map to text
#[derive(Debug)]
enum TextDecoder {
    /// Single-byte font with a named base encoding
    Simple(String),
    /// Two-byte CIDs looked up in the font's ToUnicode CMap
    Cid(ToUnicodeMap),
}

impl TextDecoder {
    fn for_font(doc: &Document, name: &[u8], font: &Dictionary) -> Self {
        let encoding = base_encoding(doc, font);
        if !encoding.starts_with("Identity") {
            return Self::Simple(encoding.to_string());
        }

        let cmap = font
            .get(b"ToUnicode")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_object(id))
            .and_then(Object::as_stream)
            .map(|stream| {
                stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone())
            });

        match cmap {
            Ok(data) => Self::Cid(ToUnicodeMap::parse(&data)),
            Err(e) => {
                warn!(
                    font = %String::from_utf8_lossy(name),
                    encoding,
                    error = %e,
                    "Composite font has no usable ToUnicode map, its text is skipped"
                );
                Self::Cid(ToUnicodeMap::default())
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Simple(encoding) => Document::decode_text(Some(encoding), bytes),
            Self::Cid(map) => map.decode(bytes),
        }
    }
}

/// Base encoding of a font: the `Encoding` name, or the `BaseEncoding` of an
/// encoding dictionary
fn base_encoding<'a>(doc: &'a Document, font: &'a Dictionary) -> &'a str {
    let encoding = match font.get(b"Encoding") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        other => other.ok(),
    };

    match encoding {
        Some(name @ Object::Name(_)) => name.as_name_str().unwrap_or(DEFAULT_ENCODING),
        Some(Object::Dictionary(dict)) => dict
            .get(b"BaseEncoding")
            .and_then(Object::as_name_str)
            .unwrap_or(DEFAULT_ENCODING),
        _ => DEFAULT_ENCODING,
    }
}

/// CID to text mapping read from the bfchar and bfrange sections of a
/// ToUnicode CMap
#[derive(Debug, Default)]
struct ToUnicodeMap {
    entries: HashMap<u32, String>,
}

#[derive(Debug, PartialEq)]
enum CmapToken {
    Hex(Vec<u8>),
    ArrayOpen,
    ArrayClose,
    Word(String),
}

impl ToUnicodeMap {
    fn parse(data: &[u8]) -> Self {
        let tokens = cmap_tokens(data);
        let mut entries = HashMap::new();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                CmapToken::Word(word) if word == "beginbfchar" => {
                    i += 1;
                    while let [CmapToken::Hex(src), CmapToken::Hex(dst), ..] = &tokens[i..] {
                        entries.insert(code_of(src), String::from_utf16_lossy(&utf16_units(dst)));
                        i += 2;
                    }
                }
                CmapToken::Word(word) if word == "beginbfrange" => {
                    i += 1;
                    loop {
                        match &tokens[i..] {
                            [CmapToken::Hex(lo), CmapToken::Hex(hi), CmapToken::Hex(dst), ..] => {
                                let (lo, hi) = (code_of(lo), code_of(hi));
                                let base = utf16_units(dst);
                                for code in lo..=hi.min(lo.saturating_add(MAX_CMAP_RANGE)) {
                                    let mut units = base.clone();
                                    if let Some(last) = units.last_mut() {
                                        *last = last.wrapping_add((code - lo) as u16);
                                    }
                                    entries.insert(code, String::from_utf16_lossy(&units));
                                }
                                i += 3;
                            }
                            [CmapToken::Hex(lo), CmapToken::Hex(_), CmapToken::ArrayOpen, rest @ ..] => {
                                let lo = code_of(lo);
                                let targets: Vec<&Vec<u8>> = rest
                                    .iter()
                                    .map_while(|token| match token {
                                        CmapToken::Hex(dst) => Some(dst),
                                        _ => None,
                                    })
                                    .collect();
                                for (offset, dst) in targets.iter().enumerate() {
                                    entries.insert(
                                        lo + offset as u32,
                                        String::from_utf16_lossy(&utf16_units(dst)),
                                    );
                                }
                                // lo, hi, [, targets, ]
                                i += 4 + targets.len();
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        Self { entries }
    }

    /// Unmapped codes are dropped
    fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(2)
            .filter_map(|code| self.entries.get(&code_of(code)))
            .map(String::as_str)
            .collect()
    }
}

fn cmap_tokens(data: &[u8]) -> Vec<CmapToken> {
    const DELIMITERS: &[u8] = b"<>[]{}()/%";
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) != Some(&b'<') => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                tokens.push(CmapToken::Hex(hex_bytes(&data[i + 1..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CmapToken::ArrayOpen);
                i += 1;
            }
            b']' => {
                tokens.push(CmapToken::ArrayClose);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() || DELIMITERS.contains(&b) => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !DELIMITERS.contains(&data[i])
                {
                    i += 1;
                }
                tokens.push(CmapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

/// Hex digits to bytes; an odd trailing digit is padded with zero
fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16))
        .map(|d| d as u8)
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        build_pdf, build_pdf_with, helvetica, identity_font, text_block, PageContent,
    };
    use lopdf::{dictionary, StringFormat};

    fn show_bytes(bytes: &[u8]) -> Operation {
        Operation::new(
            "Tj",
            vec![Object::String(bytes.to_vec(), StringFormat::Hexadecimal)],
        )
    }

    #[test]
    fn test_pages_and_fragments() {
        let pdf = build_pdf(vec![
            text_block(vec![
                Operation::new("Tj", vec![Object::string_literal("Transmission lines")]),
                Operation::new("Tj", vec![Object::string_literal("up to 800kV")]),
            ]),
            text_block(vec![Operation::new(
                "'",
                vec![Object::string_literal("Substations")],
            )]),
        ]);

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "Transmission lines up to 800kV\nSubstations");
    }

    #[test]
    fn test_tj_array_kerning() {
        let pdf = build_pdf(vec![text_block(vec![Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("400"),
                Object::Integer(-40),
                Object::string_literal("kV"),
                Object::Integer(-500),
                Object::string_literal("lines"),
            ])],
        )])]);

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "400kV lines");
    }

    #[test]
    fn test_empty_page_keeps_separator() {
        let pdf = build_pdf(vec![
            text_block(vec![Operation::new("Tj", vec![Object::string_literal("first")])]),
            text_block(vec![]),
            text_block(vec![Operation::new("Tj", vec![Object::string_literal("third")])]),
        ]);

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "first\n\nthird");
    }

    #[test]
    fn test_invalid_payload() {
        let err = extract_document_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, IngestionError::DocumentParse { .. }));
    }

    #[test]
    fn test_win_ansi_font() {
        let pdf = build_pdf_with(
            vec![PageContent::Operations(text_block(vec![show_bytes(
                b"\x93EPC\x94 \x805M",
            )]))],
            |_| helvetica(Some("WinAnsiEncoding")),
        );

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "\u{201C}EPC\u{201D} \u{20AC}5M");
    }

    #[test]
    fn test_encoding_dictionary_base_encoding() {
        let pdf = build_pdf_with(
            vec![PageContent::Operations(text_block(vec![show_bytes(
                b"\x80120 crore",
            )]))],
            |_| {
                let mut font = helvetica(None);
                font.set(
                    "Encoding",
                    dictionary! {
                        "Type" => "Encoding",
                        "BaseEncoding" => "WinAnsiEncoding",
                    },
                );
                font
            },
        );

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "\u{20AC}120 crore");
    }

    #[test]
    fn test_identity_font_uses_to_unicode() {
        let cmap = "/CIDInit /ProcSet findresource begin\n\
                    12 dict begin\n\
                    begincmap\n\
                    1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
                    2 beginbfchar\n<0003> <0020>\n<0011> <20AC>\nendbfchar\n\
                    2 beginbfrange\n<0024> <0026> <0041>\n<0030> <0031> [<006B> <0056>]\nendbfrange\n\
                    endcmap\n";
        let pdf = build_pdf_with(
            vec![PageContent::Operations(text_block(vec![show_bytes(&[
                0x00, 0x24, 0x00, 0x25, 0x00, 0x26, 0x00, 0x03, 0x00, 0x11, 0x00, 0x30, 0x00,
                0x31,
            ])]))],
            |doc| identity_font(doc, cmap),
        );

        let text = extract_document_text(&pdf).unwrap();
        assert_eq!(text, "ABC \u{20AC}kV");
    }

    #[test]
    fn test_missing_contents_reference_fails() {
        let pdf = build_pdf_with(
            vec![
                PageContent::Operations(text_block(vec![Operation::new(
                    "Tj",
                    vec![Object::string_literal("first")],
                )])),
                PageContent::Dangling((999, 0)),
            ],
            |_| helvetica(None),
        );

        let err = extract_document_text(&pdf).unwrap_err();
        match err {
            IngestionError::DocumentParse { message } => assert!(message.contains("page 2")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_content_stream_fails() {
        for garbage in [&b"BT (unterminated Tj ET [[[ <<"[..], &b"[[[ <<"[..]] {
            let pdf = build_pdf_with(
                vec![
                    PageContent::Operations(text_block(vec![Operation::new(
                        "Tj",
                        vec![Object::string_literal("first")],
                    )])),
                    PageContent::Raw(garbage.to_vec()),
                ],
                |_| helvetica(None),
            );

            let err = extract_document_text(&pdf).unwrap_err();
            assert!(matches!(err, IngestionError::DocumentParse { .. }));
        }
    }

    #[test]
    fn test_to_unicode_map_drops_unmapped_codes() {
        let map = ToUnicodeMap::parse(b"1 beginbfchar <0041> <0061> endbfchar");
        assert_eq!(map.decode(&[0x00, 0x41, 0x00, 0x42, 0x00, 0x41]), "aa");
    }
}
