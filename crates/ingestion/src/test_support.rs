//! PDF fixtures for tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// What a fixture page points its `Contents` entry at
pub enum PageContent {
    Operations(Vec<Operation>),
    /// Stream bytes written verbatim
    Raw(Vec<u8>),
    /// Reference to an object that is never written
    Dangling(ObjectId),
}

/// Build a PDF with one content stream per page, font F1 being plain Helvetica
pub fn build_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
    build_pdf_with(
        pages.into_iter().map(PageContent::Operations).collect(),
        |_| helvetica(None),
    )
}

/// Build a PDF whose font F1 is produced by `font`, which may add
/// supporting objects such as a ToUnicode stream
pub fn build_pdf_with(
    pages: Vec<PageContent>,
    font: impl FnOnce(&mut Document) -> Dictionary,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font = font(&mut doc);
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let contents = match page {
            PageContent::Operations(operations) => {
                let content = Content { operations };
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()))
            }
            PageContent::Raw(bytes) => doc.add_object(Stream::new(dictionary! {}, bytes)),
            PageContent::Dangling(id) => id,
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Type1 Helvetica, optionally with a named base encoding
pub fn helvetica(encoding: Option<&str>) -> Dictionary {
    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    };
    if let Some(encoding) = encoding {
        font.set("Encoding", Object::Name(encoding.as_bytes().to_vec()));
    }
    font
}

/// Type0 font with Identity-H encoding and the given ToUnicode CMap
pub fn identity_font(doc: &mut Document, cmap: &str) -> Dictionary {
    let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap.as_bytes().to_vec()));
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSans",
        "Encoding" => "Identity-H",
        "ToUnicode" => cmap_id,
    }
}

/// Wrap text operators in a BT/ET block with a font selected
pub fn text_block(fragments: Vec<Operation>) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
    ];
    ops.extend(fragments);
    ops.push(Operation::new("ET", vec![]));
    ops
}
