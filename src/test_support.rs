// src/test_support.rs
//
// Workbook and PDF fixtures shared by the unit tests.

use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};
use rust_xlsxwriter::Workbook;

pub enum Cell {
    S(&'static str),
    N(f64),
}

/// Build an xlsx with one sheet: a header row followed by `rows`.
/// Empty string cells are left unwritten.
pub fn workbook(headers: &[&str], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut book = Workbook::new();
    let sheet = book.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, cells) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::S("") => {}
                Cell::S(s) => {
                    sheet.write_string(r, col as u16, *s).unwrap();
                }
                Cell::N(n) => {
                    sheet.write_number(r, col as u16, *n).unwrap();
                }
            }
        }
    }
    book.save_to_buffer().unwrap()
}

/// A PDF whose page `i` (1-based) draws the text `Page i`.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(count);
    for i in 1..=count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", i))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

/// Text labels (`Page i`) drawn on every page of `bytes`, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content).to_string();
            let start = text.find("(Page ").unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}
