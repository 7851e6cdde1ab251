//! Builders for test documents.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;

use pdfsort::processor::{EmbeddedImage, PdfPage};

/// A page with embedded text.
pub fn text_page(number: u32, text: &str) -> PdfPage {
    PdfPage {
        number,
        text: text.to_string(),
        images: vec![],
    }
}

/// A page without text, carrying scanned images.
pub fn scanned_page(number: u32, images: Vec<EmbeddedImage>) -> PdfPage {
    PdfPage {
        number,
        text: String::new(),
        images,
    }
}

/// A gray image that is `ocr_width` pixels wide once downscaled, which is
/// how the fake OCR engine picks its answer.
pub fn scan_image(name: &str, ocr_width: u32) -> EmbeddedImage {
    let width = ocr_width * 2;
    let height = 4;
    EmbeddedImage::gray(name, width, height, vec![220; (width * height) as usize])
}

/// Bytes of a real PDF with one text page per entry.
pub fn text_pdf_bytes(pages: &[&str]) -> Vec<u8> {
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

    let mut kids = Vec::new();
    for text in pages {
        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}

/// Bytes of a ZIP archive holding the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(data).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}
