use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::ProcessError;
use crate::processor::image::{ColorKind, EmbeddedImage, ImageEncoding};
use crate::processor::{DocumentSource, PdfPage};
use crate::sanitize::redact_path;

/// Pattern for Identity-H Unimplemented errors (common with CID fonts).
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// How far `Resources` are looked up through `Parent` nodes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// How deep image lookup recurses into form XObjects.
const MAX_FORM_DEPTH: usize = 4;

/// Resolution of whole-page renders.
const RENDER_DPI: u32 = 300;

/// Reads PDFs with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfSource;

impl LopdfSource {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSource for LopdfSource {
    fn open(&self, path: &Path) -> Result<Vec<PdfPage>, ProcessError> {
        let _span = tracing::info_span!("processor.pdf", file = %redact_path(path)).entered();

        let pdf_bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&pdf_bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let pages = doc
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| {
                let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                    tracing::debug!("No text extracted from page {}: {}", number, e);
                    String::new()
                });
                PdfPage {
                    number,
                    text,
                    images: page_images(&doc, page_id),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!("Opened {} page(s)", pages.len());
        Ok(pages)
    }

    fn render_page(&self, path: &Path, page: u32) -> Result<DynamicImage, ProcessError> {
        let _span =
            tracing::info_span!("processor.render", file = %redact_path(path), page).entered();
        render_with_pdftoppm(path, page, RENDER_DPI)
    }
}

/// Rasterizes one page with poppler's `pdftoppm` into a temporary PNG.
fn render_with_pdftoppm(path: &Path, page: u32, dpi: u32) -> Result<DynamicImage, ProcessError> {
    let render_error = |reason: String| ProcessError::RenderPage { page, reason };

    let output_prefix =
        std::env::temp_dir().join(format!("pdfsort_page_{}", uuid::Uuid::new_v4()));
    let page_arg = page.to_string();

    let output = Command::new("pdftoppm")
        .args(["-png", "-singlefile", "-r", &dpi.to_string()])
        .args(["-f", &page_arg, "-l", &page_arg])
        .arg(path)
        .arg(&output_prefix)
        .output()
        .map_err(|e| {
            render_error(format!(
                "failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(render_error(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    // -singlefile writes <prefix>.png without a page suffix
    let image_path = output_prefix.with_extension("png");
    let rendered = image::open(&image_path)
        .map_err(|e| render_error(format!("failed to read rendered page: {}", e)));

    if image_path.exists() {
        if let Err(e) = std::fs::remove_file(&image_path) {
            tracing::warn!("Failed to remove {}: {}", image_path.display(), e);
        }
    }

    rendered
}

/// Returns true when the page carries no usable embedded text:
/// - Text is empty or whitespace only
/// - Text contains only font encoding error markers (Identity-H Unimplemented)
pub fn page_lacks_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }

    trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .chars()
        .all(char::is_whitespace)
}

/// Raster images of a page in resource order, including those nested in
/// form XObjects.
fn page_images(doc: &Document, page_id: ObjectId) -> Vec<EmbeddedImage> {
    let mut images = Vec::new();
    if let Some(resources) = page_resources(doc, page_id) {
        collect_images(doc, resources, 0, &mut images);
    }
    images
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key)
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if node.has(b"Resources") {
            return resolve_dict(doc, node, b"Resources");
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    depth: usize,
    images: &mut Vec<EmbeddedImage>,
) {
    let Some(xobjects) = resolve_dict(doc, resources, b"XObject") else {
        return;
    };

    for (name, entry) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, entry) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                if let Some(image) = embedded_image(doc, name, stream) {
                    images.push(image);
                }
            }
            Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                if let Some(form_resources) = resolve_dict(doc, &stream.dict, b"Resources") {
                    collect_images(doc, form_resources, depth + 1, images);
                }
            }
            _ => {}
        }
    }
}

fn embedded_image(doc: &Document, name: &[u8], stream: &Stream) -> Option<EmbeddedImage> {
    let name = String::from_utf8_lossy(name).into_owned();
    let dict = &stream.dict;

    let width = dict.get(b"Width").and_then(Object::as_i64).ok()?;
    let height = dict.get(b"Height").and_then(Object::as_i64).ok()?;
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        tracing::debug!("Skipping image {} with invalid size", name);
        return None;
    };

    let filters = filter_names(doc, dict);
    let (encoding, data) = if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() == 1 {
            (ImageEncoding::Jpeg, stream.content.clone())
        } else {
            (ImageEncoding::Unsupported(filters.join("+")), Vec::new())
        }
    } else if let Some(filter) = filters
        .iter()
        .find(|f| matches!(f.as_str(), "JBIG2Decode" | "CCITTFaxDecode" | "JPXDecode"))
    {
        (ImageEncoding::Unsupported(filter.clone()), Vec::new())
    } else {
        let data = if filters.is_empty() {
            Ok(stream.content.clone())
        } else {
            stream.decompressed_content()
        };
        match (data, color_kind(doc, dict)) {
            (Ok(data), Some(color)) => {
                let bits_per_component = dict
                    .get(b"BitsPerComponent")
                    .and_then(Object::as_i64)
                    .ok()
                    .and_then(|b| u8::try_from(b).ok())
                    .unwrap_or(if is_image_mask(dict) { 1 } else { 8 });
                (
                    ImageEncoding::Raw {
                        color,
                        bits_per_component,
                    },
                    data,
                )
            }
            (Ok(_), None) => (
                ImageEncoding::Unsupported("an unsupported colour space".to_string()),
                Vec::new(),
            ),
            (Err(e), _) => (
                ImageEncoding::Unsupported(format!("{} ({})", filters.join("+"), e)),
                Vec::new(),
            ),
        }
    };

    Some(EmbeddedImage {
        name,
        width,
        height,
        encoding,
        data,
    })
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|o| resolve(doc, o)) else {
        return Vec::new();
    };

    match filter {
        Object::Name(name) => vec![String::from_utf8_lossy(name).into_owned()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| item.as_name().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_image_mask(dict: &Dictionary) -> bool {
    matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)))
}

fn color_kind(doc: &Document, dict: &Dictionary) -> Option<ColorKind> {
    if is_image_mask(dict) {
        return Some(ColorKind::Gray);
    }

    match resolve(doc, dict.get(b"ColorSpace").ok()?)? {
        Object::Name(name) => named_color_kind(name),
        Object::Array(items) => match items.first()?.as_name().ok()? {
            b"ICCBased" => {
                let profile = resolve(doc, items.get(1)?)?.as_stream().ok()?;
                match profile.dict.get(b"N").and_then(Object::as_i64).ok()? {
                    1 => Some(ColorKind::Gray),
                    3 => Some(ColorKind::Rgb),
                    4 => Some(ColorKind::Cmyk),
                    _ => None,
                }
            }
            b"CalGray" => Some(ColorKind::Gray),
            b"CalRGB" => Some(ColorKind::Rgb),
            _ => None,
        },
        _ => None,
    }
}

fn named_color_kind(name: &[u8]) -> Option<ColorKind> {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Some(ColorKind::Gray),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorKind::Rgb),
        b"DeviceCMYK" | b"CMYK" => Some(ColorKind::Cmyk),
        _ => None,
    }
}
