//! Photo extraction from PDF brochures.
//!
//! Pages are scanned by interpreting their content streams. The current
//! transformation matrix gives every image placement its box on the page, and
//! text-showing operators give caption candidates. Placements too small to be
//! photos are dropped; the rest are re-encoded as PNG and uploaded.
//!
//! Coordinates reported here are in points with a top-left origin, so `top`
//! grows downwards like on a rendered page.

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, ImageOutputFormat, RgbImage};
use log::{debug, error, info, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Read};
use thiserror::Error;

use crate::models::ExtractedImage;
use crate::services::storage::{upload_image, ObjectStore};

pub const DEFAULT_CAPTION_OFFSET: f64 = 30.0;
pub const PNG_MIME: &str = "image/png";

// Anything smaller is a logo or an icon.
const MIN_WIDTH: f64 = 150.0;
const MIN_HEIGHT: f64 = 100.0;
const MIN_AREA: f64 = 15_000.0;

const MAX_FORM_DEPTH: usize = 8;
const MAX_TREE_DEPTH: usize = 32;
const LINE_TOLERANCE: f64 = 1.0;
/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.5;
/// TJ adjustments (thousandths of an em) beyond this read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = 250.0;
const US_LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
/// Largest raw image accepted, in pixels.
const MAX_IMAGE_PIXELS: u64 = 100_000_000;
/// Inflated streams are cut off past this size.
const MAX_INFLATED_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("could not parse PDF: {0}")]
    Parse(String),
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// A photo found on a page, ready for upload.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position among all placements on the page, sorted by `(top, x0)`.
    pub index: usize,
    pub caption: String,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ScannedPdf {
    pub total_pages: u32,
    pub images: Vec<PageImage>,
}

/// Extraction outcome for one PDF.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub pdf_filename: String,
    pub total_pages: u32,
    pub images: Vec<ExtractedImage>,
}

/// Scan a PDF, upload every photo under `folder` and describe the uploads.
///
/// Parsing runs on the blocking pool. Images that fail to upload are skipped.
pub async fn extract_images(
    store: &dyn ObjectStore,
    pdf_bytes: Vec<u8>,
    pdf_filename: &str,
    folder: &str,
    caption_offset: f64,
) -> Result<ExtractionResult, PdfError> {
    let scanned = tokio::task::spawn_blocking(move || scan(&pdf_bytes, caption_offset))
        .await
        .map_err(|e| PdfError::Task(e.to_string()))?
        .map_err(|e| {
            error!("Error processing PDF {} from bytes: {}", pdf_filename, e);
            e
        })?;

    let mut images = Vec::with_capacity(scanned.images.len());
    for image in scanned.images {
        let name = format!("page{}_img{}", image.page, image.index);
        match upload_image(store, image.png, folder, &name, PNG_MIME).await {
            Ok(stored) => images.push(ExtractedImage {
                filename: format!("{}.png", name),
                page: image.page,
                caption: image.caption,
                url: stored.url,
                mime_type: PNG_MIME.to_string(),
            }),
            Err(e) => warn!("S3 upload failed for {}: {}", name, e),
        }
    }

    info!("Extracted {} images from {}", images.len(), pdf_filename);
    Ok(ExtractionResult {
        pdf_filename: pdf_filename.to_string(),
        total_pages: scanned.total_pages,
        images,
    })
}

/// Find the photos in a PDF and encode them as PNG.
pub fn scan(pdf_bytes: &[u8], caption_offset: f64) -> Result<ScannedPdf, PdfError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    let pages = doc.get_pages();

    let mut scanned = ScannedPdf {
        total_pages: pages.len() as u32,
        images: Vec::new(),
    };

    for (page_number, page_id) in pages {
        let layout = PageLayout::scan(&doc, page_id);

        for (position, placement) in layout.placements.iter().enumerate() {
            let (width, height) = (placement.width(), placement.height());
            if width < MIN_WIDTH || height < MIN_HEIGHT || width * height < MIN_AREA {
                debug!(
                    "Skipping small image on page {}: {:.0}x{:.0} (area: {:.0})",
                    page_number,
                    width,
                    height,
                    width * height
                );
                continue;
            }

            info!(
                "Processing image on page {}: {:.0}x{:.0} (area: {:.0})",
                page_number,
                width,
                height,
                width * height
            );

            let png = match encode_png(&doc, placement.object_id) {
                Ok(png) => png,
                Err(reason) => {
                    warn!("Could not extract image on page {}: {}", page_number, reason);
                    continue;
                }
            };

            scanned.images.push(PageImage {
                page: page_number,
                index: position + 1,
                caption: layout.caption_below(placement, caption_offset),
                png,
            });
        }
    }

    Ok(scanned)
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() != 6 {
            return None;
        }
        let mut m = [0.0; 6];
        for (slot, operand) in m.iter_mut().zip(operands) {
            *slot = number(operand)?;
        }
        Some(Matrix(m))
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

#[derive(Debug, Default)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f64,
    font_size: f64,
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

#[derive(Debug, Clone, Copy)]
struct PageBox {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone)]
struct Placement {
    object_id: ObjectId,
    x0: f64,
    top: f64,
    x1: f64,
    bottom: f64,
}

impl Placement {
    fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone)]
struct TextFragment {
    x: f64,
    top: f64,
    text: String,
}

/// Image placements and text fragments of one page.
struct PageLayout<'a> {
    doc: &'a Document,
    page_box: PageBox,
    placements: Vec<Placement>,
    fragments: Vec<TextFragment>,
}

impl<'a> PageLayout<'a> {
    fn scan(doc: &'a Document, page_id: ObjectId) -> Self {
        let mut layout = PageLayout {
            doc,
            page_box: page_box(doc, page_id),
            placements: Vec::new(),
            fragments: Vec::new(),
        };

        match doc.get_page_content(page_id) {
            Ok(content) => {
                let resources = inherited(doc, page_id, b"Resources").and_then(|r| r.as_dict().ok());
                layout.run(&content, resources, Matrix::IDENTITY, 0);
            }
            Err(e) => warn!("Could not read page content: {}", e),
        }

        layout
            .placements
            .sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));
        layout
    }

    fn run(&mut self, content: &[u8], resources: Option<&'a Dictionary>, base: Matrix, depth: usize) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not decode content stream: {}", e);
                return;
            }
        };

        let mut ctm = base;
        let mut saved: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(base),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        ctm = m.then(ctm);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, ctm, depth);
                    }
                }
                "BT" => {
                    text.matrix = Matrix::IDENTITY;
                    text.line_matrix = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(size) = operands.get(1).and_then(number) {
                        text.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        text.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "T*" => text.next_line(),
                "Tj" => {
                    if let Some(shown) = operands.first().and_then(string_text) {
                        self.show_text(shown, &mut text, ctm);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_text(array_text(items), &mut text, ctm);
                    }
                }
                "'" => {
                    text.next_line();
                    if let Some(shown) = operands.first().and_then(string_text) {
                        self.show_text(shown, &mut text, ctm);
                    }
                }
                "\"" => {
                    text.next_line();
                    if let Some(shown) = operands.get(2).and_then(string_text) {
                        self.show_text(shown, &mut text, ctm);
                    }
                }
                _ => {}
            }
        }
    }

    fn draw_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        ctm: Matrix,
        depth: usize,
    ) {
        let Some((object_id, stream)) = self.xobject(resources, name) else {
            debug!("Unknown XObject /{}", String::from_utf8_lossy(name));
            return;
        };

        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Image" => {
                let page = self.page_box;
                let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(x, y)| ctm.apply(x, y));
                let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
                let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
                let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
                let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

                self.placements.push(Placement {
                    object_id,
                    x0: min_x - page.left,
                    top: page.top - max_y,
                    x1: max_x - page.left,
                    bottom: page.top - min_y,
                });
            }
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Form" => {
                if depth >= MAX_FORM_DEPTH {
                    warn!("Form XObjects nested too deeply, ignoring the rest");
                    return;
                }
                let Some(content) = stream_bytes(stream) else {
                    warn!("Unsupported filter on form XObject");
                    return;
                };
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| resolve(self.doc, m))
                    .and_then(|m| m.as_array().ok())
                    .and_then(|m| Matrix::from_operands(m))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve(self.doc, r))
                    .and_then(|r| r.as_dict().ok())
                    .or(resources);

                self.run(&content, form_resources, form_matrix.then(ctm), depth + 1);
            }
            _ => {}
        }
    }

    fn xobject(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<(ObjectId, &'a Stream)> {
        let doc: &'a Document = self.doc;
        let xobjects = resolve(doc, resources?.get(b"XObject").ok()?)?.as_dict().ok()?;
        let object_id = xobjects.get(name).ok()?.as_reference().ok()?;
        let stream = doc.get_object(object_id).ok()?.as_stream().ok()?;
        Some((object_id, stream))
    }

    fn show_text(&mut self, shown: String, state: &mut TextState, ctm: Matrix) {
        let (x, y) = state.matrix.then(ctm).apply(0.0, 0.0);
        let advance = shown.chars().count() as f64 * state.font_size * GLYPH_WIDTH;
        state.matrix = Matrix::translate(advance, 0.0).then(state.matrix);

        self.fragments.push(TextFragment {
            x: x - self.page_box.left,
            top: self.page_box.top - y,
            text: shown,
        });
    }

    /// Text in the band of `offset` points directly below a placement.
    fn caption_below(&self, placement: &Placement, offset: f64) -> String {
        let left = placement.x0.max(0.0);
        let right = placement.x1.min(self.page_box.width);
        let upper = placement.bottom;
        let lower = (placement.bottom + offset).min(self.page_box.height);

        let mut hits: Vec<&TextFragment> = self
            .fragments
            .iter()
            .filter(|f| f.x >= left && f.x <= right && f.top >= upper && f.top <= lower)
            .collect();
        hits.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x.total_cmp(&b.x)));

        let mut lines: Vec<Vec<&str>> = Vec::new();
        let mut line_top = f64::NEG_INFINITY;
        for fragment in hits {
            if (fragment.top - line_top).abs() >= LINE_TOLERANCE || lines.is_empty() {
                lines.push(Vec::new());
                line_top = fragment.top;
            }
            if let Some(line) = lines.last_mut() {
                line.extend(fragment.text.split_whitespace());
            }
        }

        lines
            .iter()
            .map(|words| words.join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, following `/Parent` for inheritable keys.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|b| b.as_array().ok())
        .and_then(|values| {
            let numbers: Vec<f64> = values.iter().filter_map(number).collect();
            <[f64; 4]>::try_from(numbers).ok()
        })
        .unwrap_or(US_LETTER);

    let [x0, y0, x1, y1] = media_box;
    PageBox {
        left: x0.min(x1),
        top: y0.max(y1),
        width: (x1 - x0).abs(),
        height: (y1 - y0).abs(),
    }
}

/// PDF text string: UTF-16BE with a byte order mark, else one byte per char.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn string_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn array_text(items: &[Object]) -> String {
    let mut shown = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => shown.push_str(&decode_pdf_string(bytes)),
            other => {
                if number(other).is_some_and(|n| n < -TJ_SPACE_THRESHOLD) {
                    shown.push(' ');
                }
            }
        }
    }
    shown
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(names)) => names
            .iter()
            .filter_map(|n| match n {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Zlib-inflate a stream's raw content, giving up past `limit` bytes.
fn inflate(stream: &Stream, limit: usize) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(stream.content.as_slice())
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .ok()?;
    if out.len() > limit {
        warn!("Inflated stream exceeds {} bytes, skipping", limit);
        return None;
    }
    Some(out)
}

/// Stream content when it is unfiltered or only deflated.
fn stream_bytes(stream: &Stream) -> Option<Vec<u8>> {
    let filters = filter_names(&stream.dict);
    match filters.as_slice() {
        [] => Some(stream.content.clone()),
        [flate] if flate == "FlateDecode" => inflate(stream, MAX_INFLATED_SIZE),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn parse(doc: &Document, object: &Object) -> Option<ColorSpace> {
        match resolve(doc, object)? {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
                b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
                _ => None,
            },
            Object::Array(items) => {
                let Some(Object::Name(family)) = items.first() else {
                    return None;
                };
                match family.as_slice() {
                    b"CalGray" => Some(ColorSpace::Gray),
                    b"CalRGB" => Some(ColorSpace::Rgb),
                    b"ICCBased" => {
                        let profile = resolve(doc, items.get(1)?)?.as_stream().ok()?;
                        match profile.dict.get(b"N").ok().and_then(number)? as i64 {
                            1 => Some(ColorSpace::Gray),
                            3 => Some(ColorSpace::Rgb),
                            4 => Some(ColorSpace::Cmyk),
                            _ => None,
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = ColorSpace::parse(doc, items.get(1)?)?;
                        if matches!(base, ColorSpace::Indexed { .. }) {
                            return None;
                        }
                        let palette = match resolve(doc, items.get(3)?)? {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(stream) => stream_bytes(stream)?,
                            _ => return None,
                        };
                        Some(ColorSpace::Indexed {
                            base: Box::new(base),
                            palette,
                        })
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Convert one sample of a non-indexed space to RGB.
    fn rgb(&self, sample: &[u8]) -> [u8; 3] {
        match (self, sample) {
            (ColorSpace::Gray, [g, ..]) => [*g, *g, *g],
            (ColorSpace::Rgb, [r, g, b, ..]) => [*r, *g, *b],
            (ColorSpace::Cmyk, [c, m, y, k, ..]) => {
                let channel = |v: u8| ((255 - v as u16) * (255 - *k as u16) / 255) as u8;
                [channel(*c), channel(*m), channel(*y)]
            }
            _ => [0, 0, 0],
        }
    }
}

fn encode_png(doc: &Document, object_id: ObjectId) -> Result<Vec<u8>, String> {
    let stream = doc
        .get_object(object_id)
        .and_then(|o| o.as_stream())
        .map_err(|e| e.to_string())?;
    let image = decode_image(doc, stream)?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(png)
}

fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, String> {
    let dict = &stream.dict;
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err("stencil mask".to_string());
    }

    let filters = filter_names(dict);
    let (data, remaining) = match filters.split_first() {
        Some((first, rest)) if first == "FlateDecode" => (
            inflate(stream, MAX_INFLATED_SIZE)
                .ok_or_else(|| "could not inflate image data".to_string())?,
            rest,
        ),
        _ => (stream.content.clone(), filters.as_slice()),
    };

    match remaining {
        [] => decode_samples(doc, dict, data),
        [dct] if dct == "DCTDecode" => image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
            .map_err(|e| e.to_string()),
        other => Err(format!("unsupported filter {:?}", other)),
    }
}

fn decode_samples(doc: &Document, dict: &Dictionary, data: Vec<u8>) -> Result<DynamicImage, String> {
    let dimension = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(number)
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
            .ok_or_else(|| format!("missing /{}", String::from_utf8_lossy(key)))
    };
    let (width, height) = (dimension(b"Width")?, dimension(b"Height")?);
    if u64::from(width) * u64::from(height) > MAX_IMAGE_PIXELS {
        return Err(format!("image of {}x{} pixels is too large", width, height));
    }

    let bits = dict.get(b"BitsPerComponent").ok().and_then(number).unwrap_or(8.0);
    if bits != 8.0 {
        return Err(format!("unsupported bit depth {}", bits));
    }

    let space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| ColorSpace::parse(doc, cs))
        .ok_or_else(|| "unsupported color space".to_string())?;

    let row_len = (width as usize)
        .checked_mul(space.components())
        .ok_or_else(|| "image row size overflows".to_string())?;
    let expected = row_len
        .checked_mul(height as usize)
        .ok_or_else(|| "image size overflows".to_string())?;
    let data = if uses_png_predictor(dict) {
        undo_png_predictor(&data, row_len, space.components())
            .ok_or_else(|| "invalid predictor rows".to_string())?
    } else {
        data
    };
    if data.len() < expected {
        return Err("image data is truncated".to_string());
    }
    let samples = &data[..expected];

    let image = match &space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageLuma8),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageRgb8),
        ColorSpace::Cmyk => {
            let rgb = samples.chunks_exact(4).flat_map(|s| ColorSpace::Cmyk.rgb(s)).collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed { base, palette } => {
            let step = base.components();
            let rgb = samples
                .iter()
                .flat_map(|&index| {
                    let start = index as usize * step;
                    palette
                        .get(start..start + step)
                        .map(|entry| base.rgb(entry))
                        .unwrap_or([0, 0, 0])
                })
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };

    image.ok_or_else(|| "sample buffer does not match image size".to_string())
}

fn uses_png_predictor(dict: &Dictionary) -> bool {
    let params = match dict.get(b"DecodeParms") {
        Ok(Object::Dictionary(params)) => Some(params),
        Ok(Object::Array(items)) => items.iter().find_map(|item| item.as_dict().ok()),
        _ => None,
    };
    params
        .and_then(|p| p.get(b"Predictor").ok())
        .and_then(number)
        .is_some_and(|predictor| predictor >= 10.0)
}

/// Reverse PNG row filters (`/Predictor` 10 and up).
fn undo_png_predictor(data: &[u8], row_len: usize, bytes_per_pixel: usize) -> Option<Vec<u8>> {
    let stride = row_len + 1;
    if row_len == 0 || data.len() % stride != 0 {
        return None;
    }

    let mut out = Vec::with_capacity(data.len() / stride * row_len);
    let mut previous = vec![0u8; row_len];
    for row in data.chunks_exact(stride) {
        let mut current = row[1..].to_vec();
        for i in 0..row_len {
            let left = if i >= bytes_per_pixel { current[i - bytes_per_pixel] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bytes_per_pixel { previous[i - bytes_per_pixel] } else { 0 };
            let predicted = match row[0] {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => return None,
            };
            current[i] = current[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&current);
        previous = current;
    }
    Some(out)
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let p = left as i16 + up as i16 - up_left as i16;
    let (pa, pb, pc) = (
        (p - left as i16).abs(),
        (p - up as i16).abs(),
        (p - up_left as i16).abs(),
    );
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}
