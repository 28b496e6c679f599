//! Fixtures shared by unit and HTTP tests.

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::sync::Mutex;

use crate::services::generator::{
    GeneratedImage, GeneratedOutput, GenerationError, ImageGenerator, InputImage,
};

fn ops(operations: Vec<Operation>) -> Vec<u8> {
    Content { operations }.encode().unwrap()
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 30) as u8, (y * 30) as u8, 128])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(90))
        .unwrap();
    bytes
}

/// PNG bytes for a small solid image.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([200, 10, 10])))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// A three page brochure on US Letter.
///
/// - Page 1: a 300x200 photo (raw RGB, 4x3 samples) at x 100..400, top 92,
///   captioned "Modern kitchen", plus a 50x50 logo and an unrelated phone line.
/// - Page 2: a 200x150 JPEG photo drawn through a form XObject, captioned
///   "Living room".
/// - Page 3: text only.
pub fn sample_brochure_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let photo_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 4,
            "Height" => 3,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        (0..36u8).map(|v| v * 7).collect(),
    ));
    let logo_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0, 255, 255, 0],
    ));
    let jpeg_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg(8, 8),
        )
        .with_compression(false),
    );
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 200.into(), 150.into()],
            "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 50.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im3" => jpeg_id },
            },
        },
        ops(vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![200.into(), 0.into(), 0.into(), 150.into(), 0.into(), 0.into()]),
            Operation::new("Do", vec!["Im3".into()]),
            Operation::new("Q", vec![]),
        ]),
    ));

    let text = |x: i64, y: i64, shown: &str| {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(shown)]),
            Operation::new("ET", vec![]),
        ]
    };

    let mut first = vec![
        Operation::new("q", vec![]),
        Operation::new("cm", vec![300.into(), 0.into(), 0.into(), 200.into(), 100.into(), 500.into()]),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        Operation::new("cm", vec![50.into(), 0.into(), 0.into(), 50.into(), 20.into(), 20.into()]),
        Operation::new("Do", vec!["Im2".into()]),
        Operation::new("Q", vec![]),
    ];
    first.extend(text(110, 480, "Modern kitchen"));
    first.extend(text(110, 100, "Call 555-0100"));

    let mut second = vec![
        Operation::new("q", vec![]),
        Operation::new("Do", vec!["Fx".into()]),
        Operation::new("Q", vec![]),
    ];
    second.extend(text(60, 40, "Living room"));

    let third = text(72, 700, "Floor plans available on request");

    let mut kids: Vec<Object> = Vec::new();
    for (content, xobjects) in [
        (first, dictionary! { "Im1" => photo_id, "Im2" => logo_id }),
        (second, dictionary! { "Fx" => form_id }),
        (third, dictionary! {}),
    ] {
        let content_id = doc.add_object(Stream::new(dictionary! {}, ops(content)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Generator returning canned output and recording what it was sent.
#[derive(Default)]
pub struct FakeGenerator {
    pub output: GeneratedOutput,
    pub fail_with: Option<String>,
    pub calls: Mutex<Vec<(String, Vec<InputImage>)>>,
}

impl FakeGenerator {
    pub fn returning(images: Vec<GeneratedImage>, description: &str) -> Self {
        Self {
            output: GeneratedOutput {
                images,
                description: description.to_string(),
            },
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<InputImage>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn regenerate(
        &self,
        prompt: &str,
        images: Vec<InputImage>,
    ) -> Result<GeneratedOutput, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), images));
        match &self.fail_with {
            Some(message) => Err(GenerationError::Response {
                provider: "fake",
                message: message.clone(),
            }),
            None => Ok(self.output.clone()),
        }
    }
}
