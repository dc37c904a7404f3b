//! Single-page PDF export: a text label and the image at a fixed place.

use std::io::Write;

use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::codec;
use crate::error::Result;

/// Name every export is saved under.
pub const PDF_FILE_NAME: &str = "converted_image.pdf";

const PT_PER_MM: f32 = 72.0 / 25.4;
const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const LABEL_FONT_SIZE: i64 = 16;

/// Placement of the label and image on the page, in millimetres from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub label_x: f32,
    pub label_y: f32,
    pub image_x: f32,
    pub image_y: f32,
    pub image_width: f32,
    pub image_height: f32,
    /// JPEG quality of the embedded image.
    pub jpeg_quality: u8,
}

impl Default for PageLayout {
    /// Label at (10, 10); image at (10, 20) stretched to 180 x 160 whatever
    /// its aspect ratio.
    fn default() -> Self {
        Self {
            label_x: 10.0,
            label_y: 10.0,
            image_x: 10.0,
            image_y: 20.0,
            image_width: 180.0,
            image_height: 160.0,
            jpeg_quality: codec::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Builds the document for `image` labelled with `label` and returns its
/// serialized bytes.
pub fn export_pdf(image: &[u8], label: &str, layout: &PageLayout) -> Result<Vec<u8>> {
    let surface = codec::decode_surface(image)?;
    let (width, height) = surface.dimensions();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let image_id = add_image_xobject(&mut doc, &surface, width, height, layout.jpeg_quality)?;

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: page_operations(label, layout),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (A4_WIDTH_MM * PT_PER_MM).into(),
            (A4_HEIGHT_MM * PT_PER_MM).into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    log::info!(
        "exported {}x{} image to a {} byte PDF",
        width,
        height,
        buffer.len()
    );
    Ok(buffer)
}

fn page_operations(label: &str, layout: &PageLayout) -> Vec<Operation> {
    // PDF space grows upward from the bottom-left corner.
    let label_x = layout.label_x * PT_PER_MM;
    let label_y = (A4_HEIGHT_MM - layout.label_y) * PT_PER_MM;
    let image_x = layout.image_x * PT_PER_MM;
    let image_y = (A4_HEIGHT_MM - layout.image_y - layout.image_height) * PT_PER_MM;

    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), LABEL_FONT_SIZE.into()]),
        Operation::new("Td", vec![label_x.into(), label_y.into()]),
        Operation::new("Tj", vec![Object::string_literal(label)]),
        Operation::new("ET", vec![]),
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                (layout.image_width * PT_PER_MM).into(),
                0.into(),
                0.into(),
                (layout.image_height * PT_PER_MM).into(),
                image_x.into(),
                image_y.into(),
            ],
        ),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
    ]
}

/// Opaque images go in as a single DCT stream. Transparent ones are split
/// into RGB (JPEG) plus an alpha soft mask (Flate).
fn add_image_xobject(
    doc: &mut Document,
    surface: &image::DynamicImage,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<ObjectId> {
    let jpeg = codec::encode_jpeg(surface, quality)?;
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };

    let rgba = surface.to_rgba8();
    if rgba.pixels().any(|p| p[3] != u8::MAX) {
        let alpha: Vec<u8> = rgba.pixels().map(|p| p[3]).collect();
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
        encoder.write_all(&alpha)?;
        let compressed_mask = encoder.finish()?;

        let smask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed_mask,
        ));
        dict.set("SMask", smask_id);
    }

    Ok(doc.add_object(Stream::new(dict, jpeg)))
}
