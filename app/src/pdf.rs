use crate::compositor::{ComposedPage, DrawInstruction};
use crate::decode::{EncodedImage, Filter, ImageDecoder};
use crate::error::{CollageError, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use log::{debug, info};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;

/// Turns a composed page into an output document on disk.
pub trait DocumentWriter {
    fn write(&self, page: &ComposedPage, decoder: &dyn ImageDecoder, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn write(&self, page: &ComposedPage, decoder: &dyn ImageDecoder, path: &Path) -> Result<()> {
        let mut document = render(page, decoder)?;
        save(&mut document, path)
    }
}

/// Builds a one-page document drawing every instruction in order.
pub fn render(page: &ComposedPage, decoder: &dyn ImageDecoder) -> Result<Document> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut xobjects = Dictionary::new();
    let mut operations = Vec::new();

    for (index, instruction) in page.instructions.iter().enumerate() {
        let image = decoder.load(&instruction.source)?;
        let image_id = add_image(&mut document, &image);
        let name = format!("Im{}", index);

        xobjects.set(name.as_str(), image_id);
        operations.extend(draw_operations(&name, instruction));
    }

    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| CollageError::write("page content", e))?;
    let content_id = document.add_object(Stream::new(Dictionary::new(), encoded));

    let page_id = document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            real(page.size.width),
            real(page.size.height),
        ],
        "Resources" => dictionary! {
            "XObject" => xobjects,
        },
        "Contents" => content_id,
    });

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    Ok(document)
}

/// Writes `document` to `path` through a temporary file, so a failure never
/// leaves a truncated PDF behind.
pub fn save(document: &mut Document, path: &Path) -> Result<()> {
    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| CollageError::write(path, e))?;

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            f.write_all(&bytes)?;
            f.flush()
        })
        .map_err(|e| CollageError::write(path, e.to_string()))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn draw_operations(name: &str, instruction: &DrawInstruction) -> Vec<Operation> {
    let transform = instruction.transform.operands().map(real).to_vec();
    let scale = vec![
        real(instruction.width),
        0.into(),
        0.into(),
        real(instruction.height),
        0.into(),
        0.into(),
    ];

    vec![
        Operation::new("q", vec![]),
        Operation::new("cm", transform),
        Operation::new("cm", scale),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn add_image(document: &mut Document, image: &EncodedImage) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => image.color_space.name(),
        "BitsPerComponent" => 8,
        "Filter" => image.filter.name(),
    };

    if let Some(alpha) = &image.soft_mask {
        let mask_id = document.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => Filter::Flate.name(),
                },
                alpha.clone(),
            )
            .with_compression(false),
        );
        dict.set("SMask", mask_id);
    }

    debug!(
        "Embedding {}x{} {} image",
        image.width,
        image.height,
        image.filter.name()
    );
    document.add_object(Stream::new(dict, image.data.clone()).with_compression(false))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
