//! Raster images as PDF pages.
//!
//! JPEG and PNG go straight into the document. Everything else, and any image
//! that has to be turned, is rasterized, rotated and re-encoded as PNG first.

use crate::error::ImageError;
use crate::pdf::document::OutputDocument;
use crate::rotation::Rotation;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::codecs::png::PngDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::{dictionary, Dictionary, Document, ObjectId, Stream};
use std::io::{Cursor, Write};

const IMAGE_NAME: &str = "Im0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    Gray,
    Rgb,
}

impl JpegColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            JpegColorSpace::Gray => "DeviceGray",
            JpegColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// Encoded pixels ready to become an image XObject.
#[derive(Debug, Clone)]
pub enum PixelSource {
    /// JPEG bytes, embedded untouched as a DCT stream
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// PNG bytes, unpacked losslessly into a Flate stream
    Png(Vec<u8>),
}

/// An image sized to become exactly one page.
#[derive(Debug, Clone)]
pub struct PageDescriptor {
    pub width: u32,
    pub height: u32,
    pub pixel_source: PixelSource,
}

/// Prepare an encoded image to fill one page, turned clockwise by `rotation`.
pub fn to_embeddable_page(bytes: &[u8], rotation: Rotation) -> Result<PageDescriptor, ImageError> {
    let format = image::guess_format(bytes).map_err(ImageError::from_decode)?;

    if rotation == Rotation::None {
        if let Some(descriptor) = pass_through(bytes, format)? {
            tracing::debug!(?format, "embedding image without re-encoding");
            return Ok(descriptor);
        }
    }

    tracing::debug!(?format, %rotation, "re-encoding image as PNG");
    reencode(bytes, format, rotation)
}

fn pass_through(bytes: &[u8], format: ImageFormat) -> Result<Option<PageDescriptor>, ImageError> {
    match format {
        ImageFormat::Jpeg => {
            let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(ImageError::from_decode)?;
            let (width, height) = decoder.dimensions();
            let color_space = match decoder.original_color_type() {
                ExtendedColorType::L8 => JpegColorSpace::Gray,
                ExtendedColorType::Rgb8 => JpegColorSpace::Rgb,
                // CMYK and friends need their pixels converted
                _ => return Ok(None),
            };
            Ok(Some(PageDescriptor {
                width,
                height,
                pixel_source: PixelSource::Jpeg {
                    data: bytes.to_vec(),
                    color_space,
                },
            }))
        }
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(ImageError::from_decode)?;
            let (width, height) = decoder.dimensions();
            Ok(Some(PageDescriptor {
                width,
                height,
                pixel_source: PixelSource::Png(bytes.to_vec()),
            }))
        }
        _ => Ok(None),
    }
}

fn reencode(
    bytes: &[u8],
    format: ImageFormat,
    rotation: Rotation,
) -> Result<PageDescriptor, ImageError> {
    let decoded =
        image::load_from_memory_with_format(bytes, format).map_err(ImageError::from_decode)?;

    let rotated = match rotation {
        Rotation::None => decoded,
        Rotation::Right => decoded.rotate90(),
        Rotation::Down => decoded.rotate180(),
        Rotation::Left => decoded.rotate270(),
    };
    let normalized = if rotated.color().has_alpha() {
        DynamicImage::ImageRgba8(rotated.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(rotated.to_rgb8())
    };

    let mut png = Vec::new();
    normalized
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(ImageError::Encode)?;

    Ok(PageDescriptor {
        width: normalized.width(),
        height: normalized.height(),
        pixel_source: PixelSource::Png(png),
    })
}

/// Add the image as an XObject to `doc`.
pub fn embed(doc: &mut Document, descriptor: &PageDescriptor) -> Result<ObjectId, ImageError> {
    let width = descriptor.width as i64;
    let height = descriptor.height as i64;

    match &descriptor.pixel_source {
        PixelSource::Jpeg { data, color_space } => {
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => color_space.pdf_name(),
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                data.clone(),
            )
            .with_compression(false);
            Ok(doc.add_object(stream))
        }
        PixelSource::Png(data) => {
            let decoded = image::load_from_memory_with_format(data, ImageFormat::Png)
                .map_err(ImageError::from_decode)?;

            let mut image_dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };

            let rgb = if decoded.color().has_alpha() {
                let rgba = decoded.to_rgba8();
                let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
                let mut alpha = Vec::with_capacity(rgba.len() / 4);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }

                let smask = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                        "Filter" => "FlateDecode",
                    },
                    deflate(&alpha)?,
                )
                .with_compression(false);
                image_dict.set("SMask", doc.add_object(smask));
                rgb
            } else {
                decoded.to_rgb8().into_raw()
            };

            let stream = Stream::new(image_dict, deflate(&rgb)?).with_compression(false);
            Ok(doc.add_object(stream))
        }
    }
}

/// Append one page that the image fills edge to edge at 1:1 scale.
pub fn append_image_page(
    out: &mut OutputDocument,
    descriptor: &PageDescriptor,
) -> Result<ObjectId, ImageError> {
    let image_id = embed(out.doc_mut(), descriptor)?;
    let (width, height) = (descriptor.width as i64, descriptor.height as i64);

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n", width, height, IMAGE_NAME);
    let content_id = out
        .doc_mut()
        .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    Ok(out.push_page(dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
        "Contents" => content_id,
    }))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ImageError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ImageError::Encode(e.into()))?;
    encoder.finish().map_err(|e| ImageError::Encode(e.into()))
}
