use crate::error::{CollageError, Result};
use crate::placement::SourceImage;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};
use log::debug;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

/// Decodes image files for the editor and the compositor.
pub trait ImageDecoder {
    /// Checks that `path` is a decodable image and reads its dimensions.
    fn probe(&self, path: &Path) -> Result<SourceImage>;

    /// Re-reads the source at export time, ready to embed in a PDF.
    fn load(&self, source: &SourceImage) -> Result<EncodedImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
}

impl ColorSpace {
    pub fn name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// JPEG bytes embedded as they are on disk.
    Dct,
    Flate,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Dct => "DCTDecode",
            Filter::Flate => "FlateDecode",
        }
    }
}

/// Pixel data in a form a PDF image XObject can carry directly.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: Filter,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha channel, present only when some pixel is
    /// not fully opaque.
    pub soft_mask: Option<Vec<u8>>,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, ImageError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = decoded.dimensions();

        if format == ImageFormat::Jpeg {
            // The decoder hands back RGB for CMYK files, so the color space
            // has to come from the frame header of the original bytes.
            let color_space = match jpeg_components(bytes) {
                Some(1) => Some(ColorSpace::DeviceGray),
                Some(3) => Some(ColorSpace::DeviceRGB),
                _ => None,
            };
            if let Some(color_space) = color_space {
                return Ok(Self {
                    width,
                    height,
                    color_space,
                    filter: Filter::Dct,
                    data: bytes.to_vec(),
                    soft_mask: None,
                });
            }
        }

        Ok(Self::from_image(&decoded)?)
    }

    pub fn from_image(decoded: &DynamicImage) -> std::io::Result<Self> {
        let (width, height) = decoded.dimensions();
        let rgba = decoded.to_rgba8();

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            has_alpha |= a != u8::MAX;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let soft_mask = if has_alpha {
            Some(flate_compress(&alpha)?)
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            color_space: ColorSpace::DeviceRGB,
            filter: Filter::Flate,
            data: flate_compress(&rgb)?,
            soft_mask,
        })
    }
}

/// Number of color components declared by the first SOF segment.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != 0xFF {
            return None;
        }
        let marker = bytes[offset + 1];
        if marker == 0xFF {
            offset += 1;
            continue;
        }
        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return bytes.get(offset + 9).copied();
        }
        offset += 2 + length;
    }
    None
}

fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Reads images from the local filesystem with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDecoder;

impl ImageDecoder for FsDecoder {
    fn probe(&self, path: &Path) -> Result<SourceImage> {
        let bytes = fs::read(path).map_err(|e| CollageError::InvalidSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| CollageError::InvalidSource {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if reader.format().is_none() {
            return Err(CollageError::InvalidSource {
                path: path.to_path_buf(),
                reason: "unrecognized image format".to_string(),
            });
        }

        let decoded = reader.decode().map_err(|e| classify(path, e))?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(CollageError::InvalidSource {
                path: path.to_path_buf(),
                reason: "image has no pixels".to_string(),
            });
        }

        Ok(SourceImage::new(path, width, height))
    }

    fn load(&self, source: &SourceImage) -> Result<EncodedImage> {
        let path = source.path();
        let bytes = fs::read(path).map_err(|e| CollageError::source_unavailable(path, e))?;
        let encoded =
            EncodedImage::from_bytes(&bytes).map_err(|e| CollageError::source_unavailable(path, e))?;
        debug!(
            "Loaded {} as {} {}x{}",
            path.display(),
            encoded.filter.name(),
            encoded.width,
            encoded.height
        );
        Ok(encoded)
    }
}

/// Unsupported formats mean the file isn't an image we handle; anything else
/// is a failure inside the decoder. The bytes are already in memory, so an
/// I/O error here is the decoder running out of data.
fn classify(path: &Path, error: ImageError) -> CollageError {
    match error {
        ImageError::Unsupported(e) => CollageError::InvalidSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
        other => CollageError::Decode {
            path: path.to_path_buf(),
            source: other,
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_probe_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "red.png", 40, 30);

        let source = FsDecoder.probe(&path).unwrap();
        assert_eq!(path.as_path(), source.path());
        assert_eq!(40, source.width());
        assert_eq!(30, source.height());
    }

    #[test]
    fn test_probe_missing_file() {
        let result = FsDecoder.probe(Path::new("test/potato.png"));
        assert!(matches!(result, Err(CollageError::InvalidSource { .. })));
    }

    #[test]
    fn test_probe_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        fs::write(&path, "definitely not pixels").unwrap();

        let result = FsDecoder.probe(&path);
        assert!(matches!(result, Err(CollageError::InvalidSource { .. })));
    }

    #[test]
    fn test_probe_truncated_png_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "whole.png", 64, 64);
        let bytes = fs::read(&path).unwrap();
        let truncated = dir.path().join("truncated.png");
        fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

        let result = FsDecoder.probe(&truncated);
        assert!(
            matches!(result, Err(CollageError::Decode { .. })),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_probe_corrupt_png_data_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noisy.png");
        RgbImage::from_fn(64, 64, |x, y| Rgb([x as u8 * 4, y as u8 * 4, (x ^ y) as u8]))
            .save(&path)
            .unwrap();
        let mut bytes = fs::read(&path).unwrap();

        // Scribble over the start of the compressed IDAT payload.
        let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
        for byte in &mut bytes[idat + 4..idat + 12] {
            *byte ^= 0xFF;
        }
        let corrupt = dir.path().join("corrupt.png");
        fs::write(&corrupt, &bytes).unwrap();

        let result = FsDecoder.probe(&corrupt);
        assert!(
            matches!(result, Err(CollageError::Decode { .. })),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_load_jpeg_passes_bytes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(16, 8, Rgb([10, 120, 240]))
            .save(&path)
            .unwrap();

        let source = FsDecoder.probe(&path).unwrap();
        let encoded = FsDecoder.load(&source).unwrap();
        assert_eq!(Filter::Dct, encoded.filter);
        assert_eq!(ColorSpace::DeviceRGB, encoded.color_space);
        assert_eq!(fs::read(&path).unwrap(), encoded.data);
        assert_eq!((16, 8), (encoded.width, encoded.height));
        assert!(encoded.soft_mask.is_none());
    }

    #[test]
    fn test_load_gray_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.jpeg");
        GrayImage::from_pixel(8, 8, Luma([128])).save(&path).unwrap();

        let encoded = FsDecoder.load(&SourceImage::new(&path, 8, 8)).unwrap();
        assert_eq!(Filter::Dct, encoded.filter);
        assert_eq!(ColorSpace::DeviceGray, encoded.color_space);
    }

    #[test]
    fn test_jpeg_components_reads_frame_header() {
        let mut bytes = Vec::new();
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(Some(3), jpeg_components(&bytes));
        assert_eq!(None, jpeg_components(b"\xFF\xD8garbage"));
    }

    #[test]
    fn test_load_opaque_png_has_no_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "opaque.png", 5, 4);

        let encoded = FsDecoder.load(&SourceImage::new(&path, 5, 4)).unwrap();
        assert_eq!(Filter::Flate, encoded.filter);
        assert!(encoded.soft_mask.is_none());
    }

    #[test]
    fn test_load_translucent_png_has_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glass.png");
        RgbaImage::from_pixel(5, 4, Rgba([0, 0, 255, 128]))
            .save(&path)
            .unwrap();

        let encoded = FsDecoder.load(&SourceImage::new(&path, 5, 4)).unwrap();
        assert!(encoded.soft_mask.is_some());
    }

    #[test]
    fn test_load_vanished_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "gone.png", 5, 4);
        let source = FsDecoder.probe(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let result = FsDecoder.load(&source);
        assert!(matches!(result, Err(CollageError::SourceUnavailable { .. })));
    }
}
