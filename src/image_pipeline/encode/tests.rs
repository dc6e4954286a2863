use std::io::{self, Write};
use std::path::Path;

use crate::image_pipeline::common::config::{PipelineConfig, Verbosity};
use crate::image_pipeline::common::error::{ErrorKind, ImageIoError};
use crate::image_pipeline::decode::Decoder;
use crate::image_pipeline::encode::encoder::Encoder;
use crate::image_pipeline::encode::writer::ImageWriter;
use crate::image_pipeline::frame::{Image, Pixel, PixelFormat};

/// Accepts `budget` bytes, then fails every write. Flushing can fail separately.
struct FailingWriter {
    written: Vec<u8>,
    budget: usize,
    fail_flush: bool,
}

impl FailingWriter {
    fn new(budget: usize) -> Self {
        Self { written: Vec::new(), budget, fail_flush: false }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.budget {
            return Err(io::Error::other("Mock disk full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_flush {
            return Err(io::Error::other("Mock flush error"));
        }
        Ok(())
    }
}

fn encoder() -> Encoder {
    Encoder::new(PipelineConfig::default())
}

fn encode(image: &Image, desired: PixelFormat) -> Vec<u8> {
    let mut out = Vec::new();
    encoder()
        .encode_to(Path::new("out.pnm"), &mut out, image, desired)
        .unwrap();
    out
}

fn rgb_image() -> Image {
    let mut image = Image::new(2, 2, PixelFormat::Rgb24).unwrap();
    image.set_pixel(0, 0, Pixel::new(255, 0, 0)).unwrap();
    image.set_pixel(1, 0, Pixel::new(0, 255, 0)).unwrap();
    image.set_pixel(0, 1, Pixel::new(0, 0, 255)).unwrap();
    image.set_pixel(1, 1, Pixel::new(200, 200, 200)).unwrap();
    image
}

#[test]
fn test_ppm_layout() {
    let out = encode(&rgb_image(), PixelFormat::Rgb24);
    let mut expected = b"P6\n2 2\n255\n".to_vec();
    expected.extend_from_slice(&[255, 0, 0, 0, 255, 0, 0, 0, 255, 200, 200, 200]);
    assert_eq!(out, expected);
}

#[test]
fn test_pgm_layout_drops_alpha() {
    let mut image = Image::new(3, 1, PixelFormat::GrayAlpha8).unwrap();
    image.row_mut(0, 0).copy_from_slice(&[10, 0, 20, 128, 30, 255]);

    let out = encode(&image, PixelFormat::GrayAlpha8);
    assert_eq!(out, b"P5\n3 1\n255\n\x0a\x14\x1e".to_vec());
}

#[test]
fn test_pbm_layout_from_gray() {
    // 10 pixels: dark, light alternating; the threshold is 128.
    let mut image = Image::new(10, 1, PixelFormat::Gray8).unwrap();
    image
        .row_mut(0, 0)
        .copy_from_slice(&[0, 255, 127, 128, 0, 255, 0, 255, 10, 250]);

    let out = encode(&image, PixelFormat::MonoBlack);
    let mut expected = b"P4\n10 1\n".to_vec();
    expected.extend_from_slice(&[0b1010_1010, 0b1000_0000]);
    assert_eq!(out, expected);
}

#[test]
fn test_monoblack_input_is_written_with_black_set() {
    // MonoBlack: set bit = white.
    let image = Image::new(8, 1, PixelFormat::MonoBlack).unwrap();
    assert_eq!(image.get_pixel(0, 0), Pixel::BLACK);

    let out = encode(&image, PixelFormat::MonoBlack);
    assert_eq!(out, b"P4\n8 1\n\xff".to_vec());
}

#[test]
fn test_caller_image_is_not_modified() {
    let image = rgb_image();
    let before = image.clone();
    encode(&image, PixelFormat::Gray8);
    encode(&image, PixelFormat::MonoWhite);
    assert_eq!(image, before);
}

#[test]
fn test_palette_requests_are_rejected() {
    let err = encoder()
        .encode_to(Path::new("out.pnm"), &mut Vec::<u8>::new(), &rgb_image(), PixelFormat::Palette8)
        .unwrap_err();
    assert!(matches!(err, ImageIoError::UnsupportedOutputFormat { .. }));
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_write_failures_are_distinct() {
    let image = rgb_image();
    let header_len = b"P6\n2 2\n255\n".len();

    let mut out = FailingWriter::new(0);
    let err = encoder()
        .encode_to(Path::new("header.ppm"), &mut out, &image, PixelFormat::Rgb24)
        .unwrap_err();
    assert!(matches!(err, ImageIoError::WriteHeader { .. }));
    assert_eq!(err.to_string(), "error writing header to 'header.ppm': Mock disk full");

    let mut out = FailingWriter::new(header_len);
    let err = encoder()
        .encode_to(Path::new("packet.ppm"), &mut out, &image, PixelFormat::Rgb24)
        .unwrap_err();
    assert!(matches!(err, ImageIoError::WritePacket { .. }));
    assert_eq!(out.written.len(), header_len);

    let mut out = FailingWriter::new(usize::MAX);
    out.fail_flush = true;
    let err = encoder()
        .encode_to(Path::new("trailer.ppm"), &mut out, &image, PixelFormat::Rgb24)
        .unwrap_err();
    assert!(matches!(err, ImageIoError::WriteTrailer { .. }));
    assert!(err.to_string().contains("trailer.ppm"));
}

#[test]
fn test_save_to_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.pgm");
    let err = encoder().save(&path, &rgb_image(), PixelFormat::Gray8).unwrap_err();
    assert!(matches!(err, ImageIoError::OutputOpen { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unsupported_request_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pnm");
    assert!(encoder().save(&path, &rgb_image(), PixelFormat::Palette8).is_err());
    assert!(!path.exists());
}

#[test]
fn test_saved_file_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder().verbosity(Verbosity::More).build();
    let encoder = Encoder::new(config.clone());
    let decoder = Decoder::new(config);

    let image = rgb_image();
    for (desired, expected) in [
        (PixelFormat::Rgb24, PixelFormat::Rgb24),
        (PixelFormat::Gray8, PixelFormat::Gray8),
        (PixelFormat::MonoBlack, PixelFormat::MonoWhite),
    ] {
        let path = dir.path().join(format!("out-{desired}.pnm"));
        encoder.write_image(&path, &image, desired).unwrap();
        let reloaded = decoder.load(&path).unwrap();
        assert_eq!(reloaded.format(), expected);
        assert_eq!((reloaded.width(), reloaded.height()), (2, 2));
    }

    let reloaded = decoder.load(dir.path().join("out-rgb24.pnm")).unwrap();
    assert_eq!(reloaded, image);
}
