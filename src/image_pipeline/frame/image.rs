//! Owned raw pixel buffers

use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::frame::pixel::Pixel;
use crate::image_pipeline::frame::pixel_format::PixelFormat;

/// One contiguous byte buffer of an image, addressed row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    stride: usize,
}

impl Plane {
    pub fn new(data: Vec<u8>, stride: usize) -> Self {
        Self { data, stride }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// A decoded still image.
///
/// The pixel format determines how many planes the image has and how each
/// row is laid out. Rows may be padded: a plane's stride is only required to
/// be at least [`PixelFormat::plane_min_stride`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    planes: Vec<Plane>,
}

impl Image {
    /// Allocates a zeroed image with tightly packed rows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ImageIoError::InvalidDimensions(width, height));
        }

        let mut planes = Vec::with_capacity(format.planes());
        for plane in 0..format.planes() {
            let stride = format.plane_min_stride(plane, width);
            let len = stride
                .checked_mul(format.plane_rows(plane, height))
                .ok_or(ImageIoError::InvalidDimensions(width, height))?;
            planes.push(Plane::new(vec![0u8; len], stride));
        }

        Ok(Self { width, height, format, planes })
    }

    /// Allocates an image with every pixel set to `fill`.
    pub fn new_filled(width: u32, height: u32, format: PixelFormat, fill: Pixel) -> Result<Self> {
        let mut image = Self::new(width, height, format)?;
        image.fill(fill)?;
        Ok(image)
    }

    /// Wraps existing planes, checking them against the format and geometry.
    pub fn from_planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: Vec<Plane>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ImageIoError::InvalidDimensions(width, height));
        }
        if planes.len() != format.planes() {
            return Err(ImageIoError::InvalidBuffer(format!(
                "{format} needs {} plane(s), got {}",
                format.planes(),
                planes.len()
            )));
        }

        for (index, plane) in planes.iter().enumerate() {
            let min_stride = format.plane_min_stride(index, width);
            if plane.stride < min_stride {
                return Err(ImageIoError::InvalidBuffer(format!(
                    "plane {index} stride {} is below the minimum {min_stride} for {width}px {format}",
                    plane.stride
                )));
            }
            let rows = format.plane_rows(index, height);
            let needed = plane.stride * (rows - 1) + min_stride;
            if plane.data.len() < needed {
                return Err(ImageIoError::InvalidBuffer(format!(
                    "plane {index} holds {} bytes, need {needed}",
                    plane.data.len()
                )));
            }
        }

        Ok(Self { width, height, format, planes })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    pub fn into_planes(self) -> Vec<Plane> {
        self.planes
    }

    /// Meaningful bytes of row `y` in `plane`, without stride padding.
    pub fn row(&self, plane: usize, y: u32) -> &[u8] {
        let p = &self.planes[plane];
        let start = p.stride * y as usize;
        &p.data[start..start + self.format.plane_min_stride(plane, self.width)]
    }

    pub fn row_mut(&mut self, plane: usize, y: u32) -> &mut [u8] {
        let len = self.format.plane_min_stride(plane, self.width);
        let p = &mut self.planes[plane];
        let start = p.stride * y as usize;
        &mut p.data[start..start + len]
    }

    /// Colour table entry `index` of a `Palette8` image as `0xAARRGGBB`.
    pub fn palette_entry(&self, index: u8) -> Option<u32> {
        if self.format != PixelFormat::Palette8 {
            return None;
        }
        let offset = index as usize * 4;
        let bytes = self.planes[1].data.get(offset..offset + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads the colour at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let row = self.row(0, y);
        let x = x as usize;
        match self.format {
            PixelFormat::Rgb24 => Pixel::new(row[x * 3], row[x * 3 + 1], row[x * 3 + 2]),
            PixelFormat::Gray8 => Pixel::gray(row[x]),
            PixelFormat::GrayAlpha8 => Pixel::gray(row[x * 2]),
            PixelFormat::MonoWhite | PixelFormat::MonoBlack => {
                let set = row[x / 8] & (0x80 >> (x % 8)) != 0;
                let white = set == (self.format == PixelFormat::MonoBlack);
                if white { Pixel::WHITE } else { Pixel::BLACK }
            }
            PixelFormat::Palette8 => {
                let argb = self.palette_entry(row[x]).unwrap_or(0);
                Pixel::from_argb(argb)
            }
        }
    }

    /// Writes `pixel` at `(x, y)`, reducing it to the image's format.
    ///
    /// Gray formats store [`Pixel::luma`]; bi-level formats store black when
    /// [`Pixel::is_dark`]. `Palette8` images cannot be written per pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let format = self.format;
        let row = self.row_mut(0, y);
        let x = x as usize;
        match format {
            PixelFormat::Rgb24 => {
                row[x * 3] = pixel.r;
                row[x * 3 + 1] = pixel.g;
                row[x * 3 + 2] = pixel.b;
            }
            PixelFormat::Gray8 => row[x] = pixel.luma(),
            PixelFormat::GrayAlpha8 => {
                row[x * 2] = pixel.luma();
                row[x * 2 + 1] = u8::MAX;
            }
            PixelFormat::MonoWhite | PixelFormat::MonoBlack => {
                let set = pixel.is_dark() == (format == PixelFormat::MonoWhite);
                let mask = 0x80 >> (x % 8);
                if set {
                    row[x / 8] |= mask;
                } else {
                    row[x / 8] &= !mask;
                }
            }
            PixelFormat::Palette8 => {
                return Err(ImageIoError::InvalidBuffer(
                    "palette images cannot be written per pixel".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Sets every pixel to `pixel`.
    pub fn fill(&mut self, pixel: Pixel) -> Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, pixel)?;
            }
        }
        Ok(())
    }

    /// Copies `area` of `src` to `(to_x, to_y)` in this image, converting
    /// pixels when the formats differ. The copy is clipped to both images.
    pub fn copy_area_from(&mut self, src: &Image, area: Rect, to_x: u32, to_y: u32) -> Result<()> {
        let width = area
            .width
            .min(src.width.saturating_sub(area.x))
            .min(self.width.saturating_sub(to_x));
        let height = area
            .height
            .min(src.height.saturating_sub(area.y))
            .min(self.height.saturating_sub(to_y));
        if width == 0 || height == 0 {
            return Ok(());
        }

        if src.format == self.format && src.format.bits_per_pixel() % 8 == 0 && src.format.planes() == 1 {
            let bpp = src.format.bits_per_pixel() / 8;
            let len = width as usize * bpp;
            for row in 0..height {
                let from = area.x as usize * bpp;
                let to = to_x as usize * bpp;
                let src_row = &src.row(0, area.y + row)[from..from + len];
                self.row_mut(0, to_y + row)[to..to + len].copy_from_slice(src_row);
            }
            return Ok(());
        }

        for row in 0..height {
            for col in 0..width {
                let pixel = src.get_pixel(area.x + col, area.y + row);
                self.set_pixel(to_x + col, to_y + row, pixel)?;
            }
        }
        Ok(())
    }

    /// Returns a newly allocated copy of this image in `format`.
    pub fn convert_to(&self, format: PixelFormat) -> Result<Image> {
        if format == self.format {
            return Ok(self.clone());
        }
        if format == PixelFormat::Palette8 {
            return Err(ImageIoError::InvalidBuffer(format!(
                "cannot convert {} to a palette image",
                self.format
            )));
        }

        let mut output = Image::new(self.width, self.height, format)?;
        output.copy_area_from(self, Rect::new(0, 0, self.width, self.height), 0, 0)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_ramp(width: u32, height: u32) -> Image {
        let mut image = Image::new(width, height, PixelFormat::Gray8).unwrap();
        for y in 0..height {
            for x in 0..width {
                image.row_mut(0, y)[x as usize] = ((x + y * width) * 16) as u8;
            }
        }
        image
    }

    #[test]
    fn test_new_rejects_empty_geometry() {
        assert!(matches!(
            Image::new(0, 10, PixelFormat::Gray8),
            Err(ImageIoError::InvalidDimensions(0, 10))
        ));
    }

    #[test]
    fn test_new_allocates_planes_per_format() {
        let image = Image::new(10, 3, PixelFormat::MonoWhite).unwrap();
        assert_eq!(image.planes().len(), 1);
        assert_eq!(image.plane(0).stride(), 2);
        assert_eq!(image.plane(0).data().len(), 6);

        let image = Image::new(4, 4, PixelFormat::Palette8).unwrap();
        assert_eq!(image.planes().len(), 2);
        assert_eq!(image.plane(1).data().len(), 1024);
    }

    #[test]
    fn test_from_planes_validates_stride() {
        let planes = vec![Plane::new(vec![0; 8], 2)];
        let err = Image::from_planes(4, 4, PixelFormat::Gray8, planes).unwrap_err();
        assert!(matches!(err, ImageIoError::InvalidBuffer(_)));

        let planes = vec![Plane::new(vec![0; 8], 4)];
        let err = Image::from_planes(4, 4, PixelFormat::Gray8, planes).unwrap_err();
        assert!(matches!(err, ImageIoError::InvalidBuffer(_)));

        // Last row does not need trailing padding.
        let planes = vec![Plane::new(vec![0; 6 * 3 + 4], 6)];
        assert!(Image::from_planes(4, 4, PixelFormat::Gray8, planes).is_ok());
    }

    #[test]
    fn test_padded_rows_are_addressed_by_stride() {
        let mut data = vec![0xEE; 8 * 2];
        data[..3].copy_from_slice(&[1, 2, 3]);
        data[8..11].copy_from_slice(&[4, 5, 6]);
        let image = Image::from_planes(3, 2, PixelFormat::Gray8, vec![Plane::new(data, 8)]).unwrap();

        assert_eq!(image.row(0, 1), &[4, 5, 6]);
        assert_eq!(image.get_pixel(2, 1), Pixel::gray(6));
    }

    #[test]
    fn test_mono_polarity() {
        let mut white_is_zero = Image::new(9, 1, PixelFormat::MonoWhite).unwrap();
        white_is_zero.set_pixel(0, 0, Pixel::BLACK).unwrap();
        white_is_zero.set_pixel(8, 0, Pixel::BLACK).unwrap();
        assert_eq!(white_is_zero.row(0, 0), &[0x80, 0x80]);
        assert_eq!(white_is_zero.get_pixel(1, 0), Pixel::WHITE);

        let mut black_is_zero = Image::new(9, 1, PixelFormat::MonoBlack).unwrap();
        black_is_zero.set_pixel(1, 0, Pixel::WHITE).unwrap();
        assert_eq!(black_is_zero.row(0, 0), &[0x40, 0x00]);
        assert_eq!(black_is_zero.get_pixel(0, 0), Pixel::BLACK);
        assert_eq!(black_is_zero.get_pixel(1, 0), Pixel::WHITE);
    }

    #[test]
    fn test_gray_alpha_ignores_alpha() {
        let data = vec![10, 0, 200, 255];
        let image =
            Image::from_planes(2, 1, PixelFormat::GrayAlpha8, vec![Plane::new(data, 4)]).unwrap();
        assert_eq!(image.get_pixel(0, 0), Pixel::gray(10));

        let gray = image.convert_to(PixelFormat::Gray8).unwrap();
        assert_eq!(gray.row(0, 0), &[10, 200]);
    }

    #[test]
    fn test_gray_to_mono_threshold() {
        let data = vec![0, 127, 128, 255];
        let gray = Image::from_planes(4, 1, PixelFormat::Gray8, vec![Plane::new(data, 4)]).unwrap();

        let mono = gray.convert_to(PixelFormat::MonoWhite).unwrap();
        assert_eq!(mono.row(0, 0), &[0b1100_0000]);

        // Same input converts identically every time.
        assert_eq!(gray.convert_to(PixelFormat::MonoWhite).unwrap(), mono);
    }

    #[test]
    fn test_convert_does_not_touch_source() {
        let gray = gray_ramp(4, 4);
        let before = gray.clone();
        let rgb = gray.convert_to(PixelFormat::Rgb24).unwrap();

        assert_eq!(gray, before);
        assert_eq!(rgb.format(), PixelFormat::Rgb24);
        assert_eq!(rgb.get_pixel(3, 2), Pixel::gray(gray.row(0, 2)[3]));
    }

    #[test]
    fn test_convert_to_palette_is_rejected() {
        let gray = gray_ramp(2, 2);
        assert!(gray.convert_to(PixelFormat::Palette8).is_err());
    }

    #[test]
    fn test_copy_area_is_clipped() {
        let src = gray_ramp(4, 4);
        let mut dst = Image::new(3, 3, PixelFormat::Gray8).unwrap();
        dst.copy_area_from(&src, Rect::new(2, 2, 4, 4), 1, 1).unwrap();

        assert_eq!(dst.row(0, 0), &[0, 0, 0]);
        assert_eq!(dst.row(0, 1), &[0, src.row(0, 2)[2], src.row(0, 2)[3]]);
        assert_eq!(dst.row(0, 2), &[0, src.row(0, 3)[2], src.row(0, 3)[3]]);
    }

    #[test]
    fn test_new_filled() {
        let image = Image::new_filled(3, 2, PixelFormat::MonoWhite, Pixel::BLACK).unwrap();
        assert_eq!(image.row(0, 1), &[0b1110_0000]);

        let image = Image::new_filled(2, 1, PixelFormat::Rgb24, Pixel::new(1, 2, 3)).unwrap();
        assert_eq!(image.row(0, 0), &[1, 2, 3, 1, 2, 3]);

        assert!(Image::new_filled(2, 2, PixelFormat::Palette8, Pixel::WHITE).is_err());
    }
}
