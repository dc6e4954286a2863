use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::frame::{Image, PixelFormat};

pub trait ImageWriter {
    fn write_image(&self, path: &Path, image: &Image, desired: PixelFormat) -> Result<()>;
}

impl<T: ImageWriter + ?Sized> ImageWriter for &T {
    fn write_image(&self, path: &Path, image: &Image, desired: PixelFormat) -> Result<()> {
        (**self).write_image(path, image, desired)
    }
}
