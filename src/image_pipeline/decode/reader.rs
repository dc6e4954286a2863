use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::frame::Image;

pub trait ImageReader {
    fn read_image(&self, path: &Path) -> Result<Image>;
}
