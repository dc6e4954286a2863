use std::path::Path;

use tracing::{debug, info, info_span};

use crate::image_pipeline::common::config::PipelineConfig;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::conversions::timing::{Stage, StageTimings};
use crate::image_pipeline::debug_sink::DebugSink;
use crate::image_pipeline::decode::{Decoder, ImageReader};
use crate::image_pipeline::encode::{Encoder, ImageWriter};
use crate::image_pipeline::frame::{Image, PixelFormat};

/// Load/save front end over an image reader and an image writer.
pub struct Pipeline<R: ImageReader, W: ImageWriter> {
    reader: R,
    writer: W,
    config: PipelineConfig,
}

impl Pipeline<Decoder, Encoder> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            reader: Decoder::new(config.clone()),
            writer: Encoder::new(config.clone()),
            config,
        }
    }
}

impl<R: ImageReader, W: ImageWriter> Pipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Self {
        Self { reader, writer, config }
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Image> {
        self.reader.read_image(path.as_ref())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, image: &Image, desired: PixelFormat) -> Result<()> {
        self.writer.write_image(path.as_ref(), image, desired)
    }

    /// Writes a snapshot of `image` when verbosity is at `DebugSave`.
    pub fn save_debug(&self, template: &str, index: u32, image: &Image) -> Result<Option<std::path::PathBuf>> {
        DebugSink::new(&self.writer, self.config.verbosity).maybe_save(template, index, image)
    }

    /// Loads `input` and saves it to `output`, keeping the source format unless `desired` is set.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        desired: Option<PixelFormat>,
    ) -> Result<()> {
        self.convert_file_with_timings(input, output, desired, None)
            .map(|_| ())
    }

    /// Like [`Pipeline::convert_file`], also passing the loaded image through
    /// the debug sink when `debug_template` is set, and timing each stage.
    pub fn convert_file_with_timings<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        desired: Option<PixelFormat>,
        debug_template: Option<&str>,
    ) -> Result<StageTimings> {
        let input = input.as_ref();
        let output = output.as_ref();
        let _span = info_span!("convert", input = %input.display(), output = %output.display()).entered();
        let mut timings = StageTimings::new();

        let image = timings.time(Stage::Load, || self.load(input))?;

        if let Some(template) = debug_template {
            let snapshot = timings.time(Stage::DebugSave, || self.save_debug(template, 1, &image))?;
            if let Some(path) = snapshot {
                debug!("Debug snapshot written to {}", path.display());
            }
        }

        let desired = desired.unwrap_or(image.format());
        timings.time(Stage::Save, || self.save(output, &image, desired))?;

        info!(
            "Converted {}x{} {} to {} in {:.3}ms",
            image.width(),
            image.height(),
            image.format(),
            desired,
            timings.total().as_secs_f64() * 1000.0
        );
        Ok(timings)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replaces the pipeline settings. A reader or writer keeps the
    /// configuration it was built with.
    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }
}
