//! Saving a canonical `Image` as a single-frame PNM file.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::common::config::PipelineConfig;
use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::encode::codec::OutputCodec;
use crate::image_pipeline::encode::muxer::{ImageMuxer, StreamParams, CONTAINER_NAME};
use crate::image_pipeline::encode::pnm_encoder::PnmEncoder;
use crate::image_pipeline::encode::writer::ImageWriter;
use crate::image_pipeline::frame::{Image, PixelFormat};

#[derive(Debug, Clone)]
pub struct Encoder {
    config: PipelineConfig,
}

impl Encoder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Writes `image` to `path` in the output family selected by `desired`.
    ///
    /// The format is checked before the destination is created, so an
    /// unsupported request leaves no file behind. A file that fails part way
    /// through encoding is removed.
    #[instrument(skip(self, path, image, desired), fields(path = %path.as_ref().display(), desired = %desired))]
    pub fn save<P: AsRef<Path>>(&self, path: P, image: &Image, desired: PixelFormat) -> Result<()> {
        let path = path.as_ref();
        select_codec(path, image, desired)?;

        let file = File::create(path).map_err(|source| ImageIoError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        let result = self.encode_to(path, &mut out, image, desired);
        drop(out);
        discard_partial_output(path, result)
    }

    /// Encodes into any writer; `path` only names the destination in diagnostics.
    pub fn encode_to(
        &self,
        path: &Path,
        out: &mut dyn Write,
        image: &Image,
        desired: PixelFormat,
    ) -> Result<()> {
        let (codec, target) = select_codec(path, image, desired)?;

        let frame: Cow<'_, Image> = if image.format() == target {
            Cow::Borrowed(image)
        } else {
            debug!("Converting {} to {} for {}", image.format(), target, codec);
            Cow::Owned(image.convert_to(target)?)
        };

        let mut muxer = ImageMuxer::new(out);
        let params = StreamParams::new(frame.width(), frame.height(), codec);
        muxer
            .add_stream(params.clone())
            .map_err(|reason| ImageIoError::EncoderOpen {
                path: path.to_path_buf(),
                codec: codec.to_string(),
                reason,
            })?;
        let mut encoder = PnmEncoder::open(&params).map_err(|reason| ImageIoError::EncoderOpen {
            path: path.to_path_buf(),
            codec: codec.to_string(),
            reason,
        })?;

        if self.config.verbosity.dumps_containers() {
            dump_output(path, &params);
        }

        muxer
            .write_header()
            .map_err(|reason| ImageIoError::WriteHeader { path: path.to_path_buf(), reason })?;
        let packet = encoder
            .encode(&frame)
            .map_err(|reason| ImageIoError::Encode { path: path.to_path_buf(), reason })?;
        muxer
            .write_packet(&packet)
            .map_err(|reason| ImageIoError::WritePacket { path: path.to_path_buf(), reason })?;
        muxer
            .write_trailer()
            .map_err(|reason| ImageIoError::WriteTrailer { path: path.to_path_buf(), reason })?;

        debug!(
            "Saved {}: {}x{} {} as {}",
            path.display(),
            frame.width(),
            frame.height(),
            frame.format(),
            encoder.codec()
        );
        Ok(())
    }
}

impl ImageWriter for Encoder {
    fn write_image(&self, path: &Path, image: &Image, desired: PixelFormat) -> Result<()> {
        self.save(path, image, desired)
    }
}

fn discard_partial_output(path: &Path, result: Result<()>) -> Result<()> {
    if result.is_err() {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed incomplete output {}", path.display()),
            Err(e) => warn!("Could not remove incomplete output {}: {}", path.display(), e),
        }
    }
    result
}

fn select_codec(path: &Path, image: &Image, desired: PixelFormat) -> Result<(OutputCodec, PixelFormat)> {
    if image.format() == PixelFormat::Palette8 {
        return Err(ImageIoError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            format: image.format().to_string(),
        });
    }
    OutputCodec::select(desired).ok_or_else(|| ImageIoError::UnsupportedOutputFormat {
        path: path.to_path_buf(),
        format: desired.to_string(),
    })
}

fn dump_output(path: &Path, params: &StreamParams) {
    info!("Output #0, {}, to '{}':", CONTAINER_NAME, path.display());
    info!(
        "  Stream #{}: {} ({}), {}x{}, {}/{}",
        params.index,
        params.codec,
        params.format,
        params.width,
        params.height,
        params.time_base.0,
        params.time_base.1
    );
}
