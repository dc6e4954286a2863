//! Loading a single still image into a canonical `Image`.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::image_pipeline::common::config::PipelineConfig;
use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::decode::codec::{find_decoder, DecodedFrame, FrameDecoder};
use crate::image_pipeline::decode::container::{CodecId, Demuxer, ImageDemuxer, MediaType};
use crate::image_pipeline::decode::palette::expand_palette;
use crate::image_pipeline::decode::reader::ImageReader;
use crate::image_pipeline::frame::{Image, PixelFormat};

type DecoderLookup = Box<dyn Fn(CodecId) -> Option<Box<dyn FrameDecoder>>>;

/// Decodes exactly one frame from stream 0 of a container and normalizes it.
///
/// Palette images are expanded to `Rgb24`; other canonical layouts are moved
/// into the returned `Image` untouched. Every demuxer and codec opened for a
/// call is released before it returns, on success and on every error.
pub struct Decoder {
    config: PipelineConfig,
    lookup: DecoderLookup,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Decoder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            lookup: Box::new(find_decoder),
        }
    }

    /// Uses `lookup` instead of the built-in codecs to find frame decoders.
    pub fn with_codecs(
        config: PipelineConfig,
        lookup: impl Fn(CodecId) -> Option<Box<dyn FrameDecoder>> + 'static,
    ) -> Self {
        Self {
            config,
            lookup: Box::new(lookup),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Image> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| ImageIoError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.load_bytes(path, data)
    }

    /// Decodes an in-memory file; `path` only names it in diagnostics.
    pub fn load_bytes(&self, path: &Path, data: Vec<u8>) -> Result<Image> {
        let demuxer = ImageDemuxer::open(path, data)?;
        self.load_from(path, demuxer)
    }

    /// Decodes the first frame of `demuxer`, taking ownership of it.
    pub fn load_from<D: Demuxer>(&self, path: &Path, mut demuxer: D) -> Result<Image> {
        let streams = demuxer.streams();
        if self.config.verbosity.dumps_containers() {
            dump_container(path, &demuxer);
        }

        let stream = streams.first().ok_or_else(|| ImageIoError::MissingStreams {
            path: path.to_path_buf(),
        })?;
        if stream.media_type != MediaType::Image {
            return Err(ImageIoError::WrongStream {
                path: path.to_path_buf(),
                media_type: stream.media_type.to_string(),
            });
        }
        let stream = stream.clone();
        if let Some((width, height)) = stream.dimensions {
            self.validate_dimensions(width, height)?;
        }

        let mut codec = (self.lookup)(stream.codec).ok_or_else(|| ImageIoError::UnsupportedCodec {
            path: path.to_path_buf(),
            codec: stream.codec.to_string(),
        })?;
        codec.open(&stream).map_err(|reason| ImageIoError::CodecOpen {
            path: path.to_path_buf(),
            codec: codec.name().to_string(),
            reason,
        })?;

        let packet = demuxer
            .read_packet()
            .map_err(|reason| ImageIoError::ReadPacket { path: path.to_path_buf(), reason })?
            .ok_or_else(|| ImageIoError::ReadPacket {
                path: path.to_path_buf(),
                reason: "no packet available".to_string(),
            })?;
        if packet.stream_index != 0 {
            return Err(ImageIoError::InvalidStream {
                path: path.to_path_buf(),
                stream_index: packet.stream_index,
            });
        }
        debug!("Read packet of {} bytes from stream 0", packet.data.len());

        let frame = codec
            .decode(&packet)
            .map_err(|reason| ImageIoError::Decode { path: path.to_path_buf(), reason })?
            .ok_or_else(|| ImageIoError::NoFrame { path: path.to_path_buf() })?;
        drop(packet);

        let image = normalize(path, frame)?;
        self.validate_dimensions(image.width(), image.height())?;

        debug!(
            "Loaded {}: {}x{} {}",
            path.display(),
            image.width(),
            image.height(),
            image.format()
        );
        Ok(image)
    }

    /// Applies `max_dimension`, first to the size the container declares
    /// and again to the decoded image.
    fn validate_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(ImageIoError::InvalidDimensions(width, height));
            }
        }
        Ok(())
    }
}

impl ImageReader for Decoder {
    fn read_image(&self, path: &Path) -> Result<Image> {
        self.load(path)
    }
}

/// Converts a decoded frame into a canonical image.
fn normalize(path: &Path, frame: DecodedFrame) -> Result<Image> {
    let Some(format) = frame.format.canonical() else {
        return Err(ImageIoError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            format: frame.format.to_string(),
        });
    };

    match format {
        PixelFormat::Gray8
        | PixelFormat::GrayAlpha8
        | PixelFormat::Rgb24
        | PixelFormat::MonoBlack
        | PixelFormat::MonoWhite => Image::from_planes(frame.width, frame.height, format, frame.planes),
        PixelFormat::Palette8 => {
            let indexed = Image::from_planes(frame.width, frame.height, format, frame.planes)?;
            expand_palette(&indexed)
        }
    }
}

fn dump_container(path: &Path, demuxer: &dyn Demuxer) {
    info!("Input {}, from '{}':", demuxer.format_name(), path.display());
    for stream in demuxer.streams() {
        match stream.dimensions {
            Some((w, h)) => info!(
                "  Stream #{}: {}: {}, {}x{}",
                stream.index, stream.media_type, stream.codec, w, h
            ),
            None => info!("  Stream #{}: {}: {}", stream.index, stream.media_type, stream.codec),
        }
    }
}
