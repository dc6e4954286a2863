//! Binary PNM decoder: P4 (PBM), P5 (PGM), P6 (PPM) and P7 (PAM).
//!
//! Samples with a maxval below 255 are rescaled to the full 8-bit range.
//! Maxvals above 255 are decoded as 16-bit layouts, which the pipeline does
//! not accept as canonical formats.

use tracing::debug;

use crate::image_pipeline::decode::codec::{check_stream, DecodedFrame, FrameDecoder, NativePixelFormat};
use crate::image_pipeline::decode::container::{Packet, StreamInfo};
use crate::image_pipeline::frame::Plane;

/// PNM sub-format, named by magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnmKind {
    Pbm,
    Pgm,
    Ppm,
    Pam,
}

/// Parsed PNM header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PnmHeader {
    pub kind: PnmKind,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    pub depth: u32,
    pub tupltype: Option<String>,
    pub data_offset: usize,
}

struct HeaderCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err("unexpected end of header".to_string());
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| "header is not ASCII".to_string())
    }

    fn number(&mut self, what: &str) -> Result<u32, String> {
        let token = self.token()?;
        token
            .parse::<u32>()
            .map_err(|_| format!("invalid {what} '{token}'"))
    }

    /// Consumes the single whitespace byte separating the header from the raster.
    fn end_of_header(&mut self) -> Result<usize, String> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => Ok(self.pos + 1),
            Some(_) => Err("missing whitespace after header".to_string()),
            None => Err("unexpected end of header".to_string()),
        }
    }

    fn line(&mut self) -> Option<&'a str> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(|&b| b != b'\n') {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        let line = std::str::from_utf8(&self.data[start..self.pos]).ok();
        if self.pos < self.data.len() {
            self.pos += 1;
        }
        line.map(str::trim)
    }
}

pub fn parse_header(data: &[u8]) -> Result<PnmHeader, String> {
    let kind = match data {
        [b'P', b'4', ..] => PnmKind::Pbm,
        [b'P', b'5', ..] => PnmKind::Pgm,
        [b'P', b'6', ..] => PnmKind::Ppm,
        [b'P', b'7', ..] => PnmKind::Pam,
        [b'P', b'1'..=b'3', ..] => return Err("ASCII PNM variants are not supported".to_string()),
        _ => return Err("not a PNM file".to_string()),
    };

    let mut cursor = HeaderCursor { data, pos: 2 };

    if kind == PnmKind::Pam {
        return parse_pam_header(cursor);
    }

    let width = cursor.number("width")?;
    let height = cursor.number("height")?;
    let (maxval, depth) = match kind {
        PnmKind::Pbm => (1, 1),
        PnmKind::Pgm => (cursor.number("maxval")?, 1),
        _ => (cursor.number("maxval")?, 3),
    };
    let data_offset = cursor.end_of_header()?;

    Ok(PnmHeader { kind, width, height, maxval, depth, tupltype: None, data_offset })
}

fn parse_pam_header(mut cursor: HeaderCursor<'_>) -> Result<PnmHeader, String> {
    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    let mut tupltype: Option<String> = None;

    loop {
        let line = cursor.line().ok_or("PAM header has no ENDHDR")?;
        let (key, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let value = value.trim();
        let parse = |v: &str| v.parse::<u32>().map_err(|_| format!("invalid {key} '{v}'"));
        match key {
            "ENDHDR" => break,
            "WIDTH" => width = Some(parse(value)?),
            "HEIGHT" => height = Some(parse(value)?),
            "DEPTH" => depth = Some(parse(value)?),
            "MAXVAL" => maxval = Some(parse(value)?),
            "TUPLTYPE" => match tupltype.as_mut() {
                Some(t) => {
                    t.push(' ');
                    t.push_str(value);
                }
                None => tupltype = Some(value.to_string()),
            },
            other => debug!("Ignoring PAM header field {}", other),
        }
    }

    Ok(PnmHeader {
        kind: PnmKind::Pam,
        width: width.ok_or("PAM header lacks WIDTH")?,
        height: height.ok_or("PAM header lacks HEIGHT")?,
        depth: depth.ok_or("PAM header lacks DEPTH")?,
        maxval: maxval.ok_or("PAM header lacks MAXVAL")?,
        tupltype,
        data_offset: cursor.pos,
    })
}

impl PnmHeader {
    /// Layout of the decoded raster.
    pub fn native_format(&self) -> Result<NativePixelFormat, String> {
        let wide = self.maxval > 255;
        let format = match (self.kind, self.depth, wide) {
            (PnmKind::Pbm, _, _) => NativePixelFormat::MonoWhite,
            (PnmKind::Pgm, _, false) => NativePixelFormat::Gray8,
            (PnmKind::Pgm, _, true) => NativePixelFormat::Gray16,
            (PnmKind::Ppm, _, false) => NativePixelFormat::Rgb24,
            (PnmKind::Ppm, _, true) => NativePixelFormat::Rgb48,
            (PnmKind::Pam, 1, false) => NativePixelFormat::Gray8,
            (PnmKind::Pam, 1, true) => NativePixelFormat::Gray16,
            (PnmKind::Pam, 2, false) => NativePixelFormat::GrayAlpha8,
            (PnmKind::Pam, 2, true) => NativePixelFormat::GrayAlpha16,
            (PnmKind::Pam, 3, false) => NativePixelFormat::Rgb24,
            (PnmKind::Pam, 3, true) => NativePixelFormat::Rgb48,
            (PnmKind::Pam, 4, false) if self.is_cmyk() => NativePixelFormat::Cmyk32,
            (PnmKind::Pam, 4, false) => NativePixelFormat::Rgba32,
            (PnmKind::Pam, 4, true) => NativePixelFormat::Rgba64,
            (PnmKind::Pam, depth, _) => return Err(format!("unsupported PAM depth {depth}")),
        };
        Ok(format)
    }

    fn is_cmyk(&self) -> bool {
        self.tupltype.as_deref() == Some("CMYK")
    }

    fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid dimensions {}x{}", self.width, self.height));
        }
        if self.maxval == 0 || self.maxval > u16::MAX as u32 {
            return Err(format!("invalid maxval {}", self.maxval));
        }
        if let Some(tupltype) = self.tupltype.as_deref() {
            let expected = match tupltype {
                "BLACKANDWHITE" | "GRAYSCALE" => Some(1),
                "BLACKANDWHITE_ALPHA" | "GRAYSCALE_ALPHA" => Some(2),
                "RGB" => Some(3),
                "RGB_ALPHA" | "CMYK" => Some(4),
                _ => None,
            };
            if expected.is_some_and(|d| d != self.depth) {
                return Err(format!("TUPLTYPE {tupltype} does not match DEPTH {}", self.depth));
            }
        }
        Ok(())
    }

    /// Bytes of one raster row in the file.
    fn row_bytes(&self) -> Option<usize> {
        match self.kind {
            PnmKind::Pbm => Some((self.width as usize).div_ceil(8)),
            _ => {
                let bytes_per_sample = if self.maxval > 255 { 2 } else { 1 };
                (self.width as usize)
                    .checked_mul(self.depth as usize)?
                    .checked_mul(bytes_per_sample)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct PnmFrameDecoder;

impl FrameDecoder for PnmFrameDecoder {
    fn name(&self) -> &'static str {
        "pnm"
    }

    fn open(&mut self, stream: &StreamInfo) -> Result<(), String> {
        check_stream(stream)
    }

    fn decode(&mut self, packet: &Packet) -> Result<Option<DecodedFrame>, String> {
        let header = parse_header(&packet.data)?;
        header.validate()?;
        let format = header.native_format()?;
        debug!(
            "PNM {:?} {}x{} depth {} maxval {} -> {}",
            header.kind, header.width, header.height, header.depth, header.maxval, format
        );

        let row_bytes = header.row_bytes().ok_or("image dimensions overflow")?;
        let raster_len = row_bytes
            .checked_mul(header.height as usize)
            .ok_or("image dimensions overflow")?;
        let raster_end = header
            .data_offset
            .checked_add(raster_len)
            .ok_or("image dimensions overflow")?;
        let raster = packet
            .data
            .get(header.data_offset..raster_end)
            .ok_or_else(|| {
                format!(
                    "truncated raster: need {} bytes, got {}",
                    raster_len,
                    packet.data.len().saturating_sub(header.data_offset)
                )
            })?;

        let mut data = raster.to_vec();
        if header.kind != PnmKind::Pbm && header.maxval < 255 {
            rescale_samples(&mut data, header.maxval)?;
        }

        Ok(Some(DecodedFrame {
            width: header.width,
            height: header.height,
            format,
            planes: vec![Plane::new(data, row_bytes)],
        }))
    }
}

/// Stretches samples in `0..=maxval` to `0..=255`.
fn rescale_samples(samples: &mut [u8], maxval: u32) -> Result<(), String> {
    for sample in samples.iter_mut() {
        let v = *sample as u32;
        if v > maxval {
            return Err(format!("sample {v} exceeds maxval {maxval}"));
        }
        *sample = ((v * 255 + maxval / 2) / maxval) as u8;
    }
    Ok(())
}
