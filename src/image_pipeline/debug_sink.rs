//! Snapshots of intermediate images, written only at the highest verbosity.

use std::path::PathBuf;

use tracing::debug;

use crate::image_pipeline::common::config::Verbosity;
use crate::image_pipeline::common::error::{ImageIoError, Result};
use crate::image_pipeline::encode::ImageWriter;
use crate::image_pipeline::frame::Image;

pub struct DebugSink<W: ImageWriter> {
    writer: W,
    verbosity: Verbosity,
}

impl<W: ImageWriter> DebugSink<W> {
    pub fn new(writer: W, verbosity: Verbosity) -> Self {
        Self { writer, verbosity }
    }

    pub fn is_active(&self) -> bool {
        self.verbosity.saves_debug_images()
    }

    /// Saves `image` under `template` with `index` substituted.
    ///
    /// Returns the written path, or `None` when snapshots are disabled. The
    /// template is not validated while the sink is inactive.
    pub fn maybe_save(&self, template: &str, index: u32, image: &Image) -> Result<Option<PathBuf>> {
        if !self.is_active() {
            return Ok(None);
        }
        let path = PathBuf::from(format_template(template, index)?);
        debug!("Saving debug image {}", path.display());
        self.writer.write_image(&path, image, image.format())?;
        Ok(Some(path))
    }
}

const MAX_FIELD_WIDTH: usize = 255;

/// Substitutes `index` for the single `%d` placeholder of `template`.
///
/// The placeholder accepts a width of at most 255 and a zero flag (`%3d`,
/// `%03d`); `%%` yields a literal percent sign.
pub fn format_template(template: &str, index: u32) -> Result<String> {
    let invalid = |reason: &str| ImageIoError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut output = String::with_capacity(template.len() + 8);
    let mut placeholders = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            output.push('%');
            continue;
        }

        let zero_pad = chars.next_if_eq(&'0').is_some();
        let mut width = 0usize;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            chars.next();
            width = width
                .checked_mul(10)
                .and_then(|w| w.checked_add(digit as usize))
                .filter(|&w| w <= MAX_FIELD_WIDTH)
                .ok_or_else(|| invalid("field width too large"))?;
        }
        if chars.next() != Some('d') {
            return Err(invalid("only %d placeholders are supported"));
        }

        placeholders += 1;
        if zero_pad {
            output.push_str(&format!("{index:0width$}"));
        } else {
            output.push_str(&format!("{index:width$}"));
        }
    }

    match placeholders {
        1 => Ok(output),
        0 => Err(invalid("missing %d placeholder")),
        _ => Err(invalid("more than one placeholder")),
    }
}
