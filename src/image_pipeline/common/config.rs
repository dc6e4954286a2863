//! Pipeline configuration types

use std::fmt;
use std::str::FromStr;

/// Ordered verbosity levels.
///
/// `More` enables container dumps on load and save, `DebugSave` additionally
/// enables the debug sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    None,
    Normal,
    More,
    Debug,
    DebugSave,
}

impl Verbosity {
    /// Level reached after `count` repetitions of a `-v` flag, starting at `None`.
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::None,
            1 => Verbosity::Normal,
            2 => Verbosity::More,
            3 => Verbosity::Debug,
            _ => Verbosity::DebugSave,
        }
    }

    pub fn dumps_containers(self) -> bool {
        self >= Verbosity::More
    }

    pub fn saves_debug_images(self) -> bool {
        self >= Verbosity::DebugSave
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Quiet => "quiet",
            Verbosity::None => "none",
            Verbosity::Normal => "normal",
            Verbosity::More => "more",
            Verbosity::Debug => "debug",
            Verbosity::DebugSave => "debug-save",
        };
        f.write_str(name)
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" => Ok(Verbosity::Quiet),
            "none" => Ok(Verbosity::None),
            "normal" => Ok(Verbosity::Normal),
            "more" => Ok(Verbosity::More),
            "debug" => Ok(Verbosity::Debug),
            "debug-save" | "debug_save" => Ok(Verbosity::DebugSave),
            other => Err(format!("unknown verbosity level '{other}'")),
        }
    }
}

/// Configuration shared by the decoder, encoder and debug sink
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Verbosity gating container dumps and debug snapshots
    pub verbosity: Verbosity,
    /// Largest accepted width or height of a loaded image; `None` disables the check
    pub max_dimension: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::None,
            max_dimension: Some(65535),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    verbosity: Option<Verbosity>,
    max_dimension: Option<Option<u32>>,
}

impl PipelineConfigBuilder {
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    pub fn max_dimension(mut self, max: Option<u32>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            verbosity: self.verbosity.unwrap_or(default.verbosity),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .verbosity(Verbosity::More)
            .max_dimension(None)
            .build();

        assert_eq!(config.verbosity, Verbosity::More);
        assert_eq!(config.max_dimension, None);
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = PipelineConfig::builder().build();
        assert_eq!(config.verbosity, Verbosity::None);
        assert_eq!(config.max_dimension, Some(65535));
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::Quiet < Verbosity::None);
        assert!(Verbosity::More < Verbosity::DebugSave);
        assert!(!Verbosity::Debug.saves_debug_images());
        assert!(Verbosity::DebugSave.saves_debug_images());
        assert!(Verbosity::More.dumps_containers());
        assert!(!Verbosity::Normal.dumps_containers());
    }

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("debug-save".parse::<Verbosity>(), Ok(Verbosity::DebugSave));
        assert_eq!("MORE".parse::<Verbosity>(), Ok(Verbosity::More));
        assert!("loud".parse::<Verbosity>().is_err());
        assert_eq!(Verbosity::from_occurrences(2), Verbosity::More);
        assert_eq!(Verbosity::from_occurrences(9), Verbosity::DebugSave);
    }
}
