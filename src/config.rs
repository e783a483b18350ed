//! Configuration for a conversion run

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Default JPEG quality
pub const DEFAULT_QUALITY: u8 = 92;

/// Lowest accepted JPEG quality
pub const MIN_QUALITY: u8 = 1;

/// Highest accepted JPEG quality
pub const MAX_QUALITY: u8 = 100;

/// Extension given to every converted file
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Chroma subsampling used by the JPEG encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChromaSubsampling {
    /// Full chroma resolution
    #[serde(rename = "444")]
    Yuv444,
    /// Half horizontal chroma resolution
    #[serde(rename = "422")]
    Yuv422,
    /// Half horizontal and vertical chroma resolution
    #[default]
    #[serde(rename = "420")]
    Yuv420,
}

impl ChromaSubsampling {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChromaSubsampling::Yuv444 => "4:4:4",
            ChromaSubsampling::Yuv422 => "4:2:2",
            ChromaSubsampling::Yuv420 => "4:2:0",
        }
    }
}

/// How embedded color profiles are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Convert pixels to sRGB and embed the sRGB profile
    #[default]
    ConvertToStandard,
    /// Embed the source profile unchanged, no pixel transform
    PreserveSource,
    /// Embed no profile at all
    Strip,
}

impl ColorMode {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::ConvertToStandard => "convert-to-standard",
            ColorMode::PreserveSource => "preserve-source",
            ColorMode::Strip => "strip",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared read-only by every worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// JPEG quality (1-100)
    pub quality: u8,

    /// Chroma subsampling mode
    pub subsampling: ChromaSubsampling,

    /// Use optimized Huffman tables
    pub optimize: bool,

    /// Write a progressive JPEG
    pub progressive: bool,

    /// Replace an existing destination instead of skipping the item
    pub overwrite: bool,

    /// Color profile handling
    pub color_mode: ColorMode,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            subsampling: ChromaSubsampling::default(),
            optimize: true,
            progressive: true,
            overwrite: false,
            color_mode: ColorMode::default(),
        }
    }
}

impl ConversionConfig {
    /// Clamp a requested quality into the accepted range
    pub fn clamp_quality(quality: u8) -> u8 {
        quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }
}

/// Configuration for a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Files or directories to convert
    pub roots: Vec<PathBuf>,

    /// Source extensions to include (lowercase, without dot)
    pub extensions: HashSet<String>,

    /// Number of parallel workers
    /// 0 means auto-detect (available parallelism)
    pub num_workers: usize,

    /// Per-item conversion settings
    pub conversion: ConversionConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: Self::default_extensions(),
            num_workers: 0,
            conversion: ConversionConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create a config builder
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    /// Get the default HEIF family extensions
    pub fn default_extensions() -> HashSet<String> {
        ["heic", "heif", "heics", "heifs"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get the effective number of workers
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        } else {
            self.num_workers
        }
    }
}

/// Builder for RunConfig
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root paths
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.roots = roots;
        self
    }

    /// Add a root path
    pub fn add_root(mut self, root: PathBuf) -> Self {
        self.config.roots.push(root);
        self
    }

    /// Set the extensions whitelist
    pub fn extensions(mut self, extensions: HashSet<String>) -> Self {
        self.config.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Set the number of workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the JPEG quality, clamped to 1-100
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.conversion.quality = ConversionConfig::clamp_quality(quality);
        self
    }

    /// Set the chroma subsampling
    pub fn subsampling(mut self, subsampling: ChromaSubsampling) -> Self {
        self.config.conversion.subsampling = subsampling;
        self
    }

    /// Enable or disable optimized Huffman tables
    pub fn optimize(mut self, enabled: bool) -> Self {
        self.config.conversion.optimize = enabled;
        self
    }

    /// Enable or disable progressive encoding
    pub fn progressive(mut self, enabled: bool) -> Self {
        self.config.conversion.progressive = enabled;
        self
    }

    /// Enable or disable overwriting existing destinations
    pub fn overwrite(mut self, enabled: bool) -> Self {
        self.config.conversion.overwrite = enabled;
        self
    }

    /// Set the color profile handling
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.config.conversion.color_mode = mode;
        self
    }

    /// Build the config
    pub fn build(self) -> RunConfig {
        self.config
    }
}
