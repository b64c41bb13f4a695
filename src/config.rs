//! Configuration Management

use crate::cli::Cli;
use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use negtrack_experiment::ExperimentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tried in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub experiment: ExperimentConfig,
    pub display: DisplayConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub font_path: Option<PathBuf>,
    pub fullscreen: bool,
    /// Pixel size of the revealed word
    pub word_size: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            fullscreen: true,
            word_size: 48.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("experiment_results.json"),
        }
    }
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Command-line flags win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(variant) = cli.variant {
            self.experiment.variant = variant;
        }
        if let Some(seed) = cli.seed {
            self.experiment.seed = Some(seed);
        }
        if let Some(output) = &cli.output {
            self.output.path = output.clone();
        }
        if let Some(font) = &cli.font {
            self.display.font_path = Some(font.clone());
        }
        if cli.preview {
            self.experiment.preview = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        if self.display.word_size.is_nan() || self.display.word_size <= 0.0 {
            return Err(anyhow!("display.word_size must be positive"));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(anyhow!("output.path must not be empty"));
        }
        Ok(())
    }
}

impl DisplayConfig {
    /// Loads the configured font, or the first system font found.
    pub fn load_font(&self) -> Result<FontVec> {
        if let Some(path) = &self.font_path {
            return read_font(path);
        }
        let path = SYSTEM_FONTS
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .ok_or_else(|| anyhow!("no system font found, pass one with --font"))?;
        read_font(path)
    }
}

fn read_font(path: &Path) -> Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| anyhow!("invalid font {}: {e}", path.display()))?;
    debug!(path = %path.display(), "font loaded");
    Ok(font)
}
