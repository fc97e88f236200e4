//! CLI configuration file

use serde::{Deserialize, Serialize};
use std::path::Path;

use stripcode::{EncoderConfig, Protocol};
use stripcode_raster::{RenderOptions, SampleOptions};

/// Defaults applied to every subcommand; flags override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Horizontal pixel budget per chunk.
    pub width_px: u32,
    /// Strip height in pixels.
    pub height_px: u32,
    /// Protocol revision for encoding.
    pub protocol: Protocol,
    /// Geometry of rendered PNGs.
    pub render: RenderOptions,
    /// Thresholds used when scanning images.
    pub sample: SampleOptions,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            width_px: 2000,
            height_px: 32,
            protocol: Protocol::Enhanced,
            render: RenderOptions::with_margin_cells(4, 2),
            sample: SampleOptions::default(),
        }
    }
}

impl StripConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => Ok(toml::from_str(&contents)?),
            "json" => Ok(serde_json::from_str(&contents)?),
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    /// Load `path` if given and present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                tracing::warn!("Config file not found, using defaults: {}", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Encoder configuration for this protocol.
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::with_protocol(self.protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_values() {
        let config = StripConfig::default();
        assert_eq!(config.width_px, 2000);
        assert_eq!(config.height_px, 32);
        assert_eq!(config.protocol, Protocol::Enhanced);
        assert_eq!(config.render, RenderOptions { cell_px: 4, margin_px: 8 });
        assert_eq!(config.sample.dark_threshold, 128);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
width_px = 640
protocol = "base"

[render]
cell_px = 6
"#
        )
        .unwrap();
        let config = StripConfig::from_file(file.path()).unwrap();
        assert_eq!(config.width_px, 640);
        assert_eq!(config.height_px, 32);
        assert_eq!(config.protocol, Protocol::Base);
        assert_eq!(config.render.cell_px, 6);
        assert_eq!(config.render.margin_px, 8);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"height_px": 16, "sample": {{"dark_threshold": 100}}}}"#).unwrap();
        let config = StripConfig::from_file(file.path()).unwrap();
        assert_eq!(config.height_px, 16);
        assert_eq!(config.sample.dark_threshold, 100);
        assert_eq!(config.sample.alpha_threshold, 50);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".yaml").unwrap();
        assert!(StripConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StripConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, StripConfig::default());
        assert_eq!(StripConfig::load(None).unwrap(), StripConfig::default());
    }
}
