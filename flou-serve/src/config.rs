use std::path::{Path, PathBuf};

use flou::io::jpeg::DEFAULT_JPEG_QUALITY;
use serde::Deserialize;

/// Server settings, loaded from a JSON file and then overridden by flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub kernel_size: usize,
    /// Largest kernel side a request may ask for.
    pub max_kernel_size: usize,
    pub sigma: f64,
    pub jpeg_quality: u8,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upload_dir: PathBuf::from("./images"),
            max_upload_bytes: 10 << 20,
            kernel_size: 5,
            max_kernel_size: 101,
            sigma: 10.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

impl ServeConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Per-request overrides of the blur parameters, taken from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct BlurQuery {
    pub kernel_size: Option<usize>,
    pub sigma: Option<f64>,
}

impl BlurQuery {
    pub fn resolve(&self, config: &ServeConfig) -> (usize, f64) {
        (
            self.kernel_size.unwrap_or(config.kernel_size),
            self.sigma.unwrap_or(config.sigma),
        )
    }
}
