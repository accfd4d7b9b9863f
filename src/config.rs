use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::layout::{LayoutError, LayoutRegistry};
use crate::output::OutputShape;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid WEBPRO_SHAPE: {0}")]
    InvalidShape(String),

    #[error("Failed to load layouts: {0}")]
    Layouts(#[from] LayoutError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    /// Output file (workbook shapes) or directory (tables); shape default when unset
    pub output: Option<PathBuf>,
    pub pattern: String,
    pub shape: OutputShape,
    /// JSON layout registry replacing the built-in one
    pub layouts: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input_files"),
            output: None,
            pattern: "*.xlsx".to_string(),
            shape: OutputShape::default(),
            layouts: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            input_dir: env::var("WEBPRO_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output: env::var("WEBPRO_OUTPUT").ok().map(PathBuf::from),
            pattern: env::var("WEBPRO_PATTERN").unwrap_or(defaults.pattern),
            shape: match env::var("WEBPRO_SHAPE") {
                Ok(shape) => shape.parse().map_err(ConfigError::InvalidShape)?,
                Err(_) => defaults.shape,
            },
            layouts: env::var("WEBPRO_LAYOUTS").ok().map(PathBuf::from),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.shape.default_output())
    }

    /// The layout registry to run: the JSON file if configured, else the shape's built-in one
    pub fn registry(&self) -> Result<LayoutRegistry, ConfigError> {
        match &self.layouts {
            Some(path) => Ok(LayoutRegistry::from_json_file(path)?),
            None => Ok(self.shape.builtin_layouts()),
        }
    }
}
