//! Export targets and input resolution.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deployment format produced by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Browser runtime graph (TensorFlow.js).
    WebGraph,
    /// On-device inference (TensorFlow Lite).
    MobileInference,
}

impl ExportFormat {
    /// Identifier the exporter expects in `format=`.
    pub fn framework_id(&self) -> &'static str {
        match self {
            Self::WebGraph => "tfjs",
            Self::MobileInference => "tflite",
        }
    }

    /// Suffix the exporter appends to the checkpoint stem for its output directory.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::WebGraph => "_web_model",
            Self::MobileInference => "_saved_model",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebGraph => "web",
            Self::MobileInference => "mobile",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown export format {0:?} (expected web, tfjs, mobile or tflite)")]
pub struct ParseFormatError(String);

impl FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "tfjs" => Ok(Self::WebGraph),
            "mobile" | "tflite" => Ok(Self::MobileInference),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

/// Model input resolution, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

impl ImageSize {
    pub const fn square(side: u32) -> Self {
        Self {
            height: side,
            width: side,
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::square(640)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.height, self.width)
    }
}

#[derive(Debug, Error)]
#[error("invalid image size {0:?}: expected N, H,W or HxW with non-zero dimensions")]
pub struct ParseImageSizeError(String);

impl FromStr for ImageSize {
    type Err = ParseImageSizeError;

    /// Accepts `640`, `640,480` or `640x480`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseImageSizeError(s.to_string());
        let dim = |part: &str| match part.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(err()),
            Ok(v) => Ok(v),
        };

        let parts: Vec<&str> = s.split([',', 'x', 'X']).collect();
        match parts.as_slice() {
            [side] => Ok(Self::square(dim(*side)?)),
            [h, w] => Ok(Self {
                height: dim(*h)?,
                width: dim(*w)?,
            }),
            _ => Err(err()),
        }
    }
}
