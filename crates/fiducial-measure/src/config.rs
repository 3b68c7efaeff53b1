//! Single configuration shared by the still-image and continuous pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use fiducial_measure_metrology::{MarkerSelection, ScaleCalibrator, DEFAULT_WINDOW_SIZE};
use fiducial_measure_segment::{SegmentationError, SegmenterParams};
use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating a [`MeasureConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Segment(#[from] SegmentationError),
}

/// The physical marker printed next to the objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerParams {
    /// Side of the square marker in physical units (e.g. cm).
    pub side_length: f64,
    /// Which detection calibrates a frame holding several markers.
    pub selection: MarkerSelection,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            side_length: 23.5,
            selection: MarkerSelection::First,
        }
    }
}

/// Measurement pipeline configuration.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub marker: MarkerParams,
    pub segment: SegmenterParams,
    /// Samples per moving-average window in continuous capture.
    pub smoothing_window_size: usize,
    /// Still images larger than this on either side are downscaled first.
    pub max_dimension: Option<u32>,
    /// Last-resort pixels-per-unit for trunk measurement without any marker.
    pub approximate_px_per_unit: f64,
    /// Prepended to the input file name for the annotated export.
    pub output_prefix: String,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            marker: MarkerParams::default(),
            segment: SegmenterParams::default(),
            smoothing_window_size: DEFAULT_WINDOW_SIZE,
            max_dimension: Some(1200),
            approximate_px_per_unit: 900.0 / 100.0,
            output_prefix: "medidas_".to_string(),
        }
    }
}

impl MeasureConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.marker.side_length.is_finite() || self.marker.side_length <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "marker.side_length",
                reason: format!("must be positive (got {})", self.marker.side_length),
            });
        }
        if self.smoothing_window_size == 0 {
            return Err(ConfigError::Invalid {
                name: "smoothing_window_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_dimension == Some(0) {
            return Err(ConfigError::Invalid {
                name: "max_dimension",
                reason: "must be positive when set".to_string(),
            });
        }
        if !self.approximate_px_per_unit.is_finite() || self.approximate_px_per_unit <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "approximate_px_per_unit",
                reason: format!("must be positive (got {})", self.approximate_px_per_unit),
            });
        }
        self.segment.validate()?;
        Ok(())
    }

    pub fn calibrator(&self) -> ScaleCalibrator {
        ScaleCalibrator::new(self.marker.side_length, self.marker.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cfg = MeasureConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.calibrator().known_real_perimeter(), 94.0);
        assert_eq!(cfg.segment.object.min_object_area, 1000.0);
        assert_eq!(cfg.segment.trunk.min_trunk_area, 5000.0);
        assert_eq!(cfg.smoothing_window_size, 10);
        assert_eq!(cfg.approximate_px_per_unit, 9.0);
    }

    #[test]
    fn partial_json_overrides() {
        let cfg: MeasureConfig = serde_json::from_str(
            r#"{"marker": {"side_length": 10.0, "selection": "lowest_id"}, "max_dimension": null}"#,
        )
        .unwrap();
        assert_eq!(cfg.marker.side_length, 10.0);
        assert_eq!(cfg.marker.selection, MarkerSelection::LowestId);
        assert_eq!(cfg.max_dimension, None);
        assert_eq!(cfg.output_prefix, "medidas_");
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = MeasureConfig {
            smoothing_window_size: 0,
            ..MeasureConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                name: "smoothing_window_size",
                ..
            })
        ));
        cfg.smoothing_window_size = 5;
        cfg.segment.object.threshold_block_size = 4;
        assert!(matches!(cfg.validate(), Err(ConfigError::Segment(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MeasureConfig::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
