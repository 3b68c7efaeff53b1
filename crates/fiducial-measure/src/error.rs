use std::path::PathBuf;

use fiducial_measure_metrology::CalibrationError;
use fiducial_measure_segment::SegmentationError;

use crate::{ConfigError, RecordingError, SourceError};

/// Errors returned by the end-to-end pipelines.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error("failed to write annotated image {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
