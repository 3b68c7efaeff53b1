//! Marker detection seam.
//!
//! Square-marker decoding happens outside this crate. A detector only has to
//! report the four corners (and optionally the id) of each marker it sees;
//! [`MarkerRecording`] replays detections saved as JSON.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use fiducial_measure_core::MarkerDetection;
use image::RgbImage;
use serde::{Deserialize, Serialize};

pub trait MarkerDetector {
    /// Markers visible in `frame`, in detector order.
    fn detect(&mut self, frame: &RgbImage) -> Vec<MarkerDetection>;
}

impl<F> MarkerDetector for F
where
    F: FnMut(&RgbImage) -> Vec<MarkerDetection>,
{
    fn detect(&mut self, frame: &RgbImage) -> Vec<MarkerDetection> {
        self(frame)
    }
}

/// Detector that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMarkers;

impl MarkerDetector for NoMarkers {
    fn detect(&mut self, _frame: &RgbImage) -> Vec<MarkerDetection> {
        Vec::new()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RecordingError {
    #[error("failed to read marker recording {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse marker recording {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-frame marker detections, frame 0 first.
///
/// ```json
/// {"frames": [[{"corners": [[10, 10], [110, 10], [110, 110], [10, 110]], "id": 7}], []]}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecording {
    pub frames: Vec<Vec<MarkerDetection>>,
}

impl MarkerRecording {
    pub fn from_json_file(path: &Path) -> Result<Self, RecordingError> {
        let raw = fs::read_to_string(path).map_err(|source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RecordingError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Recording of a single still image.
    pub fn single(detections: Vec<MarkerDetection>) -> Self {
        Self {
            frames: vec![detections],
        }
    }

    /// Detections of frame `index`; frames beyond the recording have none.
    pub fn frame(&self, index: usize) -> &[MarkerDetection] {
        self.frames.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_detector(self) -> RecordedDetector {
        RecordedDetector {
            frames: self.frames.into(),
        }
    }
}

/// Replays a [`MarkerRecording`] one frame per `detect` call.
#[derive(Clone, Debug, Default)]
pub struct RecordedDetector {
    frames: VecDeque<Vec<MarkerDetection>>,
}

impl MarkerDetector for RecordedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Vec<MarkerDetection> {
        self.frames.pop_front().unwrap_or_default()
    }
}
