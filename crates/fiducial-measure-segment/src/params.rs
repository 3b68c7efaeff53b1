use serde::{Deserialize, Serialize};

use crate::SegmentationError;

/// Which kind of object the segmenter is tuned for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Arbitrary objects measured with an oriented bounding box.
    #[default]
    Object,
    /// Roughly circular cross-sections (tree trunks, pipes) measured with an
    /// enclosing circle.
    Trunk,
}

/// General-object segmentation: mean-based adaptive threshold + area filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSegmentParams {
    /// Side of the square neighbourhood used for the local mean (odd, >= 3).
    pub threshold_block_size: u32,
    /// Subtracted from the local mean before comparing.
    pub threshold_constant: i32,
    /// Contours must be strictly larger than this (px²).
    pub min_object_area: f64,
}

impl Default for ObjectSegmentParams {
    fn default() -> Self {
        Self {
            threshold_block_size: 19,
            threshold_constant: 5,
            min_object_area: 1000.0,
        }
    }
}

/// Trunk segmentation: blur, Gaussian adaptive threshold, closing, then area
/// and circularity filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkSegmentParams {
    /// Pre-threshold Gaussian blur kernel side (odd). `0` disables the blur.
    pub blur_kernel: u32,
    pub threshold_block_size: u32,
    pub threshold_constant: i32,
    /// Square structuring element side for the closing (odd). `0` or `1`
    /// disables it.
    pub close_kernel: u32,
    /// Contours must be strictly larger than this (px²).
    pub min_trunk_area: f64,
    /// Contours must be strictly rounder than this.
    pub circularity_threshold: f64,
}

impl Default for TrunkSegmentParams {
    fn default() -> Self {
        Self {
            blur_kernel: 15,
            threshold_block_size: 21,
            threshold_constant: 2,
            close_kernel: 7,
            min_trunk_area: 5000.0,
            circularity_threshold: 0.4,
        }
    }
}

/// Parameters for both segmentation modes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterParams {
    pub object: ObjectSegmentParams,
    pub trunk: TrunkSegmentParams,
}

fn check_block(name: &'static str, block: u32) -> Result<(), SegmentationError> {
    if block < 3 || block % 2 == 0 {
        return Err(SegmentationError::InvalidParams {
            name,
            reason: format!("block size must be odd and >= 3 (got {block})"),
        });
    }
    Ok(())
}

fn check_optional_odd(name: &'static str, kernel: u32) -> Result<(), SegmentationError> {
    if kernel > 1 && kernel % 2 == 0 {
        return Err(SegmentationError::InvalidParams {
            name,
            reason: format!("kernel size must be odd (got {kernel})"),
        });
    }
    Ok(())
}

fn check_non_negative(name: &'static str, v: f64) -> Result<(), SegmentationError> {
    if !v.is_finite() || v < 0.0 {
        return Err(SegmentationError::InvalidParams {
            name,
            reason: format!("must be finite and >= 0 (got {v})"),
        });
    }
    Ok(())
}

impl ObjectSegmentParams {
    pub fn validate(&self) -> Result<(), SegmentationError> {
        check_block("object.threshold_block_size", self.threshold_block_size)?;
        check_non_negative("object.min_object_area", self.min_object_area)
    }
}

impl TrunkSegmentParams {
    pub fn validate(&self) -> Result<(), SegmentationError> {
        check_optional_odd("trunk.blur_kernel", self.blur_kernel)?;
        check_block("trunk.threshold_block_size", self.threshold_block_size)?;
        check_optional_odd("trunk.close_kernel", self.close_kernel)?;
        if self.close_kernel > 511 {
            return Err(SegmentationError::InvalidParams {
                name: "trunk.close_kernel",
                reason: format!("kernel size must be <= 511 (got {})", self.close_kernel),
            });
        }
        check_non_negative("trunk.min_trunk_area", self.min_trunk_area)?;
        check_non_negative("trunk.circularity_threshold", self.circularity_threshold)
    }
}

impl SegmenterParams {
    pub fn validate(&self) -> Result<(), SegmentationError> {
        self.object.validate()?;
        self.trunk.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SegmenterParams::default().validate().unwrap();
    }

    #[test]
    fn even_block_is_rejected() {
        let params = ObjectSegmentParams {
            threshold_block_size: 18,
            ..ObjectSegmentParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SegmentationError::InvalidParams {
                name: "object.threshold_block_size",
                ..
            })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: SegmenterParams =
            serde_json::from_str(r#"{"trunk": {"min_trunk_area": 800.0}}"#).unwrap();
        assert_eq!(params.trunk.min_trunk_area, 800.0);
        assert_eq!(params.trunk.threshold_block_size, 21);
        assert_eq!(params.object, ObjectSegmentParams::default());
    }
}
