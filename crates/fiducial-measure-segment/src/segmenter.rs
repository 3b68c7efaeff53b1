use fiducial_measure_core::Contour;
use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::threshold::{adaptive_threshold_inv, gaussian_sigma_for_kernel, AdaptiveMethod};
use crate::{SegmentMode, SegmentationError, SegmenterParams};

/// Splits a frame into foreground contours against a homogeneous background.
///
/// Holds no per-frame state: segmenting the same frame twice yields the same
/// contours.
#[derive(Clone, Debug)]
pub struct BackgroundSegmenter {
    mode: SegmentMode,
    params: SegmenterParams,
}

impl BackgroundSegmenter {
    pub fn new(mode: SegmentMode, params: SegmenterParams) -> Result<Self, SegmentationError> {
        params.validate()?;
        Ok(Self { mode, params })
    }

    pub fn objects() -> Self {
        Self {
            mode: SegmentMode::Object,
            params: SegmenterParams::default(),
        }
    }

    pub fn trunks() -> Self {
        Self {
            mode: SegmentMode::Trunk,
            params: SegmenterParams::default(),
        }
    }

    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Binary foreground mask (255 = foreground) the contours are traced from.
    pub fn foreground_mask(&self, frame: &RgbImage) -> Result<GrayImage, SegmentationError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(SegmentationError::InvalidFrame { width, height });
        }
        let gray = image::imageops::grayscale(frame);

        let mask = match self.mode {
            SegmentMode::Object => {
                let p = &self.params.object;
                adaptive_threshold_inv(
                    &gray,
                    p.threshold_block_size,
                    p.threshold_constant,
                    AdaptiveMethod::Mean,
                )
            }
            SegmentMode::Trunk => {
                let p = &self.params.trunk;
                let blurred = if p.blur_kernel > 1 {
                    gaussian_blur_f32(&gray, gaussian_sigma_for_kernel(p.blur_kernel))
                } else {
                    gray
                };
                let binary = adaptive_threshold_inv(
                    &blurred,
                    p.threshold_block_size,
                    p.threshold_constant,
                    AdaptiveMethod::Gaussian,
                );
                if p.close_kernel > 1 {
                    // LInf ball of radius k is a (2k+1)² square.
                    close(&binary, Norm::LInf, (p.close_kernel / 2) as u8)
                } else {
                    binary
                }
            }
        };
        Ok(mask)
    }

    /// Segment `frame` into filtered contours.
    ///
    /// Object mode keeps extraction order; trunk mode sorts by descending
    /// area so the largest candidate comes first.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(mode = ?self.mode, width = frame.width(), height = frame.height()))
    )]
    pub fn segment(&self, frame: &RgbImage) -> Result<Vec<Contour>, SegmentationError> {
        let mask = self.foreground_mask(frame)?;
        let raw = external_contours(&mask);
        let total = raw.len();

        let kept = match self.mode {
            SegmentMode::Object => {
                let min_area = self.params.object.min_object_area;
                raw.into_iter().filter(|c| c.area() > min_area).collect()
            }
            SegmentMode::Trunk => {
                let p = &self.params.trunk;
                let mut kept: Vec<Contour> = raw
                    .into_iter()
                    .filter(|c| {
                        // Zero-perimeter contours have no circularity.
                        let Some(circularity) = c.circularity() else {
                            return false;
                        };
                        c.area() > p.min_trunk_area && circularity > p.circularity_threshold
                    })
                    .collect();
                kept.sort_by(|a, b| b.area().total_cmp(&a.area()));
                kept
            }
        };

        debug!(
            "segmented {} contours ({} kept, mode {:?})",
            total,
            kept.len(),
            self.mode
        );
        Ok(kept)
    }
}

/// Outer borders of the top-level foreground regions of `mask` (nonzero =
/// foreground). Holes and regions nested inside holes are dropped.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}
