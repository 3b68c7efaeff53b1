//! Local (adaptive) thresholding.

use image::{GrayImage, Luma};
use imageproc::filter::{box_filter, gaussian_blur_f32};

/// Neighbourhood statistic used as the per-pixel threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdaptiveMethod {
    /// Unweighted mean over the `block × block` window.
    Mean,
    /// Gaussian-weighted mean with the sigma a `block`-sized kernel implies.
    Gaussian,
}

/// Sigma implied by a Gaussian kernel of side `kernel`:
/// `0.3 * ((kernel - 1) / 2 - 1) + 0.8`.
pub fn gaussian_sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Inverted adaptive threshold: a pixel is foreground (255) iff it is at
/// least `constant` levels darker than its local statistic, i.e.
/// `src <= local - constant`.
///
/// Image borders replicate edge pixels. `block` must be odd and >= 3; this is
/// checked by the segmenter parameters, not here.
pub fn adaptive_threshold_inv(
    gray: &GrayImage,
    block: u32,
    constant: i32,
    method: AdaptiveMethod,
) -> GrayImage {
    let radius = block / 2;
    let local = match method {
        AdaptiveMethod::Mean => box_filter(gray, radius, radius),
        AdaptiveMethod::Gaussian => gaussian_blur_f32(gray, gaussian_sigma_for_kernel(block)),
    };

    let mut out = GrayImage::new(gray.width(), gray.height());
    for ((dst, src), mean) in out.pixels_mut().zip(gray.pixels()).zip(local.pixels()) {
        let on = i32::from(src[0]) <= i32::from(mean[0]) - constant;
        *dst = Luma([if on { 255 } else { 0 }]);
    }
    out
}
