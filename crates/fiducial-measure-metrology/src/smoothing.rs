//! Moving-average smoothing for continuous capture.

use std::collections::VecDeque;

use crate::MarkerSize;

pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Fixed-capacity FIFO of scalar samples with a running mean.
///
/// The window never holds more than `capacity` samples; pushing past it
/// evicts exactly the oldest one.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothingWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl SmoothingWindow {
    /// A zero capacity is raised to one (no smoothing).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append `sample`, evict the oldest if over capacity, return the mean.
    pub fn push(&mut self, sample: f64) -> f64 {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Independent width and height windows for the calibration marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerSizeSmoother {
    width: SmoothingWindow,
    height: SmoothingWindow,
}

impl MarkerSizeSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            width: SmoothingWindow::new(capacity),
            height: SmoothingWindow::new(capacity),
        }
    }

    /// Push one per-frame marker size and return the smoothed size.
    pub fn push(&mut self, size: MarkerSize) -> MarkerSize {
        MarkerSize {
            width: self.width.push(size.width),
            height: self.height.push(size.height),
        }
    }

    pub fn current(&self) -> Option<MarkerSize> {
        Some(MarkerSize {
            width: self.width.mean()?,
            height: self.height.mean()?,
        })
    }

    pub fn width(&self) -> &SmoothingWindow {
        &self.width
    }

    pub fn height(&self) -> &SmoothingWindow {
        &self.height
    }
}

/// `known_side / smoothed_side`: multiplies per-frame measurements to
/// compensate drift of the raw ratio. `None` for a non-positive or non-finite
/// smoothed side.
pub fn correction_factor(known_side: f64, smoothed_side: f64) -> Option<f64> {
    if !smoothed_side.is_finite() || smoothed_side <= 0.0 {
        return None;
    }
    let factor = known_side / smoothed_side;
    factor.is_finite().then_some(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_covers_only_the_last_capacity_samples() {
        let mut w = SmoothingWindow::new(10);
        for _ in 0..15 {
            w.push(1.0);
        }
        let avg = w.push(100.0);
        assert_eq!(w.len(), 10);
        assert_relative_eq!(avg, (9.0 * 1.0 + 100.0) / 10.0);
        assert_relative_eq!(avg, 10.9);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut w = SmoothingWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert_eq!(w.samples().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_relative_eq!(w.mean().unwrap(), 3.0);
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut w = SmoothingWindow::default();
        assert!(w.mean().is_none());
        w.push(2.0);
        assert_relative_eq!(w.push(4.0), 3.0);
        assert_eq!(w.capacity(), DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn zero_capacity_means_no_smoothing() {
        let mut w = SmoothingWindow::new(0);
        w.push(5.0);
        assert_relative_eq!(w.push(7.0), 7.0);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn marker_windows_are_independent() {
        let mut s = MarkerSizeSmoother::new(2);
        s.push(MarkerSize {
            width: 20.0,
            height: 30.0,
        });
        let avg = s.push(MarkerSize {
            width: 24.0,
            height: 30.0,
        });
        assert_relative_eq!(avg.width, 22.0);
        assert_relative_eq!(avg.height, 30.0);
        assert_eq!(s.current(), Some(avg));
    }

    #[test]
    fn correction_factor_guards_division() {
        assert_relative_eq!(correction_factor(23.5, 23.5).unwrap(), 1.0);
        assert_relative_eq!(correction_factor(23.5, 47.0).unwrap(), 0.5);
        assert!(correction_factor(23.5, 0.0).is_none());
        assert!(correction_factor(23.5, f64::NAN).is_none());
    }
}
