use serde::{Deserialize, Serialize};

/// Rejected pixels-per-unit value (zero, negative or non-finite).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("scale ratio must be positive and finite (got {0})")]
pub struct InvalidScaleRatio(pub f64);

/// Pixels per physical unit. Always strictly positive and finite.
///
/// Pixel lengths are converted to physical units by *dividing* by the ratio.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ScaleRatio(f64);

impl ScaleRatio {
    pub fn new(px_per_unit: f64) -> Result<Self, InvalidScaleRatio> {
        if px_per_unit.is_finite() && px_per_unit > 0.0 {
            Ok(Self(px_per_unit))
        } else {
            Err(InvalidScaleRatio(px_per_unit))
        }
    }

    #[inline]
    pub fn px_per_unit(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn units_per_px(self) -> f64 {
        1.0 / self.0
    }

    /// Convert a pixel length into physical units.
    #[inline]
    pub fn to_units(self, px: f64) -> f64 {
        px / self.0
    }
}

impl TryFrom<f64> for ScaleRatio {
    type Error = InvalidScaleRatio;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScaleRatio> for f64 {
    fn from(value: ScaleRatio) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_values() {
        for v in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(ScaleRatio::new(v).is_err(), "{v} should be rejected");
        }
    }

    #[test]
    fn converts_pixels_to_units() {
        let r = ScaleRatio::new(4.0).unwrap();
        assert_eq!(r.to_units(100.0), 25.0);
        assert_eq!(r.units_per_px(), 0.25);
    }

    #[test]
    fn serde_validates_on_the_way_in() {
        let r: ScaleRatio = serde_json::from_str("2.5").unwrap();
        assert_eq!(r.px_per_unit(), 2.5);
        assert!(serde_json::from_str::<ScaleRatio>("0.0").is_err());
        assert_eq!(serde_json::to_string(&r).unwrap(), "2.5");
    }
}
