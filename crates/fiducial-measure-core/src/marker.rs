use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One fiducial marker found by an external detector.
///
/// Corners follow the detector's fixed winding (ArUco: TL, TR, BR, BL), so
/// edge 0→1 is the marker's top side and edge 1→2 its right side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub corners: [Point2<f32>; 4],
    #[serde(default)]
    pub id: Option<u32>,
}

impl MarkerDetection {
    pub fn new(corners: [Point2<f32>; 4], id: Option<u32>) -> Self {
        Self { corners, id }
    }

    /// Lengths of the four closed-polygon edges, starting with corner 0→1.
    pub fn edge_lengths(&self) -> [f64; 4] {
        std::array::from_fn(|i| {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
    }

    /// Closed perimeter in pixels.
    pub fn perimeter_px(&self) -> f64 {
        self.edge_lengths().iter().sum()
    }

    /// Mean of the corners.
    pub fn center(&self) -> Point2<f32> {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }
}
