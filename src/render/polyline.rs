//! Screen-space projection of a record's samples.

use serde::Serialize;

/// Vertical gain as a share of the drawing height.
const DEFAULT_GAIN_RATIO: f64 = 0.3;

/// One projected vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal position, left edge at zero.
    pub x: f64,
    /// Vertical position, top edge at zero.
    pub y: f64,
}

/// Maps a sample sequence onto a `width × height` surface.
///
/// Sample `i` of `N` lands at `x = (i / N) * width` and
/// `y = height / 2 - sample * gain`, so positive deflections point up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceProjection {
    /// Surface width.
    pub width: f64,
    /// Surface height.
    pub height: f64,
    /// Sample-to-pixel vertical scale.
    pub gain: f64,
}

impl TraceProjection {
    /// Creates a projection with the default gain for the surface.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            gain: height * DEFAULT_GAIN_RATIO,
        }
    }

    /// Scales the gain by a viewer amplitude factor.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.gain *= amplitude;
        self
    }

    /// Projects one sample.
    #[inline]
    pub fn point(&self, index: usize, len: usize, sample: f32) -> Point {
        let x = if len == 0 {
            0.0
        } else {
            index as f64 / len as f64 * self.width
        };
        Point {
            x,
            y: self.height / 2.0 - sample as f64 * self.gain,
        }
    }

    /// Projects a whole trace, in sample order.
    pub fn project(&self, samples: &[f32]) -> Vec<Point> {
        let len = samples.len();
        samples
            .iter()
            .enumerate()
            .map(|(i, &s)| self.point(i, len, s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_formula() {
        let projection = TraceProjection {
            width: 100.0,
            height: 50.0,
            gain: 10.0,
        };
        let points = projection.project(&[0.0, 1.0, -1.0, 0.5]);

        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point { x: 0.0, y: 25.0 });
        assert_eq!(points[1], Point { x: 25.0, y: 15.0 });
        assert_eq!(points[2], Point { x: 50.0, y: 35.0 });
        assert_eq!(points[3], Point { x: 75.0, y: 20.0 });
    }

    #[test]
    fn test_default_gain() {
        let projection = TraceProjection::new(800.0, 200.0).with_amplitude(2.0);
        assert!((projection.gain - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_trace() {
        assert!(TraceProjection::new(10.0, 10.0).project(&[]).is_empty());
    }

    #[test]
    fn test_x_strictly_increasing() {
        let samples = vec![0.0f32; 1250];
        let points = TraceProjection::new(640.0, 120.0).project(&samples);
        assert!(points.windows(2).all(|w| w[0].x < w[1].x));
        assert!(points.last().unwrap().x < 640.0);
    }
}
