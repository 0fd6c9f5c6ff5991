//! Axis-aligned spatial extent

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box in georeferenced coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Compare corner by corner with an absolute tolerance
    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        (self.min_x - other.min_x).abs() <= tolerance
            && (self.min_y - other.min_y).abs() <= tolerance
            && (self.max_x - other.max_x).abs() <= tolerance
            && (self.max_y - other.max_y).abs() <= tolerance
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(0.0, 1e-9, 10.0, 10.0);
        let c = Extent::new(0.0, 0.0, 11.0, 10.0);
        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&c, 1e-6));
    }

    #[test]
    fn test_display() {
        let e = Extent::new(0.0, -2.5, 4.0, 1.0);
        assert_eq!(e.to_string(), "[0, -2.5, 4, 1]");
        assert_eq!(e.width(), 4.0);
        assert_eq!(e.height(), 3.5);
    }
}
