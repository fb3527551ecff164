//! Geometric primitives for node placement.
//!
//! - [`Point`] - A 2D coordinate in graph space
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Strata uses a screen-like coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Layered layouts grow along +Y, so a lower level number is drawn above a
//! higher one.

use serde::{Deserialize, Serialize};

/// A 2D point representing a node position in graph coordinate space.
///
/// # Examples
///
/// ```
/// # use strata_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Euclidean length of the vector from the origin to this point
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both coordinates by `factor`
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned bounding box.
///
/// Used to reframe the viewport after a layout when the `fit` flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Computes the smallest box containing every point, or `None` for an empty input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use strata_core::geometry::{Bounds, Point};
    /// let bounds = Bounds::from_points([Point::new(0.0, 5.0), Point::new(10.0, -5.0)]).unwrap();
    /// assert_eq!(bounds.width(), 10.0);
    /// assert_eq!(bounds.height(), 10.0);
    /// assert!(Bounds::from_points([]).is_none());
    /// ```
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the box
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(3.0, 4.0);

        assert_approx_eq!(f32, p.hypot(), 5.0);
        assert_eq!(p.add_point(Point::new(1.0, 1.0)), Point::new(4.0, 5.0));
        assert_eq!(p.sub_point(Point::new(1.0, 1.0)), Point::new(2.0, 3.0));
        assert_eq!(p.scale(2.0), Point::new(6.0, 8.0));
        assert_eq!(p.with_y(0.0), Point::new(3.0, 0.0));
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f32::NAN, 2.0).is_finite());
        assert!(!Point::new(0.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = Bounds::from_points([
            Point::new(-10.0, 0.0),
            Point::new(30.0, 20.0),
            Point::new(0.0, -20.0),
        ])
        .unwrap();

        assert_approx_eq!(f32, bounds.min_x(), -10.0);
        assert_approx_eq!(f32, bounds.max_x(), 30.0);
        assert_approx_eq!(f32, bounds.min_y(), -20.0);
        assert_approx_eq!(f32, bounds.max_y(), 20.0);
        assert_approx_eq!(f32, bounds.width(), 40.0);
        assert_approx_eq!(f32, bounds.height(), 40.0);
        assert_eq!(bounds.center(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_bounds_single_point_is_degenerate() {
        let bounds = Bounds::from_points([Point::new(5.0, 5.0)]).unwrap();
        assert_approx_eq!(f32, bounds.width(), 0.0);
        assert_approx_eq!(f32, bounds.height(), 0.0);
    }
}
