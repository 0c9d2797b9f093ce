//! Closed integer polygons produced by the tracer.

/// Orientation of a traced boundary in y-down image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    /// Outer boundary of a selected region.
    Clockwise,
    /// Boundary of a hole inside a selected region.
    CounterClockwise,
    /// The turn count did not close to a full revolution.
    Unknown,
}

impl Winding {
    /// Classify a net turn count (+1 per clockwise quarter turn).
    pub fn from_turns(turns: i32) -> Self {
        match turns {
            4 => Winding::Clockwise,
            -4 => Winding::CounterClockwise,
            _ => Winding::Unknown,
        }
    }

    /// True for boundaries that add to the selection.
    #[inline]
    pub fn is_selection(self) -> bool {
        self == Winding::Clockwise
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Winding::Clockwise => "clockwise",
            Winding::CounterClockwise => "counter-clockwise",
            Winding::Unknown => "unknown",
        }
    }
}

/// A cyclic list of pixel coordinates.
///
/// The closing edge from the last point back to the first is implicit; the
/// first point is never repeated at the end.
///
/// # Example
///
/// ```
/// use artpaint_filters::{Polygon, Winding};
///
/// let square = Polygon::new(vec![(0, 0), (2, 0), (2, 2), (0, 2)], Winding::Clockwise);
/// assert_eq!(square.signed_area(), 4.0);
/// assert!(square.winding().is_selection());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<(i32, i32)>,
    winding: Winding,
}

impl Polygon {
    /// Build a polygon from its vertices.
    pub fn new(points: Vec<(i32, i32)>, winding: Winding) -> Self {
        Self { points, winding }
    }

    /// Vertices in traversal order.
    #[inline]
    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// Orientation of the walk.
    #[inline]
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True for a polygon without vertices; the tracer never emits one.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fewer than three vertices: a point or a back-and-forth line.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// Shoelace area; positive for clockwise traversal on a y-down grid.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                i64::from(x0) * i64::from(y1) - i64::from(x1) * i64::from(y0)
            })
            .sum();
        twice as f64 / 2.0
    }

    /// Inclusive bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let (&(x, y), rest) = self.points.split_first()?;
        Some(rest.iter().fold((x, y, x, y), |(x0, y0, x1, y1), &(px, py)| {
            (x0.min(px), y0.min(py), x1.max(px), y1.max(py))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winding_from_turns() {
        assert_eq!(Winding::from_turns(4), Winding::Clockwise);
        assert_eq!(Winding::from_turns(-4), Winding::CounterClockwise);
        assert_eq!(Winding::from_turns(2), Winding::Unknown);
        assert!(!Winding::CounterClockwise.is_selection());
    }

    #[test]
    fn test_reversed_polygon_has_negative_area() {
        let ccw = Polygon::new(vec![(0, 0), (0, 3), (3, 3), (3, 0)], Winding::CounterClockwise);
        assert_eq!(ccw.signed_area(), -9.0);
    }

    #[test]
    fn test_single_point() {
        let dot = Polygon::new(vec![(4, 5)], Winding::Clockwise);
        assert!(dot.is_degenerate());
        assert_eq!(dot.signed_area(), 0.0);
        assert_eq!(dot.bounds(), Some((4, 5, 4, 5)));
    }
}
