//! Geometric primitives for sheet analysis.
//!
//! Pixel-space types shared by every detector: integer bounding boxes for
//! recognized text, floating-point points for line and label positions.

use serde::{Deserialize, Serialize};

/// A 2D point in image space (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::Point;
    ///
    /// let a = Point::new(0.0, 0.0);
    /// let b = Point::new(3.0, 4.0);
    /// assert_eq!(a.distance_to(&b), 5.0);
    /// ```
    pub fn distance_to(&self, other: &Point) -> f64 {
        euclidean_distance(self, other)
    }
}

/// An axis-aligned box in pixel space.
///
/// `x`/`y` is the top-left corner. Width and height are unsigned, so a box
/// can never have negative extent; a zero-width or zero-height box is legal
/// and has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of top-left corner
    pub x: i32,
    /// Y coordinate of top-left corner
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl BoundingBox {
    /// Create a new box from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(10, 10, 50, 20);
    /// assert_eq!(bbox.right(), 60);
    /// assert_eq!(bbox.bottom(), 30);
    /// ```
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box from two corners `(x1, y1)` top-left and `(x2, y2)`
    /// bottom-right. Inverted corners collapse to zero extent.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_corners(10, 20, 110, 70);
    /// assert_eq!(bbox.width, 100);
    /// assert_eq!(bbox.height, 50);
    ///
    /// let inverted = BoundingBox::from_corners(10, 10, 5, 5);
    /// assert_eq!(inverted.area(), 0);
    /// ```
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0) as u32,
            height: (y2 - y1).max(0) as u32,
        }
    }

    /// Right edge x-coordinate (exclusive).
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge y-coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Center point of the box.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::BoundingBox;
    ///
    /// let center = BoundingBox::new(0, 0, 100, 50).center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: self.x as f64 + self.width as f64 / 2.0,
            y: self.y as f64 + self.height as f64 / 2.0,
        }
    }

    /// Area in square pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersection with another box, or `None` when the boxes are disjoint
    /// or only share an edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::BoundingBox;
    ///
    /// let a = BoundingBox::new(0, 0, 10, 10);
    /// let b = BoundingBox::new(5, 5, 10, 10);
    /// assert_eq!(a.intersection(&b), Some(BoundingBox::new(5, 5, 5, 5)));
    ///
    /// let touching = BoundingBox::new(10, 0, 10, 10);
    /// assert_eq!(a.intersection(&touching), None);
    /// ```
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(BoundingBox {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// Area of the intersection, 0 when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        self.intersection(other).map(|i| i.area()).unwrap_or(0)
    }

    /// Overlap as a percentage of the smaller box's area, in `[0, 100]`.
    ///
    /// Returns 0 when the smaller box has zero area, so degenerate boxes
    /// never produce a division by zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheet_validator::geometry::BoundingBox;
    ///
    /// let outer = BoundingBox::new(0, 0, 100, 100);
    /// let inner = BoundingBox::new(10, 10, 20, 20);
    /// assert_eq!(outer.overlap_percent(&inner), 100.0);
    /// ```
    pub fn overlap_percent(&self, other: &BoundingBox) -> f64 {
        let smaller = self.area().min(other.area());
        if smaller == 0 {
            return 0.0;
        }
        let ratio = self.intersection_area(other) as f64 / smaller as f64;
        (ratio * 100.0).clamp(0.0, 100.0)
    }

    /// Check if a point lies inside the box (edges inclusive on the
    /// top-left, exclusive on the bottom-right).
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x >= self.x as f64
            && point.x < self.right() as f64
            && point.y >= self.y as f64
            && point.y < self.bottom() as f64
    }
}

/// Euclidean distance between two points.
pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Shortest distance from `point` to the segment `start`-`end`.
///
/// A zero-length segment degrades to point distance.
///
/// # Examples
///
/// ```
/// use sheet_validator::geometry::{point_to_segment_distance, Point};
///
/// let d = point_to_segment_distance(
///     &Point::new(5.0, 3.0),
///     &Point::new(0.0, 0.0),
///     &Point::new(10.0, 0.0),
/// );
/// assert_eq!(d, 3.0);
/// ```
pub fn point_to_segment_distance(point: &Point, start: &Point, end: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return euclidean_distance(point, start);
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / len_sq).clamp(0.0, 1.0);
    let projection = Point::new(start.x + t * dx, start.y + t * dy);
    euclidean_distance(point, &projection)
}

/// Perpendicular distance from `point` to the infinite line through
/// `start` and `end`.
pub fn point_to_line_distance(point: &Point, start: &Point, end: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return euclidean_distance(point, start);
    }
    ((dy * point.x - dx * point.y + end.x * start.y - end.y * start.x) / len).abs()
}
