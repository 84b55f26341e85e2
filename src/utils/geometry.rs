use std::fmt;

/// A point in pixel coordinates of a buffer
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// horizontal coordinate
    pub x: i32,
    /// vertical coordinate
    pub y: i32,
}

impl fmt::Debug for Point {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl From<(i32, i32)> for Point {
    #[inline]
    fn from((x, y): (i32, i32)) -> Point {
        Point { x, y }
    }
}

impl From<Point> for (i32, i32) {
    #[inline]
    fn from(point: Point) -> (i32, i32) {
        (point.x, point.y)
    }
}

/// A size of a buffer, in pixels
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// width
    pub w: i32,
    /// height
    pub h: i32,
}

impl Size {
    /// Check if this [`Size`] is empty
    ///
    /// Returns true if either the width or the height is zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Checks whether both dimensions of `other` fit into this size
    #[inline]
    pub fn contains(&self, other: Size) -> bool {
        other.w <= self.w && other.h <= self.h
    }
}

impl fmt::Debug for Size {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Size")
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

impl From<(i32, i32)> for Size {
    #[inline]
    fn from((w, h): (i32, i32)) -> Size {
        debug_assert!(
            w >= 0 && h >= 0,
            "Attempting to create a `Size` of negative size: {:?}",
            (w, h)
        );
        Size { w, h }
    }
}

impl From<Size> for (i32, i32) {
    #[inline]
    fn from(size: Size) -> (i32, i32) {
        (size.w, size.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_contains() {
        let surface = Size::from((800, 600));
        assert!(surface.contains((640, 480).into()));
        assert!(surface.contains(surface));
        assert!(!surface.contains((1024, 480).into()));
    }
}
