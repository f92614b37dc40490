use std::{
    fmt,
    ops::{Add, AddAssign, Div, Sub},
};

use euclid::num::{One, Zero};
pub use euclid::{Point2D as Point, Size2D as Extent, Vector2D as Offset};

/// Physical pixels of a window's framebuffer, with the origin in the top-left
/// corner and y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenPx();

/// The rectangular region of the window framebuffer that a graphic occupies.
pub type Viewport = Rect<i32, ScreenPx>;

/// An axis-aligned rectangle.
///
/// Rectangles with zero width or height are considered empty. Empty
/// rectangles never intersect anything, not even themselves.
///
/// Corners are computed with saturating arithmetic, so a rectangle that would
/// extend past the numeric range is cut off at its edge.
pub struct Rect<T, U>(euclid::Box2D<T, U>);

// Derives would require the unit marker to implement these traits too.
impl<T: Copy, U> Copy for Rect<T, U> {}

impl<T: Clone, U> Clone for Rect<T, U> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq, U> PartialEq for Rect<T, U> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Eq, U> Eq for Rect<T, U> {}

impl<T: fmt::Debug, U> fmt::Debug for Rect<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rect").field(&self.0).finish()
    }
}

/// Addition that stops at the bounds of the type instead of overflowing.
pub trait SaturatingAdd: Copy {
    #[must_use]
    fn saturating_add(self, rhs: Self) -> Self;
}

macro_rules! saturating_int {
    ($($t:ty),*) => {
        $(impl SaturatingAdd for $t {
            fn saturating_add(self, rhs: Self) -> Self {
                <$t>::saturating_add(self, rhs)
            }
        })*
    };
}

saturating_int!(i32, i64, u32, u64);

impl SaturatingAdd for f32 {
    fn saturating_add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl SaturatingAdd for f64 {
    fn saturating_add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl<T, U> Rect<T, U> {
    pub fn new(origin: Point<T, U>, extent: Extent<T, U>) -> Self
    where
        T: SaturatingAdd,
    {
        let far = Point::new(
            origin.x.saturating_add(extent.width),
            origin.y.saturating_add(extent.height),
        );
        Self(euclid::Box2D::new(origin, far))
    }

    /// Creates a rectangle from its origin and size. Negative sizes are
    /// clamped to zero.
    pub fn from_xywh(x: T, y: T, width: T, height: T) -> Self
    where
        T: SaturatingAdd + PartialOrd + Zero,
    {
        let clamp = |v: T| if v < T::zero() { T::zero() } else { v };
        Self::new(
            Point::new(x, y),
            Extent::new(clamp(width), clamp(height)),
        )
    }

    pub fn x(&self) -> T
    where
        T: Copy,
    {
        self.0.min.x
    }

    pub fn y(&self) -> T
    where
        T: Copy,
    {
        self.0.min.y
    }

    pub fn width(&self) -> T
    where
        T: Copy + Sub<T, Output = T>,
    {
        self.0.max.x - self.0.min.x
    }

    pub fn height(&self) -> T
    where
        T: Copy + Sub<T, Output = T>,
    {
        self.0.max.y - self.0.min.y
    }

    pub fn top_left(&self) -> Point<T, U>
    where
        T: Copy,
    {
        self.0.min
    }

    pub fn bottom_right(&self) -> Point<T, U>
    where
        T: Copy,
    {
        self.0.max
    }

    pub fn top_right(&self) -> Point<T, U>
    where
        T: Copy,
    {
        Point::new(self.0.max.x, self.0.min.y)
    }

    pub fn bottom_left(&self) -> Point<T, U>
    where
        T: Copy,
    {
        Point::new(self.0.min.x, self.0.max.y)
    }

    pub fn extent(&self) -> Extent<T, U>
    where
        T: Copy + Sub<T, Output = T>,
    {
        self.0.size()
    }

    pub fn center(&self) -> Point<T, U>
    where
        T: Copy + One + Add<Output = T> + Div<Output = T>,
    {
        self.0.center()
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.0.is_empty()
    }

    /// Returns true if the two rectangles share some area. Rectangles that
    /// only touch along an edge do not intersect.
    pub fn intersects(&self, rhs: &Rect<T, U>) -> bool
    where
        T: PartialOrd,
    {
        !self.is_empty() && !rhs.is_empty() && self.0.intersects(&rhs.0)
    }

    pub fn intersection(&self, rhs: &Rect<T, U>) -> Option<Rect<T, U>>
    where
        T: Copy + PartialOrd,
    {
        if self.intersects(rhs) {
            self.0.intersection(&rhs.0).map(|r| Rect(r))
        } else {
            None
        }
    }

    /// The smallest rectangle containing both rectangles. Empty rectangles do
    /// not contribute to the union.
    pub fn union(&self, rhs: &Rect<T, U>) -> Rect<T, U>
    where
        T: Copy + PartialOrd,
    {
        match (self.is_empty(), rhs.is_empty()) {
            (true, _) => *rhs,
            (_, true) => *self,
            _ => Rect(self.0.union(&rhs.0)),
        }
    }

    pub fn contains(&self, point: Point<T, U>) -> bool
    where
        T: PartialOrd,
    {
        self.0.contains(point)
    }
}

impl<T, U> Add<Offset<T, U>> for Rect<T, U>
where
    T: SaturatingAdd,
{
    type Output = Self;

    fn add(self, rhs: Offset<T, U>) -> Self::Output {
        let shift = |p: Point<T, U>| Point::new(p.x.saturating_add(rhs.x), p.y.saturating_add(rhs.y));
        Self(euclid::Box2D::new(shift(self.0.min), shift(self.0.max)))
    }
}

impl<T, U> AddAssign<Offset<T, U>> for Rect<T, U>
where
    T: SaturatingAdd,
{
    fn add_assign(&mut self, rhs: Offset<T, U>) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let rect = Viewport::from_xywh(5, 6, 10, 20);
        assert_eq!(rect.x(), 5);
        assert_eq!(rect.y(), 6);
        assert_eq!(rect.width(), 10);
        assert_eq!(rect.height(), 20);
        assert_eq!(rect.bottom_right(), Point::new(15, 26));
        assert_eq!(rect.extent(), Extent::new(10, 20));
    }

    #[test]
    fn negative_size_clamps() {
        let rect = Viewport::from_xywh(-5, -5, -10, 3);
        assert_eq!(rect.width(), 0);
        assert_eq!(rect.height(), 3);
        assert!(rect.is_empty());
    }

    #[test]
    fn intersection() {
        let a = Viewport::from_xywh(0, 0, 10, 10);
        let b = Viewport::from_xywh(5, 5, 10, 10);
        let c = Viewport::from_xywh(20, 20, 5, 5);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&b), Some(Viewport::from_xywh(5, 5, 5, 5)));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Viewport::from_xywh(0, 0, 10, 10);
        let b = Viewport::from_xywh(10, 0, 10, 10);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn empty_never_intersects() {
        let line = Viewport::from_xywh(0, 0, 0, 10);
        let point = Viewport::from_xywh(5, 5, 0, 0);
        let big = Viewport::from_xywh(-100, -100, 200, 200);

        assert!(!line.intersects(&big));
        assert!(!big.intersects(&line));
        assert!(!point.intersects(&point));
        assert!(!line.intersects(&line));
    }

    #[test]
    fn union_skips_empty() {
        let a = Viewport::from_xywh(0, 0, 10, 10);
        let b = Viewport::from_xywh(20, 20, 5, 5);
        let empty = Viewport::from_xywh(100, 100, 0, 0);

        assert_eq!(a.union(&b), Viewport::from_xywh(0, 0, 25, 25));
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&b), b);
    }

    #[test]
    fn translate() {
        let mut rect = Viewport::from_xywh(1, 2, 3, 4);
        rect += Offset::new(10, 10);
        assert_eq!(rect, Viewport::from_xywh(11, 12, 3, 4));
        assert_eq!(rect + Offset::new(-11, -12), Viewport::from_xywh(0, 0, 3, 4));
    }

    #[test]
    fn far_corner_saturates() {
        let rect = Viewport::from_xywh(i32::MAX - 5, i32::MAX - 1, 100, 10);
        assert_eq!(rect.x(), i32::MAX - 5);
        assert_eq!(rect.width(), 5);
        assert_eq!(rect.height(), 1);
        assert_eq!(rect.bottom_right(), Point::new(i32::MAX, i32::MAX));

        let rect = Viewport::from_xywh(i32::MIN, 0, i32::MAX, 1);
        assert_eq!(rect.bottom_right().x, -1);

        let moved = Viewport::from_xywh(0, 0, 10, 10) + Offset::new(i32::MAX - 2, i32::MIN);
        assert_eq!(moved.width(), 2);
        assert_eq!(moved.top_left(), Point::new(i32::MAX - 2, i32::MIN));
        assert!(!moved.intersects(&Viewport::from_xywh(0, 0, 100, 100)));
    }

    #[test]
    fn unit_marker_needs_no_traits() {
        struct Opaque;

        let a = Rect::<i32, Opaque>::from_xywh(0, 0, 10, 10);
        let b = Rect::<i32, Opaque>::from_xywh(20, 20, 5, 5);
        let copy = a;

        assert_eq!(a.union(&b), Rect::from_xywh(0, 0, 25, 25));
        assert_eq!(Clone::clone(&copy), a);
        assert!(format!("{:?}", a).starts_with("Rect"));
    }
}
