use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounds with `min` at the top-left corner (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Bounds { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.min.x + self.max.x) / 2.0,
            y: (self.min.y + self.max.y) / 2.0,
        }
    }

    pub fn perimeter_len(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Point {
                x: self.min.x.min(other.min.x),
                y: self.min.y.min(other.min.y),
            },
            max: Point {
                x: self.max.x.max(other.max.x),
                y: self.max.y.max(other.max.y),
            },
        }
    }

    /// Map a point on the boundary to a scalar t in [0, perimeter), tracing
    /// top, right, bottom, left from the top-left corner.
    pub fn perimeter_t(&self, point: &Point) -> f64 {
        let w = self.width();
        let h = self.height();

        // Distances to each edge decide which edge the point belongs to.
        let to_top = (point.y - self.min.y).abs();
        let to_right = (point.x - self.max.x).abs();
        let to_bottom = (point.y - self.max.y).abs();
        let to_left = (point.x - self.min.x).abs();

        let nearest = to_top.min(to_right).min(to_bottom).min(to_left);

        if nearest == to_top {
            (point.x - self.min.x).clamp(0.0, w)
        } else if nearest == to_right {
            w + (point.y - self.min.y).clamp(0.0, h)
        } else if nearest == to_bottom {
            w + h + (self.max.x - point.x).clamp(0.0, w)
        } else {
            w + h + w + (self.max.y - point.y).clamp(0.0, h)
        }
    }

    /// Project an arbitrary point onto the boundary and return its t.
    pub fn nearest_perimeter_t(&self, point: &Point) -> f64 {
        let clamped = Point {
            x: point.x.clamp(self.min.x, self.max.x),
            y: point.y.clamp(self.min.y, self.max.y),
        };
        self.perimeter_t(&clamped)
    }

    pub fn transform(&self, transform: &AffineTransform) -> Bounds {
        let a = transform.apply(&self.min);
        let b = transform.apply(&self.max);
        Bounds {
            min: Point {
                x: a.x.min(b.x),
                y: a.y.min(b.y),
            },
            max: Point {
                x: a.x.max(b.x),
                y: a.y.max(b.y),
            },
        }
    }
}

/// Two chords (a, b) and (c, d) on a closed boundary of length `perimeter`
/// interleave iff exactly one of c, d lies strictly inside the arc from a
/// to b.
pub fn chords_cross(a: f64, b: f64, c: f64, d: f64, perimeter: f64) -> bool {
    let span = (b - a).rem_euclid(perimeter);
    if span == 0.0 {
        return false;
    }
    let in_arc = |t: f64| {
        let rel = (t - a).rem_euclid(perimeter);
        rel > 0.0 && rel < span
    };
    in_arc(c) != in_arc(d)
}

/// Row-major 2x3 affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl AffineTransform {
    pub fn identity() -> Self {
        AffineTransform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        AffineTransform {
            tx,
            ty,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        AffineTransform {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    /// Mirror across the x = y diagonal, swapping the axes.
    pub fn swap_axes() -> Self {
        AffineTransform {
            a: 0.0,
            b: 1.0,
            c: 1.0,
            d: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        Point {
            x: self.a * point.x + self.b * point.y + self.tx,
            y: self.c * point.x + self.d * point.y + self.ty,
        }
    }

    /// The transform that applies `self` first and `next` second.
    pub fn then(&self, next: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: next.a * self.a + next.b * self.c,
            b: next.a * self.b + next.b * self.d,
            c: next.c * self.a + next.d * self.c,
            d: next.c * self.b + next.d * self.d,
            tx: next.a * self.tx + next.b * self.ty + next.tx,
            ty: next.c * self.tx + next.d * self.ty + next.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bounds() -> Bounds {
        Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 6.0))
    }

    #[test]
    fn perimeter_t_walks_edges_in_order() {
        let bounds = sample_bounds();
        assert_eq!(bounds.perimeter_t(&Point::new(0.0, 0.0)), 0.0);
        assert_eq!(bounds.perimeter_t(&Point::new(4.0, 0.0)), 4.0);
        assert_eq!(bounds.perimeter_t(&Point::new(10.0, 2.0)), 12.0);
        assert_eq!(bounds.perimeter_t(&Point::new(7.0, 6.0)), 19.0);
        assert_eq!(bounds.perimeter_t(&Point::new(0.0, 3.0)), 29.0);
        assert!(bounds.perimeter_t(&Point::new(0.0, 5.9)) < bounds.perimeter_len());
    }

    #[test]
    fn nearest_perimeter_t_projects_interior_points() {
        let bounds = sample_bounds();
        assert_eq!(bounds.nearest_perimeter_t(&Point::new(5.0, 0.5)), 5.0);
    }

    #[test]
    fn chords_cross_requires_exactly_one_endpoint_inside() {
        let p = 32.0;
        assert!(chords_cross(0.0, 10.0, 5.0, 15.0, p));
        assert!(chords_cross(5.0, 15.0, 0.0, 10.0, p));
        // Both endpoints inside the arc.
        assert!(!chords_cross(0.0, 10.0, 2.0, 8.0, p));
        // Both endpoints outside the arc.
        assert!(!chords_cross(0.0, 10.0, 12.0, 20.0, p));
        // Wrap-around arc.
        assert!(chords_cross(28.0, 4.0, 2.0, 10.0, p));
        assert!(!chords_cross(28.0, 4.0, 30.0, 2.0, p));
    }

    #[test]
    fn chords_sharing_an_endpoint_do_not_cross() {
        let p = 32.0;
        assert!(!chords_cross(0.0, 10.0, 10.0, 20.0, p));
        assert!(!chords_cross(0.0, 10.0, 0.0, 5.0, p));
    }

    #[test]
    fn swap_axes_then_translate() {
        let transform = AffineTransform::swap_axes().then(&AffineTransform::translation(1.0, 2.0));
        let point = transform.apply(&Point::new(3.0, 7.0));
        assert_eq!(point, Point::new(8.0, 5.0));
    }

    #[test]
    fn bounds_transform_renormalizes_corners() {
        let bounds = sample_bounds().transform(&AffineTransform::swap_axes());
        assert_eq!(bounds.min, Point::new(0.0, 0.0));
        assert_eq!(bounds.max, Point::new(6.0, 10.0));
    }
}
