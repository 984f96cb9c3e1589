//! Geometry primitives shared by every stage of the ledger pipeline.
//!
//! Pixel boxes are integer rectangles in image coordinates (y grows downward),
//! measured points are `[f32; 2]` like the rest of the crate.
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle. `w`/`h` count pixels, so the right-most
/// covered column is `x + w - 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn center(&self) -> [f32; 2] {
        [
            self.x as f32 + self.w as f32 * 0.5,
            self.y as f32 + self.h as f32 * 0.5,
        ]
    }

    /// Length of the common abscissa range; negative values measure the gap.
    pub fn x_overlap(&self, other: &Rect) -> i32 {
        self.right().min(other.right()) - self.x.max(other.x)
    }

    /// Length of the common ordinate range; negative values measure the gap.
    pub fn y_overlap(&self, other: &Rect) -> i32 {
        self.bottom().min(other.bottom()) - self.y.max(other.y)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty() && !other.is_empty() && self.x_overlap(other) > 0 && self.y_overlap(other) > 0
    }

    pub fn contains(&self, p: [f32; 2]) -> bool {
        p[0] >= self.x as f32
            && p[0] < self.right() as f32
            && p[1] >= self.y as f32
            && p[1] < self.bottom() as f32
    }

    pub fn x_embraces(&self, x: f32) -> bool {
        x >= self.x as f32 && x < self.right() as f32
    }

    pub fn grow(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2 * dx, self.h + 2 * dy)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    fn corners(&self) -> [[f32; 2]; 4] {
        let (x0, y0) = (self.x as f32, self.y as f32);
        let (x1, y1) = (self.right() as f32, self.bottom() as f32);
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }
}

/// Straight line `y = intercept + slope * x` fitted on weighted samples.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub intercept: f32,
    pub slope: f32,
}

impl LineFit {
    pub fn horizontal(y: f32) -> Self {
        Self {
            intercept: y,
            slope: 0.0,
        }
    }

    #[inline]
    pub fn y_at(&self, x: f32) -> f32 {
        self.intercept + self.slope * x
    }

    /// Perpendicular distance of `p` to the line.
    pub fn distance(&self, p: [f32; 2]) -> f32 {
        (p[1] - self.y_at(p[0])).abs() / (1.0 + self.slope * self.slope).sqrt()
    }

    /// Weighted least-squares fit over `(x, y, weight)` samples.
    ///
    /// Returns `None` when fewer than one sample carries weight. A single
    /// distinct abscissa yields a horizontal line through the weighted mean.
    pub fn fit(samples: &[(f32, f32, f32)]) -> Option<Self> {
        let mut sw = 0.0f64;
        let mut sx = 0.0f64;
        let mut sy = 0.0f64;
        let mut sxx = 0.0f64;
        let mut sxy = 0.0f64;
        for &(x, y, w) in samples {
            if w <= 0.0 {
                continue;
            }
            let (x, y, w) = (x as f64, y as f64, w as f64);
            sw += w;
            sx += w * x;
            sy += w * y;
            sxx += w * x * x;
            sxy += w * x * y;
        }
        if sw <= 0.0 {
            return None;
        }
        let normal = Matrix2::new(sw, sx, sx, sxx);
        let rhs = Vector2::new(sy, sxy);
        match normal.lu().solve(&rhs) {
            Some(sol) if sol[0].is_finite() && sol[1].is_finite() && normal.determinant().abs() > 1e-9 => {
                Some(Self {
                    intercept: sol[0] as f32,
                    slope: sol[1] as f32,
                })
            }
            _ => Some(Self::horizontal((sy / sw) as f32)),
        }
    }
}

/// Convex polygon area, used for beam and hook interpretations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<[f32; 2]>,
}

impl Polygon {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    /// Parallelogram of vertical `height` centred on the median `p0 -> p1`.
    pub fn from_median(p0: [f32; 2], p1: [f32; 2], height: f32) -> Self {
        let dy = height * 0.5;
        Self::new(vec![
            [p0[0], p0[1] - dy],
            [p1[0], p1[1] - dy],
            [p1[0], p1[1] + dy],
            [p0[0], p0[1] + dy],
        ])
    }

    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::default();
        }
        let mut x0 = f32::INFINITY;
        let mut y0 = f32::INFINITY;
        let mut x1 = f32::NEG_INFINITY;
        let mut y1 = f32::NEG_INFINITY;
        for p in &self.points {
            x0 = x0.min(p[0]);
            y0 = y0.min(p[1]);
            x1 = x1.max(p[0]);
            y1 = y1.max(p[1]);
        }
        let (ix, iy) = (x0.floor() as i32, y0.floor() as i32);
        Rect::new(ix, iy, x1.ceil() as i32 - ix, y1.ceil() as i32 - iy)
    }

    /// Point containment for a convex polygon (either winding).
    pub fn contains(&self, p: [f32; 2]) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0f32;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Separating-axis test between this convex polygon and a rectangle.
    pub fn intersects(&self, rect: &Rect) -> bool {
        if self.points.len() < 3 || rect.is_empty() {
            return false;
        }
        let corners = rect.corners();
        let mut axes: Vec<[f32; 2]> = vec![[1.0, 0.0], [0.0, 1.0]];
        let n = self.points.len();
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            axes.push([-(b[1] - a[1]), b[0] - a[0]]);
        }
        axes.iter().all(|axis| {
            let (pmin, pmax) = project(&self.points, axis);
            let (rmin, rmax) = project(&corners, axis);
            pmax > rmin && rmax > pmin
        })
    }
}

fn project(points: &[[f32; 2]], axis: &[f32; 2]) -> (f32, f32) {
    points
        .iter()
        .map(|p| p[0] * axis[0] + p[1] * axis[1])
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}
