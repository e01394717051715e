use geo::{Area, ConvexHull, Contains};
use geo_types::{Coord, LineString, MultiPoint, Point as GeoPoint, Polygon};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use super::regions::covariance_eigenvalues;

/// An outer border traced on a binary mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Every border pixel, in tracing order
    pub points: Vec<Point<i32>>,
    /// Border with straight runs collapsed to their end points
    pub corners: Vec<Point<i32>>,
}

/// Raw and central moments of a closed polygon.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,
}

/// Outer borders of `mask` that are not nested inside another border.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// The contour with the largest polygon area.
pub fn largest_contour(contours: &[Contour]) -> Option<&Contour> {
    contours
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
}

/// Drop points that lie on a straight run between their neighbours.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let here = points[i];
            let next = points[(i + 1) % n];
            (here.x - prev.x, here.y - prev.y) != (next.x - here.x, next.y - here.y)
        })
        .map(|i| points[i])
        .collect()
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let mut corners = compress_chain(&points);
        if corners.is_empty() && !points.is_empty() {
            corners.push(points[0]);
        }
        Self { points, corners }
    }

    /// Absolute polygon area of the corner path.
    pub fn area(&self) -> f64 {
        self.moments().m00.abs()
    }

    /// Closed arc length.
    pub fn perimeter(&self) -> f64 {
        let n = self.corners.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.corners[i];
                let b = self.corners[(i + 1) % n];
                f64::from(b.x - a.x).hypot(f64::from(b.y - a.y))
            })
            .sum()
    }

    /// Polygon moments via Green's theorem, oriented so `m00 >= 0`.
    pub fn moments(&self) -> PolygonMoments {
        let n = self.corners.len();
        if n < 3 {
            return PolygonMoments::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0, 0.0, 0.0);
        let (mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0);
        let (mut a30, mut a21, mut a12, mut a03) = (0.0, 0.0, 0.0, 0.0);

        let last = self.corners[n - 1];
        let (mut xp, mut yp) = (f64::from(last.x), f64::from(last.y));
        for p in &self.corners {
            let (x, y) = (f64::from(p.x), f64::from(p.y));
            let dxy = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;

            a00 += dxy;
            a10 += dxy * xs;
            a01 += dxy * ys;
            a20 += dxy * (xp * xs + x * x);
            a11 += dxy * (xp * (ys + yp) + x * (ys + y));
            a02 += dxy * (yp * ys + y * y);
            a30 += dxy * xs * (xp * xp + x * x);
            a03 += dxy * ys * (yp * yp + y * y);
            a21 += dxy * (xp * xp * (3.0 * yp + y) + 2.0 * x * xp * ys + x * x * (yp + 3.0 * y));
            a12 += dxy * (yp * yp * (3.0 * xp + x) + 2.0 * y * yp * xs + y * y * (xp + 3.0 * x));

            xp = x;
            yp = y;
        }

        if a00.abs() <= f64::EPSILON {
            return PolygonMoments::default();
        }
        let sign = a00.signum();

        let m00 = sign * a00 / 2.0;
        let m10 = sign * a10 / 6.0;
        let m01 = sign * a01 / 6.0;
        let m20 = sign * a20 / 12.0;
        let m11 = sign * a11 / 24.0;
        let m02 = sign * a02 / 12.0;
        let m30 = sign * a30 / 20.0;
        let m21 = sign * a21 / 60.0;
        let m12 = sign * a12 / 60.0;
        let m03 = sign * a03 / 20.0;

        let cx = m10 / m00;
        let cy = m01 / m00;
        let mu20 = m20 - cx * m10;
        let mu11 = m11 - cx * m01;
        let mu02 = m02 - cy * m01;

        PolygonMoments {
            m00,
            m10,
            m01,
            mu20,
            mu11,
            mu02,
            mu30: m30 - cx * (3.0 * mu20 + cx * m10),
            mu21: m21 - cx * (2.0 * mu11 + cx * m01) - cy * mu20,
            mu12: m12 - cy * (2.0 * mu11 + cy * m10) - cx * mu02,
            mu03: m03 - cy * (3.0 * mu02 + cy * m01),
        }
    }

    /// Integer centroid, `None` for a zero-area polygon.
    pub fn centroid(&self) -> Option<Point<i32>> {
        let m = self.moments();
        if m.m00 == 0.0 {
            return None;
        }
        Some(Point::new((m.m10 / m.m00) as i32, (m.m01 / m.m00) as i32))
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .corners
            .iter()
            .map(|p| Coord { x: f64::from(p.x), y: f64::from(p.y) })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// True only for points strictly inside the polygon; the border does not count.
    pub fn strictly_contains(&self, point: Point<i32>) -> bool {
        if self.corners.len() < 3 {
            return false;
        }
        self.to_polygon()
            .contains(&GeoPoint::new(f64::from(point.x), f64::from(point.y)))
    }

    pub fn convex_hull_area(&self) -> f64 {
        let points: MultiPoint<f64> = self
            .corners
            .iter()
            .map(|p| GeoPoint::new(f64::from(p.x), f64::from(p.y)))
            .collect();
        points.convex_hull().unsigned_area()
    }

    /// Paint the contour and everything it encloses onto `canvas`.
    pub fn fill(&self, canvas: &mut GrayImage, value: u8) {
        let mut poly = self.corners.clone();
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() >= 3 {
            draw_polygon_mut(canvas, &poly, Luma([value]));
        }
        let (width, height) = canvas.dimensions();
        for p in &self.points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                canvas.put_pixel(p.x as u32, p.y as u32, Luma([value]));
            }
        }
    }
}

impl PolygonMoments {
    /// The seven Hu invariants of the scale-normalized central moments.
    pub fn hu(&self) -> [f64; 7] {
        let (s2, s3) = if self.m00.abs() > f64::EPSILON {
            let inv = 1.0 / self.m00;
            (inv * inv, inv * inv * inv.abs().sqrt())
        } else {
            (0.0, 0.0)
        };
        let nu20 = self.mu20 * s2;
        let nu11 = self.mu11 * s2;
        let nu02 = self.mu02 * s2;
        let nu30 = self.mu30 * s3;
        let nu21 = self.mu21 * s3;
        let nu12 = self.mu12 * s3;
        let nu03 = self.mu03 * s3;

        let mut t0 = nu30 + nu12;
        let mut t1 = nu21 + nu03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * nu11;
        let s = nu20 + nu02;
        let d = nu20 - nu02;

        let h0 = s;
        let h1 = d * d + n4 * nu11;
        let h3 = q0 + q1;
        let h5 = d * (q0 - q1) + n4 * t0 * t1;

        t0 *= q0 - 3.0 * q1;
        t1 *= 3.0 * q0 - q1;
        let r0 = nu30 - 3.0 * nu12;
        let r1 = 3.0 * nu21 - nu03;

        let h2 = r0 * r0 + r1 * r1;
        let h4 = r0 * t0 + r1 * t1;
        let h6 = r1 * t0 - r0 * t1;

        [h0, h1, h2, h3, h4, h5, h6]
    }

    /// Major to minor axis ratio of the moment ellipse (same second moments
    /// as the polygon), not a least-squares fit to the border points.
    pub fn elongation(&self) -> f64 {
        if self.m00 <= 0.0 {
            return 0.0;
        }
        let (major, minor) = covariance_eigenvalues(
            self.mu20 / self.m00,
            self.mu02 / self.m00,
            self.mu11 / self.m00,
        );
        if minor <= f64::EPSILON {
            return 0.0;
        }
        (major / minor).sqrt()
    }
}
