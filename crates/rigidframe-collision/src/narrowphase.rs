//! Contact generation for box and sphere pairs.
//!
//! Normals point from A to B. For every point `(on_a - on_b) · normal == depth`, so a
//! positive depth means penetration and a negative one a speculative contact inside
//! `margin`.

use rigidframe_core::types::{Isometry, Mat3, Vec3};
use rigidframe_geom::{Shape, ShapeKind};

pub const MAX_MANIFOLD_POINTS: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactPoint {
    pub on_a: Vec3,
    pub on_b: Vec3,
    pub depth: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactManifold {
    pub normal: Vec3,
    pub points: Vec<ContactPoint>,
}

impl ContactManifold {
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        for p in &mut self.points { core::mem::swap(&mut p.on_a, &mut p.on_b); }
        self
    }

    pub fn max_depth(&self) -> f32 {
        self.points.iter().map(|p| p.depth).fold(f32::NEG_INFINITY, f32::max)
    }
}

pub fn collide(a: &Shape, xa: &Isometry, b: &Shape, xb: &Isometry, margin: f32) -> Option<ContactManifold> {
    match (*a.kind(), *b.kind()) {
        (ShapeKind::Sphere { radius: ra }, ShapeKind::Sphere { radius: rb }) => sphere_sphere(xa.pos, ra, xb.pos, rb, margin),
        (ShapeKind::Sphere { radius }, ShapeKind::Box { half_extents, .. }) => sphere_box(xa.pos, radius, xb, half_extents, margin),
        (ShapeKind::Box { half_extents, .. }, ShapeKind::Sphere { radius }) => {
            sphere_box(xb.pos, radius, xa, half_extents, margin).map(ContactManifold::flipped)
        }
        (ShapeKind::Box { half_extents: ha, .. }, ShapeKind::Box { half_extents: hb, .. }) => box_box(xa, ha, xb, hb, margin),
    }
}

fn sphere_sphere(ca: Vec3, ra: f32, cb: Vec3, rb: f32, margin: f32) -> Option<ContactManifold> {
    let d = cb - ca;
    let dist = d.length();
    if dist > ra + rb + margin { return None; }
    let n = if dist > 1.0e-6 { d / dist } else { Vec3::Y };
    Some(ContactManifold {
        normal: n,
        points: vec![ContactPoint { on_a: ca + n * ra, on_b: cb - n * rb, depth: ra + rb - dist }],
    })
}

/// Sphere is A, box is B.
fn sphere_box(c: Vec3, r: f32, xb: &Isometry, he: Vec3, margin: f32) -> Option<ContactManifold> {
    let lc = xb.inverse_transform_point(c);
    let q = lc.clamp(-he, he);
    let (out_local, surface_local, depth) = if q == lc {
        // centre inside: push out through the nearest face
        let gap = he - lc.abs();
        let axis = if gap.x <= gap.y && gap.x <= gap.z { 0 } else if gap.y <= gap.z { 1 } else { 2 };
        let mut n = Vec3::ZERO;
        n[axis] = if lc[axis] >= 0.0 { 1.0 } else { -1.0 };
        let mut s = lc;
        s[axis] = n[axis] * he[axis];
        (n, s, r + gap[axis])
    } else {
        let diff = lc - q;
        let dist = diff.length();
        if dist > r + margin { return None; }
        (diff / dist, q, r - dist)
    };
    let n = -xb.transform_vector(out_local);
    Some(ContactManifold {
        normal: n,
        points: vec![ContactPoint { on_a: c + n * r, on_b: xb.transform_point(surface_local), depth }],
    })
}

#[inline]
fn project(he: Vec3, axes: &[Vec3; 3], n: Vec3) -> f32 {
    he.x * axes[0].dot(n).abs() + he.y * axes[1].dot(n).abs() + he.z * axes[2].dot(n).abs()
}

fn corners(xf: &Isometry, he: Vec3) -> [Vec3; 8] {
    let mut out = [Vec3::ZERO; 8];
    for (i, c) in out.iter_mut().enumerate() {
        let s = Vec3::new(
            if i & 1 == 0 { -1.0 } else { 1.0 },
            if i & 2 == 0 { -1.0 } else { 1.0 },
            if i & 4 == 0 { -1.0 } else { 1.0 },
        );
        *c = xf.transform_point(s * he);
    }
    out
}

#[inline]
fn inside(xf: &Isometry, he: Vec3, p: Vec3, margin: f32) -> bool {
    let l = xf.inverse_transform_point(p);
    l.abs().cmple(he + Vec3::splat(margin)).all()
}

fn box_box(xa: &Isometry, ha: Vec3, xb: &Isometry, hb: Vec3, margin: f32) -> Option<ContactManifold> {
    let ma = Mat3::from_quat(xa.rot);
    let mb = Mat3::from_quat(xb.rot);
    let axes_a = [ma.x_axis, ma.y_axis, ma.z_axis];
    let axes_b = [mb.x_axis, mb.y_axis, mb.z_axis];
    let d = xb.pos - xa.pos;

    let mut candidates: Vec<(Vec3, bool)> = Vec::with_capacity(15);
    candidates.extend(axes_a.iter().map(|a| (*a, false)));
    candidates.extend(axes_b.iter().map(|a| (*a, false)));
    for a in &axes_a {
        for b in &axes_b {
            let c = a.cross(*b);
            if c.length_squared() > 1.0e-8 { candidates.push((c.normalize(), true)); }
        }
    }

    let mut best = f32::INFINITY;
    let mut best_depth = 0.0;
    let mut n = Vec3::Y;
    for (axis, is_edge) in candidates {
        let dist = d.dot(axis);
        let overlap = project(ha, &axes_a, axis) + project(hb, &axes_b, axis) - dist.abs();
        if overlap < -margin { return None; }
        // faces win ties so stacked boxes keep a stable face normal
        let score = if is_edge { overlap * 1.05 + 1.0e-3 } else { overlap };
        if score < best {
            best = score;
            best_depth = overlap;
            n = if dist < 0.0 { -axis } else { axis };
        }
    }

    let top_a = xa.pos.dot(n) + project(ha, &axes_a, n);
    let bottom_b = xb.pos.dot(n) - project(hb, &axes_b, n);
    let mut points: Vec<ContactPoint> = Vec::with_capacity(MAX_MANIFOLD_POINTS);
    for v in corners(xb, hb) {
        if !inside(xa, ha, v, margin) { continue; }
        let depth = top_a - v.dot(n);
        if depth >= -margin { points.push(ContactPoint { on_a: v + n * depth, on_b: v, depth }); }
    }
    for u in corners(xa, ha) {
        if !inside(xb, hb, u, margin) { continue; }
        let depth = u.dot(n) - bottom_b;
        if depth >= -margin { points.push(ContactPoint { on_a: u, on_b: u - n * depth, depth }); }
    }

    if points.is_empty() {
        // edge contact: meet in the middle of the two supporting features
        let fa = support_centroid(&corners(xa, ha), n);
        let fb = support_centroid(&corners(xb, hb), -n);
        let mid = (fa + fb) * 0.5;
        let h = n * (best_depth * 0.5);
        points.push(ContactPoint { on_a: mid + h, on_b: mid - h, depth: best_depth });
    }

    points.sort_by(|p, q| q.depth.total_cmp(&p.depth));
    points.truncate(MAX_MANIFOLD_POINTS);
    Some(ContactManifold { normal: n, points })
}

fn support_centroid(verts: &[Vec3; 8], dir: Vec3) -> Vec3 {
    let max = verts.iter().map(|v| v.dot(dir)).fold(f32::NEG_INFINITY, f32::max);
    let mut sum = Vec3::ZERO;
    let mut count = 0.0;
    for v in verts.iter().filter(|v| v.dot(dir) >= max - 1.0e-4) {
        sum += *v;
        count += 1.0;
    }
    sum / count
}
