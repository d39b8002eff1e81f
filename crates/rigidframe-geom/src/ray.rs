use rigidframe_core::types::Vec3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray { pub origin: Vec3, pub dir: Vec3 }

impl Ray {
    #[inline] pub fn at(&self, t: f32) -> Vec3 { self.origin + self.dir * t }
}

/// Distance along the ray and surface normal at the hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit { pub t: f32, pub normal: Vec3 }

/// Rays starting inside report a hit at `t = 0` against the direction of travel.
pub fn ray_box_local(o: Vec3, d: Vec3, he: Vec3, max_t: f32) -> Option<RayHit> {
    let mut t0 = f32::NEG_INFINITY;
    let mut t1 = max_t;
    let mut axis_in = 0usize;
    let mut sign_in = 1.0f32;
    for axis in 0..3 {
        if d[axis].abs() < 1.0e-12 {
            if o[axis] < -he[axis] || o[axis] > he[axis] { return None; }
            continue;
        }
        let inv = 1.0 / d[axis];
        let ta = (-he[axis] - o[axis]) * inv;
        let tb = (he[axis] - o[axis]) * inv;
        let (near, far, s) = if ta < tb { (ta, tb, -1.0) } else { (tb, ta, 1.0) };
        if near > t0 { t0 = near; axis_in = axis; sign_in = s; }
        t1 = t1.min(far);
        if t0 > t1 { return None; }
    }
    if t1 < 0.0 { return None; }
    if t0 < 0.0 {
        return Some(RayHit { t: 0.0, normal: -d.normalize_or_zero() });
    }
    let mut n = Vec3::ZERO;
    n[axis_in] = sign_in;
    Some(RayHit { t: t0, normal: n })
}

pub fn ray_sphere_local(o: Vec3, d: Vec3, r: f32, max_t: f32) -> Option<RayHit> {
    let c = o.length_squared() - r * r;
    if c <= 0.0 {
        return Some(RayHit { t: 0.0, normal: -d.normalize_or_zero() });
    }
    let b = o.dot(d);
    if b > 0.0 { return None; }
    let disc = b * b - c;
    if disc < 0.0 { return None; }
    let t = -b - disc.sqrt();
    if t > max_t { return None; }
    Some(RayHit { t, normal: (o + d * t) / r })
}
