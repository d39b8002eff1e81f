use rigidframe_core::types::Vec3;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }
    #[inline] pub fn from_center_half_extents(c: Vec3, he: Vec3) -> Self {
        Self { min: c - he, max: c + he }
    }
    #[inline] pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x || self.min.x > other.max.x ||
            self.max.y < other.min.y || self.min.y > other.max.y ||
            self.max.z < other.min.z || self.min.z > other.max.z)
    }
    #[inline] pub fn expand_by(&mut self, r: f32) {
        let e = Vec3::splat(r);
        self.min -= e; self.max += e;
    }
    /// Grow along `d` only, so a box swept by displacement `d` stays covered.
    #[inline] pub fn sweep(&mut self, d: Vec3) {
        self.min += d.min(Vec3::ZERO);
        self.max += d.max(Vec3::ZERO);
    }
    #[inline] pub fn is_finite(&self) -> bool { self.min.is_finite() && self.max.is_finite() }

    /// Slab test. Returns the entry distance along `dir` within `[0, max_t]`.
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, max_t: f32) -> Option<f32> {
        let mut t0 = 0.0f32;
        let mut t1 = max_t;
        for axis in 0..3 {
            let (o, d, lo, hi) = (origin[axis], dir[axis], self.min[axis], self.max[axis]);
            if d.abs() < 1.0e-12 {
                if o < lo || o > hi { return None; }
                continue;
            }
            let inv = 1.0 / d;
            let (mut a, mut b) = ((lo - o) * inv, (hi - o) * inv);
            if a > b { core::mem::swap(&mut a, &mut b); }
            t0 = t0.max(a);
            t1 = t1.min(b);
            if t0 > t1 { return None; }
        }
        Some(t0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::vec3;

    #[test]
    fn sweep_covers_displacement() {
        let mut a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        a.sweep(vec3(2.0, -1.0, 0.0));
        assert_eq!(a.min, vec3(-1.0, -2.0, -1.0));
        assert_eq!(a.max, vec3(3.0, 1.0, 1.0));
    }

    #[test]
    fn ray_entry_hits_and_misses() {
        let a = Aabb::from_center_half_extents(vec3(0.0, 0.0, 5.0), Vec3::splat(1.0));
        let t = a.ray_entry(Vec3::ZERO, vec3(0.0, 0.0, 1.0), 10.0).unwrap();
        assert!((t - 4.0).abs() < 1e-6);
        assert!(a.ray_entry(Vec3::ZERO, vec3(0.0, 0.0, 1.0), 3.0).is_none());
        assert!(a.ray_entry(Vec3::ZERO, vec3(0.0, 1.0, 0.0), 10.0).is_none());
        // origin inside
        assert_eq!(a.ray_entry(vec3(0.0, 0.0, 5.0), vec3(1.0, 0.0, 0.0), 10.0), Some(0.0));
    }
}
