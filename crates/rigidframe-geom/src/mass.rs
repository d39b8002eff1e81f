use rigidframe_core::types::{Mat3, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
    /// Principal moments about the local axes.
    pub inertia: Mat3,
}

impl MassProps {
    pub fn from_sphere(radius: f32, density: f32) -> Self {
        let vol = (4.0/3.0) * core::f32::consts::PI * radius*radius*radius;
        let m = density * vol;
        let ii = 0.4 * m * radius * radius;
        Self { mass: m, inv_mass: 1.0/m, inertia: Mat3::from_diagonal(Vec3::splat(ii).into()) }
    }

    pub fn from_box(half: Vec3, density: f32) -> Self {
        let dims = half * 2.0;
        let m = density * dims.x * dims.y * dims.z;
        let (x2, y2, z2) = (dims.x * dims.x, dims.y * dims.y, dims.z * dims.z);
        let ix = (1.0/12.0) * m * (y2 + z2);
        let iy = (1.0/12.0) * m * (x2 + z2);
        let iz = (1.0/12.0) * m * (x2 + y2);
        Self { mass: m, inv_mass: 1.0/m, inertia: Mat3::from_diagonal(Vec3::new(ix, iy, iz).into()) }
    }

    /// Same shape of inertia, rescaled to `mass`.
    pub fn with_mass(&self, mass: f32) -> Self {
        let s = mass / self.mass;
        Self { mass, inv_mass: 1.0 / mass, inertia: self.inertia * s }
    }

    pub fn inv_inertia_local(&self) -> Mat3 {
        let d = Vec3::new(self.inertia.x_axis.x, self.inertia.y_axis.y, self.inertia.z_axis.z);
        let inv = Vec3::select(d.cmpgt(Vec3::ZERO), d.recip(), Vec3::ZERO);
        Mat3::from_diagonal(inv.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_mass_and_override() {
        let m = MassProps::from_box(Vec3::new(0.5, 0.5, 0.5), 1000.0);
        assert!((m.mass - 1000.0).abs() < 1e-3);
        let light = m.with_mass(10.0);
        assert!((light.inv_mass - 0.1).abs() < 1e-6);
        let ratio = light.inertia.x_axis.x / m.inertia.x_axis.x;
        assert!((ratio - 0.01).abs() < 1e-6);
    }
}
