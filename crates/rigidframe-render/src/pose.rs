use glam::{Mat3, Mat4, Quat, Vec3};
use rigidframe_core::Isometry;
use serde::{Deserialize, Serialize};

/// World transform as a renderer wants it: translation plus a column-major rotation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyPose {
    pub translation: [f32; 3],
    /// Columns are the body's x, y and z axes in world space.
    pub rotation: [[f32; 3]; 3],
}

impl BodyPose {
    pub fn from_isometry(xf: &Isometry) -> Self {
        let m = Mat3::from_quat(xf.rot.normalize());
        Self {
            translation: Vec3::from(xf.pos).to_array(),
            rotation: m.to_cols_array_2d(),
        }
    }

    pub fn rotation_matrix(&self) -> Mat3 { Mat3::from_cols_array_2d(&self.rotation) }

    pub fn model_matrix(&self) -> Mat4 {
        let q = Quat::from_mat3(&self.rotation_matrix());
        Mat4::from_rotation_translation(q, Vec3::from_array(self.translation))
    }

    pub fn is_finite(&self) -> bool {
        self.translation.iter().chain(self.rotation.iter().flatten()).all(|v| v.is_finite())
    }

    /// Columns unit length and mutually perpendicular within `eps`.
    pub fn is_orthonormal(&self, eps: f32) -> bool {
        let m = self.rotation_matrix();
        let [x, y, z] = [m.x_axis, m.y_axis, m.z_axis];
        (x.length() - 1.0).abs() < eps && (y.length() - 1.0).abs() < eps && (z.length() - 1.0).abs() < eps
            && x.dot(y).abs() < eps && y.dot(z).abs() < eps && z.dot(x).abs() < eps
    }
}
