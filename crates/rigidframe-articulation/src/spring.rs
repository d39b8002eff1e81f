use serde::{Deserialize, Serialize};

/// Soft constraint parameters. A zero frequency means rigid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpringSettings {
    /// Hz.
    pub frequency: f32,
    /// Damping ratio, 1 is critical.
    pub damping: f32,
}

impl SpringSettings {
    pub fn new(frequency: f32, damping: f32) -> Self { Self { frequency, damping } }

    #[inline] pub fn is_rigid(&self) -> bool { self.frequency <= 0.0 }

    /// XPBD `(alpha_tilde, gamma)` for generalized inverse mass `w` and substep `h`.
    pub fn xpbd_terms(&self, w: f32, h: f32) -> (f32, f32) {
        if self.is_rigid() || w <= 0.0 || h <= 0.0 { return (0.0, 0.0); }
        let omega = 2.0 * core::f32::consts::PI * self.frequency;
        let alpha_tilde = w / (omega * omega * h * h);
        let gamma = 2.0 * self.damping / (omega * h);
        (alpha_tilde, gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rigid_has_no_compliance() {
        assert_eq!(SpringSettings::default().xpbd_terms(1.0, 0.01), (0.0, 0.0));
        let (a, g) = SpringSettings::new(1.0, 0.1).xpbd_terms(2.0, 0.01);
        assert!(a > 0.0 && g > 0.0);
    }
}
