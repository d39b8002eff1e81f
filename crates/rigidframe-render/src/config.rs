use serde::{Deserialize, Serialize};

use crate::extract::Drawable;

/// Uniforms fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Unit vector towards the light.
    pub light_direction: [f32; 3],
    pub aspect: f32,
    /// Label and shape of every drawable, in packet order.
    pub drawables: Vec<Drawable>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { light_direction: normalized([0.36, 0.8, -0.48]), aspect: 1280.0 / 720.0, drawables: Vec::new() }
    }
}

impl RenderConfig {
    pub fn with_drawables(mut self, drawables: Vec<Drawable>) -> Self { self.drawables = drawables; self }
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 { [v[0] / len, v[1] / len, v[2] / len] } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_light_is_unit_length() {
        let l = RenderConfig::default().light_direction;
        let len = (l[0] * l[0] + l[1] * l[1] + l[2] * l[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
    }
}
