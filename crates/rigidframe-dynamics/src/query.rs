use rigidframe_collision::BroadPhase;
use rigidframe_core::types::Vec3;
use rigidframe_core::{BodyId, ObjectLayer};

use crate::registry::BodyRegistry;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayCastResult {
    pub body: BodyId,
    /// Distance along the (unit) ray direction.
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Closest hit among in-world bodies that pass `filter`.
pub fn cast_ray<F>(
    broad_phase: &BroadPhase,
    bodies: &BodyRegistry,
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    filter: F,
) -> Option<RayCastResult>
where
    F: Fn(BodyId, ObjectLayer) -> bool,
{
    let dir = dir.try_normalize()?;
    let candidates = broad_phase.cast_ray(origin, dir, max_distance, |p| filter(p.body, p.layer));
    let mut best: Option<RayCastResult> = None;
    for (entry, proxy) in candidates {
        if best.is_some_and(|b| entry > b.distance) { break; }
        let Ok(body) = bodies.get(proxy.body) else { continue };
        let limit = best.map_or(max_distance, |b| b.distance);
        if let Some(hit) = body.shape().cast_ray(&body.transform(), origin, dir, limit) {
            best = Some(RayCastResult { body: proxy.body, distance: hit.t, point: origin + dir * hit.t, normal: hit.normal });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use rigidframe_collision::Proxy;
    use rigidframe_core::{vec3, LayerPolicy};
    use rigidframe_geom::{BoxShapeSettings, SphereShapeSettings, ShapeSettings};
    use crate::body::{Activation, BodyCreationSettings, MotionType};

    #[test]
    fn nearest_body_wins_and_filter_applies() {
        let policy = LayerPolicy::collide_all();
        let mut reg = BodyRegistry::new(8);
        let mut bp = BroadPhase::new(1);
        let ground = BoxShapeSettings::new(vec3(5.0, 0.5, 5.0)).create().unwrap();
        let ball = SphereShapeSettings::new(0.5).create().unwrap();
        let mut add = |shape, pos, layer| {
            let id = reg.create(&BodyCreationSettings::new(shape, pos, Quat::IDENTITY, MotionType::Static, ObjectLayer(layer))).unwrap();
            reg.mark_added(id, Activation::DontActivate).unwrap();
            let aabb = reg.get(id).unwrap().world_aabb();
            bp.insert(Proxy { body: id, layer: ObjectLayer(layer), aabb }, &policy);
            id
        };
        let g = add(ground, vec3(0.0, -0.5, 0.0), 0);
        let s = add(ball, vec3(0.0, 2.0, 0.0), 1);
        bp.optimize();

        let down = vec3(0.0, -1.0, 0.0);
        let hit = cast_ray(&bp, &reg, vec3(0.0, 5.0, 0.0), down, 10.0, |_, _| true).unwrap();
        assert_eq!(hit.body, s);
        assert!((hit.distance - 2.5).abs() < 1e-4);

        let hit = cast_ray(&bp, &reg, vec3(0.0, 5.0, 0.0), down, 10.0, |_, l| l != ObjectLayer(1)).unwrap();
        assert_eq!(hit.body, g);
        assert!((hit.point.y).abs() < 1e-4);

        assert!(cast_ray(&bp, &reg, vec3(0.0, 5.0, 0.0), down, 1.0, |_, _| true).is_none());
    }
}
