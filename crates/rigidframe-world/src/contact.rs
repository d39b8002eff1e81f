//! Contact constraints for one collision step.
//!
//! Narrow-phase runs once per collision step and produces one [`Contact`] per manifold
//! point, anchored in each body's local frame. Every substep re-measures the depth from
//! the current poses, then the velocity pass adds restitution and dynamic friction.

use rayon::prelude::*;
use rigidframe_collision::collide;
use rigidframe_core::{BodyId, Vec3};
use rigidframe_dynamics::xpbd::{apply_impulse_pair, positional_weight, solve_linear};
use rigidframe_dynamics::{Body, BodyRegistry};

#[derive(Copy, Clone, Debug)]
pub(crate) struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    /// From A to B.
    pub normal: Vec3,
    pub local_a: Vec3,
    pub local_b: Vec3,
    pub friction: f32,
    pub restitution: f32,
    /// Penetration left uncorrected.
    pub slop: f32,
    /// Depth measured at generation; negative for speculative points.
    pub depth: f32,
    /// Normal multiplier from this substep's position pass.
    lambda_n: f32,
}

/// Contacts for every pair, in pair order. Runs on the current rayon pool.
pub(crate) fn generate(bodies: &BodyRegistry, pairs: &[(BodyId, BodyId)], margin: f32) -> Vec<Contact> {
    let per_pair: Vec<Vec<Contact>> = pairs
        .par_iter()
        .map(|&(a, b)| {
            let (Ok(ba), Ok(bb)) = (bodies.get(a), bodies.get(b)) else { return Vec::new() };
            let (xa, xb) = (ba.transform(), bb.transform());
            let Some(m) = collide(ba.shape(), &xa, bb.shape(), &xb, margin) else { return Vec::new() };
            let friction = (ba.friction() * bb.friction()).sqrt();
            let restitution = ba.restitution().max(bb.restitution());
            let slop = 0.1 * ba.shape().convex_radius().min(bb.shape().convex_radius());
            m.points
                .iter()
                .map(|p| Contact {
                    a,
                    b,
                    normal: m.normal,
                    local_a: xa.inverse_transform_point(p.on_a),
                    local_b: xb.inverse_transform_point(p.on_b),
                    friction,
                    restitution,
                    slop,
                    depth: p.depth,
                    lambda_n: 0.0,
                })
                .collect()
        })
        .collect();
    per_pair.into_iter().flatten().collect()
}

/// Non-penetration plus static friction. Resets and fills each contact's normal multiplier.
pub(crate) fn solve_positions(contacts: &mut [Contact], bodies: &mut BodyRegistry) {
    for c in contacts.iter_mut() {
        c.lambda_n = 0.0;
        let Ok((a, b)) = bodies.pair_mut(c.a, c.b) else { continue };
        let (pa, pb) = (a.transform().transform_point(c.local_a), b.transform().transform_point(c.local_b));
        let depth = (pa - pb).dot(c.normal) - c.slop;
        if depth <= 0.0 { continue; }
        let (ra, rb) = (pa - a.position(), pb - b.position());
        c.lambda_n = solve_linear(a, b, ra, rb, -c.normal, depth, 0.0, 0.0, 0.0);

        // Static friction: undo tangential drift of the contact points this substep.
        let (pa, pb) = (a.transform().transform_point(c.local_a), b.transform().transform_point(c.local_b));
        let pa_prev = a.prev_transform().transform_point(c.local_a);
        let pb_prev = b.prev_transform().transform_point(c.local_b);
        let dp = (pa - pa_prev) - (pb - pb_prev);
        let dp_t = dp - c.normal * dp.dot(c.normal);
        let len = dp_t.length();
        if len <= 1.0e-9 { continue; }
        let (ra, rb) = (pa - a.position(), pb - b.position());
        let t = dp_t / len;
        let w = positional_weight(a, ra, t) + positional_weight(b, rb, t);
        if w <= 0.0 { continue; }
        if len / w < c.friction * c.lambda_n {
            solve_linear(a, b, ra, rb, -t, len, 0.0, 0.0, 0.0);
        }
    }
}

/// Restitution and dynamic friction for contacts that were active this substep.
pub(crate) fn solve_velocities(contacts: &[Contact], bodies: &mut BodyRegistry, h: f32, gravity: Vec3) {
    let rest_threshold = 2.0 * gravity.length() * h;
    for c in contacts {
        if c.lambda_n <= 0.0 { continue; }
        let Ok((a, b)) = bodies.pair_mut(c.a, c.b) else { continue };
        // Normal from B towards A so approaching gives a negative normal speed.
        let n = -c.normal;
        let (pa, pb) = (a.transform().transform_point(c.local_a), b.transform().transform_point(c.local_b));
        let v = a.velocity_at(pa) - b.velocity_at(pb);
        let vn = v.dot(n);
        let vt = v - n * vn;

        let mut dv = Vec3::ZERO;
        let vt_len = vt.length();
        if vt_len > 1.0e-9 {
            let fn_impulse = c.lambda_n / h;
            dv -= vt / vt_len * (c.friction * fn_impulse).min(vt_len);
        }
        let vn_pre = (a.pre_solve_velocity_at(pa) - b.pre_solve_velocity_at(pb)).dot(n);
        let e = if vn.abs() <= rest_threshold { 0.0 } else { c.restitution };
        dv += n * (-vn + (-e * vn_pre).max(0.0));

        apply_velocity_change(a, b, pa, pb, dv);
    }
}

fn apply_velocity_change(a: &mut Body, b: &mut Body, pa: Vec3, pb: Vec3, dv: Vec3) {
    let len = dv.length();
    if len <= 1.0e-9 { return; }
    let dir = dv / len;
    let w = positional_weight(a, pa - a.position(), dir) + positional_weight(b, pb - b.position(), dir);
    if w <= 0.0 { return; }
    apply_impulse_pair(a, b, pa, pb, dir * (len / w));
}
