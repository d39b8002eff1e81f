//! Layer setup shared by the demo scenes.
//!
//! | object layer | broad-phase | collides with |
//! |---|---|---|
//! | `NON_MOVING` | 0 | `MOVING`, `CHASSIS` |
//! | `MOVING` | 1 | everything but `LINKS` |
//! | `LINKS` | 1 | nothing |
//! | `CHASSIS` | 1 | `NON_MOVING`, `MOVING` |

use rigidframe_core::{BroadPhaseLayer, BroadPhaseLayerMap, LayerPolicy, ObjectLayer, PairTable};

pub const NON_MOVING: ObjectLayer = ObjectLayer(0);
pub const MOVING: ObjectLayer = ObjectLayer(1);
/// Jointed links that overlap their neighbours at the pivots.
pub const LINKS: ObjectLayer = ObjectLayer(2);
pub const CHASSIS: ObjectLayer = ObjectLayer(3);

pub const BP_NON_MOVING: BroadPhaseLayer = BroadPhaseLayer(0);
pub const BP_MOVING: BroadPhaseLayer = BroadPhaseLayer(1);

pub fn demo_policy() -> LayerPolicy {
    let map = BroadPhaseLayerMap::new(vec![BP_NON_MOVING, BP_MOVING, BP_MOVING, BP_MOVING]);

    let mut ovb: PairTable<ObjectLayer, BroadPhaseLayer> = PairTable::new(4);
    ovb.allow(NON_MOVING, BP_MOVING)
        .allow(MOVING, BP_NON_MOVING)
        .allow(MOVING, BP_MOVING)
        .allow(CHASSIS, BP_NON_MOVING)
        .allow(CHASSIS, BP_MOVING);

    let mut pairs = PairTable::new(4);
    pairs
        .allow_pair(NON_MOVING, MOVING)
        .allow_pair(NON_MOVING, CHASSIS)
        .allow_pair(MOVING, MOVING)
        .allow_pair(MOVING, CHASSIS);

    LayerPolicy::new(map, ovb, pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_matches_table() {
        let p = demo_policy();
        assert!(p.find_asymmetry().is_none());
        assert!(p.pair_allowed(MOVING, NON_MOVING));
        assert!(p.pair_allowed(CHASSIS, NON_MOVING));
        assert!(!p.pair_allowed(NON_MOVING, NON_MOVING));
        assert!(!p.pair_allowed(CHASSIS, CHASSIS));
        for other in [NON_MOVING, MOVING, LINKS, CHASSIS] {
            assert!(!p.pair_allowed(LINKS, other));
        }
    }
}
