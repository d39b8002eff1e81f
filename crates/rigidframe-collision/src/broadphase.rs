//! Layered sweep-and-prune.
//!
//! One list per broad-phase layer, each kept ordered by `aabb.min.x`. New proxies are
//! appended unsorted; [`BroadPhase::optimize`] does a full sort while the per-step
//! [`BroadPhase::update`] only runs an insertion sort, which is linear when the lists
//! are nearly ordered from the previous step.

use std::collections::HashMap;

use rigidframe_core::{BodyId, BroadPhaseLayer, LayerPolicy, ObjectLayer};
use rigidframe_core::types::Vec3;
use rigidframe_geom::Aabb;

#[derive(Copy, Clone, Debug)]
pub struct Proxy {
    pub body: BodyId,
    pub layer: ObjectLayer,
    pub aabb: Aabb,
}

#[derive(Default)]
struct SapList {
    proxies: Vec<Proxy>,
}

impl SapList {
    fn sort_full(&mut self) {
        self.proxies.sort_by(|a, b| a.aabb.min.x.total_cmp(&b.aabb.min.x).then(a.body.cmp(&b.body)));
    }

    fn sort_incremental(&mut self) {
        let v = &mut self.proxies;
        for i in 1..v.len() {
            let mut j = i;
            while j > 0 && key_less(&v[j], &v[j - 1]) {
                v.swap(j, j - 1);
                j -= 1;
            }
        }
    }
}

#[inline]
fn key_less(a: &Proxy, b: &Proxy) -> bool {
    a.aabb.min.x.total_cmp(&b.aabb.min.x).then(a.body.cmp(&b.body)).is_lt()
}

pub struct BroadPhase {
    lists: Vec<SapList>,
    where_is: HashMap<BodyId, BroadPhaseLayer>,
    inserted_since_optimize: usize,
}

impl BroadPhase {
    pub fn new(num_layers: usize) -> Self {
        let lists = (0..num_layers.max(1)).map(|_| SapList::default()).collect();
        Self { lists, where_is: HashMap::new(), inserted_since_optimize: 0 }
    }

    #[inline] pub fn len(&self) -> usize { self.where_is.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.where_is.is_empty() }
    #[inline] pub fn contains(&self, body: BodyId) -> bool { self.where_is.contains_key(&body) }
    #[inline] pub fn inserted_since_optimize(&self) -> usize { self.inserted_since_optimize }

    pub fn insert(&mut self, proxy: Proxy, policy: &LayerPolicy) {
        let bp = policy.broad_phase_layer(proxy.layer);
        let idx = (bp.0 as usize).min(self.lists.len() - 1);
        self.lists[idx].proxies.push(proxy);
        self.where_is.insert(proxy.body, BroadPhaseLayer(idx as u8));
        self.inserted_since_optimize += 1;
    }

    pub fn remove(&mut self, body: BodyId) -> bool {
        let Some(bp) = self.where_is.remove(&body) else { return false };
        self.lists[bp.0 as usize].proxies.retain(|p| p.body != body);
        true
    }

    /// Full re-sort of every list. Call after a batch of insertions.
    pub fn optimize(&mut self) {
        for l in &mut self.lists { l.sort_full(); }
        self.inserted_since_optimize = 0;
    }

    /// Refresh bounds through `bounds` and restore ordering. `None` keeps the old box.
    pub fn update<F>(&mut self, mut bounds: F)
    where
        F: FnMut(BodyId) -> Option<Aabb>,
    {
        for l in &mut self.lists {
            for p in &mut l.proxies {
                if let Some(a) = bounds(p.body) { p.aabb = a; }
            }
            l.sort_incremental();
        }
    }

    pub fn aabb(&self, body: BodyId) -> Option<Aabb> {
        let bp = self.where_is.get(&body)?;
        self.lists[bp.0 as usize].proxies.iter().find(|p| p.body == body).map(|p| p.aabb)
    }

    /// Overlapping pairs that pass the layer policy and `keep`, as `(lo, hi)` by id, sorted.
    pub fn find_pairs<K>(&self, policy: &LayerPolicy, keep: K, out: &mut Vec<(BodyId, BodyId)>)
    where
        K: Fn(&Proxy, &Proxy) -> bool,
    {
        out.clear();
        let mut emit = |a: &Proxy, b: &Proxy| {
            if !a.aabb.overlaps(&b.aabb) { return; }
            if !policy.pair_allowed(a.layer, b.layer) || !keep(a, b) { return; }
            out.push(if a.body < b.body { (a.body, b.body) } else { (b.body, a.body) });
        };

        let mut active: Vec<&Proxy> = Vec::new();
        for list in &self.lists {
            active.clear();
            for p in &list.proxies {
                if !p.aabb.is_finite() { continue; }
                active.retain(|q| q.aabb.max.x >= p.aabb.min.x);
                for q in &active { emit(*q, p); }
                active.push(p);
            }
        }

        for i in 0..self.lists.len() {
            for j in i + 1..self.lists.len() {
                let (li, lj) = (&self.lists[i].proxies, &self.lists[j].proxies);
                let bi = BroadPhaseLayer(i as u8);
                let bj = BroadPhaseLayer(j as u8);
                for a in li {
                    if !policy.object_vs_broad(a.layer, bj) || !a.aabb.is_finite() { continue; }
                    for b in lj {
                        if b.aabb.min.x > a.aabb.max.x { break; }
                        if !policy.object_vs_broad(b.layer, bi) { continue; }
                        emit(a, b);
                    }
                }
            }
        }

        out.sort_unstable();
        out.dedup();
    }

    /// Proxies whose bounds the ray enters within `max_t`, nearest first.
    pub fn cast_ray<F>(&self, origin: Vec3, dir: Vec3, max_t: f32, filter: F) -> Vec<(f32, Proxy)>
    where
        F: Fn(&Proxy) -> bool,
    {
        let mut hits: Vec<(f32, Proxy)> = self.lists.iter()
            .flat_map(|l| l.proxies.iter())
            .filter(|p| filter(p))
            .filter_map(|p| p.aabb.ray_entry(origin, dir, max_t).map(|t| (t, *p)))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.body.cmp(&b.1.body)));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigidframe_core::{vec3, Handle, BroadPhaseLayerMap, PairTable, AlwaysCollide};

    fn proxy(i: u32, layer: u16, x: f32) -> Proxy {
        Proxy {
            body: BodyId::from_parts(i, 0),
            layer: ObjectLayer(layer),
            aabb: Aabb::from_center_half_extents(vec3(x, 0.0, 0.0), Vec3::splat(0.5)),
        }
    }

    fn brute(ps: &[Proxy]) -> Vec<(BodyId, BodyId)> {
        let mut out = Vec::new();
        for i in 0..ps.len() {
            for j in i + 1..ps.len() {
                if ps[i].aabb.overlaps(&ps[j].aabb) {
                    let (a, b) = (ps[i].body, ps[j].body);
                    out.push(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        out.sort_unstable();
        out
    }

    #[test]
    fn matches_brute_force_before_and_after_optimize() {
        let policy = LayerPolicy::collide_all();
        let ps: Vec<Proxy> = (0..20).map(|i| proxy(i, 0, ((i * 7) % 11) as f32 * 0.6)).collect();
        let mut bp = BroadPhase::new(1);
        for p in &ps { bp.insert(*p, &policy); }
        let mut pairs = Vec::new();
        bp.update(|_| None);
        bp.find_pairs(&policy, |_, _| true, &mut pairs);
        assert_eq!(pairs, brute(&ps));
        bp.optimize();
        assert_eq!(bp.inserted_since_optimize(), 0);
        bp.find_pairs(&policy, |_, _| true, &mut pairs);
        assert_eq!(pairs, brute(&ps));
    }

    #[test]
    fn layers_prune_pairs() {
        let map = BroadPhaseLayerMap::new(vec![BroadPhaseLayer(0), BroadPhaseLayer(1)]);
        let mut pairs_table = PairTable::new(2);
        pairs_table.allow_pair(ObjectLayer(0), ObjectLayer(1)).allow_pair(ObjectLayer(1), ObjectLayer(1));
        let policy = LayerPolicy::new(map, AlwaysCollide, pairs_table);

        let mut bp = BroadPhase::new(2);
        bp.insert(proxy(0, 0, 0.0), &policy);
        bp.insert(proxy(1, 0, 0.2), &policy);
        bp.insert(proxy(2, 1, 0.4), &policy);
        bp.optimize();
        let mut pairs = Vec::new();
        bp.find_pairs(&policy, |_, _| true, &mut pairs);
        let ids = |a: u32, b: u32| (BodyId::from_parts(a, 0), BodyId::from_parts(b, 0));
        assert_eq!(pairs, vec![ids(0, 2), ids(1, 2)]);

        assert!(bp.remove(BodyId::from_parts(2, 0)));
        assert!(!bp.remove(BodyId::from_parts(2, 0)));
        bp.find_pairs(&policy, |_, _| true, &mut pairs);
        assert!(pairs.is_empty());
    }

    #[test]
    fn ray_candidates_nearest_first() {
        let policy = LayerPolicy::collide_all();
        let mut bp = BroadPhase::new(1);
        bp.insert(proxy(0, 0, 5.0), &policy);
        bp.insert(proxy(1, 0, 2.0), &policy);
        let hits = bp.cast_ray(vec3(-1.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 100.0, |_| true);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1.body, BodyId::from_parts(1, 0));
        assert!((hits[0].0 - 2.5).abs() < 1e-6);
    }
}
