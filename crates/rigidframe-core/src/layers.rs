//! Collision layer policy.
//!
//! Every body carries an [`ObjectLayer`]. Object layers map onto a smaller set of
//! [`BroadPhaseLayer`]s, each of which gets its own broad-phase list. Whether two
//! bodies may produce a contact is decided by two predicates: object layer vs
//! broad-phase layer (prunes whole lists) and object layer vs object layer.
//! Both must be pure, and the object pair predicate must be symmetric.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectLayer(pub u16);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BroadPhaseLayer(pub u8);

/// Dense index of a layer, used by [`PairTable`].
pub trait LayerIndex: Copy {
    fn index(self) -> usize;
}

impl LayerIndex for ObjectLayer { #[inline] fn index(self) -> usize { self.0 as usize } }
impl LayerIndex for BroadPhaseLayer { #[inline] fn index(self) -> usize { self.0 as usize } }

pub trait CollisionPolicy<A, B = A>: Send + Sync {
    fn collides(&self, a: A, b: B) -> bool;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AlwaysCollide;

#[derive(Copy, Clone, Debug, Default)]
pub struct NeverCollide;

impl<A, B> CollisionPolicy<A, B> for AlwaysCollide {
    #[inline] fn collides(&self, _: A, _: B) -> bool { true }
}

impl<A, B> CollisionPolicy<A, B> for NeverCollide {
    #[inline] fn collides(&self, _: A, _: B) -> bool { false }
}

/// Closure adapter: `FnPolicy(|a: ObjectLayer, b: ObjectLayer| a != b)`.
#[derive(Copy, Clone)]
pub struct FnPolicy<F>(pub F);

impl<A, B, F> CollisionPolicy<A, B> for FnPolicy<F>
where
    F: Fn(A, B) -> bool + Send + Sync,
{
    #[inline] fn collides(&self, a: A, b: B) -> bool { (self.0)(a, b) }
}

/// Bitmask table, up to 64 columns. Layers outside the table never collide.
#[derive(Clone, Debug)]
pub struct PairTable<A, B = A> {
    rows: Vec<u64>,
    _marker: std::marker::PhantomData<fn(A, B)>,
}

impl<A: LayerIndex, B: LayerIndex> PairTable<A, B> {
    pub fn new(rows: usize) -> Self { Self { rows: vec![0; rows], _marker: std::marker::PhantomData } }

    pub fn allow(&mut self, a: A, b: B) -> &mut Self {
        if let Some(row) = self.rows.get_mut(a.index()) {
            if b.index() < 64 { *row |= 1u64 << b.index(); }
        }
        self
    }

    #[inline]
    pub fn get(&self, a: A, b: B) -> bool {
        b.index() < 64 && self.rows.get(a.index()).is_some_and(|r| (*r >> b.index()) & 1 == 1)
    }
}

impl<A: LayerIndex> PairTable<A, A> {
    /// Sets both `(a, b)` and `(b, a)`.
    pub fn allow_pair(&mut self, a: A, b: A) -> &mut Self {
        self.allow(a, b);
        self.allow(b, a)
    }
}

impl<A: LayerIndex, B: LayerIndex> CollisionPolicy<A, B> for PairTable<A, B> {
    #[inline] fn collides(&self, a: A, b: B) -> bool { self.get(a, b) }
}

/// Object layer to broad-phase layer. Unmapped object layers land in layer 0.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadPhaseLayerMap {
    map: Vec<BroadPhaseLayer>,
    num_layers: u8,
}

impl Default for BroadPhaseLayerMap {
    fn default() -> Self { Self::single() }
}

impl BroadPhaseLayerMap {
    /// Everything in one broad-phase list.
    pub fn single() -> Self { Self { map: Vec::new(), num_layers: 1 } }

    pub fn new(map: Vec<BroadPhaseLayer>) -> Self {
        let num_layers = map.iter().map(|l| l.0 + 1).max().unwrap_or(1);
        Self { map, num_layers }
    }

    #[inline]
    pub fn get(&self, layer: ObjectLayer) -> BroadPhaseLayer {
        self.map.get(layer.index()).copied().unwrap_or(BroadPhaseLayer(0))
    }

    #[inline] pub fn num_broad_phase_layers(&self) -> usize { self.num_layers as usize }
    #[inline] pub fn num_object_layers(&self) -> usize { self.map.len().max(1) }
}

/// Everything the world needs to decide whether two layers interact.
#[derive(Clone)]
pub struct LayerPolicy {
    map: BroadPhaseLayerMap,
    object_vs_broad: Arc<dyn CollisionPolicy<ObjectLayer, BroadPhaseLayer>>,
    object_pairs: Arc<dyn CollisionPolicy<ObjectLayer>>,
}

impl fmt::Debug for LayerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerPolicy").field("map", &self.map).finish_non_exhaustive()
    }
}

impl Default for LayerPolicy {
    fn default() -> Self { Self::collide_all() }
}

impl LayerPolicy {
    pub fn new(
        map: BroadPhaseLayerMap,
        object_vs_broad: impl CollisionPolicy<ObjectLayer, BroadPhaseLayer> + 'static,
        object_pairs: impl CollisionPolicy<ObjectLayer> + 'static,
    ) -> Self {
        Self { map, object_vs_broad: Arc::new(object_vs_broad), object_pairs: Arc::new(object_pairs) }
    }

    pub fn collide_all() -> Self { Self::new(BroadPhaseLayerMap::single(), AlwaysCollide, AlwaysCollide) }
    pub fn collide_none() -> Self { Self::new(BroadPhaseLayerMap::single(), NeverCollide, NeverCollide) }

    #[inline] pub fn map(&self) -> &BroadPhaseLayerMap { &self.map }
    #[inline] pub fn broad_phase_layer(&self, layer: ObjectLayer) -> BroadPhaseLayer { self.map.get(layer) }

    #[inline]
    pub fn object_vs_broad(&self, layer: ObjectLayer, bp: BroadPhaseLayer) -> bool {
        self.object_vs_broad.collides(layer, bp)
    }

    #[inline]
    pub fn objects_collide(&self, a: ObjectLayer, b: ObjectLayer) -> bool {
        self.object_pairs.collides(a, b)
    }

    /// Full filter for a candidate pair.
    pub fn pair_allowed(&self, a: ObjectLayer, b: ObjectLayer) -> bool {
        self.object_vs_broad(a, self.map.get(b))
            && self.object_vs_broad(b, self.map.get(a))
            && self.objects_collide(a, b)
    }

    /// First asymmetric pair among the mapped object layers, if any.
    pub fn find_asymmetry(&self) -> Option<(ObjectLayer, ObjectLayer)> {
        let n = self.map.num_object_layers() as u16;
        for a in 0..n {
            for b in a + 1..n {
                let (la, lb) = (ObjectLayer(a), ObjectLayer(b));
                if self.objects_collide(la, lb) != self.objects_collide(lb, la) {
                    return Some((la, lb));
                }
            }
        }
        None
    }
}
