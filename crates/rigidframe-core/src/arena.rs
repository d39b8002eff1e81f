use core::marker::PhantomData;
use rayon::prelude::*;

use crate::ids::Handle;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-checked slot storage. Freed slots are reused LIFO with a bumped
/// generation, so a handle from before the removal never resolves again.
pub struct Arena<I, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: Handle, T> Default for Arena<I, T> {
    fn default() -> Self { Self::new() }
}

impl<I: Handle, T> Arena<I, T> {
    pub fn new() -> Self { Self { slots: Vec::new(), free: Vec::new(), len: 0, _id: PhantomData } }

    pub fn with_capacity(cap: usize) -> Self {
        Self { slots: Vec::with_capacity(cap), free: Vec::new(), len: 0, _id: PhantomData }
    }

    #[inline] pub fn len(&self) -> usize { self.len }
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn insert(&mut self, value: T) -> I {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return I::from_parts(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        I::from_parts(index, 0)
    }

    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() { return None; }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn contains(&self, id: I) -> bool { self.get(id).is_some() }

    pub fn get(&self, id: I) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() { return None; }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() { return None; }
        slot.value.as_mut()
    }

    /// Two distinct live entries at once. `None` if either is stale or `a == b`.
    pub fn get2_mut(&mut self, a: I, b: I) -> Option<(&mut T, &mut T)> {
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia == ib || !self.contains(a) || !self.contains(b) { return None; }
        let (lo, hi, swapped) = if ia < ib { (ia, ib, false) } else { (ib, ia, true) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let x = head[lo].value.as_mut()?;
        let y = tail[0].value.as_mut()?;
        Some(if swapped { (y, x) } else { (x, y) })
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| (I::from_parts(i as u32, s.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| (I::from_parts(i as u32, generation), v))
        })
    }

    pub fn ids(&self) -> Vec<I> { self.iter().map(|(id, _)| id).collect() }
}

impl<I: Handle, T: Send> Arena<I, T> {
    /// Parallel visit of every live value. Runs on the current rayon pool.
    pub fn par_for_each_mut<F>(&mut self, f: F)
    where
        F: Fn(&mut T) + Sync + Send,
    {
        self.slots.par_iter_mut().for_each(|s| {
            if let Some(v) = s.value.as_mut() { f(v) }
        });
    }
}
